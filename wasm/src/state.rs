use std::cell::RefCell;

use emoji_connections::Game;

use crate::browser::{LocalStorageStore, WindowScheduler};

pub type BrowserGame = Game<WindowScheduler, LocalStorageStore>;

/// Where the page is in its lifecycle.
pub enum Phase {
    Loading,
    /// The puzzle could not be loaded; nothing is playable.
    Error(String),
    Ready(Box<BrowserGame>),
}

pub struct App {
    pub phase: Phase,
    /// Called after every state change so the page can re-render.
    pub on_change: Option<js_sys::Function>,
    /// Bumped on every `start`; timers and fetches from older games are dropped.
    pub epoch: u32,
}

impl App {
    const fn new() -> Self {
        App {
            phase: Phase::Loading,
            on_change: None,
            epoch: 0,
        }
    }

    pub fn game(&self) -> Option<&BrowserGame> {
        match &self.phase {
            Phase::Ready(game) => Some(game.as_ref()),
            _ => None,
        }
    }

    pub fn game_mut(&mut self) -> Option<&mut BrowserGame> {
        match &mut self.phase {
            Phase::Ready(game) => Some(game.as_mut()),
            _ => None,
        }
    }
}

thread_local! {
    pub static APP: RefCell<App> = const { RefCell::new(App::new()) };
}
