use emoji_connections::calendar::puzzle_id_at;
use emoji_connections::{
    Band, Game, Group, Item, Outcome, Persistence, Status, TilePosition, Timer, Verdict,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

mod browser;
mod console;
mod state;

use browser::{LocalStorageStore, WindowScheduler};
use state::{APP, BrowserGame, Phase};

/// What the page renders, serialized as JSON by [`view`].
#[derive(Serialize)]
#[serde(tag = "status")]
enum View<'a> {
    Loading,
    Error { message: &'a str },
    Ready(Board<'a>),
}

#[derive(Serialize)]
struct Board<'a> {
    puzzle_id: &'a str,
    puzzle_number: i64,
    tiles: &'a [TilePosition],
    selected: &'a [Item],
    attempts: u8,
    solved: &'a [Group],
    band: Option<&'a Band>,
    over: bool,
    busy: bool,
    phase: Status,
    outcome: Option<Outcome>,
    notice: Option<String>,
    summary: bool,
}

impl<'a> Board<'a> {
    fn of(game: &'a BrowserGame) -> Self {
        Board {
            puzzle_id: game.puzzle().id(),
            puzzle_number: game.puzzle().number(),
            tiles: game.tiles(),
            selected: game.selected(),
            attempts: game.remaining_attempts(),
            solved: game.solved_groups(),
            band: game.band(),
            over: game.is_over(),
            busy: game.is_busy(),
            phase: game.status(),
            outcome: game.outcome(),
            notice: game.notice().map(|n| n.to_string()),
            summary: game.summary_visible(),
        }
    }
}

/// Calls the page's change callback. Must run with no borrow of `APP` held,
/// since the page reads [`view`] from inside it.
fn notify() {
    let Some(callback) = APP.with_borrow(|app| app.on_change.clone()) else {
        return;
    };
    if let Err(e) = callback.call0(&JsValue::NULL) {
        log::warn!("change callback failed: {e:?}");
    }
}

/// Runs `f` against the loaded game, then re-renders. `None` until a game is ready.
fn with_game<R>(f: impl FnOnce(&mut BrowserGame) -> R) -> Option<R> {
    let result = APP.with_borrow_mut(|app| app.game_mut().map(f));
    if result.is_some() {
        notify();
    }
    result
}

pub(crate) fn fire_timer(epoch: u32, timer: Timer) {
    let fired = APP.with_borrow_mut(|app| {
        if app.epoch != epoch {
            return false;
        }
        match app.game_mut() {
            Some(game) => {
                game.on_timer(timer);
                true
            }
            None => false,
        }
    });
    if fired {
        notify();
    }
}

/// Loads today's puzzle and starts (or resumes) the game. `on_change` is
/// called whenever [`view`] would return something new.
#[wasm_bindgen]
pub fn start(on_change: js_sys::Function) {
    console_error_panic_hook::set_once();
    console::init();

    let epoch = APP.with_borrow_mut(|app| {
        app.epoch = app.epoch.wrapping_add(1);
        app.phase = Phase::Loading;
        app.on_change = Some(on_change);
        app.epoch
    });
    notify();

    let date = puzzle_id_at((js_sys::Date::now() / 1000.0) as i64);
    wasm_bindgen_futures::spawn_local(async move {
        let loaded = browser::fetch_puzzle(&date).await;
        let current = APP.with_borrow_mut(|app| {
            if app.epoch != epoch {
                return false;
            }
            app.phase = match loaded {
                Ok(puzzle) => {
                    log::info!("loaded puzzle #{} ({})", puzzle.number(), puzzle.id());
                    let game = Game::new(
                        puzzle,
                        WindowScheduler::new(epoch),
                        Persistence::new(LocalStorageStore),
                    );
                    Phase::Ready(Box::new(game))
                }
                Err(e) => {
                    log::error!("failed to load puzzle for {date}: {e}");
                    Phase::Error(e.to_string())
                }
            };
            true
        });
        if current {
            notify();
        }
    });
}

/// Current page state as JSON.
#[wasm_bindgen]
pub fn view() -> Result<String, String> {
    APP.with_borrow(|app| {
        let view = match &app.phase {
            Phase::Loading => View::Loading,
            Phase::Error(message) => View::Error { message: message.as_str() },
            Phase::Ready(game) => View::Ready(Board::of(game)),
        };
        serde_json::to_string(&view).map_err(|e| e.to_string())
    })
}

#[wasm_bindgen]
pub fn select_tile(item: &str) -> bool {
    with_game(|game| game.toggle_select(item)).unwrap_or(false)
}

/// Submits the selection. Returns whether the guess was judged.
#[wasm_bindgen]
pub fn submit_guess() -> bool {
    with_game(|game| game.submit())
        .is_some_and(|verdict| !matches!(verdict, Verdict::Ignored))
}

#[wasm_bindgen]
pub fn shuffle() {
    with_game(|game| game.shuffle());
}

#[wasm_bindgen]
pub fn deselect_all() {
    with_game(|game| game.deselect_all());
}

#[wasm_bindgen]
pub fn request_share_text() -> Option<String> {
    APP.with_borrow(|app| app.game().map(|game| game.share_text()))
}

#[wasm_bindgen]
pub async fn copy_share_text() -> bool {
    match request_share_text() {
        Some(text) => browser::copy_text(&text).await,
        None => false,
    }
}

#[wasm_bindgen]
pub fn show_summary() {
    with_game(|game| game.show_summary());
}

#[wasm_bindgen]
pub fn dismiss_summary() {
    with_game(|game| game.dismiss_summary());
}
