use std::time::Duration;

use anyhow::{Context, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use emoji_connections::{
    BlobStore, MemoryProvider, ProviderError, Puzzle, PuzzleProvider, Scheduler, Timer,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Storage, Window};

const PUZZLE_ENDPOINT: &str = "/api/puzzle";

fn js_error(value: JsValue) -> anyhow::Error {
    anyhow!("{value:?}")
}

fn window() -> anyhow::Result<Window> {
    web_sys::window().context("no window")
}

fn local_storage() -> anyhow::Result<Storage> {
    window()?
        .local_storage()
        .map_err(js_error)?
        .context("localStorage is disabled")
}

/// Keeps snapshots in `localStorage`, base64-encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

impl BlobStore for LocalStorageStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let Some(text) = local_storage()?.get_item(key).map_err(js_error)? else {
            return Ok(None);
        };
        let bytes = STANDARD
            .decode(text.as_bytes())
            .context("saved game is not base64")?;
        Ok(Some(bytes))
    }

    fn set(&mut self, key: &str, bytes: &[u8]) -> anyhow::Result<()> {
        local_storage()?
            .set_item(key, &STANDARD.encode(bytes))
            .map_err(js_error)
    }
}

/// Schedules timers with `window.setTimeout`. Each timer carries the epoch of
/// the game that asked for it.
#[derive(Debug, Clone, Copy)]
pub struct WindowScheduler {
    epoch: u32,
}

impl WindowScheduler {
    pub fn new(epoch: u32) -> Self {
        WindowScheduler { epoch }
    }
}

impl Scheduler for WindowScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) {
        let epoch = self.epoch;
        let callback = Closure::once_into_js(move || crate::fire_timer(epoch, timer));
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let result = window().and_then(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                millis,
            )
            .map_err(js_error)
        });
        if let Err(e) = result {
            log::warn!("failed to schedule {timer:?}: {e:#}");
        }
    }
}

/// Fetches the puzzle for `date` from the puzzle service.
pub async fn fetch_puzzle(date: &str) -> Result<Puzzle, ProviderError> {
    let transport = |e: anyhow::Error| ProviderError::Transport(format!("{e:#}"));

    let url = format!("{PUZZLE_ENDPOINT}?date={date}");
    let window = window().map_err(transport)?;
    let response: Response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(js_error)
        .and_then(|value| value.dyn_into().map_err(js_error))
        .map_err(transport)?;

    if response.status() == 404 {
        return Err(ProviderError::NotFound(date.to_string()));
    }
    if !response.ok() {
        return Err(ProviderError::Transport(format!(
            "{url} answered {}",
            response.status()
        )));
    }

    let text = async {
        let value = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        value.as_string().context("response body is not text")
    }
    .await
    .map_err(transport)?;

    let mut cache = MemoryProvider::new();
    cache.insert(date, text);
    cache.get_puzzle(date)
}

/// Writes `text` to the system clipboard, reporting whether it landed.
pub async fn copy_text(text: &str) -> bool {
    let result = async {
        let clipboard = window()?.navigator().clipboard();
        JsFuture::from(clipboard.write_text(text))
            .await
            .map_err(js_error)?;
        anyhow::Ok(())
    }
    .await;
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to copy share text: {e:#}");
            false
        }
    }
}
