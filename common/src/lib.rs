//! Board engine for a daily "find four groups of four" emoji puzzle.
//!
//! [`Game`] owns selection, guess judging, layout and persistence for one
//! [`Puzzle`]. Animation steps are requested from a [`Scheduler`] and fed
//! back through [`Game::on_timer`], so the engine runs the same under a
//! browser timer, a test harness, or the terminal bot.

pub mod calendar;
pub mod game;
pub mod layout;
pub mod provider;
pub mod puzzle;
pub mod schedule;
pub mod share;
pub mod storage;

pub use game::{Band, Game, MAX_ATTEMPTS, Notice, Outcome, Session, Status, Verdict};
pub use layout::{GRID_WIDTH, TilePosition};
pub use provider::{MemoryProvider, ProviderError, PuzzleProvider, fallback_puzzle};
pub use puzzle::{Difficulty, Group, Item, Puzzle, PuzzleError, guess_key};
pub use schedule::{ManualScheduler, Scheduler, Timer, Timings};
pub use share::{Clipboard, share_text};
pub use storage::{BlobStore, MemoryStore, Persistence, STORAGE_KEY, Snapshot};
