use std::collections::VecDeque;
use std::time::Duration;

/// Named follow-up steps of the board choreography. The host fires each one
/// back into [`crate::Game::on_timer`] once its delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Tiles have reached their row; expand the label band.
    Settle,
    /// The band has finished expanding; record the group.
    Commit,
    /// Start revealing the next group after a loss.
    NextReveal,
    /// Shuffled tiles have reached their new places.
    ShuffleSettled,
    /// Hide the notice with this sequence number, if still shown.
    ClearNotice(u32),
    /// Show the end-of-game summary.
    ShowSummary,
}

/// Something that can call back later. Browser hosts use `setTimeout`;
/// tests and the terminal bot use [`ManualScheduler`].
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer);
}

/// Queues timers and hands them back in order, ignoring delays.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: VecDeque<(Duration, Timer)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_timer(&mut self) -> Option<Timer> {
        self.pop().map(|(_, timer)| timer)
    }

    /// Next timer together with the delay it asked for.
    pub fn pop(&mut self) -> Option<(Duration, Timer)> {
        self.pending.pop_front()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration, timer: Timer) {
        self.pending.push_back((delay, timer));
    }
}

/// Fixed animation durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub tile_movement: Duration,
    pub solution_reveal: Duration,
    pub solution_pause: Duration,
    pub share_modal_delay: Duration,
    pub message_display: Duration,
    pub shake: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            tile_movement: Duration::from_millis(300),
            solution_reveal: Duration::from_millis(500),
            solution_pause: Duration::from_millis(300),
            share_modal_delay: Duration::from_millis(1000),
            message_display: Duration::from_millis(1500),
            shake: Duration::from_millis(400),
        }
    }
}
