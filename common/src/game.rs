use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::layout::{TilePosition, arrange, initial_tiles, shuffle_unsolved};
use crate::puzzle::{Difficulty, GROUP_COUNT, GROUP_SIZE, Group, Item, Puzzle, guess_key};
use crate::schedule::{ManualScheduler, Scheduler, Timer, Timings};
use crate::share::{self, Clipboard};
use crate::storage::{BlobStore, Persistence, Snapshot};

/// Wrong guesses allowed before the game is lost.
pub const MAX_ATTEMPTS: u8 = 4;

/// The mutable part of a game that survives reloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub selected: Vec<Item>,
    pub remaining_attempts: u8,
    pub is_over: bool,
    pub guess_history: Vec<Vec<Item>>,
    pub rejected_guesses: BTreeSet<String>,
    /// Groups the player had found when the last attempt was spent.
    pub groups_found_at_loss: Option<usize>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            selected: Vec::new(),
            remaining_attempts: MAX_ATTEMPTS,
            is_over: false,
            guess_history: Vec::new(),
            rejected_guesses: BTreeSet::new(),
            groups_found_at_loss: None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Represents the current phase of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Playing,
    /// Out of attempts; the remaining groups are being shown one by one.
    Revealing,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Won,
    Lost { groups_found: usize },
}

/// Short-lived message shown over the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Notice {
    OneAway,
    AlreadyGuessed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::OneAway => f.write_str("One away!"),
            Notice::AlreadyGuessed => f.write_str("Already guessed"),
        }
    }
}

/// What became of a submitted guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to judge: wrong selection size, busy, or game over.
    Ignored,
    AlreadyGuessed,
    Correct(Difficulty),
    /// Matched a group that is already on the board.
    Stale,
    Incorrect { one_away: bool },
}

/// The labeled strip expanding over a freshly solved row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Band {
    pub group: Group,
    pub row: usize,
}

/// A group on its way to the top rows.
#[derive(Debug, Clone)]
struct Reveal {
    group: Group,
    /// The player's guess, or `None` when shown after a loss.
    guess: Option<Vec<Item>>,
    row: usize,
}

/// The board engine for one loaded puzzle.
///
/// Intents (`toggle_select`, `submit`, `shuffle`, `deselect_all`) are handled
/// to completion. Animation steps are requested from the scheduler and
/// continue in [`Game::on_timer`]; while one is in flight, intents are ignored.
pub struct Game<S, B> {
    puzzle: Puzzle,
    session: Session,
    solved: Vec<Group>,
    tiles: Vec<TilePosition>,
    status: Status,
    reveal: Option<Reveal>,
    reveal_queue: VecDeque<Group>,
    band: Option<Band>,
    notice: Option<(u32, Notice)>,
    notice_seq: u32,
    summary_visible: bool,
    timings: Timings,
    scheduler: S,
    persistence: Persistence<B>,
}

impl<S: Scheduler, B: BlobStore> Game<S, B> {
    /// Starts the puzzle, resuming the saved game for it if there is one.
    pub fn new(puzzle: Puzzle, scheduler: S, persistence: Persistence<B>) -> Self {
        Self::with_timings(puzzle, scheduler, persistence, Timings::default())
    }

    pub fn with_timings(
        puzzle: Puzzle,
        scheduler: S,
        persistence: Persistence<B>,
        timings: Timings,
    ) -> Self {
        let restored = persistence
            .load(puzzle.id())
            .and_then(|snapshot| restore(&puzzle, snapshot));

        let (session, solved, tiles) = match restored {
            Some(restored) => {
                log::debug!("resuming saved game for {}", puzzle.id());
                restored
            }
            None => (Session::new(), Vec::new(), initial_tiles(puzzle.items())),
        };

        let mut game = Game {
            puzzle,
            session,
            solved,
            tiles,
            status: Status::Playing,
            reveal: None,
            reveal_queue: VecDeque::new(),
            band: None,
            notice: None,
            notice_seq: 0,
            summary_visible: false,
            timings,
            scheduler,
            persistence,
        };

        if game.solved.len() == GROUP_COUNT {
            game.status = match game.session.groups_found_at_loss {
                Some(_) => Status::Lost,
                None => Status::Won,
            };
            game.scheduler
                .schedule(game.timings.share_modal_delay, Timer::ShowSummary);
        } else if game.session.is_over {
            // Reloaded in the middle of the loss reveal.
            game.begin_loss();
        }

        game.persist();
        game
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn tiles(&self) -> &[TilePosition] {
        &self.tiles
    }

    pub fn selected(&self) -> &[Item] {
        &self.session.selected
    }

    pub fn remaining_attempts(&self) -> u8 {
        self.session.remaining_attempts
    }

    /// Groups in the order they reached the board.
    pub fn solved_groups(&self) -> &[Group] {
        &self.solved
    }

    pub fn guess_history(&self) -> &[Vec<Item>] {
        &self.session.guess_history
    }

    pub fn is_over(&self) -> bool {
        self.session.is_over
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.status {
            Status::Playing => None,
            Status::Won => Some(Outcome::Won),
            Status::Revealing | Status::Lost => Some(Outcome::Lost {
                groups_found: self.session.groups_found_at_loss.unwrap_or_default(),
            }),
        }
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.map(|(_, notice)| notice)
    }

    pub fn band(&self) -> Option<&Band> {
        self.band.as_ref()
    }

    /// True while tiles are moving toward a solved row or the loss reveal runs.
    pub fn is_busy(&self) -> bool {
        self.reveal.is_some() || self.status == Status::Revealing
    }

    pub fn summary_visible(&self) -> bool {
        self.summary_visible
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn persistence(&self) -> &Persistence<B> {
        &self.persistence
    }

    /// Selects or deselects a tile. Returns whether the selection changed.
    pub fn toggle_select(&mut self, item: &str) -> bool {
        if !self.accepts_input()
            || self.puzzle.group_of(item).is_none()
            || self.is_solved_item(item)
        {
            return false;
        }

        if let Some(index) = self.session.selected.iter().position(|s| s == item) {
            self.session.selected.remove(index);
        } else if self.session.selected.len() >= GROUP_SIZE {
            return false;
        } else {
            self.session.selected.push(item.to_string());
        }

        self.sync_selection();
        self.persist();
        true
    }

    pub fn deselect_all(&mut self) {
        if !self.accepts_input() || self.session.selected.is_empty() {
            return;
        }
        self.session.selected.clear();
        self.sync_selection();
        self.persist();
    }

    /// Judges the four selected tiles.
    pub fn submit(&mut self) -> Verdict {
        if !self.accepts_input() || self.session.selected.len() != GROUP_SIZE {
            return Verdict::Ignored;
        }

        let guess = std::mem::take(&mut self.session.selected);
        self.sync_selection();

        let key = guess_key(&guess);
        if self.session.rejected_guesses.contains(&key) {
            self.show_notice(Notice::AlreadyGuessed);
            self.persist();
            return Verdict::AlreadyGuessed;
        }

        let matching = self
            .puzzle
            .groups()
            .iter()
            .find(|g| g.matches(&guess))
            .cloned();

        if let Some(group) = matching {
            if self.is_solved(&group) {
                self.persist();
                return Verdict::Stale;
            }
            log::debug!("solved '{}'", group.name);
            let difficulty = group.difficulty;
            self.begin_reveal(group, Some(guess));
            return Verdict::Correct(difficulty);
        }

        let one_away = self
            .puzzle
            .groups()
            .iter()
            .filter(|g| !self.is_solved(g))
            .any(|g| g.overlap(&guess) == GROUP_SIZE - 1);

        self.session.guess_history.push(guess);
        self.session.rejected_guesses.insert(key);
        self.session.remaining_attempts = self.session.remaining_attempts.saturating_sub(1);
        if one_away {
            self.show_notice(Notice::OneAway);
        }
        if self.session.remaining_attempts == 0 {
            self.begin_loss();
        }

        self.persist();
        Verdict::Incorrect { one_away }
    }

    /// Shuffles the unsolved tiles with a fresh, unseeded random source.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    pub fn shuffle_with<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.accepts_input() {
            return;
        }
        self.tiles = shuffle_unsolved(&self.tiles, &self.solved, rng);
        self.scheduler
            .schedule(self.timings.tile_movement, Timer::ShuffleSettled);
        self.persist();
    }

    pub fn share_text(&self) -> String {
        share::share_text(&self.puzzle, &self.session.guess_history)
    }

    /// Copies the share text. `false` lets the caller offer a manual copy.
    pub fn share(&self, clipboard: &mut impl Clipboard) -> bool {
        share::copy_to(clipboard, &self.share_text())
    }

    pub fn show_summary(&mut self) {
        if matches!(self.status, Status::Won | Status::Lost) {
            self.summary_visible = true;
        }
    }

    pub fn dismiss_summary(&mut self) {
        self.summary_visible = false;
    }

    /// Continues whatever step scheduled `timer`.
    pub fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::Settle => {
                if let Some(reveal) = &self.reveal {
                    self.band = Some(Band {
                        group: reveal.group.clone(),
                        row: reveal.row,
                    });
                    self.scheduler
                        .schedule(self.timings.solution_reveal, Timer::Commit);
                }
            }
            Timer::Commit => self.commit_reveal(),
            Timer::NextReveal => {
                if self.status == Status::Revealing && self.reveal.is_none() {
                    match self.reveal_queue.pop_front() {
                        Some(group) => self.begin_reveal(group, None),
                        None => self.finish_loss(),
                    }
                }
            }
            Timer::ShuffleSettled => {
                if self.reveal.is_none() {
                    for tile in &mut self.tiles {
                        tile.is_animating = false;
                    }
                }
            }
            Timer::ClearNotice(seq) => {
                if matches!(self.notice, Some((current, _)) if current == seq) {
                    self.notice = None;
                }
            }
            Timer::ShowSummary => self.summary_visible = true,
        }
    }

    fn accepts_input(&self) -> bool {
        self.status == Status::Playing && !self.session.is_over && self.reveal.is_none()
    }

    fn is_solved(&self, group: &Group) -> bool {
        self.solved.iter().any(|g| g.name == group.name)
    }

    fn is_solved_item(&self, item: &str) -> bool {
        self.solved.iter().any(|g| g.contains(item))
    }

    fn sync_selection(&mut self) {
        for tile in &mut self.tiles {
            tile.is_selected = self.session.selected.contains(&tile.item);
        }
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notice_seq = self.notice_seq.wrapping_add(1);
        self.notice = Some((self.notice_seq, notice));
        self.scheduler.schedule(
            self.timings.message_display,
            Timer::ClearNotice(self.notice_seq),
        );
    }

    /// Move phase: send the group's tiles to the next free row.
    fn begin_reveal(&mut self, group: Group, guess: Option<Vec<Item>>) {
        let in_flight = guess.clone().unwrap_or_else(|| group.items.clone());
        let row = self.solved.len();
        self.tiles = arrange(&self.tiles, &self.solved, &in_flight);
        self.reveal = Some(Reveal { group, guess, row });
        self.scheduler
            .schedule(self.timings.tile_movement, Timer::Settle);
    }

    /// Commit phase: the band is fully open, so the group joins the board.
    fn commit_reveal(&mut self) {
        let Some(reveal) = self.reveal.take() else {
            return;
        };
        self.band = None;
        self.solved.push(reveal.group);
        if let Some(guess) = reveal.guess {
            self.session.guess_history.push(guess);
        }
        self.tiles = arrange(&self.tiles, &self.solved, &[]);

        if self.status == Status::Revealing {
            if self.reveal_queue.is_empty() {
                self.finish_loss();
            } else {
                self.scheduler
                    .schedule(self.timings.solution_pause, Timer::NextReveal);
            }
        } else if self.solved.len() == GROUP_COUNT {
            log::debug!("puzzle {} won", self.puzzle.id());
            self.status = Status::Won;
            self.session.is_over = true;
            self.scheduler
                .schedule(self.timings.share_modal_delay, Timer::ShowSummary);
        }

        self.persist();
    }

    /// Out of attempts: lock the board and queue the hidden groups, easiest first.
    fn begin_loss(&mut self) {
        log::debug!("puzzle {} lost, revealing remaining groups", self.puzzle.id());
        self.status = Status::Revealing;
        self.session.is_over = true;
        self.session.selected.clear();
        self.sync_selection();
        if self.session.groups_found_at_loss.is_none() {
            self.session.groups_found_at_loss = Some(self.solved.len());
        }

        let mut hidden: Vec<Group> = self
            .puzzle
            .groups()
            .iter()
            .filter(|g| !self.is_solved(g))
            .cloned()
            .collect();
        hidden.sort_by_key(|g| g.difficulty);
        self.reveal_queue = hidden.into();

        self.scheduler.schedule(
            self.timings.shake + self.timings.solution_pause,
            Timer::NextReveal,
        );
    }

    fn finish_loss(&mut self) {
        self.status = Status::Lost;
        self.scheduler
            .schedule(self.timings.share_modal_delay, Timer::ShowSummary);
    }

    fn persist(&mut self) {
        self.persistence
            .save(self.puzzle.id(), &self.session, &self.solved, &self.tiles);
    }
}

impl<B: BlobStore> Game<ManualScheduler, B> {
    /// Fires every queued timer, including ones queued along the way.
    pub fn run_timers(&mut self) {
        while let Some(timer) = self.scheduler.next_timer() {
            self.on_timer(timer);
        }
    }
}

/// Checks a snapshot against the puzzle and rebuilds a settled board from it.
fn restore(puzzle: &Puzzle, snapshot: Snapshot) -> Option<(Session, Vec<Group>, Vec<TilePosition>)> {
    let mut names = HashSet::new();
    for group in &snapshot.solved_groups {
        if puzzle.group_named(&group.name) != Some(group) || !names.insert(group.name.as_str()) {
            log::warn!("saved game does not match puzzle {}", puzzle.id());
            return None;
        }
    }

    let expected: HashSet<&str> = puzzle.items().iter().map(String::as_str).collect();
    let found: HashSet<&str> = snapshot.tiles.iter().map(|t| t.item.as_str()).collect();
    if snapshot.tiles.len() != puzzle.items().len() || found != expected {
        log::warn!("saved tiles do not match puzzle {}", puzzle.id());
        return None;
    }

    let solved = snapshot.solved_groups;
    let mut session = Session::from(snapshot.session);
    if session.remaining_attempts > MAX_ATTEMPTS {
        return None;
    }
    session.is_over = session.remaining_attempts == 0 || solved.len() == GROUP_COUNT;

    let mut kept = Vec::new();
    for item in session.selected.drain(..) {
        let free = !solved.iter().any(|g| g.contains(&item));
        if free && expected.contains(item.as_str()) && !kept.contains(&item) {
            kept.push(item);
        }
    }
    kept.truncate(GROUP_SIZE);
    if session.is_over {
        kept.clear();
    }
    session.selected = kept;

    let tiles = arrange(&snapshot.tiles, &solved, &[])
        .into_iter()
        .map(|mut tile| {
            tile.is_animating = false;
            tile.is_selected = session.selected.contains(&tile.item);
            tile
        })
        .collect();

    Some((session, solved, tiles))
}
