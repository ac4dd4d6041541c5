use std::collections::HashMap;

use crate::puzzle::{Difficulty, Group, Item, Puzzle, PuzzleError};

/// Why no puzzle could be handed to the game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("no puzzle found for {0}")]
    NotFound(String),
    #[error("invalid puzzle: {0}")]
    Validation(#[from] PuzzleError),
    #[error("malformed puzzle payload: {0}")]
    Malformed(String),
    #[error("failed to reach puzzle service: {0}")]
    Transport(String),
}

/// Source of daily puzzles. Any error is fatal for the session.
pub trait PuzzleProvider {
    fn get_puzzle(&self, date: &str) -> Result<Puzzle, ProviderError>;
}

/// Serves cached JSON payloads keyed by date, the way the puzzle cache does.
#[derive(Debug, Default, Clone)]
pub struct MemoryProvider {
    payloads: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: impl Into<String>, json: impl Into<String>) {
        self.payloads.insert(date.into(), json.into());
    }
}

impl PuzzleProvider for MemoryProvider {
    fn get_puzzle(&self, date: &str) -> Result<Puzzle, ProviderError> {
        let json = self
            .payloads
            .get(date)
            .ok_or_else(|| ProviderError::NotFound(date.to_string()))?;
        let puzzle = Puzzle::from_json(json)?;
        if puzzle.id() != date {
            return Err(PuzzleError::WrongDate {
                requested: date.to_string(),
                found: puzzle.id().to_string(),
            }
            .into());
        }
        Ok(puzzle)
    }
}

/// Built-in puzzle used when no generated one is reachable. The display
/// order is a seeded shuffle of the date, so every player sees the same board.
pub fn fallback_puzzle(date: &str) -> Result<Puzzle, PuzzleError> {
    let group = |items: [&str; 4], name: &str, difficulty| Group {
        items: items.iter().map(|s| s.to_string()).collect(),
        name: name.to_string(),
        difficulty,
        explanation: None,
    };
    let groups = vec![
        group(["🐶", "🐱", "🐰", "🐹"], "Pets", Difficulty::Easy),
        group(["🍎", "🍌", "🍇", "🍊"], "Fruits", Difficulty::Medium),
        group(["⚽", "🏀", "🎾", "⚾"], "Sports Balls", Difficulty::Hard),
        group(["🌞", "🌙", "⭐", "☁"], "Sky Objects", Difficulty::Tricky),
    ];
    let items: Vec<Item> = groups.iter().flat_map(|g| g.items.clone()).collect();
    let items = seeded_shuffle(items, date);
    Puzzle::new(date, format!("{date}T00:00:00Z"), groups, items)
}

/// Deterministic Fisher-Yates driven by a linear congruential generator
/// seeded from the sum of the seed's character codes.
pub fn seeded_shuffle<T>(mut values: Vec<T>, seed: &str) -> Vec<T> {
    let mut state: u64 = seed.chars().map(|c| c as u64).sum();
    for i in (1..values.len()).rev() {
        state = (state * 1_664_525 + 1_013_904_223) % 4_294_967_296;
        let j = (state % (i as u64 + 1)) as usize;
        values.swap(i, j);
    }
    values
}
