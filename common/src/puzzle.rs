use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::calendar;

/// A single emoji on the board. Treated as an opaque token, compared by value.
pub type Item = String;

/// Number of groups in every puzzle.
pub const GROUP_COUNT: usize = 4;
/// Number of items in every group.
pub const GROUP_SIZE: usize = 4;

/// How hard a group is meant to be. Serialized as its integer value (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy = 1,
    Medium = 2,
    Hard = 3,
    Tricky = 4,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Tricky,
    ];

    /// The colored square used for this difficulty in share text.
    pub fn marker(self) -> &'static str {
        match self {
            Difficulty::Easy => "🟨",
            Difficulty::Medium => "🟩",
            Difficulty::Hard => "🟦",
            Difficulty::Tricky => "🟪",
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = PuzzleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            4 => Ok(Difficulty::Tricky),
            other => Err(PuzzleError::InvalidDifficulty(other)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value as u8
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Four items sharing a connection, plus its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "emojis")]
    pub items: Vec<Item>,
    pub name: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Group {
    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// Set equality against a guess; order does not matter.
    pub fn matches(&self, guess: &[Item]) -> bool {
        guess.len() == self.items.len() && guess.iter().all(|item| self.contains(item))
    }

    /// How many of the guessed items belong to this group.
    pub fn overlap(&self, guess: &[Item]) -> usize {
        guess.iter().filter(|item| self.contains(item)).count()
    }
}

/// Reasons a puzzle candidate is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleError {
    #[error("expected 4 groups, found {0}")]
    GroupCount(usize),
    #[error("group '{name}' has {len} items, expected 4")]
    GroupSize { name: String, len: usize },
    #[error("item {0} appears more than once")]
    DuplicateItem(Item),
    #[error("difficulty {0} is not in 1..=4")]
    InvalidDifficulty(u8),
    #[error("difficulty {0} must appear on exactly one group")]
    DifficultyNotUnique(Difficulty),
    #[error("display items do not match the grouped items")]
    ItemsMismatch,
    #[error("puzzle id '{0}' is not a YYYY-MM-DD date")]
    InvalidId(String),
    #[error("payload is for {found}, requested {requested}")]
    WrongDate { requested: String, found: String },
}

/// The JSON shape produced by the puzzle generator and cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPuzzle {
    pub id: String,
    #[serde(default)]
    pub generated: String,
    pub solutions: Vec<Group>,
    pub emojis: Vec<Item>,
}

/// One day's puzzle. Only constructible through validation, and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPuzzle", into = "RawPuzzle")]
pub struct Puzzle {
    id: String,
    created_at: String,
    groups: Vec<Group>,
    items: Vec<Item>,
}

impl Puzzle {
    pub fn new(
        id: impl Into<String>,
        created_at: impl Into<String>,
        groups: Vec<Group>,
        items: Vec<Item>,
    ) -> Result<Self, PuzzleError> {
        let id = id.into();
        if calendar::parse_date(&id).is_none() {
            return Err(PuzzleError::InvalidId(id));
        }
        validate_groups(&groups)?;

        let grouped: HashSet<&str> = groups
            .iter()
            .flat_map(|g| g.items.iter().map(String::as_str))
            .collect();
        let displayed: HashSet<&str> = items.iter().map(String::as_str).collect();
        if items.len() != GROUP_COUNT * GROUP_SIZE || displayed != grouped {
            return Err(PuzzleError::ItemsMismatch);
        }

        Ok(Puzzle {
            id,
            created_at: created_at.into(),
            groups,
            items,
        })
    }

    /// Parses a provider payload. This is the only place JSON becomes a `Puzzle`.
    pub fn from_json(json: &str) -> Result<Self, crate::ProviderError> {
        let raw: RawPuzzle = serde_json::from_str(json)
            .map_err(|e| crate::ProviderError::Malformed(e.to_string()))?;
        Ok(Puzzle::try_from(raw)?)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// All sixteen items in display order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn group_of(&self, item: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.contains(item))
    }

    pub fn group_named(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// The puzzle's sequence number, counted in days from launch.
    pub fn number(&self) -> i64 {
        // The id was checked in `new`.
        calendar::puzzle_number(&self.id).unwrap_or_default()
    }
}

impl TryFrom<RawPuzzle> for Puzzle {
    type Error = PuzzleError;

    fn try_from(raw: RawPuzzle) -> Result<Self, Self::Error> {
        Puzzle::new(raw.id, raw.generated, raw.solutions, raw.emojis)
    }
}

impl From<Puzzle> for RawPuzzle {
    fn from(puzzle: Puzzle) -> Self {
        RawPuzzle {
            id: puzzle.id,
            generated: puzzle.created_at,
            solutions: puzzle.groups,
            emojis: puzzle.items,
        }
    }
}

fn validate_groups(groups: &[Group]) -> Result<(), PuzzleError> {
    if groups.len() != GROUP_COUNT {
        return Err(PuzzleError::GroupCount(groups.len()));
    }
    if let Some(group) = groups.iter().find(|g| g.items.len() != GROUP_SIZE) {
        return Err(PuzzleError::GroupSize {
            name: group.name.clone(),
            len: group.items.len(),
        });
    }

    let mut seen = HashSet::new();
    for item in groups.iter().flat_map(|g| &g.items) {
        if !seen.insert(item.as_str()) {
            return Err(PuzzleError::DuplicateItem(item.clone()));
        }
    }

    let counts = groups.iter().map(|g| g.difficulty).counts();
    for difficulty in Difficulty::ALL {
        if counts.get(&difficulty) != Some(&1) {
            return Err(PuzzleError::DifficultyNotUnique(difficulty));
        }
    }
    Ok(())
}

/// Order-independent fingerprint of a guess, used to spot repeated wrong guesses.
pub fn guess_key(guess: &[Item]) -> String {
    guess.iter().sorted().join(",")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn group(items: [&str; 4], name: &str, difficulty: Difficulty) -> Group {
        Group {
            items: items.iter().map(|s| s.to_string()).collect(),
            name: name.to_string(),
            difficulty,
            explanation: None,
        }
    }

    pub(crate) fn sample_groups() -> Vec<Group> {
        vec![
            group(["🐶", "🐱", "🐰", "🐹"], "Pets", Difficulty::Easy),
            group(["🍎", "🍌", "🍇", "🍊"], "Fruits", Difficulty::Medium),
            group(["⚽", "🏀", "🎾", "⚾"], "Sports Balls", Difficulty::Hard),
            group(["🌞", "🌙", "⭐", "☁"], "Sky Objects", Difficulty::Tricky),
        ]
    }

    /// Display order deliberately interleaves groups.
    pub(crate) fn sample_puzzle() -> Puzzle {
        let groups = sample_groups();
        let items = (0..GROUP_SIZE)
            .flat_map(|i| groups.iter().map(move |g| g.items[i].clone()))
            .collect();
        Puzzle::new("2024-01-15", "2024-01-15T00:00:00Z", groups, items).unwrap()
    }

    #[test]
    fn test_valid_puzzle_has_sixteen_distinct_items() {
        let puzzle = sample_puzzle();
        let all: HashSet<&Item> = puzzle.groups().iter().flat_map(|g| &g.items).collect();
        assert_eq!(all.len(), 16);
        assert_eq!(puzzle.items().len(), 16);

        let difficulties: Vec<Difficulty> =
            puzzle.groups().iter().map(|g| g.difficulty).sorted().collect();
        assert_eq!(difficulties, Difficulty::ALL.to_vec());
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let mut groups = sample_groups();
        groups[1].items[0] = "🐶".to_string();
        let items = groups.iter().flat_map(|g| g.items.clone()).collect();
        let err = Puzzle::new("2024-01-15", "", groups, items).unwrap_err();
        assert_eq!(err, PuzzleError::DuplicateItem("🐶".to_string()));
    }

    #[test]
    fn test_repeated_difficulty_rejected() {
        let mut groups = sample_groups();
        groups[3].difficulty = Difficulty::Easy;
        let items = groups.iter().flat_map(|g| g.items.clone()).collect();
        let err = Puzzle::new("2024-01-15", "", groups, items).unwrap_err();
        assert_eq!(err, PuzzleError::DifficultyNotUnique(Difficulty::Easy));
    }

    #[test]
    fn test_display_items_must_cover_groups() {
        let groups = sample_groups();
        let mut items: Vec<Item> = groups.iter().flat_map(|g| g.items.clone()).collect();
        items[0] = "🦄".to_string();
        let err = Puzzle::new("2024-01-15", "", groups, items).unwrap_err();
        assert_eq!(err, PuzzleError::ItemsMismatch);
    }

    #[test]
    fn test_non_canonical_id_rejected() {
        let groups = sample_groups();
        let items = groups.iter().flat_map(|g| g.items.clone()).collect();
        let err = Puzzle::new("2024-+1-15", "", groups, items).unwrap_err();
        assert_eq!(err, PuzzleError::InvalidId("2024-+1-15".to_string()));
    }

    #[test]
    fn test_wrong_group_count_rejected() {
        let mut groups = sample_groups();
        groups.pop();
        let items = groups.iter().flat_map(|g| g.items.clone()).collect();
        let err = Puzzle::new("2024-01-15", "", groups, items).unwrap_err();
        assert_eq!(err, PuzzleError::GroupCount(3));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "id": "2024-01-15",
            "generated": "2024-01-14T12:00:00Z",
            "solutions": [
                {"emojis": ["🐶","🐱","🐰","🐹"], "name": "Pets", "difficulty": 1, "explanation": "Animals kept at home"},
                {"emojis": ["🍎","🍌","🍇","🍊"], "name": "Fruits", "difficulty": 2},
                {"emojis": ["⚽","🏀","🎾","⚾"], "name": "Sports Balls", "difficulty": 3},
                {"emojis": ["🌞","🌙","⭐","☁"], "name": "Sky Objects", "difficulty": 4}
            ],
            "emojis": ["🐶","🍎","⚽","🌞","🐱","🍌","🏀","🌙","🐰","🍇","🎾","⭐","🐹","🍊","⚾","☁"]
        }"#;
        let puzzle = Puzzle::from_json(json).unwrap();
        assert_eq!(puzzle.id(), "2024-01-15");
        assert_eq!(puzzle.groups()[0].explanation.as_deref(), Some("Animals kept at home"));
        assert_eq!(puzzle.group_of("🏀").map(|g| g.difficulty), Some(Difficulty::Hard));
    }

    #[test]
    fn test_from_json_bad_difficulty() {
        let json = r#"{"id":"2024-01-15","solutions":[{"emojis":["a","b","c","d"],"name":"x","difficulty":7}],"emojis":[]}"#;
        assert!(matches!(
            Puzzle::from_json(json),
            Err(crate::ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn test_guess_key_is_order_independent() {
        let a: Vec<Item> = ["🐶", "🍎", "⚽", "🌞"].iter().map(|s| s.to_string()).collect();
        let b: Vec<Item> = ["🌞", "⚽", "🐶", "🍎"].iter().map(|s| s.to_string()).collect();
        assert_eq!(guess_key(&a), guess_key(&b));
    }
}
