use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::game::Session;
use crate::layout::TilePosition;
use crate::puzzle::{Group, Item};

/// The one slot holding the most recent game in a browser profile.
pub const STORAGE_KEY: &str = "emoji-connections-state";
/// Bumped whenever the snapshot layout changes; older snapshots are ignored.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Key/value blob storage, e.g. `localStorage`.
pub trait BlobStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&mut self, key: &str, value: &[u8]) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.slots.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Session state as stored: the rejected-guess set becomes an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub selected: Vec<Item>,
    pub remaining_attempts: u8,
    pub is_over: bool,
    pub guess_history: Vec<Vec<Item>>,
    pub rejected_guesses: Vec<String>,
    pub groups_found_at_loss: Option<usize>,
}

impl From<&Session> for SavedSession {
    fn from(session: &Session) -> Self {
        SavedSession {
            selected: session.selected.clone(),
            remaining_attempts: session.remaining_attempts,
            is_over: session.is_over,
            guess_history: session.guess_history.clone(),
            rejected_guesses: session.rejected_guesses.iter().cloned().collect(),
            groups_found_at_loss: session.groups_found_at_loss,
        }
    }
}

impl From<SavedSession> for Session {
    fn from(saved: SavedSession) -> Self {
        Session {
            selected: saved.selected,
            remaining_attempts: saved.remaining_attempts,
            is_over: saved.is_over,
            guess_history: saved.guess_history,
            rejected_guesses: saved.rejected_guesses.into_iter().collect::<BTreeSet<_>>(),
            groups_found_at_loss: saved.groups_found_at_loss,
        }
    }
}

/// Everything needed to put a reloaded board back exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub puzzle_id: String,
    pub session: SavedSession,
    pub solved_groups: Vec<Group>,
    pub tiles: Vec<TilePosition>,
}

impl Snapshot {
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bytes)?)
    }
}

/// Loads and saves snapshots. Never fails outward: a broken store looks
/// like an empty one and lost writes are only logged.
#[derive(Debug)]
pub struct Persistence<B> {
    store: B,
}

impl<B: BlobStore> Persistence<B> {
    pub fn new(store: B) -> Self {
        Persistence { store }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut B {
        &mut self.store
    }

    pub fn load(&self, puzzle_id: &str) -> Option<Snapshot> {
        let bytes = match self.store.get(STORAGE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("failed to read saved game: {e:#}");
                return None;
            }
        };
        let snapshot = match Snapshot::decode(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("discarding unreadable saved game: {e:#}");
                return None;
            }
        };
        if snapshot.version != SNAPSHOT_VERSION {
            log::debug!(
                "discarding saved game with version {} (current {})",
                snapshot.version,
                SNAPSHOT_VERSION
            );
            return None;
        }
        if snapshot.puzzle_id != puzzle_id {
            log::debug!("discarding saved game for {}", snapshot.puzzle_id);
            return None;
        }
        Some(snapshot)
    }

    pub fn save(
        &mut self,
        puzzle_id: &str,
        session: &Session,
        solved_groups: &[Group],
        tiles: &[TilePosition],
    ) {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            puzzle_id: puzzle_id.to_string(),
            session: session.into(),
            solved_groups: solved_groups.to_vec(),
            tiles: tiles.to_vec(),
        };
        let result = snapshot
            .encode()
            .and_then(|bytes| self.store.set(STORAGE_KEY, &bytes));
        if let Err(e) = result {
            log::warn!("failed to save game: {e:#}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::layout::initial_tiles;
    use crate::puzzle::tests::sample_puzzle;

    /// A store whose every read and write fails.
    pub(crate) struct BrokenStore;

    impl BlobStore for BrokenStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
            anyhow::bail!("storage disabled")
        }

        fn set(&mut self, _key: &str, _value: &[u8]) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }
    }

    fn played_session() -> Session {
        let mut session = Session::new();
        session.remaining_attempts = 2;
        session.selected = vec!["🐶".to_string()];
        session.guess_history = vec![
            vec!["🐶".into(), "🍎".into(), "⚽".into(), "🌞".into()],
            vec!["🐱".into(), "🍌".into(), "🏀".into(), "🌙".into()],
        ];
        session.rejected_guesses = ["⚽,🌞,🍎,🐶", "🌙,🍌,🏀,🐱"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        session
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let puzzle = sample_puzzle();
        let session = played_session();
        let solved = vec![puzzle.groups()[1].clone()];
        let tiles = initial_tiles(puzzle.items());

        let mut persistence = Persistence::new(MemoryStore::new());
        persistence.save(puzzle.id(), &session, &solved, &tiles);

        let snapshot = persistence.load(puzzle.id()).unwrap();
        assert_eq!(snapshot.solved_groups, solved);
        assert_eq!(snapshot.tiles, tiles);
        let restored = Session::from(snapshot.session);
        assert_eq!(restored.remaining_attempts, 2);
        assert_eq!(restored.rejected_guesses, session.rejected_guesses);
        assert_eq!(restored.guess_history, session.guess_history);
    }

    #[test]
    fn test_other_day_is_ignored() {
        let puzzle = sample_puzzle();
        let mut persistence = Persistence::new(MemoryStore::new());
        persistence.save(puzzle.id(), &Session::new(), &[], &[]);

        assert!(persistence.load("2024-01-16").is_none());
        assert!(persistence.load(puzzle.id()).is_some());
    }

    #[test]
    fn test_garbage_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, b"{not a snapshot").unwrap();
        let persistence = Persistence::new(store);
        assert!(persistence.load("2024-01-15").is_none());
    }

    #[test]
    fn test_version_mismatch_is_ignored() {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION + 1,
            puzzle_id: "2024-01-15".to_string(),
            session: SavedSession::from(&Session::new()),
            solved_groups: vec![],
            tiles: vec![],
        };
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, &snapshot.encode().unwrap()).unwrap();
        assert!(Persistence::new(store).load("2024-01-15").is_none());
    }

    #[test]
    fn test_broken_store_degrades_quietly() {
        let mut persistence = Persistence::new(BrokenStore);
        persistence.save("2024-01-15", &Session::new(), &[], &[]);
        assert!(persistence.load("2024-01-15").is_none());
    }
}
