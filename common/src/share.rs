use itertools::Itertools;

use crate::puzzle::{Item, Puzzle};

/// Marker for a guessed item that belongs to no group.
const UNKNOWN_MARKER: &str = "⬜";

/// Somewhere to put the share text, typically the system clipboard.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> anyhow::Result<()>;
}

/// Renders the guesses as rows of difficulty-colored squares, headed by the
/// puzzle number. Items in each row follow the board's display order so the
/// grid never leaks which tile was picked first.
pub fn share_text(puzzle: &Puzzle, guesses: &[Vec<Item>]) -> String {
    let position = |item: &Item| {
        puzzle
            .items()
            .iter()
            .position(|i| i == item)
            .unwrap_or(usize::MAX)
    };

    let rows = guesses
        .iter()
        .map(|guess| {
            guess
                .iter()
                .sorted_by_key(|item| position(item))
                .map(|item| {
                    puzzle
                        .group_of(item)
                        .map_or(UNKNOWN_MARKER, |g| g.difficulty.marker())
                })
                .join("")
        })
        .join("\n");

    format!("Emoji Connections #{}\n\n{}", puzzle.number(), rows)
}

/// Copies the share text, reporting whether it landed.
pub fn copy_to(clipboard: &mut impl Clipboard, text: &str) -> bool {
    match clipboard.write_text(text) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to copy share text: {e:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::tests::sample_puzzle;

    fn guess(items: [&str; 4]) -> Vec<Item> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_share_text_grid() {
        let puzzle = sample_puzzle();
        let guesses = vec![
            guess(["🐹", "🐶", "🐰", "🐱"]),
            guess(["⭐", "🐶", "🍎", "⚽"]),
        ];
        // Display order of the sample puzzle is 🐶 🍎 ⚽ 🌞 🐱 🍌 🏀 🌙 ...
        assert_eq!(
            share_text(&puzzle, &guesses),
            "Emoji Connections #46\n\n🟨🟨🟨🟨\n🟨🟩🟦🟪"
        );
    }

    #[test]
    fn test_unknown_items_get_default_marker() {
        let puzzle = sample_puzzle();
        let guesses = vec![guess(["🐶", "🍎", "⚽", "🦄"])];
        assert!(share_text(&puzzle, &guesses).ends_with("🟨🟩🟦⬜"));
    }

    #[test]
    fn test_share_text_without_guesses() {
        let puzzle = sample_puzzle();
        assert_eq!(share_text(&puzzle, &[]), "Emoji Connections #46\n\n");
    }

    struct Recorder(Option<String>);

    impl Clipboard for Recorder {
        fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
            match self.0 {
                Some(_) => anyhow::bail!("clipboard busy"),
                None => {
                    self.0 = Some(text.to_string());
                    Ok(())
                }
            }
        }
    }

    #[test]
    fn test_copy_reports_outcome() {
        let mut clipboard = Recorder(None);
        assert!(copy_to(&mut clipboard, "first"));
        assert_eq!(clipboard.0.as_deref(), Some("first"));
        assert!(!copy_to(&mut clipboard, "second"));
    }
}
