use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::puzzle::{Group, Item};

/// Tiles per row.
pub const GRID_WIDTH: usize = 4;

/// Where a single item currently sits on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePosition {
    pub item: Item,
    pub row: usize,
    pub col: usize,
    pub is_selected: bool,
    pub is_animating: bool,
}

impl TilePosition {
    fn placed(&self, row: usize, col: usize, is_animating: bool) -> Self {
        TilePosition {
            item: self.item.clone(),
            row,
            col,
            is_selected: self.is_selected,
            is_animating,
        }
    }
}

/// Lays items out row-major in display order.
pub fn initial_tiles(items: &[Item]) -> Vec<TilePosition> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| TilePosition {
            item: item.clone(),
            row: i / GRID_WIDTH,
            col: i % GRID_WIDTH,
            is_selected: false,
            is_animating: false,
        })
        .collect()
}

/// Computes the board after `solved` groups have taken the top rows and
/// `in_flight` items are heading for the next one.
///
/// Solved tiles take their group's item order, in-flight tiles the order
/// given, and everything else reflows below in its previous reading order.
/// Pure: equal inputs give equal output.
pub fn arrange(tiles: &[TilePosition], solved: &[Group], in_flight: &[Item]) -> Vec<TilePosition> {
    let mut arranged = Vec::with_capacity(tiles.len());

    for (row, group) in solved.iter().enumerate() {
        for (col, item) in group.items.iter().enumerate() {
            if let Some(tile) = tiles.iter().find(|t| &t.item == item) {
                arranged.push(tile.placed(row, col, false));
            }
        }
    }

    let flight_row = solved.len();
    for (col, item) in in_flight.iter().enumerate() {
        if let Some(tile) = tiles.iter().find(|t| &t.item == item) {
            arranged.push(tile.placed(flight_row, col, true));
        }
    }

    let first_free_row = flight_row + usize::from(!in_flight.is_empty());
    let mut remaining: Vec<&TilePosition> = tiles
        .iter()
        .filter(|t| !in_flight.contains(&t.item) && !solved.iter().any(|g| g.contains(&t.item)))
        .collect();
    remaining.sort_by_key(|t| (t.row, t.col));

    for (i, tile) in remaining.into_iter().enumerate() {
        let row = first_free_row + i / GRID_WIDTH;
        let col = i % GRID_WIDTH;
        let moved = tile.row != row || tile.col != col;
        arranged.push(tile.placed(row, col, moved));
    }

    arranged
}

/// Randomly reassigns the positions of every tile below the solved rows.
/// Solved tiles keep their place.
pub fn shuffle_unsolved<R: Rng + ?Sized>(
    tiles: &[TilePosition],
    solved: &[Group],
    rng: &mut R,
) -> Vec<TilePosition> {
    let (mut fixed, mut loose): (Vec<TilePosition>, Vec<TilePosition>) = tiles
        .iter()
        .cloned()
        .partition(|t| solved.iter().any(|g| g.contains(&t.item)));

    loose.shuffle(rng);
    let start = solved.len();
    for (i, tile) in loose.iter_mut().enumerate() {
        tile.row = start + i / GRID_WIDTH;
        tile.col = i % GRID_WIDTH;
        tile.is_animating = true;
    }
    for tile in &mut fixed {
        tile.is_animating = false;
    }

    fixed.extend(loose);
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::tests::sample_puzzle;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn position_of<'a>(tiles: &'a [TilePosition], item: &str) -> &'a TilePosition {
        tiles.iter().find(|t| t.item == item).unwrap()
    }

    #[test]
    fn test_initial_tiles_row_major() {
        let puzzle = sample_puzzle();
        let tiles = initial_tiles(puzzle.items());
        assert_eq!(tiles.len(), 16);
        assert_eq!((tiles[5].row, tiles[5].col), (1, 1));
        assert_eq!((tiles[15].row, tiles[15].col), (3, 3));
        assert!(tiles.iter().all(|t| !t.is_selected && !t.is_animating));
    }

    #[test]
    fn test_arrange_without_groups_keeps_grid() {
        let puzzle = sample_puzzle();
        let tiles = initial_tiles(puzzle.items());
        assert_eq!(arrange(&tiles, &[], &[]), tiles);
    }

    #[test]
    fn test_arrange_places_solved_and_in_flight_rows() {
        let puzzle = sample_puzzle();
        let tiles = initial_tiles(puzzle.items());
        let solved = vec![puzzle.groups()[2].clone()];
        let in_flight: Vec<Item> = puzzle.groups()[0].items.iter().rev().cloned().collect();

        let arranged = arrange(&tiles, &solved, &in_flight);
        assert_eq!(arranged.len(), 16);

        for (col, item) in solved[0].items.iter().enumerate() {
            let tile = position_of(&arranged, item);
            assert_eq!((tile.row, tile.col), (0, col));
            assert!(!tile.is_animating);
        }
        for (col, item) in in_flight.iter().enumerate() {
            let tile = position_of(&arranged, item);
            assert_eq!((tile.row, tile.col), (1, col));
            assert!(tile.is_animating);
        }
        let rest: Vec<&TilePosition> = arranged.iter().filter(|t| t.row >= 2).collect();
        assert_eq!(rest.len(), 8);
        assert!(rest.iter().all(|t| t.row < 4 && t.col < GRID_WIDTH));
    }

    #[test]
    fn test_arrange_reflow_is_stable() {
        let puzzle = sample_puzzle();
        let tiles = initial_tiles(puzzle.items());
        let solved = vec![puzzle.groups()[0].clone()];

        let arranged = arrange(&tiles, &solved, &[]);
        let reading_order: Vec<&Item> = tiles
            .iter()
            .filter(|t| !solved[0].contains(&t.item))
            .map(|t| &t.item)
            .collect();
        let mut reflowed: Vec<&TilePosition> = arranged.iter().filter(|t| t.row >= 1).collect();
        reflowed.sort_by_key(|t| (t.row, t.col));
        let reflowed: Vec<&Item> = reflowed.iter().map(|t| &t.item).collect();
        assert_eq!(reflowed, reading_order);
    }

    #[test]
    fn test_arrange_is_deterministic() {
        let puzzle = sample_puzzle();
        let tiles = initial_tiles(puzzle.items());
        let solved = vec![puzzle.groups()[1].clone(), puzzle.groups()[3].clone()];
        let in_flight = puzzle.groups()[0].items.clone();
        assert_eq!(
            arrange(&tiles, &solved, &in_flight),
            arrange(&tiles, &solved, &in_flight)
        );
    }

    #[test]
    fn test_shuffle_leaves_solved_rows() {
        let puzzle = sample_puzzle();
        let solved = vec![puzzle.groups()[3].clone()];
        let tiles = arrange(&initial_tiles(puzzle.items()), &solved, &[]);
        let mut rng = StdRng::seed_from_u64(7);

        let shuffled = shuffle_unsolved(&tiles, &solved, &mut rng);
        assert_eq!(shuffled.len(), 16);
        for item in &solved[0].items {
            assert_eq!(position_of(&shuffled, item), position_of(&tiles, item));
        }

        let mut cells: Vec<(usize, usize)> = shuffled
            .iter()
            .filter(|t| t.row >= 1)
            .map(|t| (t.row, t.col))
            .collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 12);
    }
}
