//! The hidden-target board: random target placement, guess resolution, and
//! open-cell queries used for hints.
//!
//! The board is stateless with respect to turns. Whether a guess is a repeat
//! is a session-level question, so [`Board::resolve_guess`] does not check for
//! repeats; callers consult the session's guessed-cell set first.

use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};

pub use self::cell::{Cell, Neighbors, ParseCellError};

mod cell;

/// Result of resolving a single guess against the hidden target set.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GuessResult {
    /// The guessed cell held a target. The target is now removed.
    Hit,
    /// The guessed cell was open water.
    Miss,
}

/// A single game's worth of hidden targets on the 10x10 grid.
#[derive(Debug, Clone)]
pub struct Board {
    /// Targets not yet hit. Shrinks monotonically as guesses land.
    targets: HashSet<Cell>,
}

impl Board {
    /// Create a board with `count` distinct targets chosen uniformly at random
    /// from the 100-cell grid. Counts larger than the grid are clamped.
    pub fn with_random_targets(rng: &mut impl Rng, count: usize) -> Self {
        let all: Vec<Cell> = Cell::all().collect();
        let count = count.min(all.len());
        let targets = all.choose_multiple(rng, count).copied().collect();
        Self { targets }
    }

    /// Number of targets that have not been hit yet.
    pub fn targets_remaining(&self) -> usize {
        self.targets.len()
    }

    /// True once every target has been hit.
    pub fn is_cleared(&self) -> bool {
        self.targets.is_empty()
    }

    /// The cells still holding targets. Exposed for board overlays and tests;
    /// the dispatcher never reveals these to players.
    pub fn targets(&self) -> &HashSet<Cell> {
        &self.targets
    }

    /// Resolve a guess: remove the cell from the target set if present and
    /// report [`GuessResult::Hit`], otherwise report [`GuessResult::Miss`].
    pub fn resolve_guess(&mut self, cell: Cell) -> GuessResult {
        if self.targets.remove(&cell) {
            GuessResult::Hit
        } else {
            GuessResult::Miss
        }
    }

    /// Up to 4 orthogonally adjacent in-bounds cells of `cell` that are not in
    /// `exclude`. Used to suggest alternatives after a repeat guess.
    pub fn open_neighbors(cell: Cell, exclude: &HashSet<Cell>) -> Vec<Cell> {
        cell.neighbors().filter(|n| !exclude.contains(n)).collect()
    }

    /// Up to `n` cells chosen at random from the complement of `exclude`.
    /// Used by the intel hint.
    pub fn random_open_cells(rng: &mut impl Rng, exclude: &HashSet<Cell>, n: usize) -> Vec<Cell> {
        let open: Vec<Cell> = Cell::all().filter(|c| !exclude.contains(c)).collect();
        open.choose_multiple(rng, n).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn places_requested_number_of_distinct_targets() {
        let board = Board::with_random_targets(&mut rng(), 5);
        assert_eq!(board.targets_remaining(), 5);
    }

    #[test]
    fn clamps_target_count_to_grid_size() {
        let board = Board::with_random_targets(&mut rng(), 500);
        assert_eq!(board.targets_remaining(), 100);
    }

    #[test]
    fn hit_removes_the_target() {
        let mut board = Board::with_random_targets(&mut rng(), 3);
        let target = *board.targets().iter().next().unwrap();
        assert_eq!(board.resolve_guess(target), GuessResult::Hit);
        assert_eq!(board.targets_remaining(), 2);
        // The same cell is open water on a second resolution.
        assert_eq!(board.resolve_guess(target), GuessResult::Miss);
    }

    #[test]
    fn miss_leaves_targets_untouched() {
        let mut board = Board::with_random_targets(&mut rng(), 3);
        let open = Cell::all().find(|c| !board.targets().contains(c)).unwrap();
        assert_eq!(board.resolve_guess(open), GuessResult::Miss);
        assert_eq!(board.targets_remaining(), 3);
    }

    #[test]
    fn open_neighbors_excludes_guessed_cells() {
        let center: Cell = "E5".parse().unwrap();
        let mut guessed = HashSet::new();
        assert_eq!(Board::open_neighbors(center, &guessed).len(), 4);

        guessed.insert("D5".parse().unwrap());
        guessed.insert("E4".parse().unwrap());
        let open = Board::open_neighbors(center, &guessed);
        assert_eq!(open.len(), 2);
        assert!(open.contains(&"F5".parse().unwrap()));
        assert!(open.contains(&"E6".parse().unwrap()));
    }

    #[test]
    fn random_open_cells_avoids_excluded_and_caps_count() {
        let mut exclude = HashSet::new();
        // Exclude all but three cells.
        for cell in Cell::all().skip(3) {
            exclude.insert(cell);
        }
        let open = Board::random_open_cells(&mut rng(), &exclude, 5);
        assert_eq!(open.len(), 3);
        for cell in &open {
            assert!(!exclude.contains(cell));
        }
    }
}
