//! Per-game mutable state: the roster, the hidden targets, the turn pointer,
//! and the hit ledger.
//!
//! A [`GameSession`] covers a single game from the moment registration opens
//! until the game is over. The dispatcher discards the session once it is
//! over; a fresh `start` command creates a new one with no link to the old.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::warn;

use crate::board::{Board, Cell, GuessResult};

/// Lifecycle of a [`GameSession`].
///
/// There is no idle variant: the dispatcher holds `Option<GameSession>`,
/// and `None` means no game is registering or running.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Lifecycle {
    /// The registration window is open; players may join, no one may guess.
    Registering,
    /// The game is running and players take turns guessing.
    Active,
    /// Terminal. All targets were hit or the roster emptied.
    Over,
}

/// Outcome of a guess, with the data the dispatcher needs to respond.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GuessOutcome {
    /// The text was not a valid cell. Nothing was mutated and the turn is not
    /// consumed.
    Invalid,
    /// The cell was guessed earlier this game. Nothing was mutated, the turn
    /// is not consumed, and up to 4 open neighboring cells are suggested.
    AlreadyGuessed(Vec<Cell>),
    /// Open water. The guess is recorded and the turn is consumed.
    Miss,
    /// A target was found. The guess and the hit are recorded and the turn is
    /// consumed.
    Hit,
}

/// Mutable state for one game.
#[derive(Debug)]
pub struct GameSession {
    /// Number of targets requested when the game was created.
    target_count: usize,
    /// When set, hits do not trigger raffle awards.
    test_mode: bool,
    lifecycle: Lifecycle,
    board: Board,
    /// Lowercase usernames in join order. Join order is turn order.
    players: Vec<String>,
    /// Every cell guessed by anyone this game. Grows monotonically.
    guessed_cells: HashSet<Cell>,
    /// Cells each player has personally guessed. Informational only; guess
    /// legality is decided against `guessed_cells`.
    per_player_guesses: HashMap<String, HashSet<Cell>>,
    /// Confirmed hits per player, reported at game end.
    hits_by_player: HashMap<String, u32>,
    /// Current player is `players[turn_index % players.len()]`. Advanced only
    /// by [`GameSession::advance_turn`].
    turn_index: usize,
    /// Players who have already acted in the current round. Gates
    /// re-entrancy and makes the timeout skip idempotent.
    guessed_this_round: HashSet<String>,
    /// Players who consumed their one-intel-per-turn privilege.
    intel_used_this_turn: HashSet<String>,
}

impl GameSession {
    /// Create a session with a freshly placed board and open registration.
    pub fn new(rng: &mut impl Rng, target_count: usize, test_mode: bool) -> Self {
        Self {
            target_count,
            test_mode,
            lifecycle: Lifecycle::Registering,
            board: Board::with_random_targets(rng, target_count),
            players: Vec::new(),
            guessed_cells: HashSet::new(),
            per_player_guesses: HashMap::new(),
            hits_by_player: HashMap::new(),
            turn_index: 0,
            guessed_this_round: HashSet::new(),
            intel_used_this_turn: HashSet::new(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// The roster in join order.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// The board holding the remaining hidden targets.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Every cell guessed by anyone so far this game.
    pub fn guessed_cells(&self) -> &HashSet<Cell> {
        &self.guessed_cells
    }

    /// Cells personally guessed by `username`, if any.
    pub fn guesses_by(&self, username: &str) -> Option<&HashSet<Cell>> {
        self.per_player_guesses.get(&username.to_lowercase())
    }

    /// Whether `username` is on the roster.
    pub fn is_registered(&self, username: &str) -> bool {
        let username = username.to_lowercase();
        self.players.iter().any(|p| *p == username)
    }

    /// Add a player to the roster. Idempotent: re-registering an existing
    /// player is a no-op. The username is normalized to lowercase.
    pub fn register(&mut self, username: &str) {
        let username = username.to_lowercase();
        if !self.players.contains(&username) {
            self.per_player_guesses
                .insert(username.clone(), HashSet::new());
            self.players.push(username);
        }
    }

    /// Close registration and begin play. Only meaningful while registering.
    pub fn start(&mut self) {
        if self.lifecycle == Lifecycle::Registering {
            self.lifecycle = Lifecycle::Active;
        }
    }

    /// The player whose turn it is, or `None` when the roster is empty.
    pub fn current_player(&self) -> Option<&str> {
        if self.players.is_empty() {
            None
        } else {
            Some(&self.players[self.turn_index % self.players.len()])
        }
    }

    /// Whether `username` has already acted this round.
    pub fn has_acted(&self, username: &str) -> bool {
        self.guessed_this_round.contains(&username.to_lowercase())
    }

    /// Record that `username` acted this round (a resolved guess or a skip).
    pub fn mark_acted(&mut self, username: &str) {
        self.guessed_this_round.insert(username.to_lowercase());
    }

    /// Whether `username` has used intel this turn.
    pub fn has_used_intel(&self, username: &str) -> bool {
        self.intel_used_this_turn.contains(&username.to_lowercase())
    }

    /// Consume `username`'s intel privilege for this turn.
    pub fn mark_intel(&mut self, username: &str) {
        self.intel_used_this_turn.insert(username.to_lowercase());
    }

    /// Resolve a guess by `username` against the board.
    ///
    /// Invalid and repeat guesses mutate nothing. A hit or miss records the
    /// cell globally and for the player; a hit also removes the target and
    /// increments the player's hit count, and ends the game when it was the
    /// last target.
    pub fn guess(&mut self, username: &str, cell_text: &str) -> GuessOutcome {
        let cell: Cell = match cell_text.parse() {
            Ok(cell) => cell,
            Err(_) => return GuessOutcome::Invalid,
        };
        if self.guessed_cells.contains(&cell) {
            return GuessOutcome::AlreadyGuessed(Board::open_neighbors(cell, &self.guessed_cells));
        }

        let username = username.to_lowercase();
        self.per_player_guesses
            .entry(username.clone())
            .or_insert_with(HashSet::new)
            .insert(cell);
        self.guessed_cells.insert(cell);

        match self.board.resolve_guess(cell) {
            GuessResult::Hit => {
                *self.hits_by_player.entry(username).or_insert(0) += 1;
                if self.board.is_cleared() {
                    self.lifecycle = Lifecycle::Over;
                }
                GuessOutcome::Hit
            }
            GuessResult::Miss => GuessOutcome::Miss,
        }
    }

    /// Rotate to the next player and clear the per-round flags.
    ///
    /// This is the only place `turn_index` is advanced. Advancing with an
    /// empty roster is a state inconsistency; the session recovers by ending
    /// the game instead of panicking in the dispatch loop.
    pub fn advance_turn(&mut self) {
        if self.players.is_empty() {
            warn!("turn advanced with an empty roster; forcing game over");
            self.lifecycle = Lifecycle::Over;
            return;
        }
        self.turn_index = (self.turn_index + 1) % self.players.len();
        self.guessed_this_round.clear();
        self.intel_used_this_turn.clear();
    }

    /// Remove a player from the roster and the per-player maps. Returns true
    /// if the player was present.
    ///
    /// The turn pointer is nudged back when the removed slot was at or before
    /// it, so it keeps pointing at a stable "next" player. Removing the last
    /// player ends the game.
    pub fn remove_player(&mut self, username: &str) -> bool {
        let username = username.to_lowercase();
        let idx = match self.players.iter().position(|p| *p == username) {
            Some(idx) => idx,
            None => return false,
        };
        self.players.remove(idx);
        self.per_player_guesses.remove(&username);
        self.hits_by_player.remove(&username);
        self.guessed_this_round.remove(&username);
        self.intel_used_this_turn.remove(&username);
        if idx <= self.turn_index && self.turn_index > 0 {
            self.turn_index -= 1;
        }
        if self.players.is_empty() {
            self.lifecycle = Lifecycle::Over;
        }
        true
    }

    /// True once the game cannot continue: all targets hit, roster empty, or
    /// the lifecycle forced to [`Lifecycle::Over`].
    pub fn is_over(&self) -> bool {
        self.lifecycle == Lifecycle::Over || self.board.is_cleared() || self.players.is_empty()
    }

    /// Targets still hidden on the board.
    pub fn targets_remaining(&self) -> usize {
        self.board.targets_remaining()
    }

    /// Confirmed hits per player, highest first, for end-of-game reporting.
    pub fn hit_totals(&self) -> Vec<(String, u32)> {
        let mut totals: Vec<(String, u32)> = self
            .hits_by_player
            .iter()
            .map(|(player, hits)| (player.clone(), *hits))
            .collect();
        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn session(targets: usize) -> GameSession {
        let mut rng = StdRng::seed_from_u64(7);
        GameSession::new(&mut rng, targets, false)
    }

    fn active_session(targets: usize, players: &[&str]) -> GameSession {
        let mut session = session(targets);
        for player in players {
            session.register(player);
        }
        session.start();
        session
    }

    /// A cell that is not a target and has not been guessed.
    fn open_cell(session: &GameSession) -> Cell {
        Cell::all()
            .find(|c| !session.board().targets().contains(c) && !session.guessed_cells().contains(c))
            .unwrap()
    }

    #[test]
    fn registration_is_idempotent_and_normalizes_case() {
        let mut session = session(3);
        session.register("Alice");
        session.register("alice");
        session.register("ALICE");
        assert_eq!(session.players(), ["alice"]);
        assert!(session.is_registered("AlIcE"));
    }

    #[test]
    fn turn_order_is_round_robin_in_join_order() {
        let mut session = active_session(10, &["a", "b", "c"]);
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(session.current_player().unwrap().to_owned());
            session.advance_turn();
        }
        assert_eq!(seen, ["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn invalid_guess_mutates_nothing() {
        let mut session = active_session(3, &["alice"]);
        assert_eq!(session.guess("alice", "Z1"), GuessOutcome::Invalid);
        assert_eq!(session.guess("alice", "A11"), GuessOutcome::Invalid);
        assert!(session.guessed_cells().is_empty());
        assert_eq!(session.targets_remaining(), 3);
    }

    #[test]
    fn repeat_guess_is_rejected_with_suggestions() {
        let mut session = active_session(3, &["alice"]);
        let cell = open_cell(&session);
        assert_eq!(session.guess("alice", &cell.to_string()), GuessOutcome::Miss);
        match session.guess("alice", &cell.to_string()) {
            GuessOutcome::AlreadyGuessed(nearby) => {
                assert!(nearby.len() <= 4);
                for suggestion in &nearby {
                    assert!(!session.guessed_cells().contains(suggestion));
                }
            }
            other => panic!("expected AlreadyGuessed, got {:?}", other),
        }
        // The repeat did not double-count.
        assert_eq!(session.guessed_cells().len(), 1);
    }

    #[test]
    fn repeat_guess_never_hits_even_on_a_former_target() {
        let mut session = active_session(1, &["alice"]);
        let target = *session.board().targets().iter().next().unwrap();
        assert_eq!(session.guess("alice", &target.to_string()), GuessOutcome::Hit);
        match session.guess("alice", &target.to_string()) {
            GuessOutcome::AlreadyGuessed(_) => {}
            other => panic!("expected AlreadyGuessed, got {:?}", other),
        }
    }

    #[test]
    fn hits_plus_remaining_targets_always_equals_target_count() {
        let mut session = active_session(4, &["alice", "bob"]);
        let cells: Vec<Cell> = Cell::all().collect();
        for cell in cells {
            let player = session.current_player().unwrap().to_owned();
            match session.guess(&player, &cell.to_string()) {
                GuessOutcome::Hit | GuessOutcome::Miss => session.advance_turn(),
                GuessOutcome::AlreadyGuessed(_) | GuessOutcome::Invalid => {}
            }
            let hits: u32 = session.hit_totals().iter().map(|(_, n)| n).sum();
            assert_eq!(session.targets_remaining() + hits as usize, 4);
            if session.is_over() {
                break;
            }
        }
        assert!(session.is_over());
    }

    #[test]
    fn final_hit_ends_the_game() {
        let mut session = active_session(1, &["alice", "bob"]);
        let target = *session.board().targets().iter().next().unwrap();
        assert_eq!(session.guess("alice", &target.to_string()), GuessOutcome::Hit);
        assert!(session.is_over());
        assert_eq!(session.lifecycle(), Lifecycle::Over);
        assert_eq!(session.hit_totals(), [("alice".to_owned(), 1)]);
    }

    #[test]
    fn advance_clears_round_flags() {
        let mut session = active_session(3, &["alice", "bob"]);
        session.mark_acted("alice");
        session.mark_intel("alice");
        session.advance_turn();
        assert!(!session.has_acted("alice"));
        assert!(!session.has_used_intel("alice"));
    }

    #[test]
    fn removing_an_earlier_player_keeps_the_turn_pointer_stable() {
        let mut session = active_session(5, &["a", "b", "c"]);
        session.advance_turn(); // b's turn
        assert_eq!(session.current_player(), Some("b"));
        assert!(session.remove_player("a"));
        assert_eq!(session.current_player(), Some("b"));
        session.advance_turn();
        assert_eq!(session.current_player(), Some("c"));
    }

    #[test]
    fn removing_the_current_player_moves_to_a_valid_slot() {
        let mut session = active_session(5, &["a", "b", "c"]);
        session.advance_turn(); // b's turn
        assert!(session.remove_player("b"));
        // The pointer backs up one slot so it stays on the roster; play
        // continues from "a" and the next advance reaches "c".
        assert_eq!(session.current_player(), Some("a"));
        assert!(!session.is_over());
        session.advance_turn();
        assert_eq!(session.current_player(), Some("c"));
    }

    #[test]
    fn removing_the_last_player_forces_game_over() {
        let mut session = active_session(5, &["a"]);
        assert!(session.remove_player("a"));
        assert!(session.is_over());
        assert_eq!(session.lifecycle(), Lifecycle::Over);
        assert_eq!(session.current_player(), None);
    }

    #[test]
    fn advancing_with_an_empty_roster_recovers_to_game_over() {
        let mut session = session(3);
        session.start();
        session.advance_turn();
        assert_eq!(session.lifecycle(), Lifecycle::Over);
    }
}
