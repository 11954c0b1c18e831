//! Reasons commands are rejected. Every one of these recovers locally to a
//! chat message; none is fatal to the dispatch loop.

use thiserror::Error;

/// Reason a `start`/`test` command was rejected.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum CannotStartReason {
    /// A session is already registering or active.
    #[error("a game is already registering or in progress")]
    GameInProgress,
    /// The target count was missing, not a number, or out of range.
    #[error("target count must be a number between 1 and 20")]
    BadTargetCount,
}

/// Reason a `join` command was rejected.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum CannotJoinReason {
    /// No session is registering or active.
    #[error("no game is registering or in progress")]
    NoGame,
    /// The sender is already on the roster.
    #[error("already registered")]
    AlreadyRegistered,
}

/// Reason a cell guess was rejected before reaching the board.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum CannotGuessReason {
    /// The roster is empty, so no turn is in progress.
    #[error("no player's turn is active")]
    NoCurrentPlayer,
    /// The sender is not the current player.
    #[error("it is {current}'s turn")]
    NotYourTurn { current: String },
    /// The sender already acted this round.
    #[error("already guessed this round")]
    AlreadyActed,
}

/// Reason an `intel` command was rejected.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum CannotIntelReason {
    /// The roster is empty, so no turn is in progress.
    #[error("no player's turn is active")]
    NoCurrentPlayer,
    /// The sender is not the current player.
    #[error("it is {current}'s turn")]
    NotYourTurn { current: String },
    /// The sender already spent their intel this turn.
    #[error("intel already used this turn")]
    AlreadyUsed,
}
