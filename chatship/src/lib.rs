//! Chat-triggered multiplayer battleship minigame.
//!
//! Players register during a timed window, then take round-robin turns
//! guessing coordinates on a hidden 10x10 board until every target is found.
//! The crate is split by responsibility:
//!
//! [`board`] owns the hidden targets and answers guess and hint queries,
//! with no knowledge of turns.
//!
//! [`session`] is the per-game mutable state: roster, turn pointer, guessed
//! cells, and the hit ledger.
//!
//! [`command`] recognizes the tiny chat grammar (`start <n>`, `test <n>`,
//! `join`, `intel`, bare cell tokens).
//!
//! [`scheduler`] owns the two cancellable timers (registration window,
//! per-turn deadline) as deferred events.
//!
//! [`dispatch`] ties it together: one event queue, one consumer, strictly
//! ordered processing of chat lines and timer fires. Output goes through the
//! [`ChatChannel`] trait; hit rewards go through [`RaffleLedger`].

pub mod board;
pub mod command;
pub mod dispatch;
pub mod scheduler;
pub mod session;

pub use crate::{
    board::{Board, Cell, GuessResult, ParseCellError},
    command::Command,
    dispatch::{ChatChannel, Dispatcher, Event, GameConfig, RaffleLedger},
    scheduler::TurnScheduler,
    session::{GameSession, GuessOutcome, Lifecycle},
};
