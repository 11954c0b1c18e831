//! The single entry point from the chat transport.
//!
//! The dispatcher owns the one live [`GameSession`] (or none), the
//! [`TurnScheduler`], and the collaborator handles. All state mutation
//! happens inside [`Dispatcher::handle`], one event at a time: chat lines and
//! timer fires arrive on the same queue and are processed strictly in
//! arrival order, so the whole validate-mutate-reschedule sequence is one
//! atomic step and no locks are needed anywhere.

use std::time::Duration;

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::{
    board::Board,
    command::Command,
    scheduler::TurnScheduler,
    session::{GameSession, GuessOutcome, Lifecycle},
};

pub use self::errors::{
    CannotGuessReason, CannotIntelReason, CannotJoinReason, CannotStartReason,
};

mod errors;

/// Smallest target count accepted by `start`/`test`.
pub const MIN_TARGETS: u32 = 1;
/// Largest target count accepted by `start`/`test`.
pub const MAX_TARGETS: u32 = 20;
/// Number of open cells revealed by a single intel use.
pub const INTEL_REVEAL: usize = 5;

/// One unit of work for the dispatch loop. Chat lines and timer fires flow
/// through the same ordered queue.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Event {
    /// A raw chat line from some user.
    Chat { username: String, text: String },
    /// The registration window elapsed.
    RegistrationClosed,
    /// The turn deadline elapsed for `player`. Carries the player the timer
    /// was armed for so a stale fire is detectable.
    TurnTimeout { player: String },
}

/// The sole output sink. The core only ever sends plain announcement strings.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn send(&self, text: &str);
}

/// Point/raffle-ticket ledger credited on hits. Fire-and-forget.
#[async_trait]
pub trait RaffleLedger: Send + Sync {
    async fn award(&self, username: &str, count: u32);
}

/// Tunables for a dispatcher instance.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Trigger word that opens every command, e.g. `!battleship`.
    pub trigger: String,
    /// How long registration stays open after `start`.
    pub registration_window: Duration,
    /// How long the current player has to act before being skipped.
    pub turn_timeout: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            trigger: "!battleship".to_owned(),
            registration_window: Duration::from_secs(120),
            turn_timeout: Duration::from_secs(60),
        }
    }
}

/// Receives events, recognizes commands, validates them against the session,
/// and emits announcements. At most one session is registering or active at
/// a time; the dispatcher enforces that by refusing `start` while it holds
/// one.
pub struct Dispatcher<C, L> {
    trigger: String,
    chat: C,
    raffle: L,
    scheduler: TurnScheduler,
    session: Option<GameSession>,
    rng: StdRng,
}

impl<C: ChatChannel, L: RaffleLedger> Dispatcher<C, L> {
    /// Build a dispatcher and the event queue feeding it. The sender is what
    /// the chat transport uses to submit events; the receiver is passed to
    /// [`Dispatcher::run`].
    pub fn new(
        config: GameConfig,
        chat: C,
        raffle: L,
    ) -> (Self, UnboundedSender<Event>, UnboundedReceiver<Event>) {
        Self::with_rng(config, chat, raffle, StdRng::from_entropy())
    }

    /// Like [`Dispatcher::new`] but with a caller-provided RNG, so tests can
    /// seed the board.
    pub fn with_rng(
        config: GameConfig,
        chat: C,
        raffle: L,
        rng: StdRng,
    ) -> (Self, UnboundedSender<Event>, UnboundedReceiver<Event>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let scheduler = TurnScheduler::new(
            events_tx.clone(),
            config.registration_window,
            config.turn_timeout,
        );
        let dispatcher = Self {
            trigger: config.trigger,
            chat,
            raffle,
            scheduler,
            session: None,
            rng,
        };
        (dispatcher, events_tx, events_rx)
    }

    /// The live session, if one is registering or active. Exposed for status
    /// overlays and tests.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Drain the event queue until every sender is dropped.
    pub async fn run(mut self, mut events: UnboundedReceiver<Event>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
    }

    /// Process a single event to completion.
    pub async fn handle(&mut self, event: Event) {
        match event {
            Event::Chat { username, text } => {
                let username = username.to_lowercase();
                self.handle_chat(&username, &text).await;
            }
            Event::RegistrationClosed => self.close_registration().await,
            Event::TurnTimeout { player } => self.turn_timeout(&player).await,
        }
    }

    async fn handle_chat(&mut self, username: &str, text: &str) {
        let command = match Command::parse(&self.trigger, text) {
            Some(command) => command,
            None => return,
        };
        debug!(username, ?command, "recognized command");
        match command {
            Command::Start { test, targets } => self.start_game(username, test, targets).await,
            Command::Join => self.join(username).await,
            Command::Intel => self.intel(username).await,
            Command::Guess(cell) => self.guess(username, &cell).await,
        }
    }

    async fn start_game(&mut self, username: &str, test: bool, targets: Option<u32>) {
        let in_progress = self
            .session
            .as_ref()
            .map(|s| s.lifecycle() != Lifecycle::Over)
            .unwrap_or(false);
        if in_progress {
            debug!(username, reason = %CannotStartReason::GameInProgress, "start rejected");
            self.chat
                .send("A Battleship game is already registering or in progress. Wait for it to finish!")
                .await;
            return;
        }
        let targets = match targets {
            Some(n) if (MIN_TARGETS..=MAX_TARGETS).contains(&n) => n,
            _ => {
                debug!(username, reason = %CannotStartReason::BadTargetCount, "start rejected");
                let usage = format!(
                    "Usage: {} start <{}-{}>",
                    self.trigger, MIN_TARGETS, MAX_TARGETS
                );
                self.chat.send(&usage).await;
                return;
            }
        };

        self.session = Some(GameSession::new(&mut self.rng, targets as usize, test));
        self.scheduler.open_registration();
        info!(username, targets, test_mode = test, "registration opened");
        let announcement = format!(
            "Battleship {}game opened! Type {} join to enter. Registration open for {} seconds.",
            if test { "TEST " } else { "" },
            self.trigger,
            self.scheduler.registration_window().as_secs(),
        );
        self.chat.send(&announcement).await;
    }

    async fn join(&mut self, username: &str) {
        let rejection = match &mut self.session {
            Some(session) if session.lifecycle() != Lifecycle::Over => {
                if session.is_registered(username) {
                    Some(CannotJoinReason::AlreadyRegistered)
                } else {
                    session.register(username);
                    info!(username, "player joined");
                    None
                }
            }
            _ => Some(CannotJoinReason::NoGame),
        };
        let text = match rejection {
            None => format!("@{} joined Battleship!", username),
            Some(CannotJoinReason::AlreadyRegistered) => {
                format!("@{}, you're already in the game!", username)
            }
            Some(CannotJoinReason::NoGame) => format!(
                "No Battleship game in progress. Start one with {} start <n>.",
                self.trigger
            ),
        };
        self.chat.send(&text).await;
    }

    async fn guess(&mut self, username: &str, cell_text: &str) {
        // A guess when no game is running is stray chatter, not an error.
        if !self.game_is_active() {
            debug!(username, cell_text, "guess ignored; no active game");
            return;
        }

        if let Some(reason) = self.guess_rejection(username) {
            debug!(username, %reason, "guess rejected");
            let text = match reason {
                CannotGuessReason::NoCurrentPlayer => "No active player turn.".to_owned(),
                CannotGuessReason::NotYourTurn { current } => format!(
                    "@{}, it's not your turn! Current turn: @{}",
                    username, current
                ),
                CannotGuessReason::AlreadyActed => {
                    format!("@{}, you have already guessed this round.", username)
                }
            };
            // The turn timer is not reset: it was never this player's turn
            // to lose.
            self.chat.send(&text).await;
            return;
        }

        let outcome = match self.session.as_mut() {
            Some(session) => session.guess(username, cell_text),
            None => return,
        };
        match outcome {
            GuessOutcome::Invalid => {
                debug!(username, cell_text, "invalid cell");
                let text = format!(
                    "@{}, that's not a valid cell! Guess a cell like D4 (A1-J10).",
                    username
                );
                self.chat.send(&text).await;
                // The turn is not consumed; re-announce and restart the clock.
                self.announce_turn().await;
            }
            GuessOutcome::AlreadyGuessed(nearby) => {
                debug!(username, cell_text, "repeat guess");
                let mut text = format!(
                    "@{}, {} has already been guessed! Try a different cell.",
                    username,
                    cell_text.to_uppercase()
                );
                if !nearby.is_empty() {
                    let cells: Vec<String> = nearby.iter().map(|c| c.to_string()).collect();
                    text.push_str(" Nearby open cells: ");
                    text.push_str(&cells.join(" "));
                }
                self.chat.send(&text).await;
                self.announce_turn().await;
            }
            GuessOutcome::Hit => {
                info!(username, cell = %cell_text.to_uppercase(), "hit");
                let test_mode = self
                    .session
                    .as_ref()
                    .map(|s| s.test_mode())
                    .unwrap_or(true);
                if !test_mode {
                    self.raffle.award(username, 1).await;
                }
                self.chat
                    .send(&format!("@{}, that's a Hit!", username))
                    .await;
                self.finish_turn(username).await;
            }
            GuessOutcome::Miss => {
                debug!(username, cell = %cell_text.to_uppercase(), "miss");
                self.chat
                    .send(&format!("@{}, that's a Miss!", username))
                    .await;
                self.finish_turn(username).await;
            }
        }
    }

    async fn intel(&mut self, username: &str) {
        if !self.game_is_active() {
            debug!(username, "intel ignored; no active game");
            return;
        }

        if let Some(reason) = self.intel_rejection(username) {
            debug!(username, %reason, "intel rejected");
            let text = match reason {
                CannotIntelReason::NoCurrentPlayer => "No active player turn.".to_owned(),
                CannotIntelReason::NotYourTurn { current } => format!(
                    "@{}, it's not your turn! Current turn: @{}",
                    username, current
                ),
                CannotIntelReason::AlreadyUsed => {
                    format!("@{}, you already used your intel this turn.", username)
                }
            };
            self.chat.send(&text).await;
            return;
        }

        let cells = match self.session.as_mut() {
            Some(session) => {
                session.mark_intel(username);
                Board::random_open_cells(&mut self.rng, session.guessed_cells(), INTEL_REVEAL)
            }
            None => return,
        };
        info!(username, revealed = cells.len(), "intel used");
        let listing: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        let text = if listing.is_empty() {
            format!("@{}, intel found no open cells left!", username)
        } else {
            format!(
                "@{}, intel reveals open cells: {}",
                username,
                listing.join(" ")
            )
        };
        self.chat.send(&text).await;

        // Intel does not consume the turn, but it does bound it: the clock
        // restarts rather than running down mid-hint.
        let current = self
            .session
            .as_ref()
            .and_then(|s| s.current_player())
            .map(str::to_owned);
        if let Some(player) = current {
            self.scheduler.reset_turn_timer(&player);
        }
    }

    async fn close_registration(&mut self) {
        let registering = matches!(
            &self.session,
            Some(s) if s.lifecycle() == Lifecycle::Registering
        );
        if !registering {
            debug!("stale registration close ignored");
            return;
        }

        let empty = self
            .session
            .as_ref()
            .map(|s| s.players().is_empty())
            .unwrap_or(true);
        if empty {
            info!("registration closed with no players; game canceled");
            self.session = None;
            self.chat
                .send("Battleship: No players registered, game canceled.")
                .await;
            return;
        }

        let roster = match self.session.as_mut() {
            Some(session) => {
                session.start();
                session.players().join(", ")
            }
            None => return,
        };
        info!(players = %roster, "registration closed; game active");
        self.chat
            .send(&format!("Battleship registration closed. Players: {}", roster))
            .await;
        self.announce_turn().await;
    }

    async fn turn_timeout(&mut self, player: &str) {
        // The skip is guarded on the round flag and the current player, so a
        // duplicate or late fire is a no-op.
        let should_skip = match &self.session {
            Some(s) => {
                s.lifecycle() == Lifecycle::Active
                    && !s.is_over()
                    && s.current_player() == Some(player)
                    && !s.has_acted(player)
            }
            None => false,
        };
        if !should_skip {
            debug!(player, "stale turn timeout ignored");
            return;
        }

        info!(player, "turn timed out; skipping");
        self.chat
            .send(&format!("@{} did not guess in time. Turn skipped.", player))
            .await;
        let over = match self.session.as_mut() {
            Some(session) => {
                session.mark_acted(player);
                session.advance_turn();
                session.is_over()
            }
            None => return,
        };
        if over {
            self.end_game().await;
        } else {
            self.announce_turn().await;
        }
    }

    /// After a consumed guess: stop the clock, rotate or finish.
    async fn finish_turn(&mut self, username: &str) {
        self.scheduler.cancel_turn_timer();
        let over = match self.session.as_mut() {
            Some(session) => {
                session.mark_acted(username);
                if session.is_over() {
                    true
                } else {
                    session.advance_turn();
                    session.is_over()
                }
            }
            None => return,
        };
        if over {
            self.end_game().await;
        } else {
            self.announce_turn().await;
        }
    }

    /// Announce whose turn it is and arm the turn timer for them.
    async fn announce_turn(&mut self) {
        let player = match self.session.as_ref().and_then(|s| s.current_player()) {
            Some(player) => player.to_owned(),
            None => {
                self.chat
                    .send("No players currently in the Battleship game.")
                    .await;
                return;
            }
        };
        let text = format!(
            "@{}, it's your turn! Type {} <cell> (e.g., {} D4) within {} seconds.",
            player,
            self.trigger,
            self.trigger,
            self.scheduler.turn_timeout().as_secs(),
        );
        self.chat.send(&text).await;
        self.scheduler.reset_turn_timer(&player);
    }

    /// Cancel every timer, report the hit ledger, and discard the session.
    /// Taking the session out makes double-reporting impossible.
    async fn end_game(&mut self) {
        self.scheduler.cancel_all();
        let session = match self.session.take() {
            Some(session) => session,
            None => return,
        };
        if session.board().is_cleared() {
            info!("game over; all targets hit");
            self.chat.send("All targets have been hit! Game over.").await;
        } else {
            info!("game over; round ended early");
            let text = format!(
                "Battleship round ended. Start a new game with {} start <n>.",
                self.trigger
            );
            self.chat.send(&text).await;
        }

        let totals = session.hit_totals();
        if totals.is_empty() {
            self.chat.send("No raffle hits were recorded this game.").await;
        } else {
            let listing: Vec<String> = totals
                .iter()
                .map(|(player, hits)| format!("{} x{}", player, hits))
                .collect();
            self.chat
                .send(&format!("Raffle hits this game: {}", listing.join(", ")))
                .await;
        }
    }

    fn game_is_active(&self) -> bool {
        matches!(
            &self.session,
            Some(s) if s.lifecycle() == Lifecycle::Active && !s.is_over()
        )
    }

    fn guess_rejection(&self, username: &str) -> Option<CannotGuessReason> {
        let session = match &self.session {
            Some(session) => session,
            None => return Some(CannotGuessReason::NoCurrentPlayer),
        };
        let current = match session.current_player() {
            Some(current) => current,
            None => return Some(CannotGuessReason::NoCurrentPlayer),
        };
        if current != username {
            return Some(CannotGuessReason::NotYourTurn {
                current: current.to_owned(),
            });
        }
        if session.has_acted(username) {
            return Some(CannotGuessReason::AlreadyActed);
        }
        None
    }

    fn intel_rejection(&self, username: &str) -> Option<CannotIntelReason> {
        let session = match &self.session {
            Some(session) => session,
            None => return Some(CannotIntelReason::NoCurrentPlayer),
        };
        let current = match session.current_player() {
            Some(current) => current,
            None => return Some(CannotIntelReason::NoCurrentPlayer),
        };
        if current != username {
            return Some(CannotIntelReason::NotYourTurn {
                current: current.to_owned(),
            });
        }
        if session.has_used_intel(username) {
            return Some(CannotIntelReason::AlreadyUsed);
        }
        None
    }
}
