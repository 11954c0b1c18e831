//! Recording doubles and a small harness for driving the dispatcher in
//! tests. Tests act as the event loop: they feed events to
//! `Dispatcher::handle` directly and, for timer cases, pull the deferred
//! events off the queue themselves.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use chatship::{Cell, ChatChannel, Dispatcher, Event, GameConfig, RaffleLedger};

/// Chat sink that records every announcement.
#[derive(Debug, Clone, Default)]
pub struct RecordingChannel {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChatChannel for RecordingChannel {
    async fn send(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_owned());
    }
}

/// Raffle ledger that records every award.
#[derive(Debug, Clone, Default)]
pub struct RecordingRaffle {
    awards: Arc<Mutex<Vec<(String, u32)>>>,
}

impl RecordingRaffle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn awards(&self) -> Vec<(String, u32)> {
        self.awards.lock().unwrap().clone()
    }
}

#[async_trait]
impl RaffleLedger for RecordingRaffle {
    async fn award(&self, username: &str, count: u32) {
        self.awards
            .lock()
            .unwrap()
            .push((username.to_owned(), count));
    }
}

pub struct Harness {
    pub chat: RecordingChannel,
    pub raffle: RecordingRaffle,
    pub dispatcher: Dispatcher<RecordingChannel, RecordingRaffle>,
    pub events_tx: UnboundedSender<Event>,
    pub events_rx: UnboundedReceiver<Event>,
}

pub fn harness(seed: u64) -> Harness {
    harness_with(GameConfig::default(), seed)
}

pub fn harness_with(config: GameConfig, seed: u64) -> Harness {
    let chat = RecordingChannel::new();
    let raffle = RecordingRaffle::new();
    let (dispatcher, events_tx, events_rx) = Dispatcher::with_rng(
        config,
        chat.clone(),
        raffle.clone(),
        StdRng::seed_from_u64(seed),
    );
    Harness {
        chat,
        raffle,
        dispatcher,
        events_tx,
        events_rx,
    }
}

impl Harness {
    /// Feed one chat line through the dispatcher.
    pub async fn chat_line(&mut self, username: &str, text: &str) {
        self.dispatcher
            .handle(Event::Chat {
                username: username.to_owned(),
                text: text.to_owned(),
            })
            .await;
    }

    /// Open a game, register the players, and close registration, leaving
    /// the first player's turn active.
    pub async fn start_active_game(&mut self, targets: u32, players: &[&str]) {
        self.chat_line(players[0], &format!("!battleship start {}", targets))
            .await;
        for player in players {
            self.chat_line(player, "!battleship join").await;
        }
        self.dispatcher.handle(Event::RegistrationClosed).await;
    }

    pub fn current_player(&self) -> Option<String> {
        self.dispatcher
            .session()
            .and_then(|s| s.current_player())
            .map(str::to_owned)
    }

    /// A hidden target cell from the live session.
    pub fn a_target(&self) -> Cell {
        *self
            .dispatcher
            .session()
            .expect("no live session")
            .board()
            .targets()
            .iter()
            .next()
            .expect("no targets left")
    }

    /// A cell that is neither a target nor already guessed.
    pub fn open_water(&self) -> Cell {
        let session = self.dispatcher.session().expect("no live session");
        Cell::all()
            .find(|c| !session.board().targets().contains(c) && !session.guessed_cells().contains(c))
            .expect("board is full")
    }
}
