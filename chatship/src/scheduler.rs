//! Cancellable timeout timers for the registration window and the per-turn
//! deadline.
//!
//! The scheduler is the only component that creates, holds, or cancels
//! timers. A timer is a spawned task that sleeps and then sends an [`Event`]
//! into the dispatcher's queue, so a timer firing is just another event
//! processed in arrival order. Each timer lives in a single slot: arming a
//! slot cancels whatever was pending in it first, so two live timers for the
//! same concern never coexist.

use std::time::Duration;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time};
use tracing::debug;

use crate::dispatch::Event;

/// A single-slot cancellable deferred event.
#[derive(Debug, Default)]
struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Cancel any pending fire, then schedule `event` to be sent after
    /// `delay`. Cancel-then-reschedule is one synchronous step; there is no
    /// window where two fires are pending.
    fn reset(&mut self, events: &UnboundedSender<Event>, delay: Duration, event: Event) {
        self.cancel();
        let events = events.clone();
        self.handle = Some(tokio::spawn(async move {
            time::sleep(delay).await;
            // The dispatcher may have shut down; a dropped event is fine.
            let _ = events.send(event);
        }));
    }

    /// Cancel the pending fire, if any.
    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Owns the registration and turn timers for the one live session.
#[derive(Debug)]
pub struct TurnScheduler {
    events: UnboundedSender<Event>,
    registration_window: Duration,
    turn_timeout: Duration,
    registration: TimerSlot,
    turn: TimerSlot,
}

impl TurnScheduler {
    pub fn new(
        events: UnboundedSender<Event>,
        registration_window: Duration,
        turn_timeout: Duration,
    ) -> Self {
        Self {
            events,
            registration_window,
            turn_timeout,
            registration: TimerSlot::default(),
            turn: TimerSlot::default(),
        }
    }

    /// How long the registration window stays open.
    pub fn registration_window(&self) -> Duration {
        self.registration_window
    }

    /// How long a player has to act on their turn.
    pub fn turn_timeout(&self) -> Duration {
        self.turn_timeout
    }

    /// Start (or restart) the registration-window timer.
    pub fn open_registration(&mut self) {
        debug!(window_secs = self.registration_window.as_secs(), "arming registration timer");
        self.registration
            .reset(&self.events, self.registration_window, Event::RegistrationClosed);
    }

    /// Cancel any pending turn timer and arm a fresh one for `player`. This
    /// is the single mutation point for the turn deadline: resolved guesses,
    /// invalid retries, and intel use all come through here.
    pub fn reset_turn_timer(&mut self, player: &str) {
        debug!(player, timeout_secs = self.turn_timeout.as_secs(), "arming turn timer");
        self.turn.reset(
            &self.events,
            self.turn_timeout,
            Event::TurnTimeout {
                player: player.to_owned(),
            },
        );
    }

    /// Cancel the pending turn timer without scheduling a new one. Used when
    /// a turn resolves and the game might be over.
    pub fn cancel_turn_timer(&mut self) {
        self.turn.cancel();
    }

    /// Cancel everything. Used at game end.
    pub fn cancel_all(&mut self) {
        self.registration.cancel();
        self.turn.cancel();
    }
}
