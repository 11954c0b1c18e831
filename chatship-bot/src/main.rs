//! Console driver for the chatship minigame.
//!
//! Stands in for the real chat transport: reads `user: message` lines from
//! stdin, feeds them to the dispatcher as chat events, and prints the bot's
//! announcements to stdout. Timers run for real, so an idle registration
//! window or turn lapses just like it would on a live channel.

use std::{error::Error, time::Duration};

use async_trait::async_trait;
use clap::{App, Arg};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use chatship::{ChatChannel, Dispatcher, Event, GameConfig, RaffleLedger};

/// Prints announcements the way the bot would send them to the channel.
struct StdoutChannel;

#[async_trait]
impl ChatChannel for StdoutChannel {
    async fn send(&self, text: &str) {
        println!("[bot] {}", text);
    }
}

/// Stand-in ledger: awards are only logged.
struct LoggingRaffle;

#[async_trait]
impl RaffleLedger for LoggingRaffle {
    async fn award(&self, username: &str, count: u32) {
        tracing::info!(username, count, "raffle entries awarded");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = App::new("chatship-bot")
        .version("0.1.0")
        .about("Chat-driven battleship minigame, fed from stdin as `user: message` lines.")
        .arg(
            Arg::with_name("trigger")
                .long("trigger")
                .value_name("WORD")
                .help("trigger word that opens every command")
                .default_value("!battleship"),
        )
        .arg(
            Arg::with_name("registration_secs")
                .long("registration-secs")
                .value_name("SECONDS")
                .help("how long the registration window stays open")
                .default_value("120"),
        )
        .arg(
            Arg::with_name("turn_secs")
                .long("turn-secs")
                .value_name("SECONDS")
                .help("how long each player has to act before being skipped")
                .default_value("60"),
        )
        .get_matches();

    let config = GameConfig {
        trigger: matches.value_of("trigger").unwrap().to_owned(),
        registration_window: Duration::from_secs(
            matches.value_of("registration_secs").unwrap().parse()?,
        ),
        turn_timeout: Duration::from_secs(matches.value_of("turn_secs").unwrap().parse()?),
    };
    tracing::info!(
        trigger = %config.trigger,
        registration_secs = config.registration_window.as_secs(),
        turn_secs = config.turn_timeout.as_secs(),
        "starting chatship bot"
    );

    let (dispatcher, events, events_rx) = Dispatcher::new(config, StdoutChannel, LoggingRaffle);
    let dispatch_loop = tokio::spawn(dispatcher.run(events_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.splitn(2, ':').collect::<Vec<&str>>().as_slice() {
            [username, text] => {
                let event = Event::Chat {
                    username: username.trim().to_owned(),
                    text: text.trim().to_owned(),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            _ => eprintln!("expected `user: message`, got {:?}", line),
        }
    }

    tracing::info!("stdin closed; shutting down");
    // The dispatcher holds timer senders of its own, so the queue never
    // closes on its own; cancel the loop directly.
    dispatch_loop.abort();
    Ok(())
}
