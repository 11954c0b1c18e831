//! Recognition of the chat command surface.
//!
//! Commands are plain chat lines starting with a trigger word (`!battleship`
//! by default). The grammar is deliberately tiny: `start <n>`, `test <n>`,
//! `join`, `intel`, and a bare cell token like `D4`. Anything else after the
//! trigger that doesn't fit one of those shapes is not a command.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matcher for the `start`/`test` shape. The target count is captured as raw
/// text; range validation is the dispatcher's job.
static START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?P<mode>start|test)(?:\s+(?P<targets>\S+))?$").unwrap());

/// A recognized chat command, not yet validated against game state.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    /// `start <n>` or `test <n>`. `targets` is `None` when the argument was
    /// missing or not a number; the dispatcher answers with a usage message.
    Start { test: bool, targets: Option<u32> },
    /// `join`: enter the roster during registration (or, permissively, during
    /// active play).
    Join,
    /// `intel`: spend the once-per-turn hint.
    Intel,
    /// A bare token, treated as a cell guess. Cell syntax is checked later so
    /// that a malformed coordinate gets the `Invalid` outcome, not silence.
    Guess(String),
}

impl Command {
    /// Parse a chat line. Returns `None` when the line does not start with
    /// the trigger word or does not match any recognized command shape.
    pub fn parse(trigger: &str, line: &str) -> Option<Command> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next()?;
        if !first.eq_ignore_ascii_case(trigger) {
            return None;
        }
        let rest = tokens.collect::<Vec<&str>>().join(" ");
        if rest.is_empty() {
            return None;
        }

        if let Some(captures) = START.captures(&rest) {
            let test = captures
                .name("mode")
                .unwrap()
                .as_str()
                .eq_ignore_ascii_case("test");
            let targets = captures
                .name("targets")
                .and_then(|m| m.as_str().parse().ok());
            return Some(Command::Start { test, targets });
        }

        let mut rest_tokens = rest.split_whitespace();
        let word = rest_tokens.next()?;
        if rest_tokens.next().is_some() {
            // More than one token and not a start/test shape: unrecognized.
            return None;
        }
        if word.eq_ignore_ascii_case("join") {
            Some(Command::Join)
        } else if word.eq_ignore_ascii_case("intel") {
            Some(Command::Intel)
        } else {
            Some(Command::Guess(word.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIGGER: &str = "!battleship";

    fn parse(line: &str) -> Option<Command> {
        Command::parse(TRIGGER, line)
    }

    #[test]
    fn recognizes_start_and_test_with_counts() {
        assert_eq!(
            parse("!battleship start 5"),
            Some(Command::Start {
                test: false,
                targets: Some(5)
            })
        );
        assert_eq!(
            parse("!Battleship TEST 20"),
            Some(Command::Start {
                test: true,
                targets: Some(20)
            })
        );
    }

    #[test]
    fn start_without_a_usable_count_still_parses() {
        assert_eq!(
            parse("!battleship start"),
            Some(Command::Start {
                test: false,
                targets: None
            })
        );
        assert_eq!(
            parse("!battleship start five"),
            Some(Command::Start {
                test: false,
                targets: None
            })
        );
    }

    #[test]
    fn recognizes_join_and_intel_case_insensitively() {
        assert_eq!(parse("!battleship join"), Some(Command::Join));
        assert_eq!(parse("!battleship JOIN"), Some(Command::Join));
        assert_eq!(parse("!battleship Intel"), Some(Command::Intel));
    }

    #[test]
    fn bare_token_is_a_guess() {
        assert_eq!(parse("!battleship D4"), Some(Command::Guess("D4".to_owned())));
        // Malformed coordinates are still guesses; validity is decided later.
        assert_eq!(parse("!battleship Z99"), Some(Command::Guess("Z99".to_owned())));
    }

    #[test]
    fn ignores_unrelated_chatter() {
        assert_eq!(parse("hello there"), None);
        assert_eq!(parse("!battleship"), None);
        assert_eq!(parse("!battleship D4 extra words"), None);
        assert_eq!(parse("!raffle join"), None);
        assert_eq!(parse(""), None);
    }
}
