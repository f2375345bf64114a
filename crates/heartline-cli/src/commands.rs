//! Line commands read from stdin.

use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
}

/// Something a participant can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Hold,
    Release,
    Pulse(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Me(Action),
    /// Drive the simulated partner (loopback mode only).
    Partner(Action),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  hold | h               hold the heart
  release | r            let go
  pulse [message] | p    send a pulse
  partner <command>      make the simulated partner hold/release/pulse
  status | s             show the room
  quit | q               leave";

fn parse_action(verb: &str, rest: &str) -> Option<Action> {
    match verb {
        "hold" | "h" => Some(Action::Hold),
        "release" | "r" => Some(Action::Release),
        "pulse" | "p" => {
            let message = rest.trim();
            Some(Action::Pulse(
                (!message.is_empty()).then(|| message.to_string()),
            ))
        }
        _ => None,
    }
}

fn split(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest),
        None => (line, ""),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = split(line);
        if verb.is_empty() {
            return Err(CommandError::Empty);
        }
        let verb_lower = verb.to_lowercase();
        if let Some(action) = parse_action(&verb_lower, rest) {
            return Ok(Command::Me(action));
        }
        match verb_lower.as_str() {
            "partner" => {
                let (inner, inner_rest) = split(rest);
                parse_action(&inner.to_lowercase(), inner_rest)
                    .map(Command::Partner)
                    .ok_or_else(|| CommandError::Unknown(format!("partner {inner}")))
            }
            "status" | "s" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(verb.to_string())),
        }
    }
}
