//! Command parser
//!
//! Turns one line of shell input into a `Command`.

use crate::error::{Result, ScarrError};
use crate::layout::Key;

use super::request::{Command, DEFAULT_FILL_COUNT, DEFAULT_STATS_ATTEMPTS};

/// Parse a key, reporting `InvalidKey` on failure
pub fn parse_key(text: &str) -> Result<Key> {
    text.trim()
        .parse()
        .map_err(|_| ScarrError::InvalidKey(text.to_string()))
}

/// Parse a command line
///
/// The verb is case-insensitive. For `add` and `edit` everything after the
/// key (trimmed) is the data, which may be empty.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, rest) = split_word(line);

    if verb.is_empty() {
        return Err(ScarrError::InvalidCommand("empty command".to_string()));
    }

    match verb.to_ascii_lowercase().as_str() {
        "search" | "get" => Ok(Command::Search {
            key: single_key(verb, rest)?,
        }),
        "add" | "set" => {
            let (key, data) = key_and_data(verb, rest)?;
            Ok(Command::Add { key, data })
        }
        "edit" => {
            let (key, data) = key_and_data(verb, rest)?;
            Ok(Command::Edit { key, data })
        }
        "delete" | "del" => Ok(Command::Delete {
            key: single_key(verb, rest)?,
        }),
        "fill" => Ok(Command::Fill {
            count: optional_count(verb, rest, DEFAULT_FILL_COUNT)?,
        }),
        "stats" => Ok(Command::Stats {
            attempts: optional_count(verb, rest, DEFAULT_STATS_ATTEMPTS)?,
        }),
        "info" => {
            if !rest.is_empty() {
                return Err(unexpected(verb, rest));
            }
            Ok(Command::Info)
        }
        other => Err(ScarrError::InvalidCommand(format!("unknown command '{}'", other))),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Split off the first whitespace-delimited word
fn split_word(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(at) => (&text[..at], text[at..].trim_start()),
        None => (text, ""),
    }
}

fn single_key(verb: &str, rest: &str) -> Result<Key> {
    let (key, trailing) = split_word(rest);
    if key.is_empty() {
        return Err(missing(verb, "key"));
    }
    if !trailing.is_empty() {
        return Err(unexpected(verb, trailing));
    }
    parse_key(key)
}

fn key_and_data(verb: &str, rest: &str) -> Result<(Key, String)> {
    let (key, data) = split_word(rest);
    if key.is_empty() {
        return Err(missing(verb, "key"));
    }
    Ok((parse_key(key)?, data.trim_end().to_string()))
}

fn optional_count(verb: &str, rest: &str, default: usize) -> Result<usize> {
    let (count, trailing) = split_word(rest);
    if !trailing.is_empty() {
        return Err(unexpected(verb, trailing));
    }
    if count.is_empty() {
        return Ok(default);
    }
    count
        .parse()
        .map_err(|_| ScarrError::InvalidCommand(format!("{}: invalid count '{}'", verb, count)))
}

fn missing(verb: &str, what: &str) -> ScarrError {
    ScarrError::InvalidCommand(format!("{}: missing {}", verb, what))
}

fn unexpected(verb: &str, trailing: &str) -> ScarrError {
    ScarrError::InvalidCommand(format!("{}: unexpected argument '{}'", verb, trailing))
}
