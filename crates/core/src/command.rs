//! Recognition and parsing of the `s/old/new` command.

use thiserror::Error;

pub const COMMAND_PREFIX: &str = "s/";
pub const DELIMITER: char = '/';
pub const USAGE: &str = "Usage: s/{text to be replaced}/{new text}";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    pub old: String,
    pub new: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("no input after `s/`")]
    EmptyInput,
    #[error("expected `s/old/new` with non-empty old and new text")]
    MissingSegment,
}

/// `trimmed` must already be stripped of surrounding whitespace.
pub fn is_command(trimmed: &str) -> bool {
    trimmed.starts_with(COMMAND_PREFIX)
}

/// Splits a recognised command into its old and new text.
///
/// The remainder after `s/` is split on every delimiter and only the first
/// two segments are used, so `s/a/b/c` yields `a` and `b`.
pub fn parse_command(trimmed: &str) -> Result<Substitution, CommandError> {
    let input = trimmed.strip_prefix(COMMAND_PREFIX).unwrap_or(trimmed).trim();
    if input.is_empty() {
        return Err(CommandError::EmptyInput);
    }

    let mut segments = input.split(DELIMITER);
    let old = segments.next().filter(|segment| !segment.trim().is_empty());
    let new = segments.next().filter(|segment| !segment.trim().is_empty());

    match (old, new) {
        (Some(old), Some(new)) => Ok(Substitution { old: old.to_owned(), new: new.to_owned() }),
        _ => Err(CommandError::MissingSegment),
    }
}
