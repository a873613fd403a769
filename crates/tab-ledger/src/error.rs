//! Errors reported while loading a ledger

use std::fmt;

/// Position of a directive in a ledger file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A problem found while loading a ledger.
///
/// Loading never stops at the first problem; callers receive the whole list
/// and decide whether any of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("{at}: syntax error: {message}")]
    Syntax { at: Location, message: String },

    #[error("{file}: cannot read: {message}")]
    Unreadable { file: String, message: String },

    #[error("{at}: include cycle through {target}")]
    IncludeCycle { at: Location, target: String },

    #[error("{at}: {target} is included more than once")]
    DuplicateInclude { at: Location, target: String },

    #[error("{at}: {message}")]
    Invalid { at: Location, message: String },
}

impl LedgerError {
    pub(crate) fn invalid(at: &Location, message: impl Into<String>) -> Self {
        Self::Invalid {
            at: at.clone(),
            message: message.into(),
        }
    }
}
