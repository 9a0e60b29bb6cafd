//! Command requests
//!
//! Represents operations requested by a shell.

use crate::layout::Key;

/// Records inserted by `fill` when no count is given
pub const DEFAULT_FILL_COUNT: usize = 10_000;

/// Searches sampled by `stats` when no count is given
pub const DEFAULT_STATS_ATTEMPTS: usize = 15;

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search for a key
    Search { key: Key },

    /// Insert or overwrite a record
    Add { key: Key, data: String },

    /// Overwrite an existing record
    Edit { key: Key, data: String },

    /// Delete a record
    Delete { key: Key },

    /// Insert `count` random records
    Fill { count: usize },

    /// Average search comparisons over `attempts` random keys
    Stats { attempts: usize },

    /// Record and structure counts
    Info,
}

impl Command {
    /// Whether the command changes (and persists) the store
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Add { .. } | Command::Edit { .. } | Command::Delete { .. } | Command::Fill { .. }
        )
    }
}
