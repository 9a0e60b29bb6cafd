//! Response definitions
//!
//! Represents the outcome of an executed command.

use crate::engine::StoreStats;
use crate::layout::Record;

/// Result of a successful command
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Search hit
    Found { record: Record, comparisons: usize },

    /// Search miss
    NotFound { comparisons: usize },

    /// Mutation applied and persisted
    Done,

    /// Mean comparisons per search
    Average(f64),

    /// Structure summary
    Summary(StoreStats),
}
