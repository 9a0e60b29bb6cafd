//! Layout Module
//!
//! Record, index entry and block definitions shared by the store and the
//! snapshot codecs.
//!
//! ## Structure
//! ```text
//! Index area            Data blocks (block_size each)     Overflow area
//! ┌────────────────┐    ┌──────────────────────────┐     ┌──────────────┐
//! │ [start, end]→0 │───▶│ block 0: r, r, r, ...    │     │ r, r, r, ... │
//! │ [start, end]→1 │───▶│ block 1: r, r, ...       │     │ (unordered)  │
//! │ ...            │    │ ...                      │     └──────────────┘
//! └────────────────┘    └──────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

/// Record key. Keys are unique across blocks and overflow.
pub type Key = i64;

/// Identifier of a data block: its position in the block list
pub type BlockId = usize;

/// Fixed-capacity container of records. Capacity is enforced by the store.
pub type DataBlock = Vec<Record>;

/// A single stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: Key,
    pub data: String,
}

impl Record {
    pub fn new(key: Key, data: impl Into<String>) -> Self {
        Self {
            key,
            data: data.into(),
        }
    }
}

/// Maps the inclusive key range `[start, end]` to one data block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub start: Key,
    pub end: Key,
    pub block_id: BlockId,
}

impl IndexEntry {
    /// Entry covering exactly one key
    pub fn singleton(key: Key, block_id: BlockId) -> Self {
        Self {
            start: key,
            end: key,
            block_id,
        }
    }

    /// `start <= key <= end`
    pub fn contains(&self, key: Key) -> bool {
        self.start <= key && key <= self.end
    }
}

/// Physical position of a record inside the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// `slot` within data block `block`
    Block { block: BlockId, slot: usize },

    /// `slot` within the overflow area
    Overflow { slot: usize },
}
