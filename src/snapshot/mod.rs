//! Snapshot Module
//!
//! The full persisted state of a store and the port used to load/save it.
//!
//! ## Responsibilities
//! - Hold the three collections (index area, data blocks, overflow area)
//! - Encode/decode them as JSON or bincode
//! - Abstract where the bytes live (`SnapshotPort`)
//!
//! ## JSON Layout
//! ```text
//! {
//!   "index_area":    [ {"start": 5, "end": 5, "block_id": 0}, ... ],
//!   "data_blocks":   [ [ {"key": 5, "data": "..."}, ... ], ... ],
//!   "overflow_area": [ {"key": 7, "data": "..."}, ... ]
//! }
//! ```
//!
//! Every mutation rewrites the whole snapshot; there is no incremental log.

mod codec;
mod file;
mod memory;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScarrError};
use crate::layout::{DataBlock, IndexEntry, Record};

pub use codec::{decode, encode};
pub use file::FileSnapshot;
pub use memory::MemorySnapshot;

/// The three collections owned by a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Index entries in creation order (not sorted)
    #[serde(default)]
    pub index_area: Vec<IndexEntry>,

    /// Data blocks, addressed by `IndexEntry::block_id`
    #[serde(default)]
    pub data_blocks: Vec<DataBlock>,

    /// Records that did not fit their block
    #[serde(default)]
    pub overflow_area: Vec<Record>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that index entries and blocks grow in lock-step and that every
    /// entry points at an existing block.
    pub fn validate(&self) -> Result<()> {
        if self.index_area.len() != self.data_blocks.len() {
            return Err(ScarrError::CorruptSnapshot(format!(
                "{} index entries but {} data blocks",
                self.index_area.len(),
                self.data_blocks.len()
            )));
        }

        if let Some(entry) = self
            .index_area
            .iter()
            .find(|entry| entry.block_id >= self.data_blocks.len())
        {
            return Err(ScarrError::CorruptSnapshot(format!(
                "index entry [{}, {}] references missing block {}",
                entry.start, entry.end, entry.block_id
            )));
        }

        Ok(())
    }

    /// Total number of records in blocks and overflow
    pub fn record_count(&self) -> usize {
        self.data_blocks.iter().map(Vec::len).sum::<usize>() + self.overflow_area.len()
    }
}

/// Where a store loads its snapshot from and saves it to
pub trait SnapshotPort {
    /// Load the persisted snapshot
    ///
    /// Returns:
    /// - `Ok(Some(snapshot))` — snapshot decoded
    /// - `Ok(None)` — nothing persisted yet
    /// - `Err(ScarrError::CorruptSnapshot(_))` — bytes exist but are unreadable
    fn load(&mut self) -> Result<Option<Snapshot>>;

    /// Replace the persisted snapshot with `snapshot`
    fn save(&mut self, snapshot: &Snapshot) -> Result<()>;
}
