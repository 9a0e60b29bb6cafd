//! In-memory snapshot port
//!
//! Keeps the encoded snapshot in a byte buffer instead of a file, so the
//! same decode path (and its corruption handling) runs as for files.

use crate::config::SnapshotFormat;
use crate::error::Result;

use super::{codec, Snapshot, SnapshotPort};

/// Snapshot port backed by a byte buffer
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    bytes: Option<Vec<u8>>,
    format: SnapshotFormat,
    saves: usize,
}

impl MemorySnapshot {
    /// Empty port (nothing persisted yet)
    pub fn new() -> Self {
        Self {
            bytes: None,
            format: SnapshotFormat::Json,
            saves: 0,
        }
    }

    /// Port pre-seeded with an encoded snapshot
    pub fn with_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let format = SnapshotFormat::Json;
        Ok(Self {
            bytes: Some(codec::encode(snapshot, format)?),
            format,
            saves: 0,
        })
    }

    /// Port pre-seeded with raw bytes (which may be garbage)
    pub fn with_bytes(bytes: impl Into<Vec<u8>>, format: SnapshotFormat) -> Self {
        Self {
            bytes: Some(bytes.into()),
            format,
            saves: 0,
        }
    }

    /// Raw persisted bytes, if any
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Decode the currently persisted snapshot
    pub fn persisted(&self) -> Result<Option<Snapshot>> {
        self.bytes
            .as_deref()
            .map(|bytes| codec::decode(bytes, self.format))
            .transpose()
    }
}

impl Default for MemorySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPort for MemorySnapshot {
    fn load(&mut self) -> Result<Option<Snapshot>> {
        self.persisted()
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.bytes = Some(codec::encode(snapshot, self.format)?);
        self.saves += 1;
        Ok(())
    }
}
