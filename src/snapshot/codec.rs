//! Snapshot codec
//!
//! Encoding and decoding of snapshots in either supported format.

use crate::config::SnapshotFormat;
use crate::error::{Result, ScarrError};

use super::Snapshot;

/// Encode a snapshot to bytes
pub fn encode(snapshot: &Snapshot, format: SnapshotFormat) -> Result<Vec<u8>> {
    match format {
        SnapshotFormat::Json => {
            serde_json::to_vec(snapshot).map_err(|e| ScarrError::Serialization(e.to_string()))
        }
        SnapshotFormat::Bincode => {
            bincode::serialize(snapshot).map_err(|e| ScarrError::Serialization(e.to_string()))
        }
    }
}

/// Decode a snapshot from bytes
///
/// Any parse failure or structural inconsistency is reported as
/// `ScarrError::CorruptSnapshot`.
pub fn decode(bytes: &[u8], format: SnapshotFormat) -> Result<Snapshot> {
    let snapshot: Snapshot = match format {
        SnapshotFormat::Json => serde_json::from_slice(bytes)
            .map_err(|e| ScarrError::CorruptSnapshot(format!("invalid JSON: {}", e)))?,
        SnapshotFormat::Bincode => bincode::deserialize(bytes)
            .map_err(|e| ScarrError::CorruptSnapshot(format!("invalid bincode: {}", e)))?,
    };

    snapshot.validate()?;
    Ok(snapshot)
}
