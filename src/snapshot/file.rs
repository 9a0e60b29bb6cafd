//! File-backed snapshot port

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::SnapshotFormat;
use crate::error::Result;

use super::{codec, Snapshot, SnapshotPort};

/// Stores the snapshot in a single file, overwritten on every save
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
    format: SnapshotFormat,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Get the snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the snapshot encoding
    pub fn format(&self) -> SnapshotFormat {
        self.format
    }
}

impl SnapshotPort for FileSnapshot {
    fn load(&mut self) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        codec::decode(&bytes, self.format).map(Some)
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = codec::encode(snapshot, self.format)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}
