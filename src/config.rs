//! Configuration for ScarrDB
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::error::{Result, ScarrError};

/// Main configuration for a ScarrDB store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Snapshot Configuration
    // -------------------------------------------------------------------------
    /// File holding the full store snapshot (rewritten on every mutation)
    pub snapshot_path: PathBuf,

    /// Encoding used for the snapshot file
    pub snapshot_format: SnapshotFormat,

    /// How bulk fills persist their inserts
    pub persist_strategy: PersistStrategy,

    // -------------------------------------------------------------------------
    // Layout Configuration
    // -------------------------------------------------------------------------
    /// Maximum number of records per data block
    pub block_size: usize,
}

/// On-disk snapshot encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// `{"index_area": [...], "data_blocks": [...], "overflow_area": [...]}`
    Json,

    /// bincode encoding of the same structure
    Bincode,
}

impl SnapshotFormat {
    /// Infer the format from a file extension (`.bin`/`.bincode` → bincode)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bin") | Some("bincode") => SnapshotFormat::Bincode,
            _ => SnapshotFormat::Json,
        }
    }
}

/// Persistence strategy for bulk fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStrategy {
    /// Persist after every inserted record (slowest, mirrors single adds)
    EveryRecord,

    /// Persist once after the whole batch has been inserted
    OncePerBatch,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("./database.json"),
            snapshot_format: SnapshotFormat::Json,
            persist_strategy: PersistStrategy::EveryRecord,
            block_size: 10,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject configurations the store cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(ScarrError::Config(
                "block_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the snapshot file path
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    /// Set the snapshot encoding
    pub fn snapshot_format(mut self, format: SnapshotFormat) -> Self {
        self.config.snapshot_format = format;
        self
    }

    /// Set the bulk fill persistence strategy
    pub fn persist_strategy(mut self, strategy: PersistStrategy) -> Self {
        self.config.persist_strategy = strategy;
        self
    }

    /// Set the data block capacity
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
