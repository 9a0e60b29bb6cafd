//! Error types for ScarrDB
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::layout::Key;

/// Result type alias using ScarrError
pub type Result<T> = std::result::Result<T, ScarrError>;

/// Unified error type for ScarrDB operations
#[derive(Debug, Error)]
pub enum ScarrError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot exists but cannot be decoded. The store recovers from this
    /// on open by resetting to an empty state.
    #[error("Snapshot corrupt: {0}")]
    CorruptSnapshot(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Record not found: {key}")]
    RecordNotFound { key: Key },

    // -------------------------------------------------------------------------
    // Shell Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
