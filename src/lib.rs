//! # ScarrDB
//!
//! A non-dense indexed sequential file with:
//! - A sparse index area mapping key ranges to data blocks
//! - Fixed-capacity data blocks
//! - An overflow area redistributed by Scarr's method
//! - Search cost instrumentation (comparison counts)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Shell (CLI / REPL / tests)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command / Response
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      IndexedStore                            │
//! │     search · add · edit · delete · rebuild · fill · stats    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼────────────┐
//!          ▼            ▼            ▼
//!   ┌────────────┐ ┌──────────┐ ┌──────────┐
//!   │ Index area │ │  Blocks  │ │ Overflow │
//!   └────────────┘ └──────────┘ └──────────┘
//!                       │
//!                       ▼ full snapshot on every mutation
//!               ┌───────────────┐
//!               │ SnapshotPort  │
//!               │ (file/memory) │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod layout;
pub mod snapshot;
pub mod command;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ScarrError, Result};
pub use config::Config;
pub use engine::{IndexedStore, Insertion, SearchResult, StoreStats};
pub use layout::{IndexEntry, Key, Record};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ScarrDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
