//! Engine Module
//!
//! The non-dense indexed store: index area, data blocks and overflow area.
//!
//! ## Responsibilities
//! - Three-stage search (index → block → overflow) with comparison counting
//! - Placement of new records into blocks or the overflow area
//! - Redistribution of overflow records into blocks (Scarr's method)
//! - Persisting the full snapshot after every mutation
//!
//! ## Index Ranges
//! New blocks are created with a singleton range `[key, key]` and ranges are
//! never widened afterwards. A block created through `add_record` therefore
//! only ever holds records whose key equals its range. Wider ranges only
//! exist when they are loaded from a snapshot.

use std::path::Path;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::command::{Command, Response};
use crate::config::{Config, PersistStrategy, SnapshotFormat};
use crate::error::{Result, ScarrError};
use crate::layout::{BlockId, DataBlock, IndexEntry, Key, Location, Record};
use crate::snapshot::{FileSnapshot, Snapshot, SnapshotPort};

/// Upper bound (inclusive) of the keys sampled by `average_comparisons`
pub const STATS_KEY_MAX: Key = 100_000;

/// Outcome of a search: the record (if any) and the comparisons it cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult<'a> {
    pub record: Option<&'a Record>,
    pub comparisons: usize,
}

impl SearchResult<'_> {
    pub fn is_found(&self) -> bool {
        self.record.is_some()
    }
}

/// Where `add_record` put a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Key already existed; its data was overwritten in place
    Updated,

    /// Appended to the given block
    Block(BlockId),

    /// Target block was full; appended to the overflow area
    Overflow,
}

/// Record and structure counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub index_entries: usize,
    pub blocks: usize,
    pub block_records: usize,
    pub overflow_records: usize,
    pub total_records: usize,
}

/// The indexed store
///
/// ## Persistence Model
/// The store owns its collections in memory and writes the full snapshot
/// through its `SnapshotPort` at the end of every mutation. If the save
/// fails, the in-memory collections are rolled back to their state before
/// the mutation and the error is returned.
///
/// ## Concurrency
/// None. A store has exactly one owner; all operations take `&self` or
/// `&mut self` and run to completion.
pub struct IndexedStore<P: SnapshotPort = FileSnapshot> {
    /// Store configuration
    config: Config,

    /// Index area, data blocks and overflow area
    state: Snapshot,

    /// Where the snapshot is loaded from and saved to
    port: P,
}

impl IndexedStore<FileSnapshot> {
    /// Open or create a file-backed store with the given config
    pub fn open(config: Config) -> Result<Self> {
        let port = FileSnapshot::new(&config.snapshot_path, config.snapshot_format);
        Self::with_port(config, port)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config, inferring the format from the file extension
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .snapshot_path(path)
            .snapshot_format(SnapshotFormat::from_path(path))
            .build();
        Self::open(config)
    }
}

impl<P: SnapshotPort> IndexedStore<P> {
    /// Open a store on an arbitrary snapshot port
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Load the snapshot from the port
    /// 3. If nothing was persisted, or the snapshot is corrupt, start empty
    ///    and write the empty snapshot back immediately
    pub fn with_port(config: Config, mut port: P) -> Result<Self> {
        config.validate()?;

        let (state, write_back) = match port.load() {
            Ok(Some(snapshot)) => (snapshot, false),
            Ok(None) => {
                debug!("no snapshot found, starting empty");
                (Snapshot::new(), true)
            }
            Err(ScarrError::CorruptSnapshot(reason)) => {
                warn!(%reason, "snapshot corrupt, resetting to empty store");
                (Snapshot::new(), true)
            }
            Err(e) => return Err(e),
        };

        if write_back {
            port.save(&state)?;
        }

        info!(
            index_entries = state.index_area.len(),
            records = state.record_count(),
            block_size = config.block_size,
            "store opened"
        );

        Ok(Self {
            config,
            state,
            port,
        })
    }

    /// Execute a command
    ///
    /// Routes shell commands to the matching operation
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        match command {
            Command::Search { key } => {
                let result = self.search(key);
                Ok(match result.record {
                    Some(record) => Response::Found {
                        record: record.clone(),
                        comparisons: result.comparisons,
                    },
                    None => Response::NotFound {
                        comparisons: result.comparisons,
                    },
                })
            }
            Command::Add { key, data } => {
                self.add_record(key, data)?;
                Ok(Response::Done)
            }
            Command::Edit { key, data } => {
                self.edit_record(key, data)?;
                Ok(Response::Done)
            }
            Command::Delete { key } => {
                self.delete_record(key)?;
                Ok(Response::Done)
            }
            Command::Fill { count } => {
                self.fill_random_data(count)?;
                Ok(Response::Done)
            }
            Command::Stats { attempts } => {
                Ok(Response::Average(self.average_comparisons(attempts)))
            }
            Command::Info => Ok(Response::Summary(self.stats())),
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Search for a key
    ///
    /// Search order, stopping at the first match:
    /// 1. Index area (one comparison per entry range check)
    /// 2. The block of the first matching entry (one per record)
    /// 3. Overflow area (one per record)
    ///
    /// If no index entry covers the key, neither the block nor the overflow
    /// area is searched.
    pub fn search(&self, key: Key) -> SearchResult<'_> {
        let (location, comparisons) = self.locate(key);
        SearchResult {
            record: location.map(|location| self.record_at(location)),
            comparisons,
        }
    }

    /// Whether `search` finds the key
    pub fn contains(&self, key: Key) -> bool {
        self.locate(key).0.is_some()
    }

    fn locate(&self, key: Key) -> (Option<Location>, usize) {
        let mut comparisons = 0;

        // Stage 1: index area
        let mut block_id = None;
        for entry in &self.state.index_area {
            comparisons += 1;
            if entry.contains(key) {
                block_id = Some(entry.block_id);
                break;
            }
        }
        let Some(block) = block_id else {
            return (None, comparisons);
        };

        // Stage 2: the indexed block
        for (slot, record) in self.state.data_blocks[block].iter().enumerate() {
            comparisons += 1;
            if record.key == key {
                return (Some(Location::Block { block, slot }), comparisons);
            }
        }

        // Stage 3: overflow area
        for (slot, record) in self.state.overflow_area.iter().enumerate() {
            comparisons += 1;
            if record.key == key {
                return (Some(Location::Overflow { slot }), comparisons);
            }
        }

        (None, comparisons)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert a record, or overwrite the data of an existing one
    ///
    /// Steps:
    /// 1. Search; if found, replace data in place
    /// 2. Otherwise find (or create) the target block
    /// 3. Append to the block if it has room, else to the overflow area
    ///    followed by a rebuild
    /// 4. Persist
    pub fn add_record(&mut self, key: Key, data: impl Into<String>) -> Result<Insertion> {
        let data = data.into();
        self.commit(|store| store.insert(key, data))
    }

    /// Replace the data of an existing record
    ///
    /// Fails with `RecordNotFound` if `search` does not find the key.
    pub fn edit_record(&mut self, key: Key, data: impl Into<String>) -> Result<()> {
        let location = self
            .locate(key)
            .0
            .ok_or(ScarrError::RecordNotFound { key })?;
        let data = data.into();

        self.commit(|store| store.record_at_mut(location).data = data)
    }

    /// Delete a record
    ///
    /// Blocks are scanned in block order before the overflow area. Index
    /// entries are left in place even if their block becomes empty.
    pub fn delete_record(&mut self, key: Key) -> Result<Record> {
        let location = self
            .find_stored(key)
            .ok_or(ScarrError::RecordNotFound { key })?;

        self.commit(|store| store.remove_at(location))
    }

    /// Run Scarr's method and persist
    ///
    /// Returns the number of records moved from overflow into blocks. Nothing
    /// moves unless the overflow area holds more than `block_size` records.
    pub fn rebuild_index(&mut self) -> Result<usize> {
        self.commit(|store| store.rebuild())
    }

    /// Insert `count` records with random keys in `[1, 10 * count]`
    pub fn fill_random_data(&mut self, count: usize) -> Result<()> {
        self.fill_random_data_with(count, &mut rand::thread_rng())
    }

    /// `fill_random_data` with a caller-supplied RNG
    ///
    /// Duplicate keys overwrite, so fewer than `count` new records may result.
    pub fn fill_random_data_with<R: Rng>(&mut self, count: usize, rng: &mut R) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        let upper = (count as Key).saturating_mul(10);
        match self.config.persist_strategy {
            PersistStrategy::EveryRecord => {
                for _ in 0..count {
                    let key = rng.gen_range(1..=upper);
                    self.add_record(key, random_data(key))?;
                }
            }
            PersistStrategy::OncePerBatch => {
                self.commit(|store| {
                    for _ in 0..count {
                        let key = rng.gen_range(1..=upper);
                        store.insert(key, random_data(key));
                    }
                })?;
            }
        }

        info!(count, records = self.state.record_count(), "random fill complete");
        Ok(())
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Mean search comparisons over `attempts` random keys in `[1, 100000]`
    pub fn average_comparisons(&self, attempts: usize) -> f64 {
        self.average_comparisons_with(attempts, &mut rand::thread_rng())
    }

    /// `average_comparisons` with a caller-supplied RNG
    ///
    /// Returns `0.0` when `attempts` is zero.
    pub fn average_comparisons_with<R: Rng>(&self, attempts: usize, rng: &mut R) -> f64 {
        if attempts == 0 {
            return 0.0;
        }

        let total: usize = (0..attempts)
            .map(|_| self.locate(rng.gen_range(1..=STATS_KEY_MAX)).1)
            .sum();

        total as f64 / attempts as f64
    }

    /// Record and structure counts
    pub fn stats(&self) -> StoreStats {
        let block_records: usize = self.state.data_blocks.iter().map(Vec::len).sum();
        let overflow_records = self.state.overflow_area.len();

        StoreStats {
            index_entries: self.state.index_area.len(),
            blocks: self.state.data_blocks.len(),
            block_records,
            overflow_records,
            total_records: block_records + overflow_records,
        }
    }

    /// Every stored record: blocks in block order, then the overflow area
    pub fn records(&self) -> impl Iterator<Item = &Record> + '_ {
        self.state
            .data_blocks
            .iter()
            .flatten()
            .chain(self.state.overflow_area.iter())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the current collections
    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    pub fn index_area(&self) -> &[IndexEntry] {
        &self.state.index_area
    }

    pub fn data_blocks(&self) -> &[DataBlock] {
        &self.state.data_blocks
    }

    pub fn overflow_area(&self) -> &[Record] {
        &self.state.overflow_area
    }

    /// Get the block capacity
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the snapshot port
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Consume the store, returning its snapshot port
    pub fn into_port(self) -> P {
        self.port
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Apply an in-memory mutation, then persist
    ///
    /// On save failure the collections are restored to their previous state.
    fn commit<T>(&mut self, mutation: impl FnOnce(&mut Self) -> T) -> Result<T> {
        let previous = self.state.clone();
        let outcome = mutation(self);

        if let Err(e) = self.port.save(&self.state) {
            self.state = previous;
            return Err(e);
        }

        Ok(outcome)
    }

    /// Upsert without persisting
    fn insert(&mut self, key: Key, data: String) -> Insertion {
        if let Some(location) = self.locate(key).0 {
            self.record_at_mut(location).data = data;
            return Insertion::Updated;
        }

        let block_id = self.find_or_create_block(key);
        let block = &mut self.state.data_blocks[block_id];
        if block.len() < self.config.block_size {
            block.push(Record::new(key, data));
            return Insertion::Block(block_id);
        }

        debug!(key, block_id, "block full, diverting to overflow");
        self.state.overflow_area.push(Record::new(key, data));
        self.rebuild();
        Insertion::Overflow
    }

    /// Block of the first index entry covering `key`, creating a singleton
    /// entry and an empty block if none does
    fn find_or_create_block(&mut self, key: Key) -> BlockId {
        if let Some(entry) = self.state.index_area.iter().find(|entry| entry.contains(key)) {
            return entry.block_id;
        }

        let block_id = self.state.data_blocks.len();
        self.state.index_area.push(IndexEntry::singleton(key, block_id));
        self.state.data_blocks.push(DataBlock::new());
        debug!(key, block_id, "created block");
        block_id
    }

    /// Scarr's method: move overflow records into blocks with spare capacity
    ///
    /// Only runs when the overflow area holds more than `block_size` records.
    /// Each overflow record present at the start is evaluated exactly once.
    fn rebuild(&mut self) -> usize {
        if self.state.overflow_area.len() <= self.config.block_size {
            return 0;
        }

        let pending = self.state.overflow_area.clone();
        let mut relocated = 0;

        for record in pending {
            let block_id = self.find_or_create_block(record.key);
            if self.state.data_blocks[block_id].len() >= self.config.block_size {
                continue;
            }

            if let Some(slot) = self
                .state
                .overflow_area
                .iter()
                .position(|r| r.key == record.key)
            {
                let record = self.state.overflow_area.remove(slot);
                self.state.data_blocks[block_id].push(record);
                relocated += 1;
            }
        }

        debug!(
            relocated,
            remaining = self.state.overflow_area.len(),
            "overflow rebuild complete"
        );
        relocated
    }

    /// Location of `key` by a full scan: blocks first, then overflow
    fn find_stored(&self, key: Key) -> Option<Location> {
        for (block, records) in self.state.data_blocks.iter().enumerate() {
            if let Some(slot) = records.iter().position(|r| r.key == key) {
                return Some(Location::Block { block, slot });
            }
        }

        self.state
            .overflow_area
            .iter()
            .position(|r| r.key == key)
            .map(|slot| Location::Overflow { slot })
    }

    fn record_at(&self, location: Location) -> &Record {
        match location {
            Location::Block { block, slot } => &self.state.data_blocks[block][slot],
            Location::Overflow { slot } => &self.state.overflow_area[slot],
        }
    }

    fn record_at_mut(&mut self, location: Location) -> &mut Record {
        match location {
            Location::Block { block, slot } => &mut self.state.data_blocks[block][slot],
            Location::Overflow { slot } => &mut self.state.overflow_area[slot],
        }
    }

    fn remove_at(&mut self, location: Location) -> Record {
        match location {
            Location::Block { block, slot } => self.state.data_blocks[block].remove(slot),
            Location::Overflow { slot } => self.state.overflow_area.remove(slot),
        }
    }
}

/// Data value synthesized for a randomly filled key
fn random_data(key: Key) -> String {
    format!("RandomData{}", key)
}
