//! Tests for IndexedStore
//!
//! These tests verify:
//! - Search results and exact comparison counts
//! - Upsert and placement into blocks / overflow
//! - Scarr's rebuild threshold and relocation
//! - Edit/delete failures leave the store unchanged
//! - Random fill and comparison statistics
//! - Rollback when persisting fails

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use scarrdb::config::{Config, PersistStrategy, SnapshotFormat};
use scarrdb::layout::{IndexEntry, Key, Record};
use scarrdb::snapshot::{MemorySnapshot, Snapshot, SnapshotPort};
use scarrdb::{IndexedStore, Insertion, ScarrError};

// =============================================================================
// Helper Functions
// =============================================================================

fn config(block_size: usize) -> Config {
    Config::builder().block_size(block_size).build()
}

fn memory_store(block_size: usize) -> IndexedStore<MemorySnapshot> {
    IndexedStore::with_port(config(block_size), MemorySnapshot::new()).unwrap()
}

/// Store whose index area holds the given (wide) ranges, each with an empty block
fn store_with_ranges(block_size: usize, ranges: &[(Key, Key)]) -> IndexedStore<MemorySnapshot> {
    let snapshot = Snapshot {
        index_area: ranges
            .iter()
            .enumerate()
            .map(|(block_id, &(start, end))| IndexEntry {
                start,
                end,
                block_id,
            })
            .collect(),
        data_blocks: vec![Vec::new(); ranges.len()],
        overflow_area: Vec::new(),
    };
    let port = MemorySnapshot::with_snapshot(&snapshot).unwrap();
    IndexedStore::with_port(config(block_size), port).unwrap()
}

fn block_keys(store: &IndexedStore<MemorySnapshot>, block: usize) -> Vec<Key> {
    store.data_blocks()[block].iter().map(|r| r.key).collect()
}

fn overflow_keys(store: &IndexedStore<MemorySnapshot>) -> Vec<Key> {
    store.overflow_area().iter().map(|r| r.key).collect()
}

/// Port whose saves can be made to fail
struct FlakyPort {
    inner: MemorySnapshot,
    fail: Rc<Cell<bool>>,
}

impl SnapshotPort for FlakyPort {
    fn load(&mut self) -> scarrdb::Result<Option<Snapshot>> {
        self.inner.load()
    }

    fn save(&mut self, snapshot: &Snapshot) -> scarrdb::Result<()> {
        if self.fail.get() {
            return Err(ScarrError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.save(snapshot)
    }
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_empty_port_writes_back_empty_snapshot() {
    let store = memory_store(10);

    assert_eq!(store.port().saves(), 1);
    assert_eq!(store.port().persisted().unwrap(), Some(Snapshot::new()));
    assert_eq!(store.stats().total_records, 0);
}

#[test]
fn test_open_existing_snapshot_does_not_rewrite() {
    let snapshot = Snapshot {
        index_area: vec![IndexEntry::singleton(3, 0)],
        data_blocks: vec![vec![Record::new(3, "c")]],
        overflow_area: Vec::new(),
    };
    let port = MemorySnapshot::with_snapshot(&snapshot).unwrap();

    let store = IndexedStore::with_port(config(10), port).unwrap();

    assert_eq!(store.port().saves(), 0);
    assert_eq!(store.snapshot(), &snapshot);
}

#[test]
fn test_open_corrupt_snapshot_resets_to_empty() {
    let port = MemorySnapshot::with_bytes(b"{not json".to_vec(), SnapshotFormat::Json);

    let store = IndexedStore::with_port(config(10), port).unwrap();

    assert_eq!(store.snapshot(), &Snapshot::new());
    assert_eq!(store.port().saves(), 1);
    assert_eq!(store.port().persisted().unwrap(), Some(Snapshot::new()));
}

#[test]
fn test_open_dangling_block_id_resets_to_empty() {
    let bytes = br#"{"index_area":[{"start":1,"end":1,"block_id":4}],"data_blocks":[[]],"overflow_area":[]}"#;
    let port = MemorySnapshot::with_bytes(bytes.to_vec(), SnapshotFormat::Json);

    let store = IndexedStore::with_port(config(10), port).unwrap();

    assert!(store.index_area().is_empty());
    assert!(store.data_blocks().is_empty());
}

#[test]
fn test_open_rejects_zero_block_size() {
    let result = IndexedStore::with_port(config(0), MemorySnapshot::new());

    assert!(matches!(result, Err(ScarrError::Config(_))));
}

// =============================================================================
// Search Tests
// =============================================================================

#[test]
fn test_search_empty_store() {
    let store = memory_store(10);

    let result = store.search(42);

    assert!(!result.is_found());
    assert_eq!(result.comparisons, 0);
}

#[test]
fn test_search_found_in_block() {
    let mut store = memory_store(10);
    for key in 1..=5 {
        store.add_record(key, format!("v{}", key)).unwrap();
    }

    let result = store.search(3);

    assert_eq!(result.record, Some(&Record::new(3, "v3")));
    // three index entries, then the first record of block 2
    assert_eq!(result.comparisons, 4);
}

#[test]
fn test_search_absent_from_index_counts_only_index() {
    let mut store = memory_store(10);
    for key in 1..=5 {
        store.add_record(key, "x").unwrap();
    }

    let result = store.search(100);

    assert!(!result.is_found());
    assert_eq!(result.comparisons, store.index_area().len());
}

#[test]
fn test_search_indexed_but_missing_scans_block_and_overflow() {
    let mut store = store_with_ranges(2, &[(1, 100)]);
    store.add_record(1, "a").unwrap();
    store.add_record(2, "b").unwrap();
    store.add_record(3, "c").unwrap(); // overflow

    let result = store.search(50);

    assert!(!result.is_found());
    // 1 index entry + 2 block records + 1 overflow record
    assert_eq!(result.comparisons, 4);
}

#[test]
fn test_search_found_in_overflow() {
    let mut store = store_with_ranges(2, &[(1, 100)]);
    store.add_record(1, "a").unwrap();
    store.add_record(2, "b").unwrap();
    store.add_record(3, "c").unwrap();

    let result = store.search(3);

    assert_eq!(result.record, Some(&Record::new(3, "c")));
    assert_eq!(result.comparisons, 4);
    assert!(store.contains(3));
}

#[test]
fn test_search_uses_first_matching_entry_only() {
    // Overlapping ranges: key 5 resolves to block 0 even though block 1 also covers it
    let snapshot = Snapshot {
        index_area: vec![
            IndexEntry { start: 1, end: 10, block_id: 0 },
            IndexEntry { start: 5, end: 5, block_id: 1 },
        ],
        data_blocks: vec![vec![], vec![Record::new(5, "hidden")]],
        overflow_area: Vec::new(),
    };
    let port = MemorySnapshot::with_snapshot(&snapshot).unwrap();
    let store = IndexedStore::with_port(config(10), port).unwrap();

    let result = store.search(5);

    assert!(!result.is_found());
    assert_eq!(result.comparisons, 1);
}

// =============================================================================
// Insertion Tests
// =============================================================================

#[test]
fn test_add_creates_singleton_block_per_key() {
    let mut store = memory_store(10);

    for key in 1..=10 {
        let placed = store.add_record(key, "x").unwrap();
        assert_eq!(placed, Insertion::Block((key - 1) as usize));
    }
    let placed = store.add_record(11, "x").unwrap();

    assert_eq!(placed, Insertion::Block(10));
    assert_eq!(store.index_area().len(), 11);
    assert_eq!(store.data_blocks().len(), 11);
    for (id, entry) in store.index_area().iter().enumerate() {
        assert_eq!(entry.start, entry.end);
        assert_eq!(entry.block_id, id);
        assert_eq!(store.data_blocks()[id].len(), 1);
    }
}

#[test]
fn test_ranges_never_widen() {
    let mut store = memory_store(10);
    store.add_record(10, "a").unwrap();
    store.add_record(11, "b").unwrap();

    assert_eq!(
        store.index_area(),
        &[IndexEntry::singleton(10, 0), IndexEntry::singleton(11, 1)]
    );
}

#[test]
fn test_add_same_key_overwrites() {
    let mut store = memory_store(10);

    store.add_record(5, "a").unwrap();
    let placed = store.add_record(5, "b").unwrap();

    assert_eq!(placed, Insertion::Updated);
    let records: Vec<&Record> = store.records().collect();
    assert_eq!(records, vec![&Record::new(5, "b")]);
    assert_eq!(store.index_area().len(), 1);
}

#[test]
fn test_add_persists_every_call() {
    let mut store = memory_store(10);
    let before = store.port().saves();

    store.add_record(1, "a").unwrap();
    store.add_record(1, "a").unwrap();

    assert_eq!(store.port().saves(), before + 2);
    assert_eq!(store.port().persisted().unwrap().as_ref(), Some(store.snapshot()));
}

#[test]
fn test_full_block_diverts_to_overflow() {
    let mut store = store_with_ranges(3, &[(1, 100)]);
    for key in 1..=3 {
        assert_eq!(store.add_record(key, "x").unwrap(), Insertion::Block(0));
    }

    let placed = store.add_record(4, "x").unwrap();

    assert_eq!(placed, Insertion::Overflow);
    assert_eq!(block_keys(&store, 0), vec![1, 2, 3]);
    assert_eq!(overflow_keys(&store), vec![4]);
}

#[test]
fn test_overwrite_record_in_overflow() {
    let mut store = store_with_ranges(1, &[(1, 100)]);
    store.add_record(1, "a").unwrap();
    store.add_record(2, "b").unwrap();

    assert_eq!(store.add_record(2, "bb").unwrap(), Insertion::Updated);
    assert_eq!(store.overflow_area(), &[Record::new(2, "bb")]);
}

// =============================================================================
// Rebuild Tests
// =============================================================================

#[test]
fn test_overflow_untouched_at_threshold() {
    let mut store = store_with_ranges(3, &[(1, 100)]);
    for key in 1..=6 {
        store.add_record(key, "x").unwrap();
    }
    store.delete_record(1).unwrap();

    // Overflow holds exactly block_size records: no rebuild yet
    assert_eq!(overflow_keys(&store), vec![4, 5, 6]);
    assert_eq!(store.rebuild_index().unwrap(), 0);
    assert_eq!(overflow_keys(&store), vec![4, 5, 6]);
}

#[test]
fn test_rebuild_relocates_when_overflow_exceeds_block_size() {
    let mut store = store_with_ranges(3, &[(1, 100), (101, 200)]);
    for key in 1..=6 {
        store.add_record(key, "x").unwrap();
    }
    store.delete_record(1).unwrap();
    for key in 101..=103 {
        assert_eq!(store.add_record(key, "y").unwrap(), Insertion::Block(1));
    }

    // Fourth overflow record crosses the threshold
    let placed = store.add_record(104, "y").unwrap();

    assert_eq!(placed, Insertion::Overflow);
    assert_eq!(block_keys(&store, 0), vec![2, 3, 4]);
    assert_eq!(block_keys(&store, 1), vec![101, 102, 103]);
    assert_eq!(overflow_keys(&store), vec![5, 6, 104]);

    let result = store.search(4);
    assert!(result.is_found());
    // 1 index entry + 3 block records
    assert_eq!(result.comparisons, 4);
}

#[test]
fn test_rebuild_evaluates_each_overflow_record_once() {
    // Overflow records with no covering entry each get a new singleton block
    let snapshot = Snapshot {
        index_area: Vec::new(),
        data_blocks: Vec::new(),
        overflow_area: [10, 20, 30, 40]
            .iter()
            .map(|&key| Record::new(key, "o"))
            .collect(),
    };
    let port = MemorySnapshot::with_snapshot(&snapshot).unwrap();
    let mut store = IndexedStore::with_port(config(3), port).unwrap();

    let relocated = store.rebuild_index().unwrap();

    assert_eq!(relocated, 4);
    assert!(store.overflow_area().is_empty());
    assert_eq!(store.index_area().len(), 4);
    for (id, key) in [10, 20, 30, 40].into_iter().enumerate() {
        assert_eq!(store.index_area()[id], IndexEntry::singleton(key, id));
        assert_eq!(block_keys(&store, id), vec![key]);
    }
}

// =============================================================================
// Edit Tests
// =============================================================================

#[test]
fn test_edit_existing_record() {
    let mut store = memory_store(10);
    store.add_record(7, "x").unwrap();

    store.edit_record(7, "y").unwrap();

    assert_eq!(store.search(7).record, Some(&Record::new(7, "y")));
    assert_eq!(store.port().persisted().unwrap().as_ref(), Some(store.snapshot()));
}

#[test]
fn test_edit_record_in_overflow() {
    let mut store = store_with_ranges(1, &[(1, 100)]);
    store.add_record(1, "a").unwrap();
    store.add_record(2, "b").unwrap();

    store.edit_record(2, "edited").unwrap();

    assert_eq!(store.overflow_area(), &[Record::new(2, "edited")]);
}

#[test]
fn test_edit_missing_record_fails_without_change() {
    let mut store = memory_store(10);
    store.add_record(7, "x").unwrap();
    let before = store.snapshot().clone();
    let saves = store.port().saves();

    let result = store.edit_record(8, "y");

    assert!(matches!(result, Err(ScarrError::RecordNotFound { key: 8 })));
    assert_eq!(store.snapshot(), &before);
    assert_eq!(store.port().saves(), saves);
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_returns_record_and_keeps_index_entry() {
    let mut store = memory_store(10);
    for key in 1..=3 {
        store.add_record(key, format!("v{}", key)).unwrap();
    }

    let removed = store.delete_record(2).unwrap();

    assert_eq!(removed, Record::new(2, "v2"));
    assert_eq!(store.index_area().len(), 3);
    assert!(store.data_blocks()[1].is_empty());

    // Stale entry still routes the search to the empty block
    let result = store.search(2);
    assert!(!result.is_found());
    assert_eq!(result.comparisons, 2);
}

#[test]
fn test_delete_from_overflow() {
    let mut store = store_with_ranges(1, &[(1, 100)]);
    store.add_record(1, "a").unwrap();
    store.add_record(2, "b").unwrap();

    store.delete_record(2).unwrap();

    assert!(store.overflow_area().is_empty());
    assert_eq!(block_keys(&store, 0), vec![1]);
}

#[test]
fn test_delete_missing_record_fails_without_change() {
    let mut store = memory_store(10);
    store.add_record(1, "a").unwrap();
    let before = store.snapshot().clone();
    let saves = store.port().saves();

    let result = store.delete_record(99);

    assert!(matches!(result, Err(ScarrError::RecordNotFound { key: 99 })));
    assert_eq!(store.snapshot(), &before);
    assert_eq!(store.port().saves(), saves);
}

// =============================================================================
// Fill and Statistics Tests
// =============================================================================

#[test]
fn test_fill_random_data_keys_in_range_and_unique() {
    let mut store = memory_store(10);
    let mut rng = StdRng::seed_from_u64(7);

    store.fill_random_data_with(50, &mut rng).unwrap();

    let keys: Vec<Key> = store.records().map(|r| r.key).collect();
    let unique: HashSet<Key> = keys.iter().copied().collect();
    assert_eq!(keys.len(), unique.len());
    assert!(!keys.is_empty() && keys.len() <= 50);
    assert!(keys.iter().all(|&key| (1..=500).contains(&key)));
    for record in store.records() {
        assert_eq!(record.data, format!("RandomData{}", record.key));
    }
}

#[test]
fn test_every_stored_record_is_searchable() {
    let mut store = memory_store(10);
    let mut rng = StdRng::seed_from_u64(11);
    store.fill_random_data_with(200, &mut rng).unwrap();

    for record in store.records() {
        assert_eq!(store.search(record.key).record, Some(record));
    }
}

#[test]
fn test_fill_zero_records_is_noop() {
    let mut store = memory_store(10);
    let saves = store.port().saves();

    store.fill_random_data(0).unwrap();

    assert_eq!(store.port().saves(), saves);
    assert_eq!(store.stats().total_records, 0);
}

#[test]
fn test_fill_persist_strategies() {
    let every = Config::builder()
        .persist_strategy(PersistStrategy::EveryRecord)
        .build();
    let mut store = IndexedStore::with_port(every, MemorySnapshot::new()).unwrap();
    store
        .fill_random_data_with(20, &mut StdRng::seed_from_u64(3))
        .unwrap();
    assert_eq!(store.port().saves(), 1 + 20);

    let batch = Config::builder()
        .persist_strategy(PersistStrategy::OncePerBatch)
        .build();
    let mut batched = IndexedStore::with_port(batch, MemorySnapshot::new()).unwrap();
    batched
        .fill_random_data_with(20, &mut StdRng::seed_from_u64(3))
        .unwrap();
    assert_eq!(batched.port().saves(), 1 + 1);

    // Same seed, same final collections
    assert_eq!(store.snapshot(), batched.snapshot());
}

#[test]
fn test_average_comparisons_bounds() {
    let mut store = memory_store(10);
    for key in 1..=5 {
        store.add_record(key, "x").unwrap();
    }
    let mut rng = StdRng::seed_from_u64(1);

    let average = store.average_comparisons_with(100, &mut rng);

    // Misses cost 5 (all index entries), a hit on key k costs k + 1
    assert!((2.0..=6.0).contains(&average));
}

#[test]
fn test_average_comparisons_degenerate_inputs() {
    let store = memory_store(10);

    assert_eq!(store.average_comparisons(0), 0.0);
    assert_eq!(store.average_comparisons(10), 0.0);
}

#[test]
fn test_stats_counts() {
    let mut store = store_with_ranges(2, &[(1, 100)]);
    for key in 1..=3 {
        store.add_record(key, "x").unwrap();
    }

    let stats = store.stats();

    assert_eq!(stats.index_entries, 1);
    assert_eq!(stats.blocks, 1);
    assert_eq!(stats.block_records, 2);
    assert_eq!(stats.overflow_records, 1);
    assert_eq!(stats.total_records, 3);
}

// =============================================================================
// Persistence Failure Tests
// =============================================================================

#[test]
fn test_failed_save_rolls_back_mutation() {
    let fail = Rc::new(Cell::new(false));
    let port = FlakyPort {
        inner: MemorySnapshot::new(),
        fail: Rc::clone(&fail),
    };
    let mut store = IndexedStore::with_port(config(10), port).unwrap();
    store.add_record(1, "a").unwrap();
    let before = store.snapshot().clone();

    fail.set(true);
    assert!(matches!(store.add_record(2, "b"), Err(ScarrError::Io(_))));
    assert!(matches!(store.edit_record(1, "z"), Err(ScarrError::Io(_))));
    assert!(matches!(store.delete_record(1), Err(ScarrError::Io(_))));

    assert_eq!(store.snapshot(), &before);
    assert!(!store.contains(2));

    fail.set(false);
    store.add_record(2, "b").unwrap();
    assert!(store.contains(2));
}
