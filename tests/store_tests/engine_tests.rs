//! Tests for the store engine
//!
//! These tests verify:
//! - Store initialization and its on-disk footprint
//! - First-free-block allocation and put/get round trips
//! - Payload size boundaries (empty, exactly one block, one block + 1)
//! - Block exhaustion
//! - Listing and standalone destroy

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use hearty_store::layout::{DATA_FILE_SIZE, DESCRIPTOR_SIZE, HEADER_SIZE, META_FILE_SIZE};
use hearty_store::layout::StoreHeader;
use hearty_store::{Config, Engine, StoreError, BLOCK_SIZE, NUM_BLOCKS};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> (TempDir, Engine) {
    let temp = TempDir::new().unwrap();
    let engine = Engine::new(Config::builder().base_dir(temp.path()).build());
    (temp, engine)
}

fn write_payload(temp: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = temp.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn read_file_at(path: &Path, offset: u64, len: usize) -> Vec<u8> {
    let mut file = File::open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf).unwrap();
    buf
}

fn read_header(temp: &TempDir, store_id: i32) -> StoreHeader {
    let meta = fs::read(temp.path().join(format!("store_{store_id}/metadata.bin"))).unwrap();
    StoreHeader::decode(&meta).unwrap()
}

// =============================================================================
// Init Tests
// =============================================================================

#[test]
fn test_init_creates_store_layout() {
    let (temp, engine) = setup_engine();

    engine.init(1).unwrap();

    let store_dir = temp.path().join("store_1");
    assert!(store_dir.is_dir());
    assert_eq!(
        fs::metadata(store_dir.join("data.bin")).unwrap().len(),
        DATA_FILE_SIZE
    );
    assert_eq!(
        fs::metadata(store_dir.join("metadata.bin")).unwrap().len(),
        META_FILE_SIZE as u64
    );
}

#[test]
fn test_init_writes_fresh_header_and_descriptors() {
    let (temp, engine) = setup_engine();

    engine.init(3).unwrap();

    let header = read_header(&temp, 3);
    assert_eq!(header.store_id, 3);
    assert_eq!(header.used_blocks, 0);
    assert!(!header.destroyed);

    // Every descriptor starts unused.
    let meta = fs::read(temp.path().join("store_3/metadata.bin")).unwrap();
    for k in 0..NUM_BLOCKS {
        assert_eq!(meta[HEADER_SIZE + k * DESCRIPTOR_SIZE], 0, "descriptor {k} used");
    }
}

#[test]
fn test_init_rejects_negative_id() {
    let (_temp, engine) = setup_engine();

    assert!(matches!(engine.init(-1), Err(StoreError::InvalidInput(_))));
}

#[test]
fn test_init_rejects_existing_store() {
    let (_temp, engine) = setup_engine();

    engine.init(1).unwrap();
    let err = engine.init(1).unwrap_err();

    assert!(err.to_string().contains("already exists"));
}

// =============================================================================
// Put / Get Tests
// =============================================================================

#[test]
fn test_put_get_round_trip() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();
    let payload = write_payload(&temp, "payload.bin", b"hello block world");

    let object_id = engine.put(1, &payload).unwrap();

    assert_eq!(engine.get(1, &object_id).unwrap(), b"hello block world");
}

#[test]
fn test_put_zero_byte_payload() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();
    let payload = write_payload(&temp, "empty.bin", b"");

    let object_id = engine.put(1, &payload).unwrap();

    assert_eq!(engine.get(1, &object_id).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_put_exactly_one_block() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();
    let payload = write_payload(&temp, "full.bin", &vec![0xA5u8; BLOCK_SIZE]);

    let object_id = engine.put(1, &payload).unwrap();

    let bytes = engine.get(1, &object_id).unwrap();
    assert_eq!(bytes.len(), BLOCK_SIZE);
    assert!(bytes.iter().all(|&b| b == 0xA5));
}

#[test]
fn test_put_rejects_oversized_payload() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();
    let payload = write_payload(&temp, "big.bin", &vec![0u8; BLOCK_SIZE + 1]);

    let err = engine.put(1, &payload).unwrap_err();

    assert!(matches!(err, StoreError::PayloadTooLarge { .. }));
    assert!(err.to_string().contains("File too large"));
}

#[test]
fn test_put_rejects_missing_payload_file() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();

    let err = engine.put(1, &temp.path().join("no-such-file")).unwrap_err();

    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn test_put_rejects_missing_store() {
    let (temp, engine) = setup_engine();
    let payload = write_payload(&temp, "payload.bin", b"x");

    assert!(matches!(
        engine.put(99, &payload),
        Err(StoreError::StoreNotFound(99))
    ));
}

#[test]
fn test_object_id_format() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();
    let payload = write_payload(&temp, "payload.bin", b"x");

    let object_id = engine.put(1, &payload).unwrap();

    let (millis, tag) = object_id.split_once('_').unwrap();
    assert!(millis.parse::<u128>().unwrap() > 0);
    let tag: u32 = tag.parse().unwrap();
    assert!((1000..=9999).contains(&tag));
}

#[test]
fn test_get_unknown_object_fails() {
    let (_temp, engine) = setup_engine();
    engine.init(1).unwrap();

    let err = engine.get(1, "1700000000000_1234").unwrap_err();

    assert!(matches!(err, StoreError::ObjectNotFound(_)));
}

#[test]
fn test_puts_fill_blocks_in_ascending_order() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();

    engine.put(1, &write_payload(&temp, "a.bin", b"first")).unwrap();
    engine.put(1, &write_payload(&temp, "b.bin", b"second")).unwrap();

    let data = temp.path().join("store_1/data.bin");
    assert_eq!(read_file_at(&data, 0, 5), b"first");
    assert_eq!(read_file_at(&data, BLOCK_SIZE as u64, 6), b"second");
}

#[test]
fn test_used_blocks_accounting() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();
    let payload = write_payload(&temp, "payload.bin", b"x");

    for _ in 0..3 {
        engine.put(1, &payload).unwrap();
    }

    let header = read_header(&temp, 1);
    assert_eq!(header.used_blocks, 3);

    // The header count matches the descriptor array.
    let meta = fs::read(temp.path().join("store_1/metadata.bin")).unwrap();
    let used = (0..NUM_BLOCKS)
        .filter(|k| meta[HEADER_SIZE + k * DESCRIPTOR_SIZE] == 1)
        .count();
    assert_eq!(used, 3);
}

#[test]
fn test_put_exhausts_all_blocks() {
    let (temp, engine) = setup_engine();
    engine.init(1).unwrap();
    let payload = write_payload(&temp, "payload.bin", b"x");

    for _ in 0..NUM_BLOCKS {
        engine.put(1, &payload).unwrap();
    }

    let err = engine.put(1, &payload).unwrap_err();
    assert!(matches!(err, StoreError::NoFreeBlocks));
    assert_eq!(err.to_string(), "No free blocks available");
}

// =============================================================================
// List Tests
// =============================================================================

#[test]
fn test_list_empty_base_dir() {
    let (_temp, engine) = setup_engine();

    assert!(engine.list().unwrap().is_empty());
}

#[test]
fn test_list_reports_usage_sorted_by_id() {
    let (temp, engine) = setup_engine();
    engine.init(2).unwrap();
    engine.init(1).unwrap();
    engine.put(1, &write_payload(&temp, "payload.bin", b"x")).unwrap();

    let summaries = engine.list().unwrap();

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].store_id, 1);
    assert_eq!(summaries[0].used_blocks, 1);
    assert_eq!(summaries[0].status(), "active");
    assert_eq!(
        summaries[0].to_string(),
        format!("1 - active (used: 1/{NUM_BLOCKS} blocks)")
    );
    assert_eq!(summaries[1].store_id, 2);
}

// =============================================================================
// Destroy Tests
// =============================================================================

#[test]
fn test_destroy_standalone_removes_directory() {
    let (temp, engine) = setup_engine();

    engine.init(1).unwrap();
    engine.destroy(1).unwrap();

    assert!(!temp.path().join("store_1").exists());
    assert!(engine.list().unwrap().is_empty());
}

#[test]
fn test_destroy_missing_store_fails() {
    let (_temp, engine) = setup_engine();

    assert!(matches!(
        engine.destroy(42),
        Err(StoreError::StoreNotFound(42))
    ));
}
