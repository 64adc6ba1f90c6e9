//! Tests for the fixed-layout binary records
//!
//! These tests verify:
//! - Field offsets of the store header and block descriptor
//! - Role mapping between the tagged variant and the raw header fields
//! - Rejection of conflicting or malformed field values
//! - Length-prefix validation of the group status record

use hearty_store::layout::{
    BlockDescriptor, HaGroupStatus, StoreHeader, StoreRole, DESCRIPTOR_SIZE, HEADER_SIZE,
    META_FILE_SIZE, NUM_BLOCKS, OBJECT_ID_LEN,
};

// =============================================================================
// Store Header Tests
// =============================================================================

#[test]
fn test_header_encode_writes_fields_at_fixed_offsets() {
    let header = StoreHeader {
        store_id: 7,
        total_blocks: 1024,
        block_size: 1024 * 1024,
        used_blocks: 3,
        role: StoreRole::MirrorCopy { peer: 12 },
        destroyed: false,
    };

    let buf = header.encode();

    assert_eq!(buf.len(), HEADER_SIZE);
    assert_eq!(&buf[0..4], &7i32.to_le_bytes());
    assert_eq!(&buf[4..8], &1024u32.to_le_bytes());
    assert_eq!(&buf[8..12], &(1024u32 * 1024).to_le_bytes());
    assert_eq!(&buf[12..16], &3u32.to_le_bytes());
    assert_eq!(buf[16], 1); // is_replica
    assert_eq!(&buf[17..21], &12i32.to_le_bytes()); // replica_of
    assert_eq!(&buf[21..25], &(-1i32).to_le_bytes()); // ha_group_id
    assert_eq!(buf[25], 0); // is_destroyed
}

#[test]
fn test_header_standalone_uses_neutral_relation_fields() {
    let buf = StoreHeader::new(1).encode();

    assert_eq!(buf[16], 0);
    assert_eq!(&buf[17..21], &(-1i32).to_le_bytes());
    assert_eq!(&buf[21..25], &(-1i32).to_le_bytes());
}

#[test]
fn test_header_decode_maps_raw_fields_to_roles() {
    let mut header = StoreHeader::new(4);
    header.role = StoreRole::HaMember { group: 5 };
    let decoded = StoreHeader::decode(&header.encode()).unwrap();
    assert_eq!(decoded.role, StoreRole::HaMember { group: 5 });

    header.role = StoreRole::MirrorSource { peer: 9 };
    let decoded = StoreHeader::decode(&header.encode()).unwrap();
    assert_eq!(decoded.role, StoreRole::MirrorSource { peer: 9 });
}

#[test]
fn test_header_decode_rejects_conflicting_roles() {
    // replica_of and ha_group_id both set names two roles at once
    let mut buf = StoreHeader::new(1).encode();
    buf[17..21].copy_from_slice(&3i32.to_le_bytes());
    buf[21..25].copy_from_slice(&5i32.to_le_bytes());

    assert!(StoreHeader::decode(&buf).is_err());
}

#[test]
fn test_header_decode_rejects_replica_flag_without_peer() {
    let mut buf = StoreHeader::new(1).encode();
    buf[16] = 1; // is_replica with replica_of = -1

    assert!(StoreHeader::decode(&buf).is_err());
}

#[test]
fn test_header_decode_rejects_bad_bool_byte() {
    let mut buf = StoreHeader::new(1).encode();
    buf[25] = 7;

    assert!(StoreHeader::decode(&buf).is_err());
}

#[test]
fn test_header_decode_rejects_truncated_input() {
    let buf = StoreHeader::new(1).encode();
    assert!(StoreHeader::decode(&buf[..HEADER_SIZE - 1]).is_err());
}

// =============================================================================
// Block Descriptor Tests
// =============================================================================

#[test]
fn test_descriptor_encode_zero_pads_object_id() {
    let descriptor = BlockDescriptor {
        is_used: true,
        object_id: "abc".to_string(),
        data_size: 42,
        timestamp: 1_700_000_000,
    };

    let buf = descriptor.encode().unwrap();

    assert_eq!(buf.len(), DESCRIPTOR_SIZE);
    assert_eq!(buf[0], 1);
    assert_eq!(&buf[1..4], b"abc");
    assert!(buf[4..1 + OBJECT_ID_LEN].iter().all(|&b| b == 0));
    assert_eq!(&buf[65..73], &42u64.to_le_bytes());
    assert_eq!(&buf[73..81], &1_700_000_000u64.to_le_bytes());
}

#[test]
fn test_descriptor_decode_trims_padding() {
    let descriptor = BlockDescriptor {
        is_used: true,
        object_id: "1732700000000_4242".to_string(),
        data_size: 10,
        timestamp: 99,
    };

    let decoded = BlockDescriptor::decode(&descriptor.encode().unwrap()).unwrap();

    assert_eq!(decoded, descriptor);
}

#[test]
fn test_descriptor_rejects_oversized_object_id() {
    let descriptor = BlockDescriptor {
        is_used: true,
        object_id: "x".repeat(OBJECT_ID_LEN + 1),
        data_size: 0,
        timestamp: 0,
    };

    assert!(descriptor.encode().is_err());
}

#[test]
fn test_empty_descriptor_is_all_zero() {
    let buf = BlockDescriptor::empty().encode().unwrap();
    assert!(buf.iter().all(|&b| b == 0));
}

// =============================================================================
// Group Status Tests
// =============================================================================

#[test]
fn test_status_encodes_length_prefixed_member_list() {
    let status = HaGroupStatus::new(1, vec![1, 2, 3]);
    let buf = status.encode();

    assert_eq!(buf.len(), 12 + 3 * 4);
    assert_eq!(&buf[0..4], &1i32.to_le_bytes());
    assert_eq!(&buf[4..8], &3u32.to_le_bytes()); // store_count
    assert_eq!(&buf[8..12], &0u32.to_le_bytes()); // destroyed_count
    assert_eq!(&buf[12..16], &1i32.to_le_bytes());
    assert_eq!(&buf[16..20], &2i32.to_le_bytes());
    assert_eq!(&buf[20..24], &3i32.to_le_bytes());
}

#[test]
fn test_status_decode_preserves_member_order() {
    let status = HaGroupStatus::new(5, vec![5, 3, 8]);
    let decoded = HaGroupStatus::decode(&status.encode()).unwrap();

    assert_eq!(decoded.store_ids, vec![5, 3, 8]);
    assert_eq!(decoded.store_count(), 3);
}

#[test]
fn test_status_decode_rejects_truncated_member_list() {
    let status = HaGroupStatus::new(1, vec![1, 2, 3]);
    let buf = status.encode();

    // Length prefix promises three members; hand over only two.
    assert!(HaGroupStatus::decode(&buf[..buf.len() - 4]).is_err());
}

// =============================================================================
// Size Constants
// =============================================================================

#[test]
fn test_metadata_image_size() {
    assert_eq!(META_FILE_SIZE, HEADER_SIZE + NUM_BLOCKS * DESCRIPTOR_SIZE);
    assert_eq!(META_FILE_SIZE, 26 + 1024 * 81);
}
