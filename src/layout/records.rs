//! Fixed-layout binary records
//!
//! Store header, block descriptor, and HA group status with positional
//! little-endian encoding. Field offsets are fixed by the format
//! documented at the module root; every encode writes fields at
//! deterministic offsets and every decode validates what it reads.

use crate::error::{Result, StoreError};

use super::{DESCRIPTOR_SIZE, HEADER_SIZE, NO_RELATION, OBJECT_ID_LEN, STATUS_FIXED_SIZE};

// =============================================================================
// Store Role
// =============================================================================

/// Redundancy role of a store.
///
/// Exactly one role holds at a time; mirror participation and HA
/// membership are mutually exclusive. On disk the role is spread over the
/// three raw header fields (`is_replica`, `replica_of`, `ha_group_id`);
/// decoding rejects combinations that name two roles at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    /// Not part of any redundancy scheme
    Standalone,
    /// Original side of a mirror pair
    MirrorSource { peer: i32 },
    /// Copy side of a mirror pair
    MirrorCopy { peer: i32 },
    /// Member of an HA group
    HaMember { group: i32 },
}

impl StoreRole {
    /// Group id if this store is an HA member
    pub fn ha_group(&self) -> Option<i32> {
        match self {
            StoreRole::HaMember { group } => Some(*group),
            _ => None,
        }
    }

    /// Partner id if this store is either side of a mirror pair
    pub fn mirror_peer(&self) -> Option<i32> {
        match self {
            StoreRole::MirrorSource { peer } | StoreRole::MirrorCopy { peer } => Some(*peer),
            _ => None,
        }
    }
}

// =============================================================================
// Store Header
// =============================================================================

/// Store header record (26 bytes on disk)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHeader {
    pub store_id: i32,
    pub total_blocks: u32,
    pub block_size: u32,
    pub used_blocks: u32,
    pub role: StoreRole,
    pub destroyed: bool,
}

impl StoreHeader {
    /// Fresh header for a newly initialized store
    pub fn new(store_id: i32) -> Self {
        Self {
            store_id,
            total_blocks: super::NUM_BLOCKS as u32,
            block_size: super::BLOCK_SIZE as u32,
            used_blocks: 0,
            role: StoreRole::Standalone,
            destroyed: false,
        }
    }

    /// Encode to the positional on-disk layout
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let (is_replica, replica_of, ha_group_id) = match self.role {
            StoreRole::Standalone => (false, NO_RELATION, NO_RELATION),
            StoreRole::MirrorSource { peer } => (false, peer, NO_RELATION),
            StoreRole::MirrorCopy { peer } => (true, peer, NO_RELATION),
            StoreRole::HaMember { group } => (false, NO_RELATION, group),
        };

        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.store_id.to_le_bytes());
        buf[4..8].copy_from_slice(&self.total_blocks.to_le_bytes());
        buf[8..12].copy_from_slice(&self.block_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.used_blocks.to_le_bytes());
        buf[16] = is_replica as u8;
        buf[17..21].copy_from_slice(&replica_of.to_le_bytes());
        buf[21..25].copy_from_slice(&ha_group_id.to_le_bytes());
        buf[25] = self.destroyed as u8;
        buf
    }

    /// Decode from the positional on-disk layout
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(StoreError::CorruptMetadata(format!(
                "store header truncated: {} of {} bytes",
                buf.len(),
                HEADER_SIZE
            )));
        }

        let store_id = i32::from_le_bytes(buf[0..4].try_into().unwrap());
        let total_blocks = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        let block_size = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        let used_blocks = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        let is_replica = decode_bool(buf[16], "is_replica")?;
        let replica_of = i32::from_le_bytes(buf[17..21].try_into().unwrap());
        let ha_group_id = i32::from_le_bytes(buf[21..25].try_into().unwrap());
        let destroyed = decode_bool(buf[25], "is_destroyed")?;

        let role = match (is_replica, replica_of, ha_group_id) {
            (false, NO_RELATION, NO_RELATION) => StoreRole::Standalone,
            (false, peer, NO_RELATION) if peer >= 0 => StoreRole::MirrorSource { peer },
            (true, peer, NO_RELATION) if peer >= 0 => StoreRole::MirrorCopy { peer },
            (false, NO_RELATION, group) if group >= 0 => StoreRole::HaMember { group },
            _ => {
                return Err(StoreError::CorruptMetadata(format!(
                    "conflicting role fields: is_replica={is_replica} \
                     replica_of={replica_of} ha_group_id={ha_group_id}"
                )))
            }
        };

        Ok(Self {
            store_id,
            total_blocks,
            block_size,
            used_blocks,
            role,
            destroyed,
        })
    }
}

// =============================================================================
// Block Descriptor
// =============================================================================

/// Block descriptor record (81 bytes on disk)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Is this block currently storing an object
    pub is_used: bool,
    /// Identifier of the object in this block (at most 64 bytes)
    pub object_id: String,
    /// Actual payload size in the block
    pub data_size: u64,
    /// Unix seconds of the last write
    pub timestamp: u64,
}

impl BlockDescriptor {
    /// Descriptor for an unused block
    pub fn empty() -> Self {
        Self {
            is_used: false,
            object_id: String::new(),
            data_size: 0,
            timestamp: 0,
        }
    }

    /// Encode to the positional on-disk layout.
    ///
    /// The object id is written zero-padded into its 64-byte field.
    pub fn encode(&self) -> Result<[u8; DESCRIPTOR_SIZE]> {
        if self.object_id.len() > OBJECT_ID_LEN {
            return Err(StoreError::InvalidInput(format!(
                "object id longer than {OBJECT_ID_LEN} bytes: {}",
                self.object_id
            )));
        }

        let mut buf = [0u8; DESCRIPTOR_SIZE];
        buf[0] = self.is_used as u8;
        buf[1..1 + self.object_id.len()].copy_from_slice(self.object_id.as_bytes());
        buf[65..73].copy_from_slice(&self.data_size.to_le_bytes());
        buf[73..81].copy_from_slice(&self.timestamp.to_le_bytes());
        Ok(buf)
    }

    /// Decode from the positional on-disk layout
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < DESCRIPTOR_SIZE {
            return Err(StoreError::CorruptMetadata(format!(
                "block descriptor truncated: {} of {} bytes",
                buf.len(),
                DESCRIPTOR_SIZE
            )));
        }

        let is_used = decode_bool(buf[0], "is_used")?;

        let id_field = &buf[1..1 + OBJECT_ID_LEN];
        let id_len = id_field.iter().position(|&b| b == 0).unwrap_or(OBJECT_ID_LEN);
        let object_id = std::str::from_utf8(&id_field[..id_len])
            .map_err(|_| StoreError::CorruptMetadata("object id is not valid UTF-8".to_string()))?
            .to_string();

        let data_size = u64::from_le_bytes(buf[65..73].try_into().unwrap());
        let timestamp = u64::from_le_bytes(buf[73..81].try_into().unwrap());

        Ok(Self {
            is_used,
            object_id,
            data_size,
            timestamp,
        })
    }
}

// =============================================================================
// HA Group Status
// =============================================================================

/// HA group status record (`status.data`)
///
/// The member list is length-prefixed by `store_count` and kept in the
/// order the group was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaGroupStatus {
    pub group_id: i32,
    pub destroyed_count: u32,
    pub store_ids: Vec<i32>,
}

impl HaGroupStatus {
    /// Status for a freshly created group
    pub fn new(group_id: i32, store_ids: Vec<i32>) -> Self {
        Self {
            group_id,
            destroyed_count: 0,
            store_ids,
        }
    }

    /// Number of members in the group
    pub fn store_count(&self) -> u32 {
        self.store_ids.len() as u32
    }

    /// Encode to the positional on-disk layout
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(STATUS_FIXED_SIZE + 4 * self.store_ids.len());
        buf.extend_from_slice(&self.group_id.to_le_bytes());
        buf.extend_from_slice(&self.store_count().to_le_bytes());
        buf.extend_from_slice(&self.destroyed_count.to_le_bytes());
        for id in &self.store_ids {
            buf.extend_from_slice(&id.to_le_bytes());
        }
        buf
    }

    /// Decode from the positional on-disk layout, validating the length
    /// prefix against the bytes actually present.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < STATUS_FIXED_SIZE {
            return Err(StoreError::CorruptMetadata(format!(
                "group status truncated: {} of {} bytes",
                buf.len(),
                STATUS_FIXED_SIZE
            )));
        }

        let group_id = i32::from_le_bytes(buf[0..4].try_into().unwrap());
        let store_count = u32::from_le_bytes(buf[4..8].try_into().unwrap()) as usize;
        let destroyed_count = u32::from_le_bytes(buf[8..12].try_into().unwrap());

        let want = STATUS_FIXED_SIZE + 4 * store_count;
        if buf.len() < want {
            return Err(StoreError::CorruptMetadata(format!(
                "group status lists {store_count} members but holds only {} bytes",
                buf.len()
            )));
        }

        let mut store_ids = Vec::with_capacity(store_count);
        for k in 0..store_count {
            let at = STATUS_FIXED_SIZE + 4 * k;
            store_ids.push(i32::from_le_bytes(buf[at..at + 4].try_into().unwrap()));
        }

        Ok(Self {
            group_id,
            destroyed_count,
            store_ids,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn decode_bool(byte: u8, field: &str) -> Result<bool> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StoreError::CorruptMetadata(format!(
            "{field} byte must be 0 or 1, got {other}"
        ))),
    }
}
