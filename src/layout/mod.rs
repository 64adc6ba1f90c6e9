//! On-Disk Layout Module
//!
//! Path derivation and fixed-offset binary I/O for store and HA group
//! files. Every other component goes through this module.
//!
//! ## Store Directory (`store_<id>`)
//! - `data.bin`: `NUM_BLOCKS × BLOCK_SIZE` bytes, block *k* at offset
//!   `k × BLOCK_SIZE`, no framing. Untouched regions read as zeros.
//! - `metadata.bin`: one store header followed by `NUM_BLOCKS` block
//!   descriptors in block-index order.
//!
//! ## `metadata.bin` Format (all integers little-endian)
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Store Header (26 bytes)                                      │
//! │   StoreId: i32 (4)    | TotalBlocks: u32 (4)                 │
//! │   BlockSize: u32 (4)  | UsedBlocks: u32 (4)                  │
//! │   IsReplica: u8 (1)   | ReplicaOf: i32 (4)                   │
//! │   HaGroupId: i32 (4)  | IsDestroyed: u8 (1)                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Block Descriptors (1024 × 81 bytes)                          │
//! │   IsUsed: u8 (1) | ObjectId: [u8; 64] (zero-padded)          │
//! │   DataSize: u64 (8) | Timestamp: u64 (8)                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## HA Group Directory (`ha_group_<gid>`)
//! - `parity.bin`: same shape as `data.bin`; block *k* holds the XOR of
//!   every member's block *k*.
//! - `status.data`:
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ GroupId: i32 (4) | StoreCount: u32 (4) | Destroyed: u32 (4)  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Member Store Ids: StoreCount × i32                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod disk;
mod records;

pub use disk::Layout;
pub use records::{BlockDescriptor, HaGroupStatus, StoreHeader, StoreRole};

// =============================================================================
// Shared Constants
// =============================================================================

/// Size of one block in bytes (1 MiB)
pub const BLOCK_SIZE: usize = 1024 * 1024;

/// Number of blocks per store
pub const NUM_BLOCKS: usize = 1024;

/// Data region size: NUM_BLOCKS × BLOCK_SIZE (1 GiB)
pub const DATA_FILE_SIZE: u64 = (NUM_BLOCKS * BLOCK_SIZE) as u64;

/// Object id field width in a block descriptor
pub const OBJECT_ID_LEN: usize = 64;

/// Store header size: 4 + 4 + 4 + 4 + 1 + 4 + 4 + 1 = 26 bytes
pub const HEADER_SIZE: usize = 26;

/// Block descriptor size: 1 + 64 + 8 + 8 = 81 bytes
pub const DESCRIPTOR_SIZE: usize = 81;

/// Full metadata image size: header + NUM_BLOCKS descriptors
pub const META_FILE_SIZE: usize = HEADER_SIZE + NUM_BLOCKS * DESCRIPTOR_SIZE;

/// Fixed prefix of `status.data` before the member id list
pub const STATUS_FIXED_SIZE: usize = 12;

/// Sentinel for "no peer / no group" in the raw header fields
pub(crate) const NO_RELATION: i32 = -1;
