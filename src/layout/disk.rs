//! Filesystem layout and raw file I/O
//!
//! Derives paths from store and group identifiers and performs the
//! positional reads and writes of the metadata, data, parity, and status
//! files. Descriptor updates always go through a whole-image rewrite;
//! single descriptors are never patched in place, so `used_blocks` and
//! the descriptor array cannot drift apart.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

use super::records::{BlockDescriptor, HaGroupStatus, StoreHeader};
use super::{BLOCK_SIZE, DATA_FILE_SIZE, DESCRIPTOR_SIZE, HEADER_SIZE, META_FILE_SIZE, NUM_BLOCKS};

/// Data file name inside a store directory
const DATA_FILENAME: &str = "data.bin";

/// Metadata file name inside a store directory
const META_FILENAME: &str = "metadata.bin";

/// Parity file name inside an HA group directory
const PARITY_FILENAME: &str = "parity.bin";

/// Status file name inside an HA group directory
const STATUS_FILENAME: &str = "status.data";

/// Store directory name prefix
const STORE_DIR_PREFIX: &str = "store_";

/// HA group directory name prefix
const GROUP_DIR_PREFIX: &str = "ha_group_";

/// Filesystem layout rooted at a base directory.
///
/// All paths of the system hang off one base directory holding
/// `store_<id>` and `ha_group_<gid>` children.
pub struct Layout {
    base_dir: PathBuf,
}

impl Layout {
    /// Create a layout rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // -------------------------------------------------------------------------
    // Path Derivation
    // -------------------------------------------------------------------------

    /// Directory of a store
    pub fn store_dir(&self, store_id: i32) -> PathBuf {
        self.base_dir.join(format!("{STORE_DIR_PREFIX}{store_id}"))
    }

    /// Data file of a store
    pub fn data_path(&self, store_id: i32) -> PathBuf {
        self.store_dir(store_id).join(DATA_FILENAME)
    }

    /// Metadata file of a store
    pub fn meta_path(&self, store_id: i32) -> PathBuf {
        self.store_dir(store_id).join(META_FILENAME)
    }

    /// Directory of an HA group
    pub fn group_dir(&self, group_id: i32) -> PathBuf {
        self.base_dir.join(format!("{GROUP_DIR_PREFIX}{group_id}"))
    }

    /// Parity file of an HA group
    pub fn parity_path(&self, group_id: i32) -> PathBuf {
        self.group_dir(group_id).join(PARITY_FILENAME)
    }

    /// Status file of an HA group
    pub fn status_path(&self, group_id: i32) -> PathBuf {
        self.group_dir(group_id).join(STATUS_FILENAME)
    }

    /// Does a store directory with this id exist
    pub fn store_exists(&self, store_id: i32) -> bool {
        self.store_dir(store_id).is_dir()
    }

    /// Ids of all store directories under the base path, sorted ascending
    pub fn store_ids(&self) -> Result<Vec<i32>> {
        let mut ids = Vec::new();
        if !self.base_dir.exists() {
            return Ok(ids);
        }
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(rest) = name.strip_prefix(STORE_DIR_PREFIX) {
                if let Ok(id) = rest.parse::<i32>() {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    // -------------------------------------------------------------------------
    // Metadata Records
    // -------------------------------------------------------------------------

    /// Read a store's header
    pub fn read_header(&self, store_id: i32) -> Result<StoreHeader> {
        let mut file = File::open(self.meta_path(store_id))?;
        let mut buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;
        StoreHeader::decode(&buf)
    }

    /// Rewrite only the header region of a store's metadata file
    pub fn write_header(&self, store_id: i32, header: &StoreHeader) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(self.meta_path(store_id))?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&header.encode())?;
        Ok(())
    }

    /// Read all `NUM_BLOCKS` block descriptors in index order
    pub fn read_descriptors(&self, store_id: i32) -> Result<Vec<BlockDescriptor>> {
        let mut file = File::open(self.meta_path(store_id))?;
        file.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        let mut buf = vec![0u8; NUM_BLOCKS * DESCRIPTOR_SIZE];
        file.read_exact(&mut buf)?;

        let mut descriptors = Vec::with_capacity(NUM_BLOCKS);
        for k in 0..NUM_BLOCKS {
            descriptors.push(BlockDescriptor::decode(&buf[k * DESCRIPTOR_SIZE..])?);
        }
        Ok(descriptors)
    }

    /// Rewrite the whole descriptor region (all `NUM_BLOCKS` entries)
    pub fn write_descriptors(&self, store_id: i32, descriptors: &[BlockDescriptor]) -> Result<()> {
        debug_assert_eq!(descriptors.len(), NUM_BLOCKS);
        let mut buf = Vec::with_capacity(NUM_BLOCKS * DESCRIPTOR_SIZE);
        for descriptor in descriptors {
            buf.extend_from_slice(&descriptor.encode()?);
        }

        let mut file = OpenOptions::new().write(true).open(self.meta_path(store_id))?;
        file.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        file.write_all(&buf)?;
        Ok(())
    }

    /// Write the whole metadata image (header + all descriptors) in one
    /// positional pass, creating or truncating the file.
    pub fn write_meta_image(
        &self,
        store_id: i32,
        header: &StoreHeader,
        descriptors: &[BlockDescriptor],
    ) -> Result<()> {
        debug_assert_eq!(descriptors.len(), NUM_BLOCKS);
        let mut buf = Vec::with_capacity(META_FILE_SIZE);
        buf.extend_from_slice(&header.encode());
        for descriptor in descriptors {
            buf.extend_from_slice(&descriptor.encode()?);
        }

        let mut file = File::create(self.meta_path(store_id))?;
        file.write_all(&buf)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Block Payload I/O
    // -------------------------------------------------------------------------

    /// Read `len` bytes from the start of block `block` of a store
    pub fn read_block(&self, store_id: i32, block: usize, len: usize) -> Result<Vec<u8>> {
        read_block_region(&self.data_path(store_id), block, len)
    }

    /// Write `bytes` at the start of block `block` of a store
    pub fn write_block(&self, store_id: i32, block: usize, bytes: &[u8]) -> Result<()> {
        write_block_region(&self.data_path(store_id), block, bytes)
    }

    /// Read one full parity block of an HA group
    pub fn read_parity_block(&self, group_id: i32, block: usize) -> Result<Vec<u8>> {
        read_block_region(&self.parity_path(group_id), block, BLOCK_SIZE)
    }

    /// Write one parity block of an HA group
    pub fn write_parity_block(&self, group_id: i32, block: usize, bytes: &[u8]) -> Result<()> {
        write_block_region(&self.parity_path(group_id), block, bytes)
    }

    // -------------------------------------------------------------------------
    // HA Group Status
    // -------------------------------------------------------------------------

    /// Read an HA group's status record
    pub fn read_ha_status(&self, group_id: i32) -> Result<HaGroupStatus> {
        let buf = fs::read(self.status_path(group_id))?;
        HaGroupStatus::decode(&buf)
    }

    /// Write an HA group's status record, replacing any previous one
    pub fn write_ha_status(&self, group_id: i32, status: &HaGroupStatus) -> Result<()> {
        let mut file = File::create(self.status_path(group_id))?;
        file.write_all(&status.encode())?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // File Allocation
    // -------------------------------------------------------------------------

    /// Allocate a store's data file: `NUM_BLOCKS × BLOCK_SIZE` zero bytes.
    ///
    /// Extended with `set_len`, so untouched regions are holes that read
    /// back as zeros.
    pub fn create_data_file(&self, store_id: i32) -> Result<()> {
        let file = File::create(self.data_path(store_id))?;
        file.set_len(DATA_FILE_SIZE)?;
        Ok(())
    }

    /// Allocate a group's parity file, same shape as a data file
    pub fn create_parity_file(&self, group_id: i32) -> Result<()> {
        let file = File::create(self.parity_path(group_id))?;
        file.set_len(DATA_FILE_SIZE)?;
        Ok(())
    }
}

// =============================================================================
// Block-Region Helpers (shared by data and parity files)
// =============================================================================

fn block_offset(block: usize, len: usize) -> Result<u64> {
    if block >= NUM_BLOCKS {
        return Err(StoreError::InvalidInput(format!(
            "block index {block} out of range (0..{NUM_BLOCKS})"
        )));
    }
    if len > BLOCK_SIZE {
        return Err(StoreError::InvalidInput(format!(
            "access of {len} bytes exceeds block size {BLOCK_SIZE}"
        )));
    }
    Ok((block * BLOCK_SIZE) as u64)
}

fn read_block_region(path: &Path, block: usize, len: usize) -> Result<Vec<u8>> {
    let offset = block_offset(block, len)?;
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

fn write_block_region(path: &Path, block: usize, bytes: &[u8]) -> Result<()> {
    let offset = block_offset(block, bytes.len())?;
    let mut file = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(bytes)?;
    Ok(())
}
