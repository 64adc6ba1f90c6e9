//! Store Engine
//!
//! Single-store operations: initialization, block allocation on put,
//! object lookup, and store enumeration.
//!
//! ## Allocation Discipline
//! `put` scans descriptors in ascending index order and takes the first
//! unused block. Blocks are never freed individually; a store gives its
//! space back only when the store itself is removed.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::error::{Result, StoreError};
use crate::layout::{BlockDescriptor, Layout, StoreHeader, StoreRole, BLOCK_SIZE, NUM_BLOCKS};

// =============================================================================
// Object Ids
// =============================================================================

/// Generate an object id of the form `<ms-since-epoch>_<4-digit-random>`.
///
/// Uniqueness within a store is probabilistic; `put` is the authoritative
/// source of the id it assigned.
pub(crate) fn generate_object_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let tag: u32 = rand::thread_rng().gen_range(1000..=9999);
    format!("{millis}_{tag}")
}

/// Unix seconds now, for descriptor timestamps
pub(crate) fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// =============================================================================
// Init
// =============================================================================

/// Initialize a fresh store.
///
/// Fails if the id is negative or the store directory already exists. On
/// any failure after the directory is created, the partial directory is
/// removed.
pub(crate) fn init(layout: &Layout, store_id: i32) -> Result<()> {
    if store_id < 0 {
        return Err(StoreError::InvalidInput(format!(
            "store id must be non-negative, got {store_id}"
        )));
    }
    if layout.store_exists(store_id) {
        return Err(StoreError::PreconditionFailed(format!(
            "Store {store_id} already exists"
        )));
    }

    fs::create_dir_all(layout.store_dir(store_id))?;

    if let Err(e) = write_fresh_files(layout, store_id) {
        let _ = fs::remove_dir_all(layout.store_dir(store_id));
        return Err(e);
    }

    tracing::info!(store_id, "initialized store");
    Ok(())
}

fn write_fresh_files(layout: &Layout, store_id: i32) -> Result<()> {
    layout.create_data_file(store_id)?;
    let header = StoreHeader::new(store_id);
    let descriptors = vec![BlockDescriptor::empty(); NUM_BLOCKS];
    layout.write_meta_image(store_id, &header, &descriptors)
}

// =============================================================================
// Put
// =============================================================================

/// Outcome of a successful put, carrying what the engine needs to drive
/// redundancy side-effects.
pub(crate) struct PutOutcome {
    /// The id assigned to the stored object
    pub object_id: String,
    /// The block index the payload landed in
    pub block: usize,
    /// The payload bytes as written
    pub payload: Vec<u8>,
    /// Prior image of the written prefix; captured only for HA members,
    /// for the incremental parity fold
    pub old_prefix: Option<Vec<u8>>,
    /// The header after the put (used-block count bumped)
    pub header: StoreHeader,
}

/// Store a payload file into the first free block of the store whose
/// header the caller already loaded and validated.
pub(crate) fn put(layout: &Layout, mut header: StoreHeader, payload_path: &Path) -> Result<PutOutcome> {
    let store_id = header.store_id;

    let payload_size = fs::metadata(payload_path)
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::InvalidInput(format!(
                "payload file does not exist: {}",
                payload_path.display()
            )),
            _ => StoreError::Io(e),
        })?
        .len();
    if payload_size > BLOCK_SIZE as u64 {
        return Err(StoreError::PayloadTooLarge {
            size: payload_size,
            max: BLOCK_SIZE as u64,
        });
    }

    let mut descriptors = layout.read_descriptors(store_id)?;
    let block = descriptors
        .iter()
        .position(|d| !d.is_used)
        .ok_or(StoreError::NoFreeBlocks)?;

    let payload = fs::read(payload_path)?;
    let object_id = generate_object_id();

    // The parity fold needs the block image as it was before this write.
    let old_prefix = if matches!(header.role, StoreRole::HaMember { .. }) {
        Some(layout.read_block(store_id, block, payload.len())?)
    } else {
        None
    };

    layout.write_block(store_id, block, &payload)?;

    descriptors[block] = BlockDescriptor {
        is_used: true,
        object_id: object_id.clone(),
        data_size: payload.len() as u64,
        timestamp: unix_seconds_now(),
    };
    header.used_blocks += 1;
    layout.write_meta_image(store_id, &header, &descriptors)?;

    tracing::debug!(store_id, block, size = payload.len(), %object_id, "stored object");
    Ok(PutOutcome {
        object_id,
        block,
        payload,
        old_prefix,
        header,
    })
}

// =============================================================================
// Get
// =============================================================================

/// Read an object's bytes from a live store, honoring the recorded
/// payload size.
pub(crate) fn get(layout: &Layout, header: &StoreHeader, object_id: &str) -> Result<Vec<u8>> {
    let descriptors = layout.read_descriptors(header.store_id)?;
    let block = find_object(&descriptors, object_id)?;
    let len = descriptors[block].data_size as usize;
    layout.read_block(header.store_id, block, len)
}

/// Block index of the used descriptor carrying `object_id`
pub(crate) fn find_object(descriptors: &[BlockDescriptor], object_id: &str) -> Result<usize> {
    descriptors
        .iter()
        .position(|d| d.is_used && d.object_id == object_id)
        .ok_or_else(|| StoreError::ObjectNotFound(object_id.to_string()))
}

// =============================================================================
// List
// =============================================================================

/// One store's line in a listing
#[derive(Debug, Clone)]
pub struct StoreSummary {
    pub store_id: i32,
    pub role: StoreRole,
    pub destroyed: bool,
    pub used_blocks: u32,
    pub total_blocks: u32,
}

impl StoreSummary {
    /// Status text, composed in priority order: destroyed, replica-of,
    /// ha-group, else active.
    pub fn status(&self) -> String {
        let mut parts = Vec::new();
        if self.destroyed {
            parts.push("destroyed".to_string());
        }
        match self.role {
            StoreRole::MirrorCopy { peer } => parts.push(format!("replica of {peer}")),
            StoreRole::HaMember { group } => parts.push(format!("ha-group={group}")),
            _ => {}
        }
        if parts.is_empty() {
            "active".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl fmt::Display for StoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} (used: {}/{} blocks)",
            self.store_id,
            self.status(),
            self.used_blocks,
            self.total_blocks
        )
    }
}

/// Summaries of every store under the base directory, sorted by id.
///
/// Stores whose metadata cannot be read are skipped with a warning.
pub(crate) fn list(layout: &Layout) -> Result<Vec<StoreSummary>> {
    let mut summaries = Vec::new();
    for store_id in layout.store_ids()? {
        match layout.read_header(store_id) {
            Ok(header) => summaries.push(StoreSummary {
                store_id: header.store_id,
                role: header.role,
                destroyed: header.destroyed,
                used_blocks: header.used_blocks,
                total_blocks: header.total_blocks,
            }),
            Err(e) => tracing::warn!(store_id, error = %e, "skipping unreadable store"),
        }
    }
    Ok(summaries)
}
