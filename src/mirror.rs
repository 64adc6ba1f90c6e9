//! Mirror Manager
//!
//! Creates and maintains mirrored pairs: a byte-for-byte copy of a source
//! store in a newly created peer, with back-pointers on both sides. A put
//! on either side replays the data region and the full metadata image to
//! the partner, so both sides agree on object placement.

use std::fs;
use std::path::PathBuf;

use rand::Rng;

use crate::error::{Result, StoreError};
use crate::layout::{BlockDescriptor, Layout, StoreHeader, StoreRole, BLOCK_SIZE};

// =============================================================================
// Replicate
// =============================================================================

/// Create a mirror copy of `source_id`, returning the new replica's id.
///
/// The source must exist and be standalone. Any failure after the replica
/// directory is created rolls back by deleting it; the source's
/// back-pointer goes in last, once the replica is complete.
pub(crate) fn replicate(layout: &Layout, source_id: i32) -> Result<i32> {
    if !layout.store_exists(source_id) {
        return Err(StoreError::StoreNotFound(source_id));
    }
    let source_header = layout.read_header(source_id)?;
    match source_header.role {
        StoreRole::Standalone => {}
        StoreRole::MirrorSource { .. } | StoreRole::MirrorCopy { .. } => {
            return Err(StoreError::PreconditionFailed(format!(
                "Store {source_id} is already part of a mirror pair"
            )));
        }
        StoreRole::HaMember { group } => {
            return Err(StoreError::PreconditionFailed(format!(
                "Store {source_id} is a member of HA group {group}"
            )));
        }
    }
    if source_header.destroyed {
        return Err(StoreError::PreconditionFailed(format!(
            "Store {source_id} is destroyed"
        )));
    }

    let replica_id = fresh_store_id(layout);
    fs::create_dir_all(layout.store_dir(replica_id))?;

    if let Err(e) = build_replica(layout, &source_header, replica_id) {
        let _ = fs::remove_dir_all(layout.store_dir(replica_id));
        return Err(e);
    }

    let mut source_header = source_header;
    source_header.role = StoreRole::MirrorSource { peer: replica_id };
    if let Err(e) = layout.write_header(source_id, &source_header) {
        let _ = fs::remove_dir_all(layout.store_dir(replica_id));
        return Err(e);
    }

    tracing::info!(source_id, replica_id, "created mirror pair");
    Ok(replica_id)
}

/// Pick a store id in 1000..=9999 that does not collide with any
/// existing store directory.
fn fresh_store_id(layout: &Layout) -> i32 {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = rng.gen_range(1000..=9999);
        if !layout.store_exists(candidate) {
            return candidate;
        }
    }
}

fn build_replica(layout: &Layout, source: &StoreHeader, replica_id: i32) -> Result<()> {
    layout.create_data_file(replica_id)?;

    let descriptors = layout.read_descriptors(source.store_id)?;
    copy_used_blocks(layout, source.store_id, replica_id, &descriptors)?;

    let mut replica_header = source.clone();
    replica_header.store_id = replica_id;
    replica_header.role = StoreRole::MirrorCopy {
        peer: source.store_id,
    };
    layout.write_meta_image(replica_id, &replica_header, &descriptors)
}

/// Replay every used block from one store's data file to another's.
///
/// Unused blocks are zero on both sides (data files are created zeroed
/// and blocks are never freed), so replaying the used ones leaves the two
/// data regions byte-identical.
fn copy_used_blocks(
    layout: &Layout,
    from: i32,
    to: i32,
    descriptors: &[BlockDescriptor],
) -> Result<()> {
    for (block, descriptor) in descriptors.iter().enumerate() {
        if !descriptor.is_used {
            continue;
        }
        let bytes = layout.read_block(from, block, BLOCK_SIZE)?;
        layout.write_block(to, block, &bytes)?;
    }
    Ok(())
}

// =============================================================================
// Sync on Put
// =============================================================================

/// Replay the caller's data region and metadata image to its mirror
/// partner after a mutating put.
///
/// The partner's rewritten header keeps the partner's own id and the
/// opposite side of the relationship; the descriptor array is copied
/// verbatim.
pub(crate) fn sync_with_partner(layout: &Layout, caller: &StoreHeader) -> Result<()> {
    let (peer, peer_role) = match caller.role {
        StoreRole::MirrorSource { peer } => (
            peer,
            StoreRole::MirrorCopy {
                peer: caller.store_id,
            },
        ),
        StoreRole::MirrorCopy { peer } => (
            peer,
            StoreRole::MirrorSource {
                peer: caller.store_id,
            },
        ),
        _ => return Ok(()),
    };
    if !layout.store_exists(peer) {
        return Err(StoreError::StoreNotFound(peer));
    }

    let descriptors = layout.read_descriptors(caller.store_id)?;
    copy_used_blocks(layout, caller.store_id, peer, &descriptors)?;

    let mut peer_header = caller.clone();
    peer_header.store_id = peer;
    peer_header.role = peer_role;
    layout.write_meta_image(peer, &peer_header, &descriptors)?;

    tracing::debug!(from = caller.store_id, to = peer, "synced mirror partner");
    Ok(())
}

// =============================================================================
// Destroy
// =============================================================================

/// Directories to remove when destroying either side of a mirror pair:
/// the caller's store and, if present, its partner's. Computed up front
/// so removal needs no recursion.
pub(crate) fn removal_set(layout: &Layout, header: &StoreHeader) -> Vec<PathBuf> {
    let mut dirs = vec![layout.store_dir(header.store_id)];
    if let Some(peer) = header.role.mirror_peer() {
        if layout.store_exists(peer) {
            dirs.push(layout.store_dir(peer));
        }
    }
    dirs
}
