//! Parity computation and degraded reads

use crate::error::{Result, StoreError};
use crate::layout::{Layout, StoreHeader, StoreRole, BLOCK_SIZE, NUM_BLOCKS};
use crate::store;

// =============================================================================
// Parity Build
// =============================================================================

/// Build the initial parity for a new group: for every block index used
/// by at least one member, XOR all members' blocks into the parity file.
///
/// Blocks unused by every member stay zero in the freshly allocated
/// parity file, which is already their XOR.
pub(super) fn build_parity(layout: &Layout, group_id: i32, member_ids: &[i32]) -> Result<()> {
    let mut member_descriptors = Vec::with_capacity(member_ids.len());
    for &member in member_ids {
        member_descriptors.push(layout.read_descriptors(member)?);
    }

    for block in 0..NUM_BLOCKS {
        let touched = member_descriptors.iter().any(|d| d[block].is_used);
        if !touched {
            continue;
        }
        let mut parity = vec![0u8; BLOCK_SIZE];
        for &member in member_ids {
            let bytes = layout.read_block(member, block, BLOCK_SIZE)?;
            xor_into(&mut parity, &bytes);
        }
        layout.write_parity_block(group_id, block, &parity)?;
    }
    Ok(())
}

/// XOR `src` into `acc` byte-wise
fn xor_into(acc: &mut [u8], src: &[u8]) {
    for (a, s) in acc.iter_mut().zip(src) {
        *a ^= s;
    }
}

// =============================================================================
// Incremental Update
// =============================================================================

/// Fold a single block's change into the group parity:
/// `parity' = parity XOR old XOR new`, applied to the written prefix only
/// (a put leaves the rest of the block untouched).
pub(crate) fn update_parity_block(
    layout: &Layout,
    group_id: i32,
    block: usize,
    old: &[u8],
    new: &[u8],
) -> Result<()> {
    debug_assert_eq!(old.len(), new.len());
    let mut parity = layout.read_parity_block(group_id, block)?;
    for ((p, o), n) in parity.iter_mut().zip(old).zip(new) {
        *p ^= o ^ n;
    }
    layout.write_parity_block(group_id, block, &parity)?;
    tracing::debug!(group_id, block, "updated parity block");
    Ok(())
}

// =============================================================================
// Degraded Read
// =============================================================================

/// Serve a get against a destroyed store by reconstruction.
///
/// The block index comes from the destroyed member's still-readable
/// metadata. Returns the full `BLOCK_SIZE` image of the lost block; the
/// descriptor of a lost member is not trusted for truncation.
pub(crate) fn degraded_get(
    layout: &Layout,
    header: &StoreHeader,
    object_id: &str,
) -> Result<Vec<u8>> {
    let StoreRole::HaMember { group } = header.role else {
        return Err(StoreError::Reconstruction(format!(
            "store {} is destroyed and not a member of an HA group",
            header.store_id
        )));
    };

    let descriptors = layout.read_descriptors(header.store_id)?;
    let block = store::find_object(&descriptors, object_id)?;
    reconstruct_block(layout, group, header.store_id, block)
}

/// Rebuild one block of a lost member: parity XOR every surviving peer.
///
/// Valid only while the group has a single loss; an unreadable peer or a
/// second destroyed member fails the read.
fn reconstruct_block(layout: &Layout, group_id: i32, lost_id: i32, block: usize) -> Result<Vec<u8>> {
    let status = layout
        .read_ha_status(group_id)
        .map_err(|e| StoreError::Reconstruction(format!("group {group_id} status unreadable: {e}")))?;

    let mut acc = layout
        .read_parity_block(group_id, block)
        .map_err(|e| StoreError::Reconstruction(format!("group {group_id} parity unreadable: {e}")))?;

    for &member in &status.store_ids {
        if member == lost_id {
            continue;
        }
        let peer = layout
            .read_header(member)
            .map_err(|e| StoreError::Reconstruction(format!("peer store {member} unreadable: {e}")))?;
        if peer.destroyed {
            return Err(StoreError::Reconstruction(format!(
                "group {group_id} has lost more than one member ({lost_id} and {member})"
            )));
        }
        let bytes = layout.read_block(member, block, BLOCK_SIZE)?;
        xor_into(&mut acc, &bytes);
    }

    tracing::info!(group_id, lost_id, block, "reconstructed block from parity");
    Ok(acc)
}
