//! Group lifecycle: creation, destruction bookkeeping, reaping

use std::collections::HashSet;
use std::fs;

use crate::error::{Result, StoreError};
use crate::layout::{HaGroupStatus, Layout, StoreHeader, StoreRole};

use super::parity::build_parity;

// =============================================================================
// Creation
// =============================================================================

/// Form an HA group from `member_ids`, returning the group id (the first
/// member's store id).
pub(crate) fn create_group(layout: &Layout, member_ids: &[i32]) -> Result<i32> {
    validate_members(layout, member_ids)?;
    let group_id = member_ids[0];

    fs::create_dir_all(layout.group_dir(group_id))?;

    if let Err(e) = build_group_files(layout, group_id, member_ids) {
        let _ = fs::remove_dir_all(layout.group_dir(group_id));
        return Err(e);
    }

    tracing::info!(group_id, members = ?member_ids, "created HA group");
    Ok(group_id)
}

fn validate_members(layout: &Layout, member_ids: &[i32]) -> Result<()> {
    if member_ids.len() < 2 {
        return Err(StoreError::InvalidInput(format!(
            "an HA group needs at least 2 stores, got {}",
            member_ids.len()
        )));
    }

    let mut seen = HashSet::new();
    for &member in member_ids {
        if !seen.insert(member) {
            return Err(StoreError::PreconditionFailed(format!(
                "duplicate store id {member} in member list"
            )));
        }
        if !layout.store_exists(member) {
            return Err(StoreError::StoreNotFound(member));
        }
        let header = layout.read_header(member)?;
        match header.role {
            StoreRole::Standalone => {}
            StoreRole::HaMember { group } => {
                return Err(StoreError::PreconditionFailed(format!(
                    "Store {member} is already part of HA group {group}"
                )));
            }
            StoreRole::MirrorSource { .. } | StoreRole::MirrorCopy { .. } => {
                return Err(StoreError::PreconditionFailed(format!(
                    "Store {member} is part of a mirror pair"
                )));
            }
        }
        if header.destroyed {
            return Err(StoreError::PreconditionFailed(format!(
                "Store {member} is destroyed"
            )));
        }
    }
    Ok(())
}

fn build_group_files(layout: &Layout, group_id: i32, member_ids: &[i32]) -> Result<()> {
    layout.create_parity_file(group_id)?;
    build_parity(layout, group_id, member_ids)?;

    // Tag members only once parity covers them. Header failures here are
    // logged, not rolled back.
    for &member in member_ids {
        match layout.read_header(member) {
            Ok(mut header) => {
                header.role = StoreRole::HaMember { group: group_id };
                if let Err(e) = layout.write_header(member, &header) {
                    tracing::warn!(member, error = %e, "failed to tag HA member header");
                }
            }
            Err(e) => tracing::warn!(member, error = %e, "failed to tag HA member header"),
        }
    }

    layout.write_ha_status(group_id, &HaGroupStatus::new(group_id, member_ids.to_vec()))
}

// =============================================================================
// Degraded-Mode Gate
// =============================================================================

/// A group that has lost a member is read-only: recomputing parity over
/// the survivors would stop covering the lost member's data.
pub(crate) fn ensure_group_writable(layout: &Layout, group_id: i32) -> Result<()> {
    let status = layout.read_ha_status(group_id)?;
    if status.destroyed_count > 0 {
        return Err(StoreError::PreconditionFailed(format!(
            "HA group {group_id} is degraded ({} member(s) lost); writes are disabled",
            status.destroyed_count
        )));
    }
    Ok(())
}

// =============================================================================
// Destruction & Reaping
// =============================================================================

/// Destroy an HA member: mark its header, bump the group's destruction
/// count, and reap the whole group on the second loss.
pub(crate) fn destroy_member(layout: &Layout, header: &StoreHeader, group_id: i32) -> Result<()> {
    let mut marked = header.clone();
    marked.destroyed = true;
    layout.write_header(header.store_id, &marked)?;

    let mut status = layout.read_ha_status(group_id)?;
    status.destroyed_count += 1;

    if status.destroyed_count <= 1 {
        layout.write_ha_status(group_id, &status)?;
        tracing::info!(
            store_id = header.store_id,
            group_id,
            destroyed_count = status.destroyed_count,
            "marked HA member destroyed"
        );
        return Ok(());
    }

    reap_group(layout, &status)
}

/// Second loss: release every member from the group, remove destroyed
/// members' directories, then remove the group directory itself.
fn reap_group(layout: &Layout, status: &HaGroupStatus) -> Result<()> {
    for &member in &status.store_ids {
        let member_header = match layout.read_header(member) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(member, error = %e, "skipping unreadable member during reap");
                continue;
            }
        };

        let mut released = member_header.clone();
        released.role = StoreRole::Standalone;
        if let Err(e) = layout.write_header(member, &released) {
            tracing::warn!(member, error = %e, "failed to release member header during reap");
        }

        if member_header.destroyed {
            fs::remove_dir_all(layout.store_dir(member))?;
        }
    }

    fs::remove_dir_all(layout.group_dir(status.group_id))?;
    tracing::info!(group_id = status.group_id, "reaped HA group");
    Ok(())
}
