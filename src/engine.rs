//! Engine Module
//!
//! The coordinating facade: one value owning the filesystem layout and
//! exposing the seven store operations.
//!
//! ## Responsibilities
//! - Load and validate store headers before every operation
//! - Dispatch destroy by redundancy role
//! - Trigger the redundancy side-effects of a put (mirror replay, parity
//!   update), downgrading their failures to warnings; the local put
//!   stands either way

use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::layout::{Layout, StoreHeader, StoreRole};
use crate::store::{self, StoreSummary};
use crate::{ha, mirror};

/// The storage engine facade
pub struct Engine {
    layout: Layout,
}

impl Engine {
    /// Create an engine over the configured base directory
    pub fn new(config: Config) -> Self {
        Self {
            layout: Layout::new(config.base_dir),
        }
    }

    /// Initialize a fresh store with the given id
    pub fn init(&self, store_id: i32) -> Result<()> {
        store::init(&self.layout, store_id)
    }

    /// Store one payload file, returning the generated object id.
    ///
    /// The payload must fit in a single block. On a mirrored store the
    /// partner is resynced afterwards; on an HA member the group parity
    /// is updated. Both side-effects are logged and dropped on failure.
    pub fn put(&self, store_id: i32, payload_path: &Path) -> Result<String> {
        let header = self.require_header(store_id)?;
        if header.destroyed {
            return Err(StoreError::PreconditionFailed(format!(
                "Store {store_id} is destroyed"
            )));
        }
        if let StoreRole::HaMember { group } = header.role {
            ha::ensure_group_writable(&self.layout, group)?;
        }

        let outcome = store::put(&self.layout, header, payload_path)?;

        match outcome.header.role {
            StoreRole::MirrorSource { .. } | StoreRole::MirrorCopy { .. } => {
                if let Err(e) = mirror::sync_with_partner(&self.layout, &outcome.header) {
                    tracing::warn!(store_id, error = %e, "mirror sync failed after put");
                }
            }
            StoreRole::HaMember { group } => {
                let old = outcome.old_prefix.as_deref().unwrap_or(&[]);
                if let Err(e) = ha::update_parity_block(
                    &self.layout,
                    group,
                    outcome.block,
                    old,
                    &outcome.payload,
                ) {
                    tracing::warn!(store_id, group, error = %e, "parity update failed after put");
                }
            }
            StoreRole::Standalone => {}
        }

        Ok(outcome.object_id)
    }

    /// Fetch an object's bytes.
    ///
    /// A destroyed HA member is served by reconstruction, which returns
    /// the full block image rather than the recorded payload length.
    pub fn get(&self, store_id: i32, object_id: &str) -> Result<Vec<u8>> {
        let header = self.require_header(store_id)?;
        if header.destroyed {
            return ha::degraded_get(&self.layout, &header, object_id);
        }
        store::get(&self.layout, &header, object_id)
    }

    /// Summaries of every store under the base directory, sorted by id
    pub fn list(&self) -> Result<Vec<StoreSummary>> {
        store::list(&self.layout)
    }

    /// Create a mirror copy of a store, returning the replica's id
    pub fn replicate(&self, source_id: i32) -> Result<i32> {
        mirror::replicate(&self.layout, source_id)
    }

    /// Form an HA group from at least two stores, returning the group id
    pub fn create_ha_group(&self, member_ids: &[i32]) -> Result<i32> {
        ha::create_group(&self.layout, member_ids)
    }

    /// Destroy a store.
    ///
    /// Standalone stores are removed outright. Destroying either side of
    /// a mirror pair removes both directories. Destroying an HA member
    /// marks it and updates the group's bookkeeping; the second loss in a
    /// group reaps the group and every destroyed member.
    pub fn destroy(&self, store_id: i32) -> Result<()> {
        let header = self.require_header(store_id)?;
        if header.destroyed {
            return Err(StoreError::PreconditionFailed(format!(
                "Store {store_id} is already destroyed"
            )));
        }

        match header.role {
            StoreRole::HaMember { group } => ha::destroy_member(&self.layout, &header, group),
            StoreRole::MirrorSource { .. } | StoreRole::MirrorCopy { .. } => {
                for dir in mirror::removal_set(&self.layout, &header) {
                    fs::remove_dir_all(dir)?;
                }
                tracing::info!(store_id, "destroyed mirror pair");
                Ok(())
            }
            StoreRole::Standalone => {
                fs::remove_dir_all(self.layout.store_dir(store_id))?;
                tracing::info!(store_id, "destroyed store");
                Ok(())
            }
        }
    }

    fn require_header(&self, store_id: i32) -> Result<StoreHeader> {
        if !self.layout.store_exists(store_id) {
            return Err(StoreError::StoreNotFound(store_id));
        }
        self.layout.read_header(store_id)
    }
}
