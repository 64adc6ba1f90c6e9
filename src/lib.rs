//! # hearty-store
//!
//! A fixed-capacity object-storage substrate with:
//! - Stores of 1024 × 1 MiB blocks addressed by generated object ids
//! - Mirrored pairs (full-copy replication with write-through sync)
//! - HA groups (N ≥ 2 stores behind one XOR parity sibling)
//! - Degraded reads that rebuild a lost member's blocks from parity
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CLI (single shot)                       │
//! │       init · put · get · list · replicate · ha · destroy     │
//! └────────────────────────────┬─────────────────────────────────┘
//!                              │
//! ┌────────────────────────────▼─────────────────────────────────┐
//! │                           Engine                             │
//! │          (validation, role dispatch, side-effects)           │
//! └─────────┬────────────────────┬────────────────────┬──────────┘
//!           │                    │                    │
//!           ▼                    ▼                    ▼
//!    ┌────────────┐       ┌────────────┐       ┌────────────┐
//!    │   Store    │       │   Mirror   │       │     HA     │
//!    │  (blocks)  │       │   (pairs)  │       │  (parity)  │
//!    └──────┬─────┘       └──────┬─────┘       └──────┬─────┘
//!           │                    │                    │
//!           └────────────────────┼────────────────────┘
//!                                ▼
//!                        ┌──────────────┐
//!                        │    Layout    │
//!                        │ (paths + I/O)│
//!                        └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod layout;

mod ha;
mod mirror;
mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::Engine;
pub use error::{Result, StoreError};
pub use layout::{BLOCK_SIZE, NUM_BLOCKS};
pub use store::StoreSummary;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of hearty-store
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
