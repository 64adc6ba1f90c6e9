//! Error types for hearty-store
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Input Validation
    // -------------------------------------------------------------------------
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large (max {max} bytes): payload is {size} bytes")]
    PayloadTooLarge { size: u64, max: u64 },

    // -------------------------------------------------------------------------
    // Preconditions
    // -------------------------------------------------------------------------
    #[error("{0}")]
    PreconditionFailed(String),

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------
    #[error("Store {0} does not exist")]
    StoreNotFound(i32),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("No free blocks available")]
    NoFreeBlocks,

    // -------------------------------------------------------------------------
    // Degraded Reads
    // -------------------------------------------------------------------------
    #[error("Reconstruction failed: {0}")]
    Reconstruction(String),

    // -------------------------------------------------------------------------
    // On-Disk Format
    // -------------------------------------------------------------------------
    #[error("Corrupt metadata: {0}")]
    CorruptMetadata(String),
}
