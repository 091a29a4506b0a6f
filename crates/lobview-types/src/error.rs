//! Error types for the lobview snapshot decoder.
//!
//! All errors use the `LV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Malformed input (short buffers, bad lengths, bad identifiers)
//! - 2xx: Corrupted allocator state
//! - 3xx: Lookups
//! - 4xx: Unsupported record shapes
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::Pubkey;

/// Central error enum for all lobview operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobviewError {
    // =================================================================
    // Malformed Input (1xx)
    // =================================================================
    /// The buffer ended before a declared field or region.
    #[error("LV_ERR_100: Buffer too short for {region}: need {needed} bytes, have {available}")]
    BufferTooShort {
        region: &'static str,
        needed: usize,
        available: usize,
    },

    /// A region did not span exactly the size derived from the header.
    #[error("LV_ERR_101: Region length mismatch for {region}: expected {expected} bytes, got {actual}")]
    RegionLengthMismatch {
        region: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A header field holds a value that makes the market unusable.
    #[error("LV_ERR_102: Invalid market header: {reason}")]
    InvalidHeader { reason: String },

    /// A public key string could not be parsed.
    #[error("LV_ERR_103: Invalid public key: {0}")]
    InvalidPubkey(String),

    // =================================================================
    // Corrupted Allocator State (2xx)
    // =================================================================
    /// Following the free list took more steps than there are slots.
    #[error("LV_ERR_200: Free list of {region} did not terminate within {bump_index} steps")]
    FreeListCycle { region: &'static str, bump_index: u32 },

    /// The allocator claims more slots than the region holds.
    #[error("LV_ERR_201: Bump index {bump_index} exceeds capacity {capacity} of {region}")]
    BumpIndexOutOfRange {
        region: &'static str,
        bump_index: u32,
        capacity: u64,
    },

    // =================================================================
    // Lookups (3xx)
    // =================================================================
    /// No trader is registered at this index.
    #[error("LV_ERR_300: Trader index not found: {0}")]
    TraderIndexNotFound(u64),

    /// No trader is registered under this key.
    #[error("LV_ERR_301: Trader not found: {0}")]
    TraderNotFound(Pubkey),

    // =================================================================
    // Unsupported Record Shapes (4xx)
    // =================================================================
    /// A record size matches none of the known layout versions.
    #[error("LV_ERR_400: Unsupported {record} record size: {size} bytes")]
    UnsupportedRecordShape { record: &'static str, size: usize },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("LV_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("LV_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("LV_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (reading snapshots or config from disk).
    #[error("LV_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LobviewError>;

impl From<std::io::Error> for LobviewError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LobviewError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
