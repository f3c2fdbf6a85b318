//! Storage error types

use postbox_protocol::SwarmAddress;
use thiserror::Error;

/// Storage and directory errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A different chunk already occupies this address
    #[error("Conflict: chunk at {0} already holds different content")]
    Conflict(SwarmAddress),

    #[error("Storage full (max {max} bytes)")]
    StorageFull { max: usize },

    #[error("Value too large: {size} bytes (max {max})")]
    ValueTooLarge { size: usize, max: usize },

    #[error("Too many keys (max {0})")]
    TooManyKeys(usize),

    /// Something is stored at this address but it is not a valid chunk
    #[error("Corrupt chunk at {address}: {reason}")]
    Corrupt {
        address: SwarmAddress,
        reason: String,
    },

    #[error("Invalid chunk: {0}")]
    Protocol(#[from] postbox_protocol::ProtocolError),

    /// The backing service could not be reached
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;
