//! Error types for protocol operations

use postbox_crypto::CryptoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid chunk signature")]
    InvalidSignature,

    #[error("Chunk signer does not match owner")]
    OwnerMismatch,

    #[error("Unsupported record version: {0}")]
    UnsupportedVersion(u32),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
