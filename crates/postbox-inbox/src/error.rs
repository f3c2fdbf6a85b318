//! Inbox error types

use postbox_crypto::CryptoError;
use postbox_protocol::ProtocolError;
use postbox_store::StoreError;
use thiserror::Error;

/// Inbox protocol errors
///
/// An absent slot is never an error; readers return `None` / `SlotState::Empty`.
#[derive(Error, Debug)]
pub enum InboxError {
    /// Nothing is published under this name
    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    /// Some, but not all, inbox coordinates are published
    #[error("Recipient inbox not configured: {0}")]
    InboxNotConfigured(String),

    #[error("Invalid inbox parameters: {0}")]
    InvalidParams(String),

    #[error("Mining failed after {trials} trials at proximity {proximity}, consider lowering proximity")]
    MiningExhausted { trials: u64, proximity: u8 },

    #[error("Operation cancelled")]
    Cancelled,

    /// Every slot tried was taken by another writer
    #[error("Write collision: slots {first}..={last} were already taken")]
    WriteCollision { first: u64, last: u64 },

    #[error("Inbox full: all {0} slots are occupied")]
    InboxFull(u64),

    #[error("Sender metadata requires the recipient's public key")]
    MissingRecipientKey,

    #[error("Invalid payload reference: {0}")]
    InvalidReference(String),

    #[error("Payload not found: {0}")]
    PayloadNotFound(String),

    #[error("Decode error: {0}")]
    Decode(ProtocolError),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Network error: {0}")]
    Network(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl InboxError {
    /// Wrong key or tampered ciphertext
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            InboxError::Crypto(CryptoError::AuthenticationFailed)
                | InboxError::Decode(ProtocolError::Crypto(CryptoError::AuthenticationFailed))
        )
    }

    /// Storage was unreachable or the payload is not there yet; retrying
    /// later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InboxError::Network(_) | InboxError::PayloadNotFound(_) | InboxError::Task(_)
        )
    }
}

impl From<ProtocolError> for InboxError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::SerializationFailed(msg) => InboxError::Serialization(msg),
            other => InboxError::Decode(other),
        }
    }
}

/// Result type for inbox operations
pub type Result<T> = std::result::Result<T, InboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_failure_is_not_a_decode_error() {
        let err = InboxError::from(ProtocolError::SerializationFailed("bad meta".into()));
        assert!(matches!(err, InboxError::Serialization(ref msg) if msg == "bad meta"));

        let err = InboxError::from(ProtocolError::DeserializationFailed("bad json".into()));
        assert!(matches!(err, InboxError::Decode(_)));
    }

    #[test]
    fn test_authentication_failure_through_decode() {
        let err = InboxError::from(ProtocolError::Crypto(CryptoError::AuthenticationFailed));
        assert!(err.is_authentication_failure());
        assert!(!InboxError::PayloadNotFound("ab".into()).is_authentication_failure());
    }

    #[test]
    fn test_transient_errors() {
        assert!(InboxError::PayloadNotFound("ab".into()).is_transient());
        assert!(InboxError::Network(StoreError::Unavailable("down".into())).is_transient());
        assert!(!InboxError::Crypto(CryptoError::AuthenticationFailed).is_transient());
        assert!(!InboxError::InvalidReference("ref-1".into()).is_transient());
    }
}
