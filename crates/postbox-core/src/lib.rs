//! Postbox Core Library
//!
//! Ties together the Postbox components:
//! - Cryptography (secp256k1 ECDH, AES-GCM, file envelopes)
//! - Protocol (identifiers, single-owner chunks, inbox records)
//! - Store (chunk store and directory interfaces)
//! - Inbox (mining, slot discovery, writing and polling)

pub use postbox_crypto as crypto;
pub use postbox_inbox as inbox;
pub use postbox_protocol as protocol;
pub use postbox_store as store;

pub use crypto::CryptoError;
pub use inbox::InboxError;
pub use protocol::ProtocolError;
pub use store::StoreError;
