//! Postbox Cryptography
//!
//! Cipher suite for the inbox protocol:
//! - secp256k1 key pairs and ECDH key agreement (SHA-256 of the shared x-coordinate)
//! - AES-256-GCM authenticated encryption with a fresh 96-bit IV per call
//! - Ephemeral-key envelopes addressed to a recipient's long-term public key
//! - File encryption with an embedded metadata header
//! - Keccak-256 and recoverable ECDSA for single-owner chunk addressing
//!
//! ## Usage
//!
//! ```rust,ignore
//! let recipient = KeyPair::generate();
//!
//! let payload = encrypt_file(b"hello", "hello.txt", "text/plain", recipient.public_key())?;
//! let file = decrypt_file(&payload, recipient.secret_key())?;
//! assert_eq!(file.data, b"hello");
//! ```

pub mod envelope;
pub mod error;
pub mod file;
pub mod hash;
pub mod hex_serde;
pub mod keys;
pub mod signing;
pub mod symmetric;

pub use envelope::{open, seal, EncryptedPayload};
pub use error::{CryptoError, Result};
pub use file::{decrypt_file, encrypt_file, DecryptedFile, FileMetadata};
pub use hash::{keccak256, keccak256_concat};
pub use keys::{
    compress_public_key, derive_shared_secret, parse_public_key, parse_public_key_hex, KeyPair,
    SharedSecret, PUBLIC_KEY_SIZE,
};
pub use symmetric::{decrypt, encrypt, Sealed, IV_SIZE};

pub use k256::{PublicKey, SecretKey};
