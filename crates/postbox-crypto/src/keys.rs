//! secp256k1 key pairs and ECDH key agreement
//!
//! Account keys and the one-time keys used for every encryption operation
//! are the same type. Ephemeral pairs are simply dropped after use.

use crate::error::{CryptoError, Result};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{ecdh, PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;

/// Size of a private scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Size of a SEC1 compressed public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 33;

/// Size of a derived shared secret in bytes
pub const SHARED_SECRET_SIZE: usize = 32;

/// A secp256k1 key pair
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new key pair from the OS entropy source
    pub fn generate() -> Self {
        Self::from_secret(SecretKey::random(&mut OsRng))
    }

    /// Build a key pair around an existing secret
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        KeyPair { secret, public }
    }

    /// Import a raw 32-byte private scalar
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: PRIVATE_KEY_SIZE,
                actual: bytes.len(),
            });
        }

        let secret = SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_secret(secret))
    }

    /// Import a hex-encoded private scalar (optional `0x` prefix)
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x"))?;
        Self::from_secret_bytes(&bytes)
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Raw private scalar
    pub fn secret_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.secret.to_bytes().into()
    }

    /// Compressed public key
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        compress_public_key(&self.public)
    }

    /// Export the private key as hex (for the local key file)
    pub fn export_secret_hex(&self) -> String {
        hex::encode(self.secret_bytes())
    }

    /// Export the compressed public key as hex
    pub fn export_public_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.export_public_hex())
            .finish_non_exhaustive()
    }
}

/// Encode a public key as a 33-byte compressed point
pub fn compress_public_key(public: &PublicKey) -> [u8; PUBLIC_KEY_SIZE] {
    let point = public.to_encoded_point(true);
    let mut out = [0u8; PUBLIC_KEY_SIZE];
    out.copy_from_slice(point.as_bytes());
    out
}

/// Parse a 33-byte compressed public key
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    if bytes.len() != PUBLIC_KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: PUBLIC_KEY_SIZE,
            actual: bytes.len(),
        });
    }

    PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Parse a hex-encoded compressed public key (optional `0x` prefix)
pub fn parse_public_key_hex(s: &str) -> Result<PublicKey> {
    let bytes = hex::decode(s.trim().trim_start_matches("0x"))?;
    parse_public_key(&bytes)
}

/// Symmetric key produced by ECDH
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl SharedSecret {
    pub fn from_bytes(bytes: [u8; SHARED_SECRET_SIZE]) -> Self {
        SharedSecret(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(..)")
    }
}

/// Derive a symmetric key from our private key and a peer's public key
///
/// The ECDH point is reduced to its x-coordinate (the SEC1 prefix byte is
/// dropped) and hashed with SHA-256.
pub fn derive_shared_secret(secret: &SecretKey, peer: &PublicKey) -> SharedSecret {
    let shared = ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    let digest: [u8; SHARED_SECRET_SIZE] = Sha256::digest(shared.raw_secret_bytes()).into();
    SharedSecret(digest)
}
