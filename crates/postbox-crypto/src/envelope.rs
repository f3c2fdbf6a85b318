//! Ephemeral-key envelopes
//!
//! Every sealed payload carries its own one-time public key. The recipient
//! combines it with their long-term private key to rebuild the shared
//! secret; the sender's ephemeral private key is dropped as soon as
//! `seal` returns.

use crate::error::Result;
use crate::keys::{derive_shared_secret, parse_public_key, KeyPair};
use crate::symmetric::{decrypt, encrypt};
use k256::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

/// Ciphertext addressed to a single recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    /// 33-byte compressed ephemeral public key
    #[serde(with = "crate::hex_serde")]
    pub ephemeral_public_key: Vec<u8>,

    /// Ciphertext including the 16-byte GCM tag
    #[serde(with = "crate::hex_serde")]
    pub ciphertext: Vec<u8>,

    /// 12-byte IV
    #[serde(with = "crate::hex_serde")]
    pub iv: Vec<u8>,
}

/// Encrypt `plaintext` so that only the holder of `recipient`'s private key can read it
pub fn seal(plaintext: &[u8], recipient: &PublicKey) -> Result<EncryptedPayload> {
    let ephemeral = KeyPair::generate();
    let shared = derive_shared_secret(ephemeral.secret_key(), recipient);
    let sealed = encrypt(plaintext, &shared)?;

    Ok(EncryptedPayload {
        ephemeral_public_key: ephemeral.public_key_bytes().to_vec(),
        ciphertext: sealed.ciphertext,
        iv: sealed.iv.to_vec(),
    })
}

/// Decrypt a payload sealed to our public key
pub fn open(payload: &EncryptedPayload, secret: &SecretKey) -> Result<Vec<u8>> {
    let ephemeral = parse_public_key(&payload.ephemeral_public_key)?;
    let shared = derive_shared_secret(secret, &ephemeral);
    decrypt(&payload.ciphertext, &payload.iv, &shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;
    use crate::keys::PUBLIC_KEY_SIZE;
    use crate::symmetric::IV_SIZE;

    #[test]
    fn test_seal_open() {
        let recipient = KeyPair::generate();
        let payload = seal(b"hello inbox", recipient.public_key()).unwrap();

        assert_eq!(payload.ephemeral_public_key.len(), PUBLIC_KEY_SIZE);
        assert_eq!(payload.iv.len(), IV_SIZE);
        assert_eq!(open(&payload, recipient.secret_key()).unwrap(), b"hello inbox");
    }

    #[test]
    fn test_ephemeral_key_per_seal() {
        let recipient = KeyPair::generate();
        let a = seal(b"one", recipient.public_key()).unwrap();
        let b = seal(b"one", recipient.public_key()).unwrap();
        assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
        assert_ne!(a.ephemeral_public_key, recipient.public_key_bytes().to_vec());
    }

    #[test]
    fn test_other_recipient_cannot_open() {
        let recipient = KeyPair::generate();
        let eve = KeyPair::generate();
        let payload = seal(b"not for eve", recipient.public_key()).unwrap();

        assert_eq!(
            open(&payload, eve.secret_key()).unwrap_err(),
            CryptoError::AuthenticationFailed
        );
    }

    #[test]
    fn test_json_wire_format() {
        let recipient = KeyPair::generate();
        let payload = seal(b"wire", recipient.public_key()).unwrap();

        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        let ephemeral = json["ephemeralPublicKey"].as_str().unwrap();
        assert_eq!(ephemeral.len(), PUBLIC_KEY_SIZE * 2);
        assert_eq!(json["iv"].as_str().unwrap().len(), IV_SIZE * 2);
        assert!(json["ciphertext"].is_string());

        let parsed: EncryptedPayload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_corrupt_ephemeral_key() {
        let recipient = KeyPair::generate();
        let mut payload = seal(b"x", recipient.public_key()).unwrap();
        payload.ephemeral_public_key.truncate(10);

        assert!(matches!(
            open(&payload, recipient.secret_key()),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }
}
