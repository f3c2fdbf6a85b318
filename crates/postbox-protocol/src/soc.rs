//! Single-owner chunks
//!
//! A single-owner chunk lives at `keccak256(identifier || owner)`. Only the
//! owner's key can produce a valid signature for it, so storage nodes can
//! reject forgeries without any other context.

use crate::error::{ProtocolError, Result};
use crate::types::{EthAddress, Identifier, SwarmAddress};
use postbox_crypto::signing::{recover_signer, sign_digest, SIGNATURE_SIZE};
use postbox_crypto::{keccak256, keccak256_concat, SecretKey};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

/// Maximum payload carried by one chunk
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Network address of the chunk `owner` publishes under `identifier`
pub fn soc_address(identifier: &Identifier, owner: &EthAddress) -> SwarmAddress {
    SwarmAddress::from_bytes(keccak256_concat(&[identifier.as_bytes(), owner.as_bytes()]))
}

/// Digest the owner signs: keccak256(identifier || keccak256(payload))
fn signing_digest(identifier: &Identifier, payload: &[u8]) -> [u8; 32] {
    keccak256_concat(&[identifier.as_bytes(), &keccak256(payload)])
}

/// A signed record published under an owner's key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleOwnerChunk {
    pub identifier: Identifier,

    pub owner: EthAddress,

    #[serde(with = "postbox_crypto::hex_serde")]
    pub payload: Vec<u8>,

    /// Recoverable ECDSA signature (r || s || v)
    #[serde(with = "BigArray")]
    pub signature: [u8; SIGNATURE_SIZE],
}

impl SingleOwnerChunk {
    /// Sign `payload` under `identifier` with the owner's key
    pub fn sign(secret: &SecretKey, identifier: Identifier, payload: Vec<u8>) -> Result<Self> {
        check_payload_size(&payload)?;

        let owner = EthAddress::from_public_key(&secret.public_key());
        let signature = sign_digest(secret, &signing_digest(&identifier, &payload))?;

        Ok(SingleOwnerChunk {
            identifier,
            owner,
            payload,
            signature,
        })
    }

    /// Address this chunk occupies
    pub fn address(&self) -> SwarmAddress {
        soc_address(&self.identifier, &self.owner)
    }

    /// Check the payload size and that the signature was made by `owner`
    pub fn verify(&self) -> Result<()> {
        check_payload_size(&self.payload)?;

        let digest = signing_digest(&self.identifier, &self.payload);
        let signer =
            recover_signer(&digest, &self.signature).map_err(|_| ProtocolError::InvalidSignature)?;

        if EthAddress::from_public_key(&signer) != self.owner {
            return Err(ProtocolError::OwnerMismatch);
        }
        Ok(())
    }
}

fn check_payload_size(payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postbox_crypto::KeyPair;

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let id = Identifier::from_bytes([3u8; 32]);

        let chunk = SingleOwnerChunk::sign(kp.secret_key(), id, b"payload".to_vec()).unwrap();
        assert_eq!(chunk.owner, EthAddress::from_public_key(kp.public_key()));
        assert_eq!(chunk.address(), soc_address(&id, &chunk.owner));
        chunk.verify().unwrap();
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let kp = KeyPair::generate();
        let mut chunk =
            SingleOwnerChunk::sign(kp.secret_key(), Identifier::from_bytes([1u8; 32]), b"a".to_vec())
                .unwrap();
        chunk.payload = b"b".to_vec();

        assert!(chunk.verify().is_err());
    }

    #[test]
    fn test_foreign_owner_rejected() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let mut chunk =
            SingleOwnerChunk::sign(kp.secret_key(), Identifier::from_bytes([1u8; 32]), b"a".to_vec())
                .unwrap();
        chunk.owner = EthAddress::from_public_key(other.public_key());

        assert_eq!(chunk.verify().unwrap_err(), ProtocolError::OwnerMismatch);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let kp = KeyPair::generate();
        let result = SingleOwnerChunk::sign(
            kp.secret_key(),
            Identifier::from_bytes([0u8; 32]),
            vec![0u8; MAX_PAYLOAD_SIZE + 1],
        );
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_address_depends_on_owner() {
        let id = Identifier::from_bytes([9u8; 32]);
        let a = EthAddress::from_bytes([1u8; 20]);
        let b = EthAddress::from_bytes([2u8; 20]);
        assert_ne!(soc_address(&id, &a), soc_address(&id, &b));
    }

    #[test]
    fn test_json_roundtrip() {
        let kp = KeyPair::generate();
        let chunk =
            SingleOwnerChunk::sign(kp.secret_key(), Identifier::from_bytes([4u8; 32]), b"z".to_vec())
                .unwrap();

        let json = serde_json::to_vec(&chunk).unwrap();
        let parsed: SingleOwnerChunk = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed, chunk);
        parsed.verify().unwrap();
    }
}
