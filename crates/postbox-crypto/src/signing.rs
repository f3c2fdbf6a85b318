//! Recoverable ECDSA signatures over 32-byte digests

use crate::error::{CryptoError, Result};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::{PublicKey, SecretKey};

/// r || s || v
pub const SIGNATURE_SIZE: usize = 65;

/// Sign a precomputed digest, returning a 65-byte recoverable signature
pub fn sign_digest(secret: &SecretKey, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_SIZE]> {
    let signing_key = SigningKey::from(secret);
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest)
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let mut out = [0u8; SIGNATURE_SIZE];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte();
    Ok(out)
}

/// Recover the public key that produced `signature` over `digest`
pub fn recover_signer(digest: &[u8; 32], signature: &[u8]) -> Result<PublicKey> {
    if signature.len() != SIGNATURE_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: SIGNATURE_SIZE,
            actual: signature.len(),
        });
    }

    let sig = Signature::from_slice(&signature[..64]).map_err(|_| CryptoError::InvalidPublicKey)?;
    let recovery_id =
        RecoveryId::from_byte(signature[64]).ok_or(CryptoError::InvalidPublicKey)?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    Ok(PublicKey::from(&verifying_key))
}
