//! AES-256-GCM authenticated encryption

use crate::error::{CryptoError, Result};
use crate::keys::SharedSecret;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const IV_SIZE: usize = 12;

/// Size of the authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// Output of a single encryption call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Ciphertext with the authentication tag appended
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_SIZE],
}

fn cipher(key: &SharedSecret) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::EncryptionFailed)
}

/// Encrypt under a fresh random IV
pub fn encrypt(plaintext: &[u8], key: &SharedSecret) -> Result<Sealed> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = cipher(key)?
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(Sealed { ciphertext, iv })
}

/// Decrypt and authenticate
pub fn decrypt(ciphertext: &[u8], iv: &[u8], key: &SharedSecret) -> Result<Vec<u8>> {
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidIvLength {
            expected: IV_SIZE,
            actual: iv.len(),
        });
    }
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }

    cipher(key)?
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SharedSecret {
        SharedSecret::from_bytes([byte; 32])
    }

    #[test]
    fn test_roundtrip() {
        let k = key(7);
        let sealed = encrypt(b"attack at dawn", &k).unwrap();
        assert_eq!(sealed.ciphertext.len(), 14 + TAG_SIZE);

        let plaintext = decrypt(&sealed.ciphertext, &sealed.iv, &k).unwrap();
        assert_eq!(plaintext, b"attack at dawn");
    }

    #[test]
    fn test_empty_plaintext() {
        let k = key(1);
        let sealed = encrypt(b"", &k).unwrap();
        assert_eq!(decrypt(&sealed.ciphertext, &sealed.iv, &k).unwrap(), b"");
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let k = key(3);
        let a = encrypt(b"same", &k).unwrap();
        let b = encrypt(b"same", &k).unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = encrypt(b"secret", &key(1)).unwrap();
        assert_eq!(
            decrypt(&sealed.ciphertext, &sealed.iv, &key(2)).unwrap_err(),
            CryptoError::AuthenticationFailed
        );
    }

    #[test]
    fn test_tampering_detected() {
        let k = key(9);
        let sealed = encrypt(b"do not touch", &k).unwrap();

        let mut ciphertext = sealed.ciphertext.clone();
        ciphertext[0] ^= 0x01;
        assert_eq!(
            decrypt(&ciphertext, &sealed.iv, &k).unwrap_err(),
            CryptoError::AuthenticationFailed
        );

        let mut iv = sealed.iv;
        iv[11] ^= 0x80;
        assert_eq!(
            decrypt(&sealed.ciphertext, &iv, &k).unwrap_err(),
            CryptoError::AuthenticationFailed
        );
    }

    #[test]
    fn test_bad_iv_length() {
        let k = key(4);
        let sealed = encrypt(b"x", &k).unwrap();
        assert!(matches!(
            decrypt(&sealed.ciphertext, &sealed.iv[..8], &k),
            Err(CryptoError::InvalidIvLength { .. })
        ));
    }

    #[test]
    fn test_truncated_ciphertext() {
        let k = key(5);
        assert_eq!(
            decrypt(&[0u8; 4], &[0u8; IV_SIZE], &k).unwrap_err(),
            CryptoError::AuthenticationFailed
        );
    }
}
