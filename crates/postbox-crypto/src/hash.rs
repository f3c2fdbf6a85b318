//! Keccak-256 hashing

use sha3::{Digest, Keccak256};

/// Size of a Keccak-256 digest in bytes
pub const HASH_SIZE: usize = 32;

/// Hash a single byte slice
pub fn keccak256(data: &[u8]) -> [u8; HASH_SIZE] {
    Keccak256::digest(data).into()
}

/// Hash the concatenation of several byte slices without allocating
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        // Well-known Keccak-256 digest of the empty string
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_concat_matches_single() {
        let joined = keccak256(b"helloworld");
        let parts = keccak256_concat(&[b"hello", b"world"]);
        assert_eq!(joined, parts);
    }
}
