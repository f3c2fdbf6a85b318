//! Slot identifiers
//!
//! `indexed_identifier(base, i) = keccak256(base || utf8(decimal(i)))`.
//! Writers and readers must agree on this byte-for-byte, so the index is
//! hashed as its decimal string, not as an integer encoding.

use crate::types::Identifier;
use postbox_crypto::keccak256_concat;

/// Identifier of slot `index` within the inbox rooted at `base`
pub fn indexed_identifier(base: &Identifier, index: u64) -> Identifier {
    let index = index.to_string();
    Identifier::from_bytes(keccak256_concat(&[base.as_bytes(), index.as_bytes()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use postbox_crypto::keccak256;
    use std::collections::HashSet;

    #[test]
    fn test_matches_manual_concatenation() {
        let base = Identifier::from_bytes([7u8; 32]);

        let mut input = base.as_bytes().to_vec();
        input.extend_from_slice(b"42");
        assert_eq!(indexed_identifier(&base, 42).as_bytes(), &keccak256(&input));
    }

    #[test]
    fn test_deterministic() {
        let base = Identifier::from_bytes([1u8; 32]);
        assert_eq!(indexed_identifier(&base, 5), indexed_identifier(&base, 5));
        assert_ne!(indexed_identifier(&base, 5), indexed_identifier(&base, 6));
    }

    #[test]
    fn test_no_collisions_over_10k_indices() {
        let base = Identifier::from_bytes([0x5a; 32]);
        let ids: HashSet<Identifier> = (0..10_000).map(|i| indexed_identifier(&base, i)).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_base_separates_inboxes() {
        let a = Identifier::from_bytes([1u8; 32]);
        let b = Identifier::from_bytes([2u8; 32]);
        assert_ne!(indexed_identifier(&a, 0), indexed_identifier(&b, 0));
    }
}
