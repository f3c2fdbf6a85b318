//! Core protocol types

use crate::error::{ProtocolError, Result};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use postbox_crypto::{keccak256, PublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Size of identifiers and network addresses in bytes (256 bits)
pub const ADDRESS_SIZE: usize = 32;

/// Size of an owner address in bytes
pub const ETH_ADDRESS_SIZE: usize = 20;

/// Highest proximity order the network distinguishes
pub const MAX_PO: u8 = 31;

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(s.trim().trim_start_matches("0x"))
        .map_err(|e| ProtocolError::InvalidHex(e.to_string()))?;

    if bytes.len() != N {
        return Err(ProtocolError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }

    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Fixed-size byte strings that travel as hex in JSON and config files
macro_rules! hex_bytes_type {
    ($(#[$meta:meta])* $name:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $size]);

        impl $name {
            pub fn from_bytes(bytes: [u8; $size]) -> Self {
                $name(bytes)
            }

            /// Copy from a slice of exactly the right length
            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                if bytes.len() != $size {
                    return Err(ProtocolError::InvalidLength {
                        expected: $size,
                        actual: bytes.len(),
                    });
                }
                let mut arr = [0u8; $size];
                arr.copy_from_slice(bytes);
                Ok($name(arr))
            }

            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex, with or without a `0x` prefix
            pub fn from_hex(s: &str) -> Result<Self> {
                decode_fixed::<$size>(s).map($name)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                $name::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_bytes_type!(
    /// Identifier under which an owner publishes a single-owner chunk
    Identifier,
    ADDRESS_SIZE
);

hex_bytes_type!(
    /// Address of a chunk in the storage network
    SwarmAddress,
    ADDRESS_SIZE
);

hex_bytes_type!(
    /// Overlay address of a storage node; inboxes are mined close to one
    Overlay,
    ADDRESS_SIZE
);

hex_bytes_type!(
    /// Chunk owner: last 20 bytes of keccak256 over the uncompressed public key
    EthAddress,
    ETH_ADDRESS_SIZE
);

impl EthAddress {
    /// Derive the owner address of a public key
    pub fn from_public_key(public: &PublicKey) -> Self {
        let point = public.to_encoded_point(false);
        // Skip the 0x04 SEC1 tag
        let hash = keccak256(&point.as_bytes()[1..]);

        let mut arr = [0u8; ETH_ADDRESS_SIZE];
        arr.copy_from_slice(&hash[ADDRESS_SIZE - ETH_ADDRESS_SIZE..]);
        EthAddress(arr)
    }
}

impl SwarmAddress {
    /// Proximity order to an overlay
    pub fn proximity(&self, overlay: &Overlay) -> u8 {
        proximity(&self.0, overlay.as_bytes())
    }
}

/// Number of leading bits `a` and `b` share, capped at [`MAX_PO`]
pub fn proximity(a: &[u8], b: &[u8]) -> u8 {
    let mut po: u32 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        let diff = x ^ y;
        if diff == 0 {
            po += 8;
            if po >= MAX_PO as u32 {
                return MAX_PO;
            }
        } else {
            po += diff.leading_zeros();
            break;
        }
    }
    po.min(MAX_PO as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use postbox_crypto::KeyPair;

    #[test]
    fn test_hex_roundtrip() {
        let id = Identifier::from_bytes([0xab; ADDRESS_SIZE]);
        assert_eq!(Identifier::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(Identifier::from_hex(&format!("0x{}", id.to_hex())).unwrap(), id);
    }

    #[test]
    fn test_from_hex_wrong_length() {
        assert_eq!(
            Overlay::from_hex("abcd").unwrap_err(),
            ProtocolError::InvalidLength {
                expected: ADDRESS_SIZE,
                actual: 2
            }
        );
        assert!(matches!(
            Overlay::from_hex("zz"),
            Err(ProtocolError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = EthAddress::from_bytes([0x11; ETH_ADDRESS_SIZE]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "11".repeat(ETH_ADDRESS_SIZE)));

        let parsed: EthAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_eth_address_known_vector() {
        // Private key 1 maps to the well-known address 0x7e5f...bdf
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let kp = KeyPair::from_secret_bytes(&secret).unwrap();

        let addr = EthAddress::from_public_key(kp.public_key());
        assert_eq!(addr.to_hex(), "7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_proximity() {
        let zero = [0u8; 32];
        assert_eq!(proximity(&zero, &zero), MAX_PO);

        let mut b = [0u8; 32];
        b[0] = 0b1000_0000;
        assert_eq!(proximity(&zero, &b), 0);

        b[0] = 0b0000_0001;
        assert_eq!(proximity(&zero, &b), 7);

        let mut c = [0u8; 32];
        c[1] = 0b0010_0000;
        assert_eq!(proximity(&zero, &c), 10);
    }
}
