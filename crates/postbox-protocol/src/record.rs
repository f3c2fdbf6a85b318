//! Inbox record wire format
//!
//! Each occupied slot holds one JSON record:
//!
//! ```text
//! { "version": 1, "reference": "<hex>", "timestamp": <epoch-ms>,
//!   "encryptedMeta"?: { "ephemeralPublicKey": "<hex>", "ciphertext": "<hex>", "iv": "<hex>" } }
//! ```

use crate::error::{ProtocolError, Result};
use postbox_crypto::EncryptedPayload;
use serde::{Deserialize, Serialize};

/// Current record version
pub const RECORD_VERSION: u32 = 1;

/// A record written once into an inbox slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    pub version: u32,

    /// Pointer to the payload stored elsewhere
    pub reference: String,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Sender metadata sealed to the recipient; absent for anonymous sends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_meta: Option<EncryptedPayload>,
}

impl EncryptedRecord {
    /// Create a record stamped with the current time
    pub fn new(reference: impl Into<String>, encrypted_meta: Option<EncryptedPayload>) -> Self {
        EncryptedRecord {
            version: RECORD_VERSION,
            reference: reference.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            encrypted_meta,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.encrypted_meta.is_none()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::SerializationFailed(e.to_string()))
    }

    /// Parse and validate a slot payload
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let record: EncryptedRecord = serde_json::from_slice(bytes)
            .map_err(|e| ProtocolError::DeserializationFailed(e.to_string()))?;

        if record.version != RECORD_VERSION {
            return Err(ProtocolError::UnsupportedVersion(record.version));
        }
        if record.reference.is_empty() {
            return Err(ProtocolError::ValidationFailed(
                "empty reference".to_string(),
            ));
        }
        Ok(record)
    }
}

/// Sender identity, sealed into `encryptedMeta`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderMeta {
    /// Human-readable sender name (e.g. a directory name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Sender's compressed public key, hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Short note attached by the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SenderMeta {
    pub fn named(name: impl Into<String>) -> Self {
        SenderMeta {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::SerializationFailed(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::DeserializationFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postbox_crypto::{seal, KeyPair};

    #[test]
    fn test_anonymous_record_omits_meta() {
        let record = EncryptedRecord::new("ref-1", None);
        assert!(record.is_anonymous());

        let json: serde_json::Value = serde_json::from_slice(&record.encode().unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["reference"], "ref-1");
        assert!(json["timestamp"].is_i64());
        assert!(json.get("encryptedMeta").is_none());
    }

    #[test]
    fn test_identified_record_field_names() {
        let recipient = KeyPair::generate();
        let meta = seal(b"{}", recipient.public_key()).unwrap();
        let record = EncryptedRecord::new("abcd", Some(meta));

        let json: serde_json::Value = serde_json::from_slice(&record.encode().unwrap()).unwrap();
        let encrypted_meta = &json["encryptedMeta"];
        assert!(encrypted_meta["ephemeralPublicKey"].is_string());
        assert!(encrypted_meta["ciphertext"].is_string());
        assert!(encrypted_meta["iv"].is_string());

        assert_eq!(EncryptedRecord::decode(&record.encode().unwrap()).unwrap(), record);
    }

    #[test]
    fn test_decode_foreign_bytes() {
        assert!(matches!(
            EncryptedRecord::decode(b"\x00\x01garbage"),
            Err(ProtocolError::DeserializationFailed(_))
        ));
        assert!(matches!(
            EncryptedRecord::decode(br#"{"hello":"world"}"#),
            Err(ProtocolError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn test_decode_unknown_version() {
        let bytes = br#"{"version":2,"reference":"ab","timestamp":0}"#;
        assert_eq!(
            EncryptedRecord::decode(bytes).unwrap_err(),
            ProtocolError::UnsupportedVersion(2)
        );
    }

    #[test]
    fn test_decode_empty_reference() {
        let bytes = br#"{"version":1,"reference":"","timestamp":0}"#;
        assert!(matches!(
            EncryptedRecord::decode(bytes),
            Err(ProtocolError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_sender_meta_roundtrip() {
        let meta = SenderMeta {
            name: Some("alice".to_string()),
            public_key: None,
            message: Some("quarterly numbers".to_string()),
        };
        let bytes = meta.encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json.get("publicKey").is_none());

        assert_eq!(SenderMeta::decode(&bytes).unwrap(), meta);
    }
}
