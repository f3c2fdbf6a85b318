//! Public inbox coordinates

use crate::error::{InboxError, Result};
use postbox_crypto::PublicKey;
use postbox_protocol::{Identifier, Overlay, MAX_PO};
use serde::{Deserialize, Serialize};

/// Everything a sender needs to write into an inbox
///
/// Immutable once published. The inbox signing key is re-derived from these
/// fields by every party; nothing here is secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxParams {
    /// Storage neighborhood the inbox was mined for
    pub target_overlay: Overlay,

    /// Root identifier hashed with each slot index
    pub base_identifier: Identifier,

    /// Leading bits slot 0 shares with `target_overlay`
    pub proximity: u8,

    /// Recipient's long-term key; required for identified sends
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "public_key_hex"
    )]
    pub recipient_public_key: Option<PublicKey>,
}

impl InboxParams {
    pub fn validate(&self) -> Result<()> {
        validate_proximity(self.proximity)
    }
}

pub(crate) fn validate_proximity(proximity: u8) -> Result<()> {
    if proximity > MAX_PO {
        return Err(InboxError::InvalidParams(format!(
            "proximity {} exceeds maximum {}",
            proximity, MAX_PO
        )));
    }
    Ok(())
}

mod public_key_hex {
    use postbox_crypto::{compress_public_key, parse_public_key_hex, PublicKey};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(key: &Option<PublicKey>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match key {
            Some(key) => serializer.serialize_str(&hex::encode(compress_public_key(key))),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PublicKey>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| parse_public_key_hex(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
