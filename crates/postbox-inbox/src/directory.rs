//! Publishing and resolving inbox coordinates by name
//!
//! Each field is a separate directory record and the directory offers no
//! transaction across them, so a reader can see a partial set. Anything
//! short of the three required fields is reported as not configured.

use crate::error::{InboxError, Result};
use crate::miner::{MinedInbox, NeighborhoodMiner};
use crate::params::InboxParams;
use postbox_crypto::{compress_public_key, parse_public_key_hex, PublicKey};
use postbox_protocol::{Identifier, Overlay};
use postbox_store::Directory;
use tracing::{debug, info};

pub const KEY_OVERLAY: &str = "postbox.overlay";
pub const KEY_BASE_IDENTIFIER: &str = "postbox.base-identifier";
pub const KEY_PROXIMITY: &str = "postbox.proximity";
pub const KEY_PUBLIC_KEY: &str = "postbox.public-key";

/// Publish `params` under `name`
pub async fn publish_inbox(directory: &dyn Directory, name: &str, params: &InboxParams) -> Result<()> {
    params.validate()?;

    directory
        .publish(name, KEY_OVERLAY, &params.target_overlay.to_hex())
        .await?;
    directory
        .publish(name, KEY_BASE_IDENTIFIER, &params.base_identifier.to_hex())
        .await?;
    directory
        .publish(name, KEY_PROXIMITY, &params.proximity.to_string())
        .await?;
    if let Some(key) = &params.recipient_public_key {
        directory
            .publish(name, KEY_PUBLIC_KEY, &hex::encode(compress_public_key(key)))
            .await?;
    }

    info!(name, "published inbox");
    Ok(())
}

/// Resolve the inbox published under `name`
///
/// `RecipientNotFound` if nothing is published, `InboxNotConfigured` if
/// the overlay, base identifier or proximity is missing. The public key is
/// optional; without it only anonymous sends are possible.
pub async fn resolve_inbox(directory: &dyn Directory, name: &str) -> Result<InboxParams> {
    let overlay = directory.lookup(name, KEY_OVERLAY).await?;
    let base = directory.lookup(name, KEY_BASE_IDENTIFIER).await?;
    let proximity = directory.lookup(name, KEY_PROXIMITY).await?;
    let public_key = directory.lookup(name, KEY_PUBLIC_KEY).await?;

    let (overlay, base, proximity) = match (overlay, base, proximity) {
        (Some(o), Some(b), Some(p)) => (o, b, p),
        (None, None, None) if public_key.is_none() => {
            return Err(InboxError::RecipientNotFound(name.to_string()))
        }
        _ => {
            debug!(name, "partial inbox publication");
            return Err(InboxError::InboxNotConfigured(name.to_string()));
        }
    };

    let params = InboxParams {
        target_overlay: Overlay::from_hex(&overlay)
            .map_err(|e| invalid(name, KEY_OVERLAY, e))?,
        base_identifier: Identifier::from_hex(&base)
            .map_err(|e| invalid(name, KEY_BASE_IDENTIFIER, e))?,
        proximity: proximity
            .trim()
            .parse()
            .map_err(|e| invalid(name, KEY_PROXIMITY, e))?,
        recipient_public_key: public_key
            .map(|key| parse_public_key_hex(&key))
            .transpose()
            .map_err(|e| invalid(name, KEY_PUBLIC_KEY, e))?,
    };
    params.validate()?;
    Ok(params)
}

fn invalid(name: &str, key: &str, error: impl std::fmt::Display) -> InboxError {
    InboxError::InvalidParams(format!("{} for {}: {}", key, name, error))
}

/// Mine an inbox for `name` and publish it
///
/// Mining runs on the blocking pool. Nothing is published unless mining
/// succeeds.
pub async fn setup_inbox(
    directory: &dyn Directory,
    name: &str,
    miner: &NeighborhoodMiner,
    target: Overlay,
    proximity: u8,
    recipient: Option<PublicKey>,
) -> Result<MinedInbox> {
    let miner = miner.clone();
    let mined = tokio::task::spawn_blocking(move || miner.mine(target, proximity, recipient))
        .await
        .map_err(|e| InboxError::Task(e.to_string()))??;

    publish_inbox(directory, name, &mined.params).await?;
    Ok(mined)
}
