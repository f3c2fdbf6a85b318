//! Inbox writer
//!
//! Signs one record per slot under the re-derived inbox key. Concurrent
//! senders may race for the same index; a slot found holding someone else's
//! record is a collision and the write moves on to the next index.
//!
//! Collisions are detected by payload bytes. Two byte-identical records
//! (same reference, no sender metadata, same millisecond) land as a single
//! delivery. Sealed sender metadata is randomized per write and payload
//! references are addresses of freshly encrypted blobs, so this only
//! happens when the same reference is sent twice anonymously.

use crate::error::{InboxError, Result};
use crate::finder::SlotFinder;
use crate::miner::derive_inbox_key;
use crate::params::InboxParams;
use postbox_crypto::seal;
use postbox_protocol::{indexed_identifier, EncryptedRecord, SenderMeta, SwarmAddress};
use postbox_store::{ChunkStore, StoreError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of extra slots tried after a collision
pub const DEFAULT_MAX_WRITE_RETRIES: u32 = 5;

/// What a sender wants delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Pointer to the payload
    pub reference: String,

    /// Identity sealed to the recipient; `None` sends anonymously
    pub sender: Option<SenderMeta>,
}

impl OutgoingMessage {
    pub fn anonymous(reference: impl Into<String>) -> Self {
        OutgoingMessage {
            reference: reference.into(),
            sender: None,
        }
    }

    pub fn identified(reference: impl Into<String>, sender: SenderMeta) -> Self {
        OutgoingMessage {
            reference: reference.into(),
            sender: Some(sender),
        }
    }
}

/// Where a record ended up
#[derive(Debug, Clone)]
pub struct WriteReceipt {
    pub index: u64,
    pub address: SwarmAddress,
    pub record: EncryptedRecord,
}

/// Build the record for `message`, sealing sender metadata if present
pub fn build_record(params: &InboxParams, message: &OutgoingMessage) -> Result<EncryptedRecord> {
    let encrypted_meta = match &message.sender {
        None => None,
        Some(meta) => {
            let recipient = params
                .recipient_public_key
                .as_ref()
                .ok_or(InboxError::MissingRecipientKey)?;
            Some(seal(&meta.encode()?, recipient)?)
        }
    };

    Ok(EncryptedRecord::new(message.reference.clone(), encrypted_meta))
}

/// Publishes records into inbox slots
#[derive(Clone)]
pub struct InboxWriter {
    store: Arc<dyn ChunkStore>,
    finder: SlotFinder,
    max_retries: u32,
}

impl InboxWriter {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        InboxWriter {
            finder: SlotFinder::new(store.clone()),
            store,
            max_retries: DEFAULT_MAX_WRITE_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Write at `index`, moving to the next index on collision
    ///
    /// Tries at most `max_retries + 1` slots. Each write is confirmed by
    /// reading the slot back.
    pub async fn write_to_inbox(
        &self,
        params: &InboxParams,
        index: u64,
        message: &OutgoingMessage,
    ) -> Result<WriteReceipt> {
        let key = derive_inbox_key(params)?;
        let record = build_record(params, message)?;
        let payload = record.encode()?;

        let last = index.saturating_add(u64::from(self.max_retries));
        for slot in index..=last {
            let chunk = key.sign_slot(&params.base_identifier, slot, payload.clone())?;

            let address = match self.store.put_soc(chunk).await {
                Ok(address) => address,
                Err(StoreError::Conflict(address)) => {
                    warn!(slot, %address, "slot taken, retrying at next index");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let identifier = indexed_identifier(&params.base_identifier, slot);
            let stored = match self.store.get_soc(key.owner(), &identifier).await {
                Ok(stored) => stored,
                Err(StoreError::Corrupt { .. }) => None,
                Err(e) => return Err(e.into()),
            };
            if stored.as_deref() != Some(payload.as_slice()) {
                warn!(slot, %address, "slot changed under write, retrying at next index");
                continue;
            }

            info!(
                slot,
                %address,
                anonymous = record.is_anonymous(),
                "record written to inbox"
            );
            return Ok(WriteReceipt {
                index: slot,
                address,
                record,
            });
        }

        Err(InboxError::WriteCollision { first: index, last })
    }

    /// Find the next free slot and write there
    pub async fn send(
        &self,
        params: &InboxParams,
        message: &OutgoingMessage,
        max_slots: u64,
    ) -> Result<WriteReceipt> {
        let index = self.finder.find_next_slot(params, max_slots).await?;
        debug!(index, reference = %message.reference, "sending to inbox");
        self.write_to_inbox(params, index, message).await
    }
}
