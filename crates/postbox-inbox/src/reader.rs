//! Slot reader
//!
//! A missing slot is a normal answer, not an error. Data at a slot address
//! that does not parse as a current record is reported separately as
//! `Foreign` so callers can tell squatting or corruption apart from an
//! empty slot, even though `read_slot` treats both as absent.

use crate::error::Result;
use crate::miner::derive_inbox_key;
use crate::params::InboxParams;
use postbox_protocol::{indexed_identifier, EncryptedRecord, EthAddress, Identifier};
use postbox_store::{ChunkStore, StoreError};
use std::sync::Arc;
use tracing::debug;

/// What a slot holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Record(EncryptedRecord),
    /// Occupied by data that is not a readable record
    Foreign,
}

impl SlotState {
    pub fn is_occupied(&self) -> bool {
        !matches!(self, SlotState::Empty)
    }

    pub fn into_record(self) -> Option<EncryptedRecord> {
        match self {
            SlotState::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Reads individual inbox slots
#[derive(Clone)]
pub struct SlotReader {
    store: Arc<dyn ChunkStore>,
}

impl SlotReader {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        SlotReader { store }
    }

    pub async fn inspect_slot(&self, params: &InboxParams, index: u64) -> Result<SlotState> {
        let key = derive_inbox_key(params)?;
        inspect(self.store.as_ref(), key.owner(), &params.base_identifier, index).await
    }

    /// Read the record at `index`; empty and foreign slots are `None`
    pub async fn read_slot(
        &self,
        params: &InboxParams,
        index: u64,
    ) -> Result<Option<EncryptedRecord>> {
        Ok(self.inspect_slot(params, index).await?.into_record())
    }
}

pub(crate) async fn inspect(
    store: &dyn ChunkStore,
    owner: &EthAddress,
    base: &Identifier,
    index: u64,
) -> Result<SlotState> {
    let identifier = indexed_identifier(base, index);
    let payload = match store.get_soc(owner, &identifier).await {
        Ok(Some(payload)) => payload,
        Ok(None) => return Ok(SlotState::Empty),
        Err(StoreError::Corrupt { address, reason }) => {
            debug!(index, %address, %reason, "slot holds a corrupt chunk");
            return Ok(SlotState::Foreign);
        }
        Err(e) => return Err(e.into()),
    };

    match EncryptedRecord::decode(&payload) {
        Ok(record) => Ok(SlotState::Record(record)),
        Err(e) => {
            debug!(index, error = %e, "slot holds foreign data");
            Ok(SlotState::Foreign)
        }
    }
}
