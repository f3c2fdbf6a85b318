//! In-memory chunk store

use crate::chunk_store::{content_address, ChunkStore};
use crate::error::{Result, StoreError};
use crate::{MAX_BLOB_SIZE, MAX_STORE_BYTES, MAX_STORE_KEYS};
use async_trait::async_trait;
use postbox_protocol::{soc_address, EthAddress, Identifier, SingleOwnerChunk, SwarmAddress};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Entries {
    socs: HashMap<SwarmAddress, SingleOwnerChunk>,
    blobs: HashMap<SwarmAddress, Vec<u8>>,
    current_size: usize,
}

impl Entries {
    fn key_count(&self) -> usize {
        self.socs.len() + self.blobs.len()
    }
}

/// Chunk store held entirely in memory
///
/// Behaves like a single storage node: signatures are checked on every
/// put and occupied addresses are never overwritten.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<Entries>,

    /// Maximum storage size
    max_size: usize,

    /// Maximum number of keys
    max_keys: usize,
}

impl MemoryStore {
    /// Create new in-memory storage
    pub fn new() -> Self {
        Self::with_limits(MAX_STORE_BYTES, MAX_STORE_KEYS)
    }

    /// Create with custom limits
    pub fn with_limits(max_size: usize, max_keys: usize) -> Self {
        MemoryStore {
            entries: RwLock::new(Entries::default()),
            max_size,
            max_keys,
        }
    }

    /// Get current storage size in bytes
    pub async fn size(&self) -> usize {
        self.entries.read().await.current_size
    }

    /// Get number of stored chunks and blobs
    pub async fn key_count(&self) -> usize {
        self.entries.read().await.key_count()
    }

    fn check_capacity(&self, entries: &Entries, value_size: usize) -> Result<()> {
        if entries.key_count() >= self.max_keys {
            return Err(StoreError::TooManyKeys(self.max_keys));
        }
        if entries.current_size + value_size > self.max_size {
            return Err(StoreError::StorageFull { max: self.max_size });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn put_soc(&self, chunk: SingleOwnerChunk) -> Result<SwarmAddress> {
        chunk.verify()?;
        let address = chunk.address();

        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.socs.get(&address) {
            if existing.payload == chunk.payload {
                return Ok(address);
            }
            debug!(%address, "rejecting overwrite of occupied chunk");
            return Err(StoreError::Conflict(address));
        }

        self.check_capacity(&entries, chunk.payload.len())?;
        entries.current_size += chunk.payload.len();
        entries.socs.insert(address, chunk);
        Ok(address)
    }

    async fn get_soc(
        &self,
        owner: &EthAddress,
        identifier: &Identifier,
    ) -> Result<Option<Vec<u8>>> {
        let address = soc_address(identifier, owner);
        let entries = self.entries.read().await;
        Ok(entries.socs.get(&address).map(|chunk| chunk.payload.clone()))
    }

    async fn upload(&self, data: Vec<u8>) -> Result<SwarmAddress> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StoreError::ValueTooLarge {
                size: data.len(),
                max: MAX_BLOB_SIZE,
            });
        }

        let address = content_address(&data);
        let mut entries = self.entries.write().await;
        if entries.blobs.contains_key(&address) {
            return Ok(address);
        }

        self.check_capacity(&entries, data.len())?;
        entries.current_size += data.len();
        entries.blobs.insert(address, data);
        Ok(address)
    }

    async fn download(&self, address: &SwarmAddress) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.blobs.get(address).cloned())
    }
}
