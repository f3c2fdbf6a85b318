//! Filesystem-backed chunk store
//!
//! Layout under the root directory:
//!
//! ```text
//! soc/<address>.json    signed single-owner chunks
//! blobs/<address>       raw blobs
//! ```
//!
//! Files are written to a temporary name and hard-linked into place, so a
//! chunk file appears atomically and the first writer wins even across
//! processes sharing the directory.

use crate::chunk_store::{content_address, ChunkStore};
use crate::error::{Result, StoreError};
use crate::MAX_BLOB_SIZE;
use async_trait::async_trait;
use postbox_protocol::{soc_address, EthAddress, Identifier, SingleOwnerChunk, SwarmAddress};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Chunk store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) a store under `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("soc")).await?;
        fs::create_dir_all(root.join("blobs")).await?;
        Ok(FsStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn soc_path(&self, address: &SwarmAddress) -> PathBuf {
        self.root.join("soc").join(format!("{}.json", address.to_hex()))
    }

    fn blob_path(&self, address: &SwarmAddress) -> PathBuf {
        self.root.join("blobs").join(address.to_hex())
    }

    /// Write `contents` to `path` only if nothing is there yet.
    /// Returns false if the path already existed.
    async fn write_new(&self, path: &Path, contents: &[u8]) -> Result<bool> {
        let tmp = path.with_extension(format!("tmp-{:016x}", rand::random::<u64>()));
        fs::write(&tmp, contents).await?;

        let linked = fs::hard_link(&tmp, path).await;
        let _ = fs::remove_file(&tmp).await;

        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Undecodable files and chunks failing verification are `Corrupt`
    async fn read_chunk(&self, address: &SwarmAddress) -> Result<Option<SingleOwnerChunk>> {
        let Some(bytes) = Self::read_optional(&self.soc_path(address)).await? else {
            return Ok(None);
        };

        let corrupt = |reason: String| StoreError::Corrupt {
            address: *address,
            reason,
        };
        let chunk: SingleOwnerChunk =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        chunk.verify().map_err(|e| corrupt(e.to_string()))?;
        if chunk.address() != *address {
            return Err(corrupt("chunk stored under the wrong address".to_string()));
        }
        Ok(Some(chunk))
    }
}

#[async_trait]
impl ChunkStore for FsStore {
    async fn put_soc(&self, chunk: SingleOwnerChunk) -> Result<SwarmAddress> {
        chunk.verify()?;
        let address = chunk.address();

        let encoded =
            serde_json::to_vec(&chunk).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if self.write_new(&self.soc_path(&address), &encoded).await? {
            return Ok(address);
        }

        match self.read_chunk(&address).await {
            Ok(Some(existing)) if existing.payload == chunk.payload => Ok(address),
            Ok(_) | Err(StoreError::Corrupt { .. }) => {
                debug!(%address, "rejecting overwrite of occupied chunk");
                Err(StoreError::Conflict(address))
            }
            Err(e) => Err(e),
        }
    }

    async fn get_soc(
        &self,
        owner: &EthAddress,
        identifier: &Identifier,
    ) -> Result<Option<Vec<u8>>> {
        let address = soc_address(identifier, owner);
        Ok(self.read_chunk(&address).await?.map(|chunk| chunk.payload))
    }

    async fn upload(&self, data: Vec<u8>) -> Result<SwarmAddress> {
        if data.len() > MAX_BLOB_SIZE {
            return Err(StoreError::ValueTooLarge {
                size: data.len(),
                max: MAX_BLOB_SIZE,
            });
        }

        let address = content_address(&data);
        // Content addressing makes an existing file identical by construction
        self.write_new(&self.blob_path(&address), &data).await?;
        Ok(address)
    }

    async fn download(&self, address: &SwarmAddress) -> Result<Option<Vec<u8>>> {
        Self::read_optional(&self.blob_path(address)).await
    }
}
