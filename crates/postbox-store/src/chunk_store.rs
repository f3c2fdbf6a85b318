//! Storage network interface

use crate::error::Result;
use async_trait::async_trait;
use postbox_protocol::{EthAddress, Identifier, SingleOwnerChunk, SwarmAddress};

/// Content-addressed storage with single-owner chunks
///
/// Absence is reported as `Ok(None)`; errors are reserved for the service
/// itself failing or refusing a write.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Publish a signed chunk. Fails with `Conflict` if the address already
    /// holds different content; re-publishing identical content succeeds.
    async fn put_soc(&self, chunk: SingleOwnerChunk) -> Result<SwarmAddress>;

    /// Fetch the payload `owner` published under `identifier`
    async fn get_soc(&self, owner: &EthAddress, identifier: &Identifier)
        -> Result<Option<Vec<u8>>>;

    /// Store an opaque blob under its keccak256 content address
    async fn upload(&self, data: Vec<u8>) -> Result<SwarmAddress>;

    /// Fetch a blob by content address
    async fn download(&self, address: &SwarmAddress) -> Result<Option<Vec<u8>>>;
}

/// Content address of a blob
pub fn content_address(data: &[u8]) -> SwarmAddress {
    SwarmAddress::from_bytes(postbox_crypto::keccak256(data))
}
