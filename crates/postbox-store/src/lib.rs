//! Postbox Storage
//!
//! Interfaces to the services the inbox protocol consumes:
//! - `ChunkStore`: single-owner chunk put/get and content-addressed blobs
//! - `Directory`: name -> key -> text record lookup and publication
//!
//! Ships in-memory implementations (tests, embedding) and filesystem-backed
//! ones (a shared directory standing in for the network).

pub mod chunk_store;
pub mod directory;
pub mod error;
pub mod fs;
pub mod memory;

pub use chunk_store::{content_address, ChunkStore};
pub use directory::{Directory, FileDirectory, MemoryDirectory};
pub use error::{Result, StoreError};
pub use fs::FsStore;
pub use memory::MemoryStore;

/// Maximum bytes held by a `MemoryStore`
pub const MAX_STORE_BYTES: usize = 256 * 1024 * 1024; // 256MB

/// Maximum number of chunks and blobs held by a `MemoryStore`
pub const MAX_STORE_KEYS: usize = 100_000;

/// Maximum blob size (bytes)
pub const MAX_BLOB_SIZE: usize = 32 * 1024 * 1024; // 32MB
