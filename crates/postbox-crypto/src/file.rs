//! File encryption
//!
//! Plaintext layout before encryption:
//!
//! ```text
//! [header_len: u32 LE][header: JSON FileMetadata][file bytes]
//! ```

use crate::envelope::{open, seal, EncryptedPayload};
use crate::error::{CryptoError, Result};
use k256::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};

const LENGTH_PREFIX_SIZE: usize = 4;

/// Metadata carried inside the encrypted buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,

    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,

    /// File length in bytes
    pub size: u64,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// A decrypted file and its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    pub data: Vec<u8>,
    pub metadata: FileMetadata,
}

/// Encrypt a file for `recipient` using a one-time key pair
pub fn encrypt_file(
    data: &[u8],
    name: &str,
    mime_type: &str,
    recipient: &PublicKey,
) -> Result<EncryptedPayload> {
    let metadata = FileMetadata {
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        size: data.len() as u64,
        timestamp: chrono::Utc::now().timestamp_millis(),
    };

    let buffer = encode_buffer(data, &metadata)?;
    seal(&buffer, recipient)
}

/// Decrypt a file sealed to our key
pub fn decrypt_file(payload: &EncryptedPayload, secret: &SecretKey) -> Result<DecryptedFile> {
    let buffer = open(payload, secret)?;
    decode_buffer(&buffer)
}

fn encode_buffer(data: &[u8], metadata: &FileMetadata) -> Result<Vec<u8>> {
    let header =
        serde_json::to_vec(metadata).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    let header_len = u32::try_from(header.len())
        .map_err(|_| CryptoError::Serialization("metadata header too large".to_string()))?;

    let mut buffer = Vec::with_capacity(LENGTH_PREFIX_SIZE + header.len() + data.len());
    buffer.extend_from_slice(&header_len.to_le_bytes());
    buffer.extend_from_slice(&header);
    buffer.extend_from_slice(data);
    Ok(buffer)
}

fn decode_buffer(buffer: &[u8]) -> Result<DecryptedFile> {
    if buffer.len() < LENGTH_PREFIX_SIZE {
        return Err(CryptoError::MalformedPlaintext(
            "missing length prefix".to_string(),
        ));
    }

    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&buffer[..LENGTH_PREFIX_SIZE]);
    let header_len = u32::from_le_bytes(prefix) as usize;

    let rest = &buffer[LENGTH_PREFIX_SIZE..];
    if header_len > rest.len() {
        return Err(CryptoError::MalformedPlaintext(format!(
            "header length {} exceeds remaining {} bytes",
            header_len,
            rest.len()
        )));
    }

    let (header, data) = rest.split_at(header_len);
    let metadata: FileMetadata = serde_json::from_slice(header)
        .map_err(|e| CryptoError::MalformedPlaintext(format!("metadata: {}", e)))?;

    if metadata.size != data.len() as u64 {
        return Err(CryptoError::MalformedPlaintext(format!(
            "metadata size {} does not match {} file bytes",
            metadata.size,
            data.len()
        )));
    }

    Ok(DecryptedFile {
        data: data.to_vec(),
        metadata,
    })
}
