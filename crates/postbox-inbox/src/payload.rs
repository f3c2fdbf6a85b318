//! Encrypted file payloads
//!
//! Records only carry a reference. The file itself is encrypted to the
//! recipient and uploaded as a content-addressed blob; the reference is the
//! blob's address in hex.

use crate::error::{InboxError, Result};
use postbox_crypto::{
    decrypt_file, encrypt_file, DecryptedFile, EncryptedPayload, PublicKey, SecretKey,
};
use postbox_protocol::{ProtocolError, SwarmAddress};
use postbox_store::ChunkStore;
use tracing::debug;

/// Encrypt `data` to `recipient` and upload it, returning the reference
pub async fn upload_encrypted_file(
    store: &dyn ChunkStore,
    data: &[u8],
    name: &str,
    mime_type: &str,
    recipient: &PublicKey,
) -> Result<String> {
    let payload = encrypt_file(data, name, mime_type, recipient)?;
    let encoded = serde_json::to_vec(&payload)
        .map_err(|e| ProtocolError::SerializationFailed(e.to_string()))?;

    let address = store.upload(encoded).await?;
    debug!(%address, name, size = data.len(), "uploaded encrypted file");
    Ok(address.to_hex())
}

/// Download and decrypt the file behind `reference`
pub async fn fetch_encrypted_file(
    store: &dyn ChunkStore,
    reference: &str,
    secret: &SecretKey,
) -> Result<DecryptedFile> {
    let address = SwarmAddress::from_hex(reference)
        .map_err(|_| InboxError::InvalidReference(reference.to_string()))?;

    let encoded = store
        .download(&address)
        .await?
        .ok_or_else(|| InboxError::PayloadNotFound(reference.to_string()))?;

    let payload: EncryptedPayload = serde_json::from_slice(&encoded)
        .map_err(|e| ProtocolError::DeserializationFailed(e.to_string()))?;

    Ok(decrypt_file(&payload, secret)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postbox_crypto::KeyPair;
    use postbox_store::MemoryStore;

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let store = MemoryStore::new();
        let recipient = KeyPair::generate();

        let reference = upload_encrypted_file(
            &store,
            b"report",
            "report.txt",
            "text/plain",
            recipient.public_key(),
        )
        .await
        .unwrap();
        assert_eq!(reference.len(), 64);

        let file = fetch_encrypted_file(&store, &reference, recipient.secret_key())
            .await
            .unwrap();
        assert_eq!(file.data, b"report");
        assert_eq!(file.metadata.name, "report.txt");
    }

    #[tokio::test]
    async fn test_wrong_key_is_authentication_failure() {
        let store = MemoryStore::new();
        let recipient = KeyPair::generate();
        let reference = upload_encrypted_file(
            &store,
            b"secret",
            "s.bin",
            "application/octet-stream",
            recipient.public_key(),
        )
        .await
        .unwrap();

        let err = fetch_encrypted_file(&store, &reference, KeyPair::generate().secret_key())
            .await
            .unwrap_err();
        assert!(err.is_authentication_failure());
    }

    #[tokio::test]
    async fn test_bad_and_missing_references() {
        let store = MemoryStore::new();
        let key = KeyPair::generate();

        assert!(matches!(
            fetch_encrypted_file(&store, "ref-1", key.secret_key()).await,
            Err(InboxError::InvalidReference(_))
        ));
        assert!(matches!(
            fetch_encrypted_file(&store, &"ab".repeat(32), key.secret_key()).await,
            Err(InboxError::PayloadNotFound(_))
        ));
    }
}
