//! End-to-end tests for postboxd
//!
//! Two accounts share one storage root, the way two machines would share a
//! network: one mines and publishes an inbox, the other sends files to it.

use anyhow::Result;
use postbox_store::{Directory, FileDirectory};
use postboxd::config::Config;
use postboxd::node::Node;
use postboxd::state::PollState;
use std::path::Path;

async fn account(root: &Path, name: &str) -> Result<Node> {
    let home = root.join(name);
    let config = Config::create_default(
        Some(home.join("config.yaml")),
        Some(home.join("data")),
        name,
        Some(root.join("network")),
    )?;
    Node::new(config).await
}

#[tokio::test]
async fn test_send_and_poll_file() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let alice = account(tmp.path(), "alice").await?;
    let bob = account(tmp.path(), "bob").await?;

    let params = alice.mine_inbox(None, Some(4), None).await?;
    assert_eq!(params.proximity, 4);
    assert!(alice.load_inbox_params().await?.is_some());

    let file = tmp.path().join("notes.txt");
    std::fs::write(&file, b"meet at noon")?;
    let receipt = bob
        .send_file("alice", &file, false, Some("hello".to_string()))
        .await?;
    assert_eq!(receipt.index, 0);

    let summary = alice.poll_once().await?;
    assert_eq!(summary.received.len(), 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.next_index, 1);

    let received = &summary.received[0];
    assert_eq!(std::fs::read(&received.path)?, b"meet at noon");
    assert!(received.path.ends_with("0-notes.txt"));
    let sender = received.sender.as_ref().unwrap();
    assert_eq!(sender.name.as_deref(), Some("bob"));
    assert_eq!(sender.message.as_deref(), Some("hello"));

    // Nothing new the second time
    let again = alice.poll_once().await?;
    assert!(again.received.is_empty());
    assert_eq!(again.next_index, 1);

    let state = PollState::load(&alice.config().state_path()).await?;
    assert_eq!(state.next_index(&params.base_identifier.to_hex()), 1);
    Ok(())
}

#[tokio::test]
async fn test_anonymous_send() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let alice = account(tmp.path(), "alice").await?;
    let bob = account(tmp.path(), "bob").await?;
    alice.mine_inbox(None, Some(2), None).await?;

    let file = tmp.path().join("tip.bin");
    std::fs::write(&file, [1u8, 2, 3])?;
    bob.send_file("alice", &file, true, None).await?;
    bob.send_file("alice", &file, true, None).await?;

    let summary = alice.poll_once().await?;
    assert_eq!(summary.received.len(), 2);
    assert!(summary.received.iter().all(|f| f.sender.is_none()));
    assert_eq!(summary.next_index, 2);
    Ok(())
}

#[tokio::test]
async fn test_unknown_and_unconfigured_recipients() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let bob = account(tmp.path(), "bob").await?;
    let file = tmp.path().join("x.txt");
    std::fs::write(&file, b"x")?;

    let err = bob.send_file("nobody", &file, true, None).await.unwrap_err();
    assert!(err.to_string().contains("Recipient not found"));

    // Only part of the coordinates published
    let directory = FileDirectory::new(bob.config().storage.directory_file());
    directory
        .publish("carol", "postbox.overlay", &"00".repeat(32))
        .await?;

    let err = bob.send_file("carol", &file, true, None).await.unwrap_err();
    assert!(err.to_string().contains("inbox not configured"));
    Ok(())
}

#[tokio::test]
async fn test_poll_before_mining_fails() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let alice = account(tmp.path(), "alice").await?;

    let err = alice.poll_once().await.unwrap_err();
    assert!(err.to_string().contains("postboxd mine"));
    Ok(())
}

#[tokio::test]
async fn test_mining_exhaustion_is_reported() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let alice = account(tmp.path(), "alice").await?;

    let err = alice.mine_inbox(None, Some(31), Some(1)).await.unwrap_err();
    assert!(err.to_string().contains("consider lowering proximity"));
    assert!(alice.load_inbox_params().await?.is_none());
    Ok(())
}

fn only_blob(node: &Node) -> Result<std::path::PathBuf> {
    let blobs = node.config().storage.chunks_dir().join("blobs");
    let mut entries = std::fs::read_dir(blobs)?.collect::<std::io::Result<Vec<_>>>()?;
    assert_eq!(entries.len(), 1);
    Ok(entries.remove(0).path())
}

#[tokio::test]
async fn test_unavailable_payload_is_fetched_on_next_poll() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let alice = account(tmp.path(), "alice").await?;
    let bob = account(tmp.path(), "bob").await?;
    alice.mine_inbox(None, Some(2), None).await?;

    let file = tmp.path().join("late.txt");
    std::fs::write(&file, b"arrives eventually")?;
    bob.send_file("alice", &file, false, None).await?;

    // The record is visible but its payload is not
    let blob = only_blob(&alice)?;
    let parked = tmp.path().join("parked");
    std::fs::rename(&blob, &parked)?;

    let first = alice.poll_once().await?;
    assert!(first.received.is_empty());
    assert_eq!(first.failed, 0);
    assert!(first.truncated);
    assert_eq!(first.next_index, 0);

    std::fs::rename(&parked, &blob)?;

    let second = alice.poll_once().await?;
    assert_eq!(second.received.len(), 1);
    assert_eq!(second.next_index, 1);
    assert_eq!(std::fs::read(&second.received[0].path)?, b"arrives eventually");
    Ok(())
}

#[tokio::test]
async fn test_malformed_payload_is_skipped() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let alice = account(tmp.path(), "alice").await?;
    let bob = account(tmp.path(), "bob").await?;
    alice.mine_inbox(None, Some(2), None).await?;

    let file = tmp.path().join("broken.txt");
    std::fs::write(&file, b"never readable")?;
    bob.send_file("alice", &file, true, None).await?;
    std::fs::write(only_blob(&alice)?, b"garbage")?;

    let summary = alice.poll_once().await?;
    assert!(summary.received.is_empty());
    assert_eq!(summary.failed, 1);
    assert!(!summary.truncated);
    assert_eq!(summary.next_index, 1);
    Ok(())
}
