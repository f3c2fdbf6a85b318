use anyhow::{Context, Result};
use postbox_crypto::KeyPair;
use postbox_inbox::{
    fetch_encrypted_file, resolve_inbox, setup_inbox, upload_encrypted_file, InboxParams,
    InboxPoller, InboxWriter, NeighborhoodMiner, OutgoingMessage, SlotFinder, WriteReceipt,
};
use postbox_protocol::{Overlay, SenderMeta};
use postbox_store::{ChunkStore, Directory, FileDirectory, FsStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::state::PollState;

/// A file delivered to our inbox and saved locally
#[derive(Debug, Clone)]
pub struct ReceivedFile {
    pub index: u64,
    pub path: PathBuf,
    pub size: usize,
    pub sender: Option<SenderMeta>,
}

/// Outcome of one poll
#[derive(Debug, Default)]
pub struct PollSummary {
    pub received: Vec<ReceivedFile>,
    /// Records that could not be opened or whose payload could not be fetched
    pub failed: usize,
    pub next_index: u64,
    pub truncated: bool,
}

/// Account-level orchestrator over the inbox protocol
pub struct Node {
    config: Config,
    account: KeyPair,
    store: Arc<dyn ChunkStore>,
    directory: Arc<dyn Directory>,
}

impl Node {
    pub async fn new(config: Config) -> Result<Self> {
        let account = config.load_account_key()?;

        let store = FsStore::open(config.storage.chunks_dir())
            .await
            .context("Failed to open chunk store")?;
        let directory = FileDirectory::new(config.storage.directory_file());
        info!("Storage root: {}", config.storage.root.display());

        Ok(Self {
            config,
            account,
            store: Arc::new(store),
            directory: Arc::new(directory),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn account(&self) -> &KeyPair {
        &self.account
    }

    /// Mine an inbox near `overlay` (default: our own) and publish it under
    /// our name. Ctrl+C cancels mining.
    pub async fn mine_inbox(
        &self,
        overlay: Option<Overlay>,
        proximity: Option<u8>,
        max_trials: Option<u64>,
    ) -> Result<InboxParams> {
        let overlay = overlay.unwrap_or(self.config.account.overlay);
        let proximity = proximity.unwrap_or(self.config.inbox.proximity);

        let cancel = Arc::new(AtomicBool::new(false));
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if signal::ctrl_c().await.is_ok() {
                    cancel.store(true, Ordering::Relaxed);
                }
            })
        };

        let miner = NeighborhoodMiner::new(max_trials.unwrap_or(self.config.inbox.max_trials))
            .with_cancel_flag(cancel);

        info!(
            "Mining inbox for {} at proximity {} (up to {} trials)",
            self.config.account.name,
            proximity,
            miner.max_trials()
        );
        let mined = setup_inbox(
            self.directory.as_ref(),
            &self.config.account.name,
            &miner,
            overlay,
            proximity,
            Some(*self.account.public_key()),
        )
        .await;
        watcher.abort();
        let mined = mined?;

        let json = serde_json::to_vec_pretty(&mined.params)?;
        tokio::fs::write(self.config.inbox_path(), json)
            .await
            .context("Failed to save inbox parameters")?;

        info!("Inbox mined after {} trials", mined.trials);
        Ok(mined.params)
    }

    /// Parameters of our own inbox, if mined
    pub async fn load_inbox_params(&self) -> Result<Option<InboxParams>> {
        let contents = match tokio::fs::read(self.config.inbox_path()).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read inbox parameters"),
        };
        let params = serde_json::from_slice(&contents).context("Failed to parse inbox parameters")?;
        Ok(Some(params))
    }

    /// Encrypt `file` to the recipient published as `to` and deliver it
    pub async fn send_file(
        &self,
        to: &str,
        file: &Path,
        anonymous: bool,
        message: Option<String>,
    ) -> Result<WriteReceipt> {
        let params = resolve_inbox(self.directory.as_ref(), to).await?;
        let recipient = params
            .recipient_public_key
            .with_context(|| format!("{} has not published a public key", to))?;

        let data = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");

        let reference =
            upload_encrypted_file(self.store.as_ref(), &data, name, mime_type(file), &recipient)
                .await?;

        let outgoing = if anonymous {
            OutgoingMessage::anonymous(reference)
        } else {
            OutgoingMessage::identified(
                reference,
                SenderMeta {
                    name: Some(self.config.account.name.clone()),
                    public_key: Some(self.account.export_public_hex()),
                    message,
                },
            )
        };

        let writer = InboxWriter::new(self.store.clone())
            .with_max_retries(self.config.inbox.max_write_retries);
        let receipt = writer
            .send(&params, &outgoing, self.config.inbox.max_slots)
            .await?;

        info!("Delivered {} to {} at slot {}", name, to, receipt.index);
        Ok(receipt)
    }

    /// Poll our inbox once, saving new files under the received directory
    pub async fn poll_once(&self) -> Result<PollSummary> {
        let params = self
            .load_inbox_params()
            .await?
            .context("No inbox mined yet; run `postboxd mine` first")?;

        let state_key = params.base_identifier.to_hex();
        let mut state = PollState::load(&self.config.state_path()).await?;
        let from_index = state.next_index(&state_key);

        let poller = InboxPoller::new(SlotFinder::new(self.store.clone()), self.account.clone())
            .with_options(self.config.inbox.scan_options());
        let report = poller.poll(&params, from_index).await?;

        let mut summary = PollSummary {
            truncated: report.truncated,
            ..Default::default()
        };
        let mut next_index = report.next_index;
        let mut fetch_failures = 0;

        for message in report.messages {
            let file = match fetch_encrypted_file(
                self.store.as_ref(),
                &message.reference,
                self.account.secret_key(),
            )
            .await
            {
                Ok(file) => file,
                Err(e) if e.is_transient() => {
                    // Stop here so the slot is fetched again next time
                    warn!("Payload for slot {} unavailable: {}", message.index, e);
                    next_index = message.index;
                    summary.truncated = true;
                    break;
                }
                Err(e) => {
                    warn!("Skipping slot {}: {}", message.index, e);
                    fetch_failures += 1;
                    continue;
                }
            };

            let path = self.save_received(message.index, &file.metadata.name, &file.data).await?;
            info!("Received {} ({} bytes)", path.display(), file.data.len());
            summary.received.push(ReceivedFile {
                index: message.index,
                path,
                size: file.data.len(),
                sender: message.sender,
            });
        }

        summary.failed = fetch_failures
            + report
                .failures
                .iter()
                .filter(|failure| failure.index < next_index)
                .count();
        summary.next_index = next_index;

        state.advance(&state_key, next_index);
        state.save().await?;
        Ok(summary)
    }

    async fn save_received(&self, index: u64, name: &str, data: &[u8]) -> Result<PathBuf> {
        let dir = self.config.received_dir();
        tokio::fs::create_dir_all(&dir).await?;

        // Only the final component of a sender-chosen name is used
        let name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let path = dir.join(format!("{}-{}", index, name));
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    /// Poll on a fixed interval until Ctrl+C
    pub async fn watch(&self, interval: Duration) -> Result<()> {
        info!("Watching inbox every {}s", interval.as_secs());
        let mut ticker = tokio::time::interval(interval);

        loop {
            let stop = tokio::select! {
                _ = ticker.tick() => false,
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                    true
                }
            };
            if stop {
                break;
            }

            // Polls run one at a time so the saved index is never raced
            match self.poll_once().await {
                Ok(summary) if !summary.received.is_empty() => {
                    info!("{} new file(s)", summary.received.len());
                }
                Ok(_) => {}
                Err(e) => error!("Poll failed: {:#}", e),
            }
        }

        Ok(())
    }
}

fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("txt") | Some("md") => "text/plain",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}
