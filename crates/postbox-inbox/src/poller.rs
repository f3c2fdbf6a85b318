//! Recipient-side polling
//!
//! One call to `poll` is one bounded scan. Scheduling repeated polls and
//! persisting `next_index` between them belong to the caller.

use crate::config::ScanOptions;
use crate::error::{InboxError, Result};
use crate::finder::{SlotFinder, SlotRecord};
use crate::params::InboxParams;
use postbox_crypto::{open, KeyPair};
use postbox_protocol::SenderMeta;
use tracing::{debug, warn};

/// A record the recipient could read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxMessage {
    pub index: u64,
    pub reference: String,
    pub timestamp: i64,
    /// `None` for anonymous senders
    pub sender: Option<SenderMeta>,
}

/// A record that was skipped
#[derive(Debug)]
pub struct PollFailure {
    pub index: u64,
    pub error: InboxError,
}

#[derive(Debug, Default)]
pub struct PollReport {
    pub messages: Vec<InboxMessage>,
    pub failures: Vec<PollFailure>,
    /// Resume point for the next poll
    pub next_index: u64,
    pub truncated: bool,
}

/// Polls an inbox on behalf of its recipient
#[derive(Clone)]
pub struct InboxPoller {
    finder: SlotFinder,
    recipient: KeyPair,
    options: ScanOptions,
}

impl InboxPoller {
    pub fn new(finder: SlotFinder, recipient: KeyPair) -> Self {
        InboxPoller {
            finder,
            recipient,
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Scan from `from_index` and open every record found
    ///
    /// A record whose sender metadata cannot be opened is reported in
    /// `failures`; the remaining records are still returned.
    pub async fn poll(&self, params: &InboxParams, from_index: u64) -> Result<PollReport> {
        let outcome = self
            .finder
            .scan_inbox(params, from_index, &self.options)
            .await?;

        let mut report = PollReport {
            next_index: outcome.next_index,
            truncated: outcome.truncated,
            ..Default::default()
        };

        for slot in outcome.records {
            let index = slot.index;
            match self.open_record(slot) {
                Ok(message) => report.messages.push(message),
                Err(error) => {
                    warn!(index, %error, "skipping unreadable record");
                    report.failures.push(PollFailure { index, error });
                }
            }
        }

        debug!(
            from_index,
            received = report.messages.len(),
            failed = report.failures.len(),
            next_index = report.next_index,
            "poll finished"
        );
        Ok(report)
    }

    fn open_record(&self, slot: SlotRecord) -> Result<InboxMessage> {
        let sender = match &slot.record.encrypted_meta {
            None => None,
            Some(meta) => {
                let plaintext = open(meta, self.recipient.secret_key())?;
                Some(SenderMeta::decode(&plaintext)?)
            }
        };

        Ok(InboxMessage {
            index: slot.index,
            reference: slot.record.reference,
            timestamp: slot.record.timestamp,
            sender,
        })
    }
}
