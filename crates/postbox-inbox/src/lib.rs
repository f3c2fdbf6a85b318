//! Postbox Inbox
//!
//! Uncoordinated, privacy-preserving inboxes on a single-owner chunk store:
//! - Inbox keys derived from public parameters, so any sender can sign slots
//! - Neighborhood mining to place slot 0 near a target overlay
//! - Slot discovery (exponential + binary search) and bounded batched scans
//! - Collision-tolerant writes and recipient-side polling
//! - Directory publication of inbox coordinates
//!
//! ## Protocol Model
//!
//! - An inbox is `(target_overlay, base_identifier, proximity)`; nothing secret
//! - Slot `i` lives at `indexed_identifier(base_identifier, i)` under the
//!   inbox owner address
//! - Records carry a payload reference and optional sender metadata sealed
//!   to the recipient
//! - The protocol owns no timers; polling is a call that returns new records
//!   and the index to resume from
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use postbox_inbox::{InboxPoller, InboxWriter, NeighborhoodMiner, OutgoingMessage, SlotFinder};
//!
//! // Recipient mines an inbox once
//! let mined = NeighborhoodMiner::default().mine(overlay, 8, Some(*alice.public_key()))?;
//!
//! // Any sender holding the params can write
//! let writer = InboxWriter::new(store.clone());
//! writer.send(&mined.params, &OutgoingMessage::anonymous(reference), 1024).await?;
//!
//! // Recipient polls from its last known index
//! let poller = InboxPoller::new(SlotFinder::new(store), alice);
//! let report = poller.poll(&mined.params, 0).await?;
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod finder;
pub mod miner;
pub mod params;
pub mod payload;
pub mod poller;
pub mod reader;
pub mod writer;

pub use config::{InboxConfig, ScanOptions};
pub use directory::{publish_inbox, resolve_inbox, setup_inbox};
pub use error::{InboxError, Result};
pub use finder::{ScanOutcome, SlotFinder, SlotRecord};
pub use miner::{derive_inbox_key, InboxKey, MinedInbox, NeighborhoodMiner};
pub use params::InboxParams;
pub use payload::{fetch_encrypted_file, upload_encrypted_file};
pub use poller::{InboxMessage, InboxPoller, PollFailure, PollReport};
pub use reader::{SlotReader, SlotState};
pub use writer::{build_record, InboxWriter, OutgoingMessage, WriteReceipt};
