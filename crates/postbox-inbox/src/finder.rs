//! Slot discovery
//!
//! - `find_next_slot`: exponential probe then binary search for the first
//!   free slot, O(log n) reads
//! - `scan_inbox`: bounded forward scan in concurrent batches
//!
//! Both treat foreign data as an occupied slot so writers never pick an
//! index a squatter already holds.

use crate::config::ScanOptions;
use crate::error::{InboxError, Result};
use crate::miner::derive_inbox_key;
use crate::params::InboxParams;
use crate::reader::{inspect, SlotState};
use futures::future::join_all;
use postbox_protocol::{EncryptedRecord, EthAddress, Identifier};
use postbox_store::ChunkStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// A record together with the slot it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub index: u64,
    pub record: EncryptedRecord,
}

/// Result of one forward scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Records found, in index order
    pub records: Vec<SlotRecord>,

    /// Where the next scan should start: one past the last occupied slot
    /// seen, never past an index that was not processed
    pub next_index: u64,

    /// The scan stopped early on a network error
    pub truncated: bool,
}

/// Locates free and occupied slots
#[derive(Clone)]
pub struct SlotFinder {
    store: Arc<dyn ChunkStore>,
}

impl SlotFinder {
    pub fn new(store: Arc<dyn ChunkStore>) -> Self {
        SlotFinder { store }
    }

    /// Index of the first free slot below `max_slots`
    ///
    /// Assumes slots fill from 0 upwards. Returns `InboxFull` when no slot
    /// below `max_slots` is free.
    pub async fn find_next_slot(&self, params: &InboxParams, max_slots: u64) -> Result<u64> {
        if max_slots == 0 {
            return Err(InboxError::InboxFull(0));
        }

        let key = derive_inbox_key(params)?;
        let probe = Probe {
            store: self.store.as_ref(),
            owner: key.owner(),
            base: &params.base_identifier,
        };

        if !probe.occupied(0).await? {
            return Ok(0);
        }

        // low is always occupied; high is free or the max_slots bound
        let mut low = 0u64;
        let mut high = 1u64;
        loop {
            if high >= max_slots {
                high = max_slots;
                break;
            }
            if !probe.occupied(high).await? {
                break;
            }
            low = high;
            high = high.saturating_mul(2);
        }

        if high == max_slots {
            let last = max_slots - 1;
            if low == last || probe.occupied(last).await? {
                return Err(InboxError::InboxFull(max_slots));
            }
            high = last;
        }

        while high - low > 1 {
            let mid = low + (high - low) / 2;
            if probe.occupied(mid).await? {
                low = mid;
            } else {
                high = mid;
            }
        }

        debug!(index = high, "found next free slot");
        Ok(high)
    }

    /// Collect every record from `last_known_index` onwards, at most
    /// `max_scan` slots, with default batching
    pub async fn poll_inbox(
        &self,
        params: &InboxParams,
        last_known_index: u64,
        max_scan: u64,
    ) -> Result<Vec<SlotRecord>> {
        let options = ScanOptions::default().with_max_scan(max_scan);
        Ok(self
            .scan_inbox(params, last_known_index, &options)
            .await?
            .records)
    }

    /// Scan forward from `from_index` in concurrent batches
    ///
    /// Stops after `options.empty_batches_to_stop` consecutive batches with
    /// no occupied slot, or once `options.max_scan` slots were examined. A
    /// network failure ends the scan with `truncated` set; it is returned as
    /// an error only if it hit the very first slot.
    pub async fn scan_inbox(
        &self,
        params: &InboxParams,
        from_index: u64,
        options: &ScanOptions,
    ) -> Result<ScanOutcome> {
        let key = derive_inbox_key(params)?;
        let probe = Probe {
            store: self.store.as_ref(),
            owner: key.owner(),
            base: &params.base_identifier,
        };

        let batch_size = options.batch_size.max(1) as u64;
        let end = from_index.saturating_add(options.max_scan);
        let mut outcome = ScanOutcome {
            next_index: from_index,
            ..Default::default()
        };
        let mut empty_batches = 0usize;
        let mut next = from_index;

        while next < end && empty_batches < options.empty_batches_to_stop.max(1) {
            let batch_end = next.saturating_add(batch_size).min(end);
            let states = join_all((next..batch_end).map(|index| probe.state(index))).await;

            let mut batch_occupied = false;
            for (index, state) in (next..batch_end).zip(states) {
                match state {
                    Ok(SlotState::Empty) => {}
                    Ok(SlotState::Record(record)) => {
                        batch_occupied = true;
                        outcome.next_index = index + 1;
                        outcome.records.push(SlotRecord { index, record });
                    }
                    Ok(SlotState::Foreign) => {
                        batch_occupied = true;
                        outcome.next_index = index + 1;
                    }
                    Err(e) if index == from_index => return Err(e),
                    Err(e) => {
                        warn!(index, error = %e, "scan stopped early");
                        outcome.truncated = true;
                        return Ok(outcome);
                    }
                }
            }

            if batch_occupied {
                empty_batches = 0;
            } else {
                empty_batches += 1;
            }
            next = batch_end;
        }

        debug!(
            from_index,
            scanned = next - from_index,
            found = outcome.records.len(),
            next_index = outcome.next_index,
            "scan complete"
        );
        Ok(outcome)
    }
}

struct Probe<'a> {
    store: &'a dyn ChunkStore,
    owner: &'a EthAddress,
    base: &'a Identifier,
}

impl Probe<'_> {
    async fn state(&self, index: u64) -> Result<SlotState> {
        inspect(self.store, self.owner, self.base, index).await
    }

    async fn occupied(&self, index: u64) -> Result<bool> {
        Ok(self.state(index).await?.is_occupied())
    }
}
