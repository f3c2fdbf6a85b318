//! Inbox tuning parameters

use crate::miner::DEFAULT_MAX_TRIALS;
use serde::{Deserialize, Serialize};

/// Tuning for mining, writing and scanning an inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// Leading bits slot 0 must share with the target overlay when mining
    pub proximity: u8,

    /// Upper bound on slot indices probed by `find_next_slot`
    pub max_slots: u64,

    /// Slots read concurrently per poll batch
    pub batch_size: usize,

    /// Consecutive all-empty batches that end a poll
    pub empty_batches_to_stop: usize,

    /// Maximum slots examined per poll
    pub max_scan: u64,

    /// Extra slots tried when a write collides
    pub max_write_retries: u32,

    /// Mining trial budget
    pub max_trials: u64,
}

impl Default for InboxConfig {
    fn default() -> Self {
        InboxConfig {
            proximity: 8,
            max_slots: 1024,
            batch_size: 5,
            empty_batches_to_stop: 2,
            max_scan: 100,
            max_write_retries: 5,
            max_trials: DEFAULT_MAX_TRIALS,
        }
    }
}

impl InboxConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            batch_size: self.batch_size,
            empty_batches_to_stop: self.empty_batches_to_stop,
            max_scan: self.max_scan,
        }
    }
}

/// Bounds on a single forward scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub batch_size: usize,
    pub empty_batches_to_stop: usize,
    pub max_scan: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        InboxConfig::default().scan_options()
    }
}

impl ScanOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_scan(mut self, max_scan: u64) -> Self {
        self.max_scan = max_scan;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InboxConfig::default();
        assert_eq!(config.proximity, 8);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.empty_batches_to_stop, 2);
        assert_eq!(config.max_write_retries, 5);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: InboxConfig = serde_json::from_str(r#"{"proximity": 12}"#).unwrap();
        assert_eq!(config.proximity, 12);
        assert_eq!(config.max_scan, 100);
    }
}
