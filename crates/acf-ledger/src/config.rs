use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use acf_types::{DisplayTransactionId, ReceiptId};

use crate::error::{LedgerError, LedgerResult};

/// Tuning for the receipt sequencer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// First receipt id on an empty ledger.
    pub base_receipt_id: u64,
    /// Allocation attempts before falling back to a random id.
    pub max_attempts: u32,
    /// How many top records each peek fetches for the collision check.
    pub peek_limit: usize,
    /// Base of the jittered exponential backoff between attempts.
    pub backoff_base_ms: u64,
    /// Lowest id handed out by the fallback path.
    pub fallback_min: u64,
    /// Highest id handed out by the fallback path.
    pub fallback_max: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            base_receipt_id: ReceiptId::BASE.value(),
            max_attempts: 5,
            peek_limit: 5,
            backoff_base_ms: 100,
            fallback_min: 1_000_000,
            fallback_max: 9_999_999,
        }
    }
}

impl SequencerConfig {
    pub fn base(&self) -> ReceiptId {
        ReceiptId::new(self.base_receipt_id)
    }

    pub fn fallback_range(&self) -> RangeInclusive<u64> {
        self.fallback_min..=self.fallback_max
    }

    /// Upper bound (exclusive) of the random delay before `attempt`.
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Configuration for pass issuance and lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Prefix of the printed transaction id.
    pub display_prefix: String,
    /// Save attempts before giving up on receipt collisions.
    pub max_save_attempts: u32,
    pub sequencer: SequencerConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            display_prefix: DisplayTransactionId::DEFAULT_PREFIX.to_string(),
            max_save_attempts: 3,
            sequencer: SequencerConfig::default(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.display_prefix.trim().is_empty() {
            return Err(LedgerError::Config("display_prefix cannot be empty".into()));
        }
        if self.max_save_attempts == 0 || self.sequencer.max_attempts == 0 {
            return Err(LedgerError::Config("attempt budgets must be at least 1".into()));
        }
        if self.sequencer.peek_limit == 0 {
            return Err(LedgerError::Config("peek_limit must be at least 1".into()));
        }
        if self.sequencer.fallback_min > self.sequencer.fallback_max {
            return Err(LedgerError::Config("fallback range is empty".into()));
        }
        Ok(())
    }
}
