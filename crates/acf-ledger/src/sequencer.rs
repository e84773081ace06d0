use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use acf_store::{Document, DocumentStore, Query, StoreResult};
use acf_types::ReceiptId;

use crate::config::SequencerConfig;
use crate::record::field;

/// How a receipt id was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationSource {
    /// `max + 1` over the stored records (or the base on an empty ledger).
    Sequential,
    /// Random id from the fallback range after every attempt failed.
    Fallback,
}

/// Result of one receipt allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptAllocation {
    pub receipt_id: ReceiptId,
    pub source: AllocationSource,
    pub attempts: u32,
}

/// Hands out human-readable receipt numbers.
///
/// Allocation reads the current top of the ledger and proposes the next
/// number. There is no transaction between the read and the caller's later
/// write, so concurrent issuers can race; the peek window and the issuer's
/// uniqueness check narrow that window but do not close it. Allocation never
/// fails: when the store stays unreachable a random id is returned instead.
pub struct ReceiptSequencer {
    store: Arc<dyn DocumentStore>,
    config: SequencerConfig,
}

impl ReceiptSequencer {
    pub fn new(store: Arc<dyn DocumentStore>, config: SequencerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Next receipt id, ignoring how it was obtained.
    pub async fn next_receipt_id(&self) -> ReceiptId {
        self.allocate().await.receipt_id
    }

    pub async fn allocate(&self) -> ReceiptAllocation {
        let base = self.config.base();

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                self.backoff(attempt).await;
            }

            let batch = match self.peek().await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!(attempt = attempt + 1, error = %e, "receipt peek failed");
                    continue;
                }
            };

            let Some(top) = batch.iter().find_map(|d| d.get_u64(field::RECEIPT_ID)) else {
                return ReceiptAllocation {
                    receipt_id: base,
                    source: AllocationSource::Sequential,
                    attempts: attempt + 1,
                };
            };

            let candidate = ReceiptId::new(top).next().max(base);
            let collides = batch
                .iter()
                .any(|d| d.get_u64(field::RECEIPT_ID) == Some(candidate.value()));
            if collides {
                tracing::warn!(
                    attempt = attempt + 1,
                    candidate = candidate.value(),
                    "receipt candidate already present in peek window"
                );
                continue;
            }

            tracing::debug!(receipt_id = candidate.value(), "allocated receipt id");
            return ReceiptAllocation {
                receipt_id: candidate,
                source: AllocationSource::Sequential,
                attempts: attempt + 1,
            };
        }

        let receipt_id = ReceiptId::new(acf_crypto::random_in_range(self.config.fallback_range()));
        tracing::warn!(
            receipt_id = receipt_id.value(),
            attempts = self.config.max_attempts,
            "receipt sequencing exhausted, using random fallback id"
        );
        ReceiptAllocation {
            receipt_id,
            source: AllocationSource::Fallback,
            attempts: self.config.max_attempts,
        }
    }

    async fn peek(&self) -> StoreResult<Vec<Document>> {
        let query = Query::new()
            .order_desc(field::RECEIPT_ID)
            .limit(self.config.peek_limit)
            .select([field::RECEIPT_ID]);
        self.store.list(&query).await
    }

    async fn backoff(&self, attempt: u32) {
        let ceiling = self.config.backoff_ceiling(attempt);
        if ceiling.is_zero() {
            return;
        }
        let ms = rand::thread_rng().gen_range(0..ceiling.as_millis() as u64);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

impl std::fmt::Debug for ReceiptSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptSequencer")
            .field("config", &self.config)
            .finish()
    }
}
