use std::sync::Arc;

use serde::Serialize;

use acf_store::{DocumentStore, Query};
use acf_types::{Amount, DonationPass};

use crate::error::LedgerResult;
use crate::record::{self, field};

/// Aggregate over every decodable pass in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub count: usize,
    /// Sum of amounts in minor units.
    pub total_minor: u64,
    /// Sum of amounts as a two-decimal string.
    pub total: String,
    /// Records that could not be decoded and were left out.
    pub skipped: usize,
}

/// Passes and their summary from a single read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub passes: Vec<DonationPass>,
    pub summary: LedgerSummary,
}

/// Read-only admin view over issued passes.
pub struct LedgerView {
    store: Arc<dyn DocumentStore>,
}

impl LedgerView {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every decodable pass, newest receipt first.
    pub async fn list_passes(&self) -> LedgerResult<Vec<DonationPass>> {
        Ok(self.load().await?.0)
    }

    pub async fn summary(&self) -> LedgerResult<LedgerSummary> {
        Ok(self.snapshot().await?.summary)
    }

    pub async fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        let (passes, skipped) = self.load().await?;
        let total_minor = Amount::total(passes.iter().map(|p| &p.amount));
        let summary = LedgerSummary {
            count: passes.len(),
            total_minor,
            total: format!("{}.{:02}", total_minor / 100, total_minor % 100),
            skipped,
        };
        Ok(LedgerSnapshot { passes, summary })
    }

    async fn load(&self) -> LedgerResult<(Vec<DonationPass>, usize)> {
        let docs = self
            .store
            .list(&Query::new().order_desc(field::RECEIPT_ID))
            .await?;
        let mut passes = Vec::with_capacity(docs.len());
        let mut skipped = 0;
        for doc in &docs {
            match record::from_document(doc) {
                Ok(stored) => passes.push(stored.pass),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(document_id = %doc.id, error = %e, "skipping undecodable pass record");
                }
            }
        }
        Ok((passes, skipped))
    }
}

impl std::fmt::Debug for LedgerView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerView").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use acf_types::DonationInput;

    use crate::testing::{document_id, fixture};

    #[tokio::test]
    async fn empty_ledger_summary() {
        let fx = fixture();
        let view = LedgerView::new(fx.store.clone());
        let summary = view.summary().await.unwrap();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total, "0.00");
    }

    #[tokio::test]
    async fn lists_newest_first_and_totals_exactly() {
        let fx = fixture();
        for amount in [0.1, 0.2, 501.0] {
            fx.issuer.issue(&DonationInput::new("Donor", amount)).await.unwrap();
        }
        let view = LedgerView::new(fx.store.clone());

        let passes = view.list_passes().await.unwrap();
        let ids: Vec<_> = passes.iter().map(|p| p.receipt_id.value()).collect();
        assert_eq!(ids, [10_003, 10_002, 10_001]);

        let summary = view.summary().await.unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_minor, 50_130);
        assert_eq!(summary.total, "501.30");
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn undecodable_records_are_skipped() {
        let fx = fixture();
        let pass = fx.issuer.issue(&DonationInput::new("Donor", 2.0)).await.unwrap();
        fx.issuer.issue(&DonationInput::new("Donor", 3.0)).await.unwrap();
        fx.store.patch(&document_id(&fx.store, &pass), "amount", json!(null)).unwrap();

        let summary = LedgerView::new(fx.store.clone()).summary().await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.total, "3.00");
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn offline_store_is_an_error() {
        let fx = fixture();
        fx.store.set_offline(true);
        let err = LedgerView::new(fx.store.clone()).list_passes().await.unwrap_err();
        assert!(err.is_connectivity());
    }
}
