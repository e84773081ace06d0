use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Mutex;

use acf_crypto::PassHasher;
use acf_store::{BlobRef, BlobStore, DocumentStore, Query};
use acf_types::{DonationInput, DonationPass, PassTimestamp, ReceiptId, SecurePassId};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::record::{self, field};
use crate::sequencer::ReceiptSequencer;

/// Content type of rendered pass images.
pub const PASS_IMAGE_CONTENT_TYPE: &str = "image/png";

/// Outcome of pushing a rendered pass image to blob storage.
///
/// Image sync is best-effort: the pass record is already durable when this
/// runs, so a failure here never undoes issuance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    Synced { reference: BlobRef },
    Failed { reason: String, retryable: bool },
}

impl SyncStatus {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// Creates donation passes.
///
/// Issuance validates the submission, fixes the secure id and timestamp,
/// signs the tamper-relevant fields, then loops allocating a receipt id and
/// checking it for uniqueness until one is free or the save budget runs out.
///
/// The uniqueness check and the write run under one lock, so tasks sharing an issuer
/// never save the same receipt id. Separate processes can still race between
/// check and write; the store offers nothing to close that gap.
pub struct PassIssuer {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    sequencer: ReceiptSequencer,
    hasher: PassHasher,
    config: LedgerConfig,
    write_lock: Mutex<()>,
}

impl PassIssuer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        hasher: PassHasher,
        config: LedgerConfig,
    ) -> Self {
        let sequencer = ReceiptSequencer::new(store.clone(), config.sequencer.clone());
        Self {
            store,
            blobs,
            sequencer,
            hasher,
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Issue and persist a new pass.
    ///
    /// Returns only after the record is durably stored. Invalid input is
    /// rejected before any id is allocated or the store is touched.
    pub async fn issue(&self, input: &DonationInput) -> LedgerResult<DonationPass> {
        let draft = input.sanitize()?;

        let secure_pass_id = SecurePassId::generate();
        let transaction_timestamp = PassTimestamp::now();
        let verification_hash =
            self.hasher
                .digest(&secure_pass_id, &draft.amount, &transaction_timestamp);

        for attempt in 1..=self.config.max_save_attempts {
            let receipt_id = self.sequencer.next_receipt_id().await;
            let _write = self.write_lock.lock().await;
            if !self.is_receipt_unique(receipt_id).await {
                tracing::warn!(
                    attempt,
                    receipt_id = receipt_id.value(),
                    "receipt id already taken, reallocating"
                );
                continue;
            }

            let pass = DonationPass {
                secure_pass_id,
                receipt_id,
                display_transaction_id: receipt_id.display_id(&self.config.display_prefix),
                donor_name: draft.donor_name.clone(),
                amount: draft.amount,
                purpose: draft.purpose.clone(),
                transaction_timestamp,
                verification_hash: verification_hash.clone(),
                payment_method: draft.payment_method,
            };

            let fields = record::to_fields(&pass)?;
            let doc = self.store.create(fields).await?;
            tracing::info!(
                document_id = %doc.id,
                transaction = %pass.display_transaction_id,
                amount = %pass.amount.canonical(),
                "donation pass issued"
            );
            return Ok(pass);
        }

        Err(LedgerError::ReceiptExhausted {
            attempts: self.config.max_save_attempts,
        })
    }

    /// Upload a rendered pass image under `Pass_<displayId>.png`.
    pub async fn upload_image(&self, pass: &DonationPass, png: Bytes) -> SyncStatus {
        if png.is_empty() {
            return SyncStatus::Failed {
                reason: "image is empty".into(),
                retryable: false,
            };
        }
        let file_name = pass.image_file_name();
        match self.blobs.upload(&file_name, PASS_IMAGE_CONTENT_TYPE, png).await {
            Ok(reference) => {
                tracing::info!(file = %file_name, reference = %reference, "pass image synced");
                SyncStatus::Synced { reference }
            }
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "pass image sync failed");
                SyncStatus::Failed {
                    reason: e.to_string(),
                    retryable: e.is_connectivity(),
                }
            }
        }
    }

    /// A failed lookup counts as unique; the write that follows is the
    /// real test of connectivity.
    async fn is_receipt_unique(&self, receipt_id: ReceiptId) -> bool {
        let query = Query::new()
            .equal(field::RECEIPT_ID, receipt_id.value())
            .select([field::RECEIPT_ID]);
        match self.store.find_one(&query).await {
            Ok(existing) => existing.is_none(),
            Err(e) => {
                tracing::warn!(
                    receipt_id = receipt_id.value(),
                    error = %e,
                    "receipt uniqueness check failed, assuming unique"
                );
                true
            }
        }
    }
}

impl std::fmt::Debug for PassIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassIssuer")
            .field("sequencer", &self.sequencer)
            .field("hasher", &self.hasher)
            .field("config", &self.config)
            .finish()
    }
}
