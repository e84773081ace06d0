//! Shared fixtures for ledger tests.

use std::sync::Arc;

use acf_crypto::PassHasher;
use acf_store::{DocumentId, InMemoryBlobStore, InMemoryDocumentStore};
use acf_types::DonationPass;

use crate::config::{LedgerConfig, SequencerConfig};
use crate::issuer::PassIssuer;
use crate::record::field;
use crate::verifier::PassVerifier;

pub(crate) const SECRET: &str = "festival-verification-secret";

pub(crate) fn hasher() -> PassHasher {
    PassHasher::new(SECRET).unwrap()
}

/// Default config without backoff sleeps.
pub(crate) fn fast_config() -> LedgerConfig {
    LedgerConfig {
        sequencer: SequencerConfig {
            backoff_base_ms: 0,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub(crate) struct Fixture {
    pub store: Arc<InMemoryDocumentStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub issuer: Arc<PassIssuer>,
    pub verifier: PassVerifier,
}

pub(crate) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryDocumentStore::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let issuer = Arc::new(PassIssuer::new(
        store.clone(),
        blobs.clone(),
        hasher(),
        fast_config(),
    ));
    let verifier = PassVerifier::new(store.clone(), hasher());
    Fixture {
        store,
        blobs,
        issuer,
        verifier,
    }
}

/// Store id of the document holding `pass`.
pub(crate) fn document_id(store: &InMemoryDocumentStore, pass: &DonationPass) -> DocumentId {
    let key = pass.secure_pass_id.to_string();
    store
        .all()
        .into_iter()
        .find(|d| d.get_str(field::SECURE_PASS_ID) == Some(key.as_str()))
        .map(|d| d.id)
        .expect("pass document present")
}
