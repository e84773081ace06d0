//! Donation pass ledger for the festival pass service.
//!
//! This crate owns the lifecycle of a pass record:
//! - `ReceiptSequencer`: next human-readable receipt number, with jittered
//!   retries and a random fallback when the store is unreachable
//! - `PassIssuer`: validation, keyed hashing, uniqueness check, persistence,
//!   and best-effort image sync
//! - `PassVerifier`: two-stage lookup and tamper detection
//! - `LedgerView`: admin listing and totals
//!
//! Records are append-only. Nothing here updates or deletes a stored pass.

pub mod config;
pub mod error;
pub mod issuer;
pub mod record;
pub mod sequencer;
pub mod verifier;
pub mod view;

pub use config::{LedgerConfig, SequencerConfig};
pub use error::{LedgerError, LedgerResult};
pub use issuer::{PassIssuer, SyncStatus, PASS_IMAGE_CONTENT_TYPE};
pub use record::{field, StoredPass};
pub use sequencer::{AllocationSource, ReceiptAllocation, ReceiptSequencer};
pub use verifier::{PassRecord, PassVerification, PassVerifier, VerificationReason};
pub use view::{LedgerSnapshot, LedgerSummary, LedgerView};

#[cfg(test)]
mod testing;
