//! Foundation types for festival donation passes.
//!
//! Every other `acf-*` crate depends on `acf-types`. Nothing in here touches
//! storage, hashing, or the network; these are plain values with their
//! validation and canonical forms.
//!
//! # Key Types
//!
//! - [`SecurePassId`] — random primary handle for a pass, encoded in its QR code
//! - [`ReceiptId`] — sequential human-readable receipt number (starts at 10001)
//! - [`DisplayTransactionId`] — `"<PREFIX>-<receiptId>"`, the printed identifier
//! - [`Amount`] — donation amount in minor units, bounded
//! - [`PassTimestamp`] — millisecond UTC timestamp with one canonical string form
//! - [`DonationInput`] / [`DonationDraft`] — raw and sanitized submissions
//! - [`DonationPass`] — the persisted record

pub mod amount;
pub mod error;
pub mod identity;
pub mod pass;
pub mod temporal;

pub use amount::Amount;
pub use error::TypeError;
pub use identity::{DisplayTransactionId, ReceiptId, SecurePassId};
pub use pass::{
    DonationDraft, DonationInput, DonationPass, PaymentMethod, ANONYMOUS_DONOR,
    MAX_DONOR_NAME_CHARS, MAX_PURPOSE_CHARS,
};
pub use temporal::PassTimestamp;
