//! Mapping between [`DonationPass`] and its stored document form.

use acf_store::{Document, DocumentId, Fields, StoreResult};
use acf_types::DonationPass;

/// Field names of a stored pass document.
pub mod field {
    pub const SECURE_PASS_ID: &str = "securePassId";
    pub const RECEIPT_ID: &str = "receiptId";
    pub const DISPLAY_TRANSACTION_ID: &str = "displayTransactionId";
    pub const DONOR_NAME: &str = "donorName";
    pub const AMOUNT: &str = "amount";
    pub const PURPOSE: &str = "purpose";
    pub const TRANSACTION_TIMESTAMP: &str = "transactionTimestamp";
    pub const VERIFICATION_HASH: &str = "verificationHash";
    pub const PAYMENT_METHOD: &str = "paymentMethodTag";

    /// Every field a pass document carries.
    pub const ALL: [&str; 9] = [
        SECURE_PASS_ID,
        RECEIPT_ID,
        DISPLAY_TRANSACTION_ID,
        DONOR_NAME,
        AMOUNT,
        PURPOSE,
        TRANSACTION_TIMESTAMP,
        VERIFICATION_HASH,
        PAYMENT_METHOD,
    ];
}

/// A pass as read back from the store, with its store-assigned id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredPass {
    pub document_id: DocumentId,
    pub pass: DonationPass,
}

pub fn to_fields(pass: &DonationPass) -> StoreResult<Fields> {
    Document::encode(pass)
}

/// Decode a stored document.
///
/// Timestamps in any RFC 3339 form (`+00:00`, microseconds) are accepted
/// and come back in canonical form.
pub fn from_document(doc: &Document) -> StoreResult<StoredPass> {
    Ok(StoredPass {
        document_id: doc.id.clone(),
        pass: doc.decode()?,
    })
}

/// The pass fields of a document exactly as stored, without validation.
///
/// Used to show what a damaged record claims when it no longer decodes.
pub fn raw_fields(doc: &Document) -> Fields {
    field::ALL
        .iter()
        .filter_map(|name| doc.get(name).map(|v| (name.to_string(), v.clone())))
        .collect()
}
