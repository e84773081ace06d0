use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use acf_crypto::PassHasher;
use acf_store::{Document, DocumentStore, Fields, Query};
use acf_types::{DonationPass, SecurePassId};

use crate::error::LedgerResult;
use crate::record::{self, field};

/// Why a verification came out the way it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum VerificationReason {
    #[serde(rename = "verified")]
    Verified,
    #[serde(rename = "tampered")]
    Tampered,
    #[serde(rename = "not found")]
    NotFound,
}

impl VerificationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Tampered => "tampered",
            Self::NotFound => "not found",
        }
    }

    /// Human-readable message for the public verification page.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Verified => "Pass verified successfully",
            Self::Tampered => "Pass has been tampered with",
            Self::NotFound => "Pass not found",
        }
    }
}

impl fmt::Display for VerificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stored record a verification looked at.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PassRecord {
    Decoded(DonationPass),
    /// Stored fields that no longer form a valid pass (an out-of-range or
    /// sub-cent amount, a malformed id or timestamp), exactly as stored.
    Raw(Fields),
}

impl PassRecord {
    pub fn as_pass(&self) -> Option<&DonationPass> {
        match self {
            Self::Decoded(pass) => Some(pass),
            Self::Raw(_) => None,
        }
    }

    pub fn into_pass(self) -> Option<DonationPass> {
        match self {
            Self::Decoded(pass) => Some(pass),
            Self::Raw(_) => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// Result of verifying a pass identifier.
///
/// `valid` is true only for [`VerificationReason::Verified`]. Whenever a
/// record was found it is returned, tampered or not, so the caller can show
/// what the ledger currently claims.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PassVerification {
    pub valid: bool,
    pub reason: VerificationReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PassRecord>,
}

impl PassVerification {
    fn verified(pass: DonationPass) -> Self {
        Self {
            valid: true,
            reason: VerificationReason::Verified,
            record: Some(PassRecord::Decoded(pass)),
        }
    }

    fn tampered(record: PassRecord) -> Self {
        Self {
            valid: false,
            reason: VerificationReason::Tampered,
            record: Some(record),
        }
    }

    fn not_found() -> Self {
        Self {
            valid: false,
            reason: VerificationReason::NotFound,
            record: None,
        }
    }
}

/// Resolves a scanned or typed identifier to a pass and checks its seal.
pub struct PassVerifier {
    store: Arc<dyn DocumentStore>,
    hasher: PassHasher,
}

impl PassVerifier {
    pub fn new(store: Arc<dyn DocumentStore>, hasher: PassHasher) -> Self {
        Self { store, hasher }
    }

    /// Verify a pass by secure id or printed transaction id.
    ///
    /// Store connectivity failures are errors, never `NotFound`, so callers
    /// can tell "no such pass" from "could not look".
    pub async fn verify(&self, raw: &str) -> LedgerResult<PassVerification> {
        let Some(doc) = self.find_document(raw).await? else {
            tracing::info!(id = raw.trim(), "verification: pass not found");
            return Ok(PassVerification::not_found());
        };

        let pass = match record::from_document(&doc) {
            Ok(stored) => stored.pass,
            Err(e) => {
                tracing::warn!(document_id = %doc.id, error = %e, "verification: undecodable pass record");
                return Ok(PassVerification::tampered(PassRecord::Raw(record::raw_fields(&doc))));
            }
        };

        let intact = self.hasher.verify(
            &pass.secure_pass_id,
            &pass.amount,
            &pass.transaction_timestamp,
            &pass.verification_hash,
        );
        if intact {
            tracing::info!(transaction = %pass.display_transaction_id, "verification: pass verified");
            Ok(PassVerification::verified(pass))
        } else {
            tracing::warn!(transaction = %pass.display_transaction_id, "verification: hash mismatch");
            Ok(PassVerification::tampered(PassRecord::Decoded(pass)))
        }
    }

    /// Look a pass up without checking its seal.
    pub async fn find_pass(&self, raw: &str) -> LedgerResult<Option<DonationPass>> {
        match self.find_document(raw).await? {
            Some(doc) => Ok(Some(record::from_document(&doc)?.pass)),
            None => Ok(None),
        }
    }

    /// Secure id first, then printed transaction id. Both are exact matches
    /// on the trimmed input; a UUID is matched in its canonical lowercase form.
    async fn find_document(&self, raw: &str) -> LedgerResult<Option<Document>> {
        let id = raw.trim();
        if id.is_empty() {
            return Ok(None);
        }

        let pass_key = SecurePassId::parse(id)
            .map(|p| p.to_string())
            .unwrap_or_else(|_| id.to_string());
        let by_pass_id = Query::new().equal(field::SECURE_PASS_ID, pass_key);
        if let Some(doc) = self.store.find_one(&by_pass_id).await? {
            return Ok(Some(doc));
        }

        let by_display_id = Query::new().equal(field::DISPLAY_TRANSACTION_ID, id);
        Ok(self.store.find_one(&by_display_id).await?)
    }
}

impl fmt::Debug for PassVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassVerifier")
            .field("hasher", &self.hasher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    use acf_types::{DonationInput, PassTimestamp};

    use crate::error::LedgerError;
    use crate::testing::{document_id, fixture, Fixture};

    async fn issued(fx: &Fixture) -> DonationPass {
        fx.issuer
            .issue(&DonationInput::new("Jane Doe", 501.0))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn verifies_by_secure_id_and_display_id() {
        let fx = fixture();
        let pass = issued(&fx).await;

        let by_scan = fx.verifier.verify(&pass.scan_payload()).await.unwrap();
        assert!(by_scan.valid);
        assert_eq!(by_scan.reason, VerificationReason::Verified);
        assert_eq!(by_scan.record.as_ref().and_then(PassRecord::as_pass), Some(&pass));

        let by_receipt = fx.verifier.verify("ACF-10001").await.unwrap();
        assert!(by_receipt.valid);
        assert_eq!(by_receipt.record, Some(PassRecord::Decoded(pass)));
    }

    #[tokio::test]
    async fn input_is_trimmed_and_uuid_case_insensitive() {
        let fx = fixture();
        let pass = issued(&fx).await;

        let padded = format!("  {}\n", pass.secure_pass_id);
        assert!(fx.verifier.verify(&padded).await.unwrap().valid);

        let upper = pass.secure_pass_id.to_string().to_uppercase();
        assert!(fx.verifier.verify(&upper).await.unwrap().valid);

        assert!(fx.verifier.verify(" ACF-10001 ").await.unwrap().valid);
    }

    #[tokio::test]
    async fn unknown_or_empty_id_is_not_found() {
        let fx = fixture();
        issued(&fx).await;

        for id in ["ACF-99999", "", "   ", "00000000-0000-4000-8000-000000000000"] {
            let v = fx.verifier.verify(id).await.unwrap();
            assert!(!v.valid);
            assert_eq!(v.reason, VerificationReason::NotFound);
            assert!(v.record.is_none());
        }
    }

    fn decoded(v: PassVerification) -> DonationPass {
        v.record
            .and_then(PassRecord::into_pass)
            .expect("decoded record")
    }

    fn raw(v: PassVerification) -> Fields {
        match v.record {
            Some(PassRecord::Raw(fields)) => fields,
            other => panic!("expected raw record, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn edited_amount_is_tampered() {
        let fx = fixture();
        let pass = issued(&fx).await;
        fx.store
            .patch(&document_id(&fx.store, &pass), field::AMOUNT, json!(5.01))
            .unwrap();

        let v = fx.verifier.verify("ACF-10001").await.unwrap();
        assert!(!v.valid);
        assert_eq!(v.reason, VerificationReason::Tampered);
        assert_eq!(decoded(v).amount.canonical(), "5.01");
    }

    #[tokio::test]
    async fn sub_cent_amount_edit_is_tampered() {
        let fx = fixture();
        let pass = issued(&fx).await;
        let edited = pass.amount.to_major() + 0.004;
        fx.store
            .patch(&document_id(&fx.store, &pass), field::AMOUNT, json!(edited))
            .unwrap();

        let v = fx.verifier.verify(&pass.scan_payload()).await.unwrap();
        assert!(!v.valid);
        assert_eq!(v.reason, VerificationReason::Tampered);
        assert_eq!(raw(v)[field::AMOUNT], json!(edited));
    }

    #[tokio::test]
    async fn edited_timestamp_is_tampered() {
        let fx = fixture();
        let pass = issued(&fx).await;
        let shifted =
            PassTimestamp::from_millis(pass.transaction_timestamp.as_millis() + 1).unwrap();
        fx.store
            .patch(
                &document_id(&fx.store, &pass),
                field::TRANSACTION_TIMESTAMP,
                json!(shifted.canonical()),
            )
            .unwrap();

        let v = fx.verifier.verify(&pass.scan_payload()).await.unwrap();
        assert_eq!(v.reason, VerificationReason::Tampered);
    }

    #[tokio::test]
    async fn edited_hash_is_tampered() {
        let fx = fixture();
        let pass = issued(&fx).await;
        fx.store
            .patch(
                &document_id(&fx.store, &pass),
                field::VERIFICATION_HASH,
                json!("0".repeat(64)),
            )
            .unwrap();
        let v = fx.verifier.verify(&pass.scan_payload()).await.unwrap();
        assert_eq!(v.reason, VerificationReason::Tampered);
    }

    #[tokio::test]
    async fn edited_secure_id_is_tampered() {
        let fx = fixture();
        let pass = issued(&fx).await;
        let forged = SecurePassId::generate();
        fx.store
            .patch(
                &document_id(&fx.store, &pass),
                field::SECURE_PASS_ID,
                json!(forged.to_string()),
            )
            .unwrap();

        let v = fx.verifier.verify("ACF-10001").await.unwrap();
        assert_eq!(v.reason, VerificationReason::Tampered);

        let v = fx.verifier.verify(&forged.to_string()).await.unwrap();
        assert_eq!(v.reason, VerificationReason::Tampered);

        let v = fx.verifier.verify(&pass.scan_payload()).await.unwrap();
        assert_eq!(v.reason, VerificationReason::NotFound);
    }

    #[tokio::test]
    async fn offset_form_timestamp_still_verifies() {
        let fx = fixture();
        let pass = issued(&fx).await;
        let rewritten = pass
            .transaction_timestamp
            .canonical()
            .replace('Z', "+00:00");
        fx.store
            .patch(
                &document_id(&fx.store, &pass),
                field::TRANSACTION_TIMESTAMP,
                json!(rewritten),
            )
            .unwrap();

        let v = fx.verifier.verify(&pass.scan_payload()).await.unwrap();
        assert!(v.valid);
        assert_eq!(decoded(v).transaction_timestamp, pass.transaction_timestamp);
    }

    #[tokio::test]
    async fn unsealed_fields_do_not_affect_validity() {
        let fx = fixture();
        let pass = issued(&fx).await;
        fx.store
            .patch(&document_id(&fx.store, &pass), field::DONOR_NAME, json!("Mallory"))
            .unwrap();

        let v = fx.verifier.verify(&pass.scan_payload()).await.unwrap();
        assert!(v.valid);
        assert_eq!(decoded(v).donor_name, "Mallory");
    }

    #[tokio::test]
    async fn undecodable_record_is_tampered_with_stored_fields() {
        let cases = [
            (field::AMOUNT, json!(2_000_000.0)),
            (field::AMOUNT, json!(0)),
            (field::AMOUNT, json!(-501.0)),
            (field::AMOUNT, json!("lots")),
            (field::SECURE_PASS_ID, json!("not-a-uuid")),
            (field::TRANSACTION_TIMESTAMP, json!("yesterday")),
        ];
        for (name, value) in cases {
            let fx = fixture();
            let pass = issued(&fx).await;
            fx.store
                .patch(&document_id(&fx.store, &pass), name, value.clone())
                .unwrap();

            let v = fx.verifier.verify("ACF-10001").await.unwrap();
            assert!(!v.valid, "{name} = {value}");
            assert_eq!(v.reason, VerificationReason::Tampered);
            let fields = raw(v);
            assert_eq!(fields[name], value);
            assert_eq!(fields[field::DONOR_NAME], json!("Jane Doe"));
            assert_eq!(fields[field::DISPLAY_TRANSACTION_ID], json!("ACF-10001"));
        }
    }

    #[test]
    fn raw_record_serializes_as_stored() {
        let mut fields = Fields::new();
        fields.insert(field::AMOUNT.into(), json!(2_000_000.0));
        let v = PassVerification::tampered(PassRecord::Raw(fields));
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"valid": false, "reason": "tampered", "record": {"amount": 2_000_000.0}})
        );
    }

    #[tokio::test]
    async fn unreachable_store_is_an_error_not_not_found() {
        let fx = fixture();
        issued(&fx).await;
        fx.store.set_offline(true);

        let err = fx.verifier.verify("ACF-10001").await.unwrap_err();
        assert!(matches!(err, LedgerError::Connectivity(_)));
    }

    #[tokio::test]
    async fn find_pass_skips_seal_check() {
        let fx = fixture();
        let pass = issued(&fx).await;
        fx.store
            .patch(&document_id(&fx.store, &pass), field::AMOUNT, json!(1.0))
            .unwrap();

        let found = fx.verifier.find_pass("ACF-10001").await.unwrap().unwrap();
        assert_eq!(found.secure_pass_id, pass.secure_pass_id);
        assert!(fx.verifier.find_pass("ACF-2").await.unwrap().is_none());
    }

    #[test]
    fn verification_serializes_reason_text() {
        let v = PassVerification::not_found();
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"valid": false, "reason": "not found"})
        );
        assert_eq!(VerificationReason::Tampered.message(), "Pass has been tampered with");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn any_valid_amount_round_trips_through_the_ledger(minor in 1u64..=100_000_000) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let verification = rt.block_on(async {
                let fx = fixture();
                let input = DonationInput::new("Donor", minor as f64 / 100.0);
                let pass = fx.issuer.issue(&input).await.unwrap();
                prop_assert_eq!(pass.amount.minor_units(), minor);
                Ok(fx.verifier.verify(&pass.scan_payload()).await.unwrap())
            })?;
            prop_assert!(verification.valid);
        }
    }
}
