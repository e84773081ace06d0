use std::fmt;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::TypeError;
use crate::identity::{DisplayTransactionId, ReceiptId, SecurePassId};
use crate::temporal::PassTimestamp;

/// Placeholder used when a donor leaves the name blank.
pub const ANONYMOUS_DONOR: &str = "Anonymous Donor";
/// Donor names are capped at this many characters after trimming.
pub const MAX_DONOR_NAME_CHARS: usize = 100;
/// Purposes are capped at this many characters after trimming.
pub const MAX_PURPOSE_CHARS: usize = 500;

/// Self-reported payment method. Never independently verified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Cash,
    BankTransfer,
    #[default]
    MobilePayment,
}

impl PaymentMethod {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::Cash => "cash",
            Self::BankTransfer => "bank_transfer",
            Self::MobilePayment => "mobile_payment",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A donation as submitted by a client, before any validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationInput {
    #[serde(default)]
    pub donor_name: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl DonationInput {
    pub fn new(donor_name: impl Into<String>, amount: f64) -> Self {
        Self {
            donor_name: Some(donor_name.into()),
            amount,
            ..Default::default()
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    /// Validate the amount and clean up the free-text fields.
    ///
    /// The amount is checked first so that an invalid submission is rejected
    /// before anything else happens.
    pub fn sanitize(&self) -> Result<DonationDraft, TypeError> {
        let amount = Amount::from_major(self.amount)?;

        let name = truncate_chars(self.donor_name.as_deref().unwrap_or(""), MAX_DONOR_NAME_CHARS);
        let donor_name = if name.is_empty() {
            ANONYMOUS_DONOR.to_string()
        } else {
            name
        };
        let purpose = truncate_chars(self.purpose.as_deref().unwrap_or(""), MAX_PURPOSE_CHARS);

        Ok(DonationDraft {
            donor_name,
            amount,
            purpose,
            payment_method: self.payment_method.unwrap_or_default(),
        })
    }
}

/// A validated donation, ready to be issued as a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DonationDraft {
    pub donor_name: String,
    pub amount: Amount,
    pub purpose: String,
    pub payment_method: PaymentMethod,
}

/// The persisted donation record. Created once, never updated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationPass {
    pub secure_pass_id: SecurePassId,
    pub receipt_id: ReceiptId,
    pub display_transaction_id: DisplayTransactionId,
    pub donor_name: String,
    pub amount: Amount,
    #[serde(default)]
    pub purpose: String,
    pub transaction_timestamp: PassTimestamp,
    pub verification_hash: String,
    #[serde(default, rename = "paymentMethodTag")]
    pub payment_method: PaymentMethod,
}

impl DonationPass {
    /// The text encoded in the pass QR code.
    ///
    /// Scanning the code yields exactly this string, which the verifier
    /// accepts as input.
    pub fn scan_payload(&self) -> String {
        self.secure_pass_id.to_string()
    }

    /// Suggested file name for the rendered pass image.
    pub fn image_file_name(&self) -> String {
        format!("Pass_{}.png", self.display_transaction_id)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.trim().chars().take(max).collect()
}
