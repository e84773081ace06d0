use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Primary external handle for a pass.
///
/// Generated from the OS CSPRNG (UUID v4, 122 random bits), never derived
/// from user input. This is the value encoded in the pass QR code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurePassId(Uuid);

impl SecurePassId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a hyphenated UUID string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidIdentifier(format!("{s:?}: {e}")))
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for SecurePassId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for SecurePassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecurePassId({})", self.0)
    }
}

impl fmt::Display for SecurePassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Sequential, human-readable receipt number.
///
/// Allocated by the receipt sequencer. Monotonic under normal operation but
/// not transactionally guaranteed unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(u64);

impl ReceiptId {
    /// The first receipt number handed out on an empty ledger.
    pub const BASE: Self = Self(10001);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The receipt number directly after this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The printed identifier for this receipt under `prefix`.
    pub fn display_id(&self, prefix: &str) -> DisplayTransactionId {
        DisplayTransactionId::new(prefix, *self)
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable transaction identifier, `"<PREFIX>-<receiptId>"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayTransactionId(String);

impl DisplayTransactionId {
    /// Default prefix used on printed passes.
    pub const DEFAULT_PREFIX: &'static str = "ACF";

    pub fn new(prefix: &str, receipt: ReceiptId) -> Self {
        Self(format!("{prefix}-{receipt}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into prefix and receipt number, if well-formed.
    pub fn parts(&self) -> Option<(&str, ReceiptId)> {
        let (prefix, number) = self.0.rsplit_once('-')?;
        let value = number.parse::<u64>().ok()?;
        Some((prefix, ReceiptId::new(value)))
    }
}

impl fmt::Display for DisplayTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DisplayTransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
