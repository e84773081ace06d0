use std::fmt;

use acf_types::{Amount, PassTimestamp, SecurePassId};

use crate::error::CryptoError;

/// Keyed BLAKE3 digest over the tamper-relevant fields of a pass.
///
/// The key is derived from the shared verification secret with a fixed
/// context string, so only holders of the secret can produce or check a
/// digest. The digested payload is
/// `"<securePassId>:<amount>:<transactionTimestamp>"` with the amount and
/// timestamp in their canonical forms; the same bytes must be produced at
/// issuance and at verification.
#[derive(Clone)]
pub struct PassHasher {
    key: [u8; 32],
}

impl PassHasher {
    const CONTEXT: &'static str = "acf-pass 2024 verification-hash v1";

    /// Derive a hasher from the shared verification secret.
    pub fn new(secret: &str) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        Ok(Self {
            key: blake3::derive_key(Self::CONTEXT, secret.as_bytes()),
        })
    }

    /// The canonical payload string for a set of pass fields.
    pub fn payload(pass_id: &SecurePassId, amount: &Amount, timestamp: &PassTimestamp) -> String {
        format!("{}:{}:{}", pass_id, amount.canonical(), timestamp.canonical())
    }

    /// Compute the hex-encoded verification hash.
    pub fn digest(&self, pass_id: &SecurePassId, amount: &Amount, timestamp: &PassTimestamp) -> String {
        self.raw_digest(pass_id, amount, timestamp).to_hex().to_string()
    }

    /// Check a stored hex digest against the given fields.
    ///
    /// Malformed hex is a mismatch, not an error. Comparison is constant-time.
    pub fn verify(
        &self,
        pass_id: &SecurePassId,
        amount: &Amount,
        timestamp: &PassTimestamp,
        expected_hex: &str,
    ) -> bool {
        match blake3::Hash::from_hex(expected_hex.trim()) {
            Ok(expected) => self.raw_digest(pass_id, amount, timestamp) == expected,
            Err(_) => false,
        }
    }

    fn raw_digest(&self, pass_id: &SecurePassId, amount: &Amount, timestamp: &PassTimestamp) -> blake3::Hash {
        let payload = Self::payload(pass_id, amount, timestamp);
        blake3::keyed_hash(&self.key, payload.as_bytes())
    }
}

impl fmt::Debug for PassHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassHasher").field("key", &"<redacted>").finish()
    }
}

/// Domain-separated fingerprint of a bearer token.
///
/// Session registries key on the fingerprint rather than the raw token, so a
/// lookup never compares secret bytes directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenFingerprint([u8; 32]);

impl TokenFingerprint {
    const DOMAIN: &'static str = "acf-session-token-v1";

    pub fn of(token: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(Self::DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(token.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Short hex prefix, safe to log.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for TokenFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenFingerprint({})", self.short())
    }
}
