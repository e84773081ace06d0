use std::time::Duration;

use acf_crypto::CryptoError;

/// Errors produced by the access gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The client exhausted its window.
    #[error("too many attempts; retry after {retry_after:?}")]
    RateLimited { retry_after: Duration, reset_at_ms: u64 },

    /// The submitted secret was empty after trimming.
    #[error("secret cannot be empty")]
    EmptySecret,

    /// The submitted secret did not match. Deliberately carries no detail.
    #[error("invalid credentials")]
    InvalidCredentials { remaining: u32 },

    /// No usable admin hash is configured on the server.
    #[error("authentication not configured: {0}")]
    NotConfigured(String),

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<CryptoError> for GateError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::MalformedHash(msg) => Self::NotConfigured(msg),
            other => Self::Config(other.to_string()),
        }
    }
}

/// Result alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;
