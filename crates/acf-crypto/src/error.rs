/// Errors from cryptographic operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A keyed hasher was constructed with an empty secret.
    #[error("verification secret is empty")]
    EmptySecret,

    /// The stored password hash could not be parsed.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    /// Hashing itself failed (bad parameters, RNG failure).
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
