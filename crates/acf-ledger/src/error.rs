use acf_store::StoreError;
use acf_types::TypeError;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The submission was rejected before touching the store.
    #[error("invalid donation: {0}")]
    Validation(#[from] TypeError),

    /// Every save attempt found its receipt id already taken.
    #[error("failed to allocate a unique receipt id after {attempts} attempts")]
    ReceiptExhausted { attempts: u32 },

    /// The document store could not be reached.
    #[error("store unreachable: {0}")]
    Connectivity(String),

    /// The document store was reached but the operation failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// No pass matches the given identifier.
    #[error("pass not found: {0}")]
    PassNotFound(String),

    /// The ledger is misconfigured.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => Self::Connectivity(msg),
            other => Self::Store(other),
        }
    }
}

impl LedgerError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
