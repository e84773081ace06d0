use thiserror::Error;

/// Errors produced when constructing or parsing pass types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("donation amount must be greater than zero")]
    NonPositiveAmount,

    #[error("donation amount cannot exceed {max}")]
    AmountTooLarge { max: String },

    #[error("donation amount is not a finite number")]
    InvalidAmount,

    #[error("donation amount {0} is not a whole cent")]
    InexactAmount(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}
