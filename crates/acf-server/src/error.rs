use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use acf_gate::GateError;
use acf_ledger::LedgerError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid password ({remaining} attempts remaining)")]
    InvalidCredentials { remaining: u32 },

    #[error("{error}: {message}")]
    RateLimited {
        error: &'static str,
        message: String,
        /// Value of the `retryAfter` body field, in the endpoint's own unit.
        retry_after: u64,
        /// Value of the `Retry-After` header, always seconds.
        retry_after_secs: u64,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("{0} not configured")]
    NotConfigured(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotConfigured(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::BadRequest(msg) => json!({ "error": msg }),
            Self::Unauthorized(msg) => json!({ "error": "Unauthorized", "message": msg }),
            Self::InvalidCredentials { remaining } => {
                json!({ "error": "Invalid password", "remaining": remaining })
            }
            Self::RateLimited {
                error,
                message,
                retry_after,
                ..
            } => json!({ "error": error, "message": message, "retryAfter": retry_after }),
            Self::NotFound(what) => json!({ "error": "Not found", "message": what }),
            Self::Conflict(msg) => json!({ "error": "Conflict", "message": msg }),
            Self::Unavailable(_) => json!({
                "error": "Service unavailable",
                "message": "Could not reach the pass ledger. Please check your connection and try again.",
            }),
            Self::NotConfigured(what) => json!({ "error": format!("{what} not configured") }),
            Self::Upstream(_) => json!({ "error": "Failed to generate response" }),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                json!({ "error": "Internal server error" })
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }

        let mut response = (status, Json(self.body())).into_response();
        if let Self::RateLimited {
            retry_after_secs, ..
        } = &self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
        }
        response
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(inner) => Self::BadRequest(inner.to_string()),
            LedgerError::ReceiptExhausted { .. } => Self::Conflict(e.to_string()),
            LedgerError::Connectivity(msg) => Self::Unavailable(msg),
            LedgerError::PassNotFound(id) => Self::NotFound(format!("pass {id}")),
            LedgerError::Config(msg) => Self::Config(msg),
            LedgerError::Store(inner) => Self::Internal(inner.to_string()),
        }
    }
}

impl From<GateError> for ServerError {
    /// Rate-limit rejections need endpoint context for their body and are
    /// mapped by the handlers; this conversion reports them in seconds.
    fn from(e: GateError) -> Self {
        match e {
            GateError::EmptySecret => Self::BadRequest("Password cannot be empty".into()),
            GateError::InvalidCredentials { remaining } => Self::InvalidCredentials { remaining },
            GateError::NotConfigured(_) => Self::NotConfigured("Authentication".into()),
            GateError::Config(msg) => Self::Config(msg),
            GateError::RateLimited { retry_after, .. } => {
                let secs = (retry_after.as_millis() as u64).div_ceil(1_000);
                Self::RateLimited {
                    error: "Too many requests",
                    message: format!("Rate limit exceeded. Please try again in {secs} seconds."),
                    retry_after: secs,
                    retry_after_secs: secs,
                }
            }
        }
    }
}
