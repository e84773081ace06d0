use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use acf_gate::GateError;

use crate::client::ClientKey;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Clone, Debug)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Self::Bearer(t.to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

/// Extractor that admits only requests carrying a live admin session token.
#[derive(Clone, Debug)]
pub struct AdminBearer;

#[async_trait]
impl FromRequestParts<AppState> for AdminBearer {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Credentials::from_headers(&parts.headers) {
            Credentials::Bearer(token) if state.admin.is_admin(&token) => Ok(Self),
            Credentials::Bearer(_) => Err(ServerError::Unauthorized(
                "Session expired or invalid. Please sign in again.".into(),
            )),
            Credentials::Anonymous => Err(ServerError::Unauthorized(
                "Admin session token required".into(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminAuthRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAuthResponse {
    pub success: bool,
    pub session_token: String,
    pub message: String,
    pub expires_at: String,
}

/// `POST /api/admin-auth`
///
/// Every request counts against the caller's window, including malformed
/// ones. Hash verification runs on the blocking pool.
pub async fn admin_auth_handler(
    State(state): State<AppState>,
    client: ClientKey,
    payload: Result<Json<AdminAuthRequest>, JsonRejection>,
) -> ServerResult<Json<AdminAuthResponse>> {
    let password = payload
        .ok()
        .and_then(|Json(body)| body.password)
        .unwrap_or_default();

    let gate = state.admin.clone();
    let client_key = client.0.clone();
    let outcome = tokio::task::spawn_blocking(move || gate.login(&client_key, &password))
        .await
        .map_err(|e| ServerError::Internal(format!("login task failed: {e}")))?;

    match outcome {
        Ok(session) => Ok(Json(AdminAuthResponse {
            success: true,
            session_token: session.token,
            message: "Authentication successful".into(),
            expires_at: iso_millis(session.expires_at_ms),
        })),
        Err(GateError::RateLimited { retry_after, .. }) => {
            let ms = retry_after.as_millis() as u64;
            let minutes = ms.div_ceil(60_000);
            tracing::warn!(client = client.as_str(), minutes, "admin login throttled");
            Err(ServerError::RateLimited {
                error: "Too many authentication attempts",
                message: format!("Please try again in {minutes} minutes"),
                retry_after: minutes,
                retry_after_secs: ms.div_ceil(1_000),
            })
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn iso_millis(ms: u64) -> String {
    DateTime::from_timestamp_millis(ms as i64)
        .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}
