use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use acf_gate::FALLBACK_CLIENT_KEY;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Rate-limit key for the calling client.
///
/// The first `X-Forwarded-For` entry, else `X-Real-IP`, else a shared
/// fallback bucket. Both headers are client-controlled unless a trusted
/// proxy overwrites them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim);
        let real_ip = headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .map(str::trim);

        let key = forwarded
            .filter(|s| !s.is_empty())
            .or(real_ip.filter(|s| !s.is_empty()))
            .unwrap_or(FALLBACK_CLIENT_KEY);
        Self(key.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientKey {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
