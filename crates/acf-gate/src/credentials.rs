use std::sync::Arc;

use crate::error::{GateError, GateResult};
use crate::rate_limit::RateLimiter;
use crate::session::SessionRegistry;

/// Checks submitted admin secrets against a stored argon2 hash.
///
/// The reference secret exists only as a PHC hash string from server-side
/// configuration; nothing here ever holds it in plaintext.
#[derive(Clone)]
pub struct CredentialVerifier {
    stored_hash: Option<String>,
}

impl CredentialVerifier {
    /// `None` or a blank string means "not configured".
    pub fn new(stored_hash: Option<String>) -> Self {
        Self {
            stored_hash: stored_hash
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.stored_hash.is_some()
    }

    /// Verify a submitted secret.
    ///
    /// The input is trimmed and an empty secret is rejected before the
    /// configuration is even consulted.
    pub fn verify(&self, submitted: &str) -> GateResult<bool> {
        let secret = submitted.trim();
        if secret.is_empty() {
            return Err(GateError::EmptySecret);
        }
        let Some(hash) = &self.stored_hash else {
            return Err(GateError::NotConfigured("ADMIN_PASSWORD_HASH is not set".into()));
        };
        Ok(acf_crypto::verify_password(secret, hash)?)
    }

    /// Mint a fresh opaque session token.
    pub fn issue_session_token(&self) -> String {
        acf_crypto::session_token()
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// A successful admin login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminSession {
    pub token: String,
    pub expires_at_ms: u64,
}

/// Admin login flow: throttle, verify, mint, register.
pub struct AdminGate {
    limiter: Arc<RateLimiter>,
    verifier: CredentialVerifier,
    sessions: Arc<SessionRegistry>,
}

impl AdminGate {
    pub fn new(
        limiter: Arc<RateLimiter>,
        verifier: CredentialVerifier,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            limiter,
            verifier,
            sessions,
        }
    }

    /// Attempt an admin login from `client_key`.
    ///
    /// Every attempt counts against the client's window, including ones that
    /// fail validation. Hash verification is CPU-heavy; async callers should
    /// run this on a blocking thread.
    pub fn login(&self, client_key: &str, submitted: &str) -> GateResult<AdminSession> {
        let decision = self.limiter.check(client_key);
        if !decision.allowed {
            let now = self.limiter.now_ms();
            return Err(GateError::RateLimited {
                retry_after: decision.retry_after(now),
                reset_at_ms: decision.reset_at_ms,
            });
        }

        match self.verifier.verify(submitted) {
            Ok(true) => {
                let token = self.verifier.issue_session_token();
                let expires_at_ms = self.sessions.register(&token);
                tracing::info!(client = client_key, "admin login succeeded");
                Ok(AdminSession {
                    token,
                    expires_at_ms,
                })
            }
            Ok(false) => {
                tracing::warn!(client = client_key, remaining = decision.remaining, "admin login rejected");
                Err(GateError::InvalidCredentials {
                    remaining: decision.remaining,
                })
            }
            Err(GateError::NotConfigured(reason)) => {
                tracing::error!(%reason, "admin authentication is not configured");
                Err(GateError::NotConfigured(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a bearer token belongs to a live admin session.
    pub fn is_admin(&self, token: &str) -> bool {
        self.sessions.is_valid(token)
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("limiter", &self.limiter)
            .field("verifier", &self.verifier)
            .field("sessions", &self.sessions)
            .finish()
    }
}
