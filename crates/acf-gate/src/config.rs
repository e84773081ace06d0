use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Limits for one fixed-window rate limiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// 10 attempts per 15 minutes.
    pub const fn admin_auth() -> Self {
        Self {
            max_requests: 10,
            window_secs: 15 * 60,
        }
    }

    /// 10 requests per minute.
    pub const fn chat() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn validate(&self) -> GateResult<()> {
        if self.max_requests == 0 {
            return Err(GateError::Config("max_requests must be at least 1".into()));
        }
        if self.window_secs == 0 {
            return Err(GateError::Config("window_secs must be at least 1".into()));
        }
        Ok(())
    }
}

/// Configuration for the access gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Throttle for admin authentication attempts.
    pub admin_auth: RateLimitConfig,
    /// Throttle for the chat proxy.
    pub chat: RateLimitConfig,
    /// How long an admin session token stays valid.
    pub session_ttl_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            admin_auth: RateLimitConfig::admin_auth(),
            chat: RateLimitConfig::chat(),
            session_ttl_secs: 12 * 60 * 60,
        }
    }
}

impl GateConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn validate(&self) -> GateResult<()> {
        self.admin_auth.validate()?;
        self.chat.validate()?;
        if self.session_ttl_secs == 0 {
            return Err(GateError::Config("session_ttl_secs must be at least 1".into()));
        }
        Ok(())
    }
}
