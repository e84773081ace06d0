//! Access gate for the festival pass service.
//!
//! Two public endpoints need throttling (admin login and the chat proxy) and
//! one needs a shared-secret check (admin login). Everything stateful here is
//! an explicitly owned object handed in by the caller, never a process-wide
//! global, so the in-memory backends can be swapped for a shared store in a
//! multi-instance deployment.
//!
//! # Quick Start
//!
//! ```rust
//! use acf_gate::{RateLimitConfig, RateLimiter};
//!
//! let limiter = RateLimiter::new("chat", RateLimitConfig::chat());
//! let decision = limiter.check("203.0.113.7");
//! assert!(decision.allowed);
//! assert_eq!(decision.remaining, 9);
//! ```

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod rate_limit;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GateConfig, RateLimitConfig};
pub use credentials::{AdminGate, AdminSession, CredentialVerifier};
pub use error::{GateError, GateResult};
pub use rate_limit::{
    InMemoryWindowStore, RateDecision, RateLimiter, WindowEntry, WindowStore, FALLBACK_CLIENT_KEY,
};
pub use session::SessionRegistry;
