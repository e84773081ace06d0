use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;

/// Bucket used when a request carries no identifying client address.
pub const FALLBACK_CLIENT_KEY: &str = "unknown";

/// Counter state for one client within its current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowEntry {
    pub count: u32,
    pub reset_at_ms: u64,
}

/// Backing state for a [`RateLimiter`].
///
/// `update` must apply `apply` to the current entry and store the result as
/// one atomic step. The in-memory implementation does this under a mutex; a
/// shared external store would use its own compare-and-set.
pub trait WindowStore: Send + Sync {
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<WindowEntry>) -> WindowEntry,
    ) -> WindowEntry;

    /// Drop every entry whose window ended before `now_ms`.
    fn purge_expired(&self, now_ms: u64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local window state.
#[derive(Debug, Default)]
pub struct InMemoryWindowStore {
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl InMemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowStore for InMemoryWindowStore {
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<WindowEntry>) -> WindowEntry,
    ) -> WindowEntry {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let next = apply(entries.get(key).copied());
        entries.insert(key.to_string(), next);
        next
    }

    fn purge_expired(&self, now_ms: u64) -> usize {
        let mut entries = self.entries.lock().expect("lock poisoned");
        let before = entries.len();
        entries.retain(|_, e| now_ms <= e.reset_at_ms);
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries.lock().expect("lock poisoned").len()
    }
}

/// Outcome of a single rate-limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_ms: u64,
}

impl RateDecision {
    /// Time until the window resets, as seen from `now_ms`.
    pub fn retry_after(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.reset_at_ms.saturating_sub(now_ms))
    }

    /// `retry_after` rounded up to whole seconds.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_at_ms.saturating_sub(now_ms).div_ceil(1_000)
    }

    /// `retry_after` rounded up to whole minutes.
    pub fn retry_after_minutes(&self, now_ms: u64) -> u64 {
        self.reset_at_ms.saturating_sub(now_ms).div_ceil(60_000)
    }
}

/// Fixed-window request throttle keyed by client address.
///
/// The first request for a key (or the first after its window ended) opens a
/// new window with `count = 1`. Within a window a request is allowed while
/// the count is below the limit; a key already at the limit is rejected
/// without incrementing. Expired entries are purged on every check.
pub struct RateLimiter {
    name: &'static str,
    config: RateLimitConfig,
    store: Arc<dyn WindowStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// A limiter with process-local state and the system clock.
    pub fn new(name: &'static str, config: RateLimitConfig) -> Self {
        Self::with_parts(
            name,
            config,
            Arc::new(InMemoryWindowStore::new()),
            Arc::new(SystemClock),
        )
    }

    /// A limiter over injected state and clock.
    pub fn with_parts(
        name: &'static str,
        config: RateLimitConfig,
        store: Arc<dyn WindowStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            config,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Count one request from `client_key` and decide whether to allow it.
    pub fn check(&self, client_key: &str) -> RateDecision {
        let now = self.clock.now_ms();
        let purged = self.store.purge_expired(now);
        if purged > 0 {
            tracing::trace!(limiter = self.name, purged, "expired rate-limit windows dropped");
        }

        let key = match client_key.trim() {
            "" => FALLBACK_CLIENT_KEY,
            k => k,
        };
        let max = self.config.max_requests;
        let window_ms = self.config.window_secs.saturating_mul(1_000);
        let mut allowed = true;

        let entry = self.store.update(key, &mut |current| match current {
            Some(e) if now <= e.reset_at_ms => {
                if e.count >= max {
                    allowed = false;
                    e
                } else {
                    WindowEntry {
                        count: e.count + 1,
                        ..e
                    }
                }
            }
            _ => WindowEntry {
                count: 1,
                reset_at_ms: now.saturating_add(window_ms),
            },
        });

        if !allowed {
            tracing::debug!(limiter = self.name, client = key, "rate limit exceeded");
        }
        RateDecision {
            allowed,
            limit: max,
            remaining: if allowed { max.saturating_sub(entry.count) } else { 0 },
            reset_at_ms: entry.reset_at_ms,
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.store.len()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}
