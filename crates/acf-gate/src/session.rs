use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use acf_crypto::TokenFingerprint;

use crate::clock::Clock;

/// Registry of issued admin session tokens.
///
/// Tokens are opaque random strings; the registry only remembers their
/// fingerprints and expiry times. A token is accepted while it is registered
/// and unexpired.
pub struct SessionRegistry {
    ttl: Duration,
    sessions: Mutex<HashMap<TokenFingerprint, u64>>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Remember `token`, returning its expiry in epoch milliseconds.
    pub fn register(&self, token: &str) -> u64 {
        let now = self.clock.now_ms();
        let expires_at = now.saturating_add(self.ttl.as_millis() as u64);
        let mut sessions = self.sessions.lock().expect("lock poisoned");
        sessions.retain(|_, exp| now < *exp);
        sessions.insert(TokenFingerprint::of(token), expires_at);
        expires_at
    }

    /// Whether `token` is registered and unexpired.
    pub fn is_valid(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let now = self.clock.now_ms();
        let fingerprint = TokenFingerprint::of(token);
        let mut sessions = self.sessions.lock().expect("lock poisoned");
        match sessions.get(&fingerprint) {
            Some(exp) if now < *exp => true,
            Some(_) => {
                sessions.remove(&fingerprint);
                false
            }
            None => false,
        }
    }

    /// Forget `token`. Returns `true` if it was registered.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .expect("lock poisoned")
            .remove(&TokenFingerprint::of(token))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("ttl", &self.ttl)
            .field("active", &self.len())
            .finish()
    }
}
