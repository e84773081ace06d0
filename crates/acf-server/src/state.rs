use std::sync::Arc;

use acf_crypto::PassHasher;
use acf_gate::{
    AdminGate, Clock, CredentialVerifier, InMemoryWindowStore, RateLimiter, SessionRegistry,
    SystemClock,
};
use acf_ledger::{LedgerView, PassIssuer, PassVerifier};
use acf_store::{BlobStore, DocumentStore, InMemoryBlobStore, InMemoryDocumentStore};

use crate::chat::{ChatBackend, ChatProxy, GeminiBackend};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// External collaborators the server is wired to.
pub struct Backends {
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub chat: Arc<dyn ChatBackend>,
    pub clock: Arc<dyn Clock>,
}

impl Backends {
    /// Process-local stores and the configured Gemini backend.
    pub fn in_memory(config: &ServerConfig) -> Self {
        Self {
            store: Arc::new(InMemoryDocumentStore::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
            chat: Arc::new(GeminiBackend::new(
                &config.chat,
                config.secrets.gemini_api_key.clone(),
            )),
            clock: Arc::new(SystemClock),
        }
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<AdminGate>,
    pub chat: Arc<ChatProxy>,
    pub issuer: Arc<PassIssuer>,
    pub verifier: Arc<PassVerifier>,
    pub ledger: Arc<LedgerView>,
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(config: &ServerConfig, backends: Backends) -> ServerResult<Self> {
        config.validate()?;
        let secret = config
            .secrets
            .verification_secret
            .as_deref()
            .ok_or_else(|| ServerError::Config("verification secret missing".into()))?;
        let hasher = PassHasher::new(secret).map_err(|e| ServerError::Config(e.to_string()))?;

        let limiter = |name: &'static str, limits| {
            Arc::new(RateLimiter::with_parts(
                name,
                limits,
                Arc::new(InMemoryWindowStore::new()),
                backends.clock.clone(),
            ))
        };
        let sessions = Arc::new(SessionRegistry::new(
            config.gate.session_ttl(),
            backends.clock.clone(),
        ));
        let admin = AdminGate::new(
            limiter("admin-auth", config.gate.admin_auth),
            CredentialVerifier::new(config.secrets.admin_password_hash.clone()),
            sessions,
        );
        let chat = ChatProxy::new(limiter("chat", config.gate.chat), backends.chat.clone(), &config.chat);

        Ok(Self {
            admin: Arc::new(admin),
            chat: Arc::new(chat),
            issuer: Arc::new(PassIssuer::new(
                backends.store.clone(),
                backends.blobs.clone(),
                hasher.clone(),
                config.ledger.clone(),
            )),
            verifier: Arc::new(PassVerifier::new(backends.store.clone(), hasher)),
            ledger: Arc::new(LedgerView::new(backends.store.clone())),
            max_image_bytes: config.max_image_bytes,
        })
    }
}
