use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use acf_gate::GateConfig;
use acf_ledger::LedgerConfig;

use crate::error::{ServerError, ServerResult};

pub const ENV_ADMIN_PASSWORD_HASH: &str = "ADMIN_PASSWORD_HASH";
pub const ENV_VERIFICATION_SECRET: &str = "VERIFICATION_SECRET";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest accepted pass image upload.
    pub max_image_bytes: usize,
    pub ledger: LedgerConfig,
    pub gate: GateConfig,
    pub chat: ChatConfig,
    pub secrets: Secrets,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            max_image_bytes: 5 * 1024 * 1024,
            ledger: LedgerConfig::default(),
            gate: GateConfig::default(),
            chat: ChatConfig::default(),
            secrets: Secrets::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read the file (or start from defaults), then let the process
    /// environment override secrets.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ServerError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_ADMIN_PASSWORD_HASH) {
            self.secrets.admin_password_hash = Some(v);
        }
        if let Some(v) = non_empty(ENV_VERIFICATION_SECRET) {
            self.secrets.verification_secret = Some(v);
        }
        if let Some(v) = non_empty(ENV_GEMINI_API_KEY) {
            self.secrets.gemini_api_key = Some(v);
        }
    }

    /// Startup check. Only the verification secret is mandatory; the admin
    /// hash and the chat key just disable their endpoints when missing.
    pub fn validate(&self) -> ServerResult<()> {
        if self.secrets.verification_secret.is_none() {
            return Err(ServerError::Config(format!(
                "{ENV_VERIFICATION_SECRET} must be set"
            )));
        }
        self.ledger
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        self.gate
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        if self.chat.max_message_chars == 0 {
            return Err(ServerError::Config("chat.max_message_chars must be at least 1".into()));
        }
        Ok(())
    }

    /// Names of optional features that are switched off by missing secrets.
    pub fn disabled_features(&self) -> Vec<&'static str> {
        let mut disabled = Vec::new();
        if self.secrets.admin_password_hash.is_none() {
            disabled.push("admin authentication");
        }
        if self.secrets.gemini_api_key.is_none() {
            disabled.push("chat assistant");
        }
        disabled
    }
}

/// Upstream model settings for the chat proxy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_message_chars: usize,
    pub event_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.5-flash-lite".into(),
            timeout_secs: 30,
            max_message_chars: 500,
            event_name: "Maha Satchandi Mahayagya".into(),
        }
    }
}

impl ChatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Context prepended to every user message.
    pub fn preamble(&self) -> String {
        format!(
            "You are a helpful assistant for the {} event. \
             This is a spiritual event with donations, schedules, and updates. \
             Answer questions about the event, donation process, schedules, and general information. \
             Keep responses concise and helpful.",
            self.event_name
        )
    }
}

/// Server-side secrets. Never serialized back out.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Argon2 PHC string for the admin password.
    #[serde(skip_serializing)]
    pub admin_password_hash: Option<String>,
    /// Key material for pass verification hashes.
    #[serde(skip_serializing)]
    pub verification_secret: Option<String>,
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("admin_password_hash", &shown(&self.admin_password_hash))
            .field("verification_secret", &shown(&self.verification_secret))
            .field("gemini_api_key", &shown(&self.gemini_api_key))
            .finish()
    }
}
