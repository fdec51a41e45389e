//! External classification service configuration.

use serde::{Deserialize, Serialize};

/// Default Gemini model.
fn default_model() -> String {
    "gemini-flash-latest".to_string()
}

/// Default HTTP timeout in seconds.
const fn default_timeout_secs() -> u64 {
    30
}

/// Public Gemini REST endpoint, used when `endpoint` is empty.
pub const GEMINI_DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Which classifier implementation to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierBackend {
    /// A service implementing the `/process`, `/subtasks`, `/group-tasks` JSON routes.
    #[default]
    Service,
    /// Google Gemini `generateContent`, prompted locally.
    Gemini,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub backend: ClassifierBackend,

    /// Base URL. Required for `service`; overrides the public endpoint for `gemini`.
    #[serde(default)]
    pub endpoint: String,

    /// API key. Required for `gemini`; sent as a bearer token to `service` when set.
    #[serde(default)]
    pub api_key: String,

    /// Model name (Gemini only).
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::default(),
            endpoint: String::new(),
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClassifierConfig {
    /// Check if the selected backend has the fields it needs.
    pub fn is_configured(&self) -> bool {
        match self.backend {
            ClassifierBackend::Service => !self.endpoint.is_empty(),
            ClassifierBackend::Gemini => !self.api_key.is_empty(),
        }
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        let endpoint = match self.backend {
            ClassifierBackend::Gemini if self.endpoint.is_empty() => GEMINI_DEFAULT_ENDPOINT,
            _ => self.endpoint.as_str(),
        };
        endpoint.trim_end_matches('/')
    }
}
