//! Provider configuration

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.moonshot.ai/v1";
pub const DEFAULT_MODEL: &str = "kimi-k2-thinking";
pub const DEFAULT_MAX_TOKENS: u32 = 1024 * 32;
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable holding the credential
pub const API_KEY_ENV: &str = "MOONSHOT_API_KEY";

/// Configuration for the remote endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on a whole turn, connection through last byte
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unparseable values keep defaults
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()),
            base_url: lookup("MOONSHOT_BASE_URL").unwrap_or(defaults.base_url),
            model: lookup("MOONSHOT_MODEL").unwrap_or(defaults.model),
            max_tokens: lookup("MOONSHOT_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            temperature: lookup("MOONSHOT_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temperature),
            timeout: lookup("MOONSHOT_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }

    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
