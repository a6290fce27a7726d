//! Process configuration

use crate::llm::LlmConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Kimi.";
pub const DEFAULT_PORT: u16 = 5000;

/// Server settings plus the provider configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub system_prompt: String,
    pub show_thinking: bool,
    pub llm: LlmConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            show_thinking: true,
            llm: LlmConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    #[must_use]
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("MOONCHAT_HOST")
                .and_then(|h| h.parse().ok())
                .unwrap_or(defaults.host),
            port: lookup("MOONCHAT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            system_prompt: lookup("MOONCHAT_SYSTEM_PROMPT")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.system_prompt),
            show_thinking: lookup("MOONCHAT_SHOW_THINKING")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.show_thinking),
            llm: LlmConfig::from_lookup(&lookup),
        }
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
