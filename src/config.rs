//! Configuration from environment variables

use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Static credential for the generation endpoint
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub max_attachment_bytes: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: lookup("GEMINI_API_KEY").unwrap_or(defaults.api_key),
            model: lookup("GEMINI_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.model),
            base_url: lookup("GEMINI_BASE_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(defaults.base_url),
            port: parse_or(&lookup, "CHAT_PORT", defaults.port),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "CHAT_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            max_attachment_bytes: parse_or(
                &lookup,
                "CHAT_MAX_ATTACHMENT_BYTES",
                defaults.max_attachment_bytes,
            ),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable setting");
            default
        }),
    }
}
