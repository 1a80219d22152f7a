use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::ANTHROPIC_API_URL;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Largest resume upload accepted, in bytes (5 MiB by default).
    pub max_upload_bytes: usize,
    pub generation_timeout_secs: u64,
    /// Sessions idle for longer than this are swept.
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub keyword_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| ANTHROPIC_API_URL.to_string()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            generation_timeout_secs: parse_env("GENERATION_TIMEOUT_SECS", 90)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 24 * 60 * 60)?,
            sweep_interval_secs: parse_env("SWEEP_INTERVAL_SECS", 300)?,
            keyword_limit: parse_env("KEYWORD_LIMIT", 20)?,
        })
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            anthropic_api_url: ANTHROPIC_API_URL.to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            generation_timeout_secs: 5,
            session_ttl_secs: 60,
            sweep_interval_secs: 60,
            keyword_limit: 20,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
