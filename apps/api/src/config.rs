use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or a number does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Directory holding one `<domain>.md` reference file per domain tag.
    pub knowledge_dir: PathBuf,
    pub domain_score_threshold: u32,
    pub max_message_chars: usize,
    pub max_completion_tokens: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            knowledge_dir: std::env::var("KNOWLEDGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("knowledge")),
            domain_score_threshold: optional_env("DOMAIN_SCORE_THRESHOLD", 2)?,
            max_message_chars: optional_env("MAX_MESSAGE_CHARS", 4000)?,
            max_completion_tokens: optional_env("MAX_COMPLETION_TOKENS", 1024)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow!("Environment variable '{key}' has invalid value '{raw}': {e}"))
}
