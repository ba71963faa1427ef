//! services/studio/src/config.rs
//!
//! Studio settings, read once from the environment when the server starts.
//! A `.env` file next to the binary is honored outside of tests.

use std::net::SocketAddr;
use tracing::Level;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(String),
    #[error("{0} has an unusable value: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// The first of `GENERATION_API_KEY`, `GEMINI_API_KEY`, `OPENAI_API_KEY` that is set.
    pub generation_api_key: Option<String>,
    pub generation_api_base: String,
    pub generation_model: String,
    /// Whether saving a chapter also refreshes its summary.
    pub auto_summary: bool,
    pub cors_origin: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_address = bind
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://novels.db".to_string());

        let level = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = level.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue("RUST_LOG".to_string(), format!("unknown level '{}'", level))
        })?;

        // --- Generation Settings ---
        let generation_api_key = ["GENERATION_API_KEY", "GEMINI_API_KEY", "OPENAI_API_KEY"]
            .iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.trim().is_empty());
        let generation_api_base =
            lookup("GENERATION_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let generation_model =
            lookup("GENERATION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let auto_summary = match lookup("AUTO_SUMMARY") {
            None => true,
            Some(value) => parse_flag(&value).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "AUTO_SUMMARY".to_string(),
                    format!("'{}' is not a boolean", value),
                )
            })?,
        };

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            generation_api_key,
            generation_api_base,
            generation_model,
            auto_summary,
            cors_origin,
        })
    }

    /// The API key, or an error naming the variables that could provide it.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.generation_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("GENERATION_API_KEY".to_string()))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
