//! Process configuration from the environment

use crate::chat::{KeywordError, KeywordSets};
use crate::llm::LlmConfig;
use axum::http::HeaderValue;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error(transparent)]
    Keywords(#[from] KeywordError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub backend_url: String,
    pub http_timeout: Duration,
    /// Browser origin of the UI; without one no cross-origin access is granted
    pub allowed_origin: Option<HeaderValue>,
    /// Ask the backend to revoke the token on logout
    pub revoke_on_logout: bool,
    pub keywords: KeywordSets,
    /// Where the keyword sets came from, if not the built-in lists
    pub keywords_path: Option<PathBuf>,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("GREEN_GUARDIAN_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "GREEN_GUARDIAN_PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let revoke_on_logout = match get("GREEN_GUARDIAN_REVOKE_ON_LOGOUT") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                name: "GREEN_GUARDIAN_REVOKE_ON_LOGOUT",
                value: raw,
            })?,
            None => false,
        };

        let http_timeout = match get("GREEN_GUARDIAN_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "GREEN_GUARDIAN_HTTP_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let allowed_origin = match get("GREEN_GUARDIAN_ALLOWED_ORIGIN") {
            Some(raw) => Some(HeaderValue::from_str(raw.trim()).map_err(|_| {
                ConfigError::Invalid {
                    name: "GREEN_GUARDIAN_ALLOWED_ORIGIN",
                    value: raw.clone(),
                }
            })?),
            None => None,
        };

        let keywords_path = get("GREEN_GUARDIAN_KEYWORDS").map(PathBuf::from);
        let keywords = match &keywords_path {
            Some(path) => KeywordSets::from_json_file(path)?,
            None => KeywordSets::default(),
        };

        let llm = LlmConfig {
            timeout: http_timeout,
            ..LlmConfig::from_lookup(&lookup)
        };

        Ok(Self {
            port,
            backend_url: get("GREEN_GUARDIAN_BACKEND_URL")
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            http_timeout,
            allowed_origin,
            revoke_on_logout,
            keywords,
            keywords_path,
            llm,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
