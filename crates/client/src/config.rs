//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MART_API_URL` - Base URL of the remote API
//!
//! ## Optional
//! - `MART_API_TOKEN` - Bearer token sent with every API request
//! - `MART_STORE_DIR` - Directory of the durable local store (default: `.mart`)
//! - `MART_USER_ID` - Signed-in user; unset means an anonymous session
//! - `MART_REMOVE_DEPLETED_LINES` - Remove cart lines decremented to zero (default: false)
//! - `MART_REQUEST_TIMEOUT_SECS` - HTTP request timeout in seconds (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use mart_core::UserId;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::cart::DepletedLinePolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Directory backing the file store
    pub store_dir: PathBuf,
    /// Signed-in user, if any
    pub user_id: Option<UserId>,
    /// What happens to a cart line decremented to zero or below
    pub cart_policy: DepletedLinePolicy,
}

/// Remote API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.example.vn/`
    pub base_url: Url,
    /// Bearer token (redacted in `Debug`)
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let base_url = env.required("MART_API_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("MART_API_URL".to_string(), e.to_string())
        })?;
        let token = env.optional("MART_API_TOKEN").map(SecretString::from);
        let timeout_secs = env
            .or_default("MART_REQUEST_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MART_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let store_dir = PathBuf::from(env.or_default("MART_STORE_DIR", ".mart"));
        let user_id = env
            .optional("MART_USER_ID")
            .map(|id| UserId::parse(&id))
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("MART_USER_ID".to_string(), e.to_string()))?;

        let remove_depleted = parse_bool(
            "MART_REMOVE_DEPLETED_LINES",
            &env.or_default("MART_REMOVE_DEPLETED_LINES", "false"),
        )?;
        let cart_policy = if remove_depleted {
            DepletedLinePolicy::Remove
        } else {
            DepletedLinePolicy::Retain
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                token,
                timeout: Duration::from_secs(timeout_secs),
            },
            store_dir,
            user_id,
            cart_policy,
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Unset and empty values are both treated as absent.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}
