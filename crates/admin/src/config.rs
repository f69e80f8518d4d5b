//! Admin configuration loaded from environment variables.
//!
//! Read once at process start. A `.env` file in the working directory is
//! loaded first if present.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CATALOG_API_URL` - Base URL of the catalog store (default: `http://localhost:5000`)
//! - `LOG_FORMAT` - `json` for structured log lines, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Store used when `CATALOG_API_URL` is not set (json-server's default port).
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Base URL of the catalog store; resource paths are appended to it.
    pub api_base_url: Url,
    /// Emit JSON log lines instead of human-readable text.
    pub json_logs: bool,
    /// Sentry configuration (optional)
    pub sentry: Option<SentryConfig>,
}

/// Sentry error tracking configuration.
///
/// Implements `Debug` manually to redact the DSN, which embeds the project key.
#[derive(Clone)]
pub struct SentryConfig {
    /// Sentry DSN
    pub dsn: SecretString,
    /// Environment tag (e.g., "development", "production")
    pub environment: Option<String>,
    /// Error sample rate (0.0 to 1.0)
    pub sample_rate: f32,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("dsn", &"[REDACTED]")
            .field("environment", &self.environment)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CATALOG_API_URL` is not a usable http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CATALOG_API_URL` is not a usable http(s) URL.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("CATALOG_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = parse_base_url("CATALOG_API_URL", raw_url.trim())?;

        let json_logs = lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        let sentry = lookup("SENTRY_DSN")
            .filter(|v| !v.is_empty())
            .map(|dsn| SentryConfig {
                dsn: SecretString::from(dsn),
                environment: lookup("SENTRY_ENVIRONMENT"),
                sample_rate: lookup("SENTRY_SAMPLE_RATE")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1.0),
            });

        Ok(Self {
            api_base_url,
            json_logs,
            sentry,
        })
    }

    /// Configuration pointing at `api_base_url` with everything else off.
    #[must_use]
    pub const fn for_base_url(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            json_logs: false,
            sentry: None,
        }
    }

    /// Replace the base URL, with the same checks as `CATALOG_API_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `raw` is not a usable http(s) URL.
    pub fn with_base_url(self, raw: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("--api-url", raw.trim())?,
            ..self
        })
    }
}

/// Parse and check a base URL.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }

    Ok(url)
}
