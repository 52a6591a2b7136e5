//! Portal client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_API_URL` - Base URL of the portal backend (e.g., `https://school.example/api/`)
//!
//! ## Optional
//! - `PORTAL_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `PORTAL_CHALLENGE_TTL_SECS` - Lifetime of a solved challenge token (default: 120)
//! - `RECAPTCHA_SITE_KEY` - Site key of the human-verification widget
//! - `PORTAL_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate, 0.0 to 1.0 (default: 1.0)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Lifetime of a reCAPTCHA token.
const DEFAULT_CHALLENGE_TTL_SECS: u64 = 120;

/// Configuration errors that can occur during loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format for the CLI subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Portal client configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN.
#[derive(Clone)]
pub struct PortalConfig {
    /// Backend base URL, always ending in `/`
    pub api_url: Url,
    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// How long a solved challenge token stays usable
    pub challenge_ttl: Duration,
    /// Human-verification widget site key
    pub recaptcha_site_key: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

impl std::fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalConfig")
            .field("api_url", &self.api_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("challenge_ttl", &self.challenge_ttl)
            .field("recaptcha_site_key", &self.recaptcha_site_key)
            .field("log_format", &self.log_format)
            .field(
                "sentry_dsn",
                &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .finish()
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `PORTAL_API_URL` is missing or any variable
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration for `api_url` with every optional setting at
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` does not parse.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| (key == "PORTAL_API_URL").then(|| api_url.to_string()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url =
            lookup("PORTAL_API_URL").ok_or_else(|| ConfigError::MissingEnvVar("PORTAL_API_URL".to_string()))?;
        let api_url = parse_base_url(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_API_URL".to_string(), e))?;

        let request_timeout = lookup("PORTAL_REQUEST_TIMEOUT_SECS")
            .map(|s| parse_secs("PORTAL_REQUEST_TIMEOUT_SECS", &s))
            .transpose()?;
        let challenge_ttl = lookup("PORTAL_CHALLENGE_TTL_SECS").map_or(
            Ok(Duration::from_secs(DEFAULT_CHALLENGE_TTL_SECS)),
            |s| parse_secs("PORTAL_CHALLENGE_TTL_SECS", &s),
        )?;

        let log_format = match lookup("PORTAL_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "PORTAL_LOG_FORMAT".to_string(),
                    format!("expected `text` or `json`, got `{other}`"),
                ));
            }
        };

        let sentry_dsn = lookup("SENTRY_DSN")
            .filter(|s| !s.is_empty())
            .map(SecretString::from);
        let sentry_sample_rate = lookup("SENTRY_SAMPLE_RATE")
            .map_or(Ok(1.0), |s| parse_sample_rate(&s))?;

        Ok(Self {
            api_url,
            request_timeout,
            challenge_ttl,
            recaptcha_site_key: lookup("RECAPTCHA_SITE_KEY"),
            log_format,
            sentry_dsn,
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }
}

/// Parse the backend URL and make sure relative joins stay under its path.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("must be an absolute http(s) URL".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_sample_rate(value: &str) -> Result<f32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), reason);
    let rate = value.trim().parse::<f32>().map_err(|e| invalid(e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(invalid(format!("expected a rate between 0.0 and 1.0, got `{value}`")))
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
