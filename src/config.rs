//! Configuration management for the Autotask client.
//!
//! This module handles loading configuration from environment variables,
//! with validation to ensure all required values are present.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::AutotaskError;

/// Default per-request transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Version segment every zone base URL ends with.
pub const API_VERSION_SEGMENT: &str = "V1.0";

/// Configuration for connecting to the Autotask REST API.
///
/// The secret is stored but never logged or exposed in error messages.
/// No `Debug` impl.
#[derive(Clone)]
pub struct Config {
    /// Zone base URL (e.g., `https://webservices5.autotask.net/ATServicesRest/V1.0`).
    /// `None` means the zone is discovered from the user name at connect time.
    pub base_url: Option<String>,

    /// API user name (usually an email address).
    pub username: String,

    /// API user secret.
    /// This value must never be logged or included in error messages.
    secret: String,

    /// Tracking identifier issued for the integration.
    pub integration_code: String,

    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl Config {
    /// Creates a configuration from explicit values.
    ///
    /// `base_url` is normalized the same way as `AUTOTASK_API_URL`.
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::Config` if the URL is malformed or a value
    /// looks like a placeholder.
    pub fn new(
        base_url: Option<&str>,
        username: impl Into<String>,
        secret: impl Into<String>,
        integration_code: impl Into<String>,
    ) -> Result<Self, AutotaskError> {
        let secret = secret.into();
        Self::validate_secret(&secret)?;

        let base_url = base_url.map(Self::validate_base_url).transpose()?;

        Ok(Config {
            base_url,
            username: username.into(),
            secret,
            integration_code: integration_code.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `AUTOTASK_USERNAME`: API user name
    /// - `AUTOTASK_SECRET`: API user secret
    /// - `AUTOTASK_INTEGRATION_CODE`: integration tracking identifier
    ///
    /// # Optional Environment Variables
    ///
    /// - `AUTOTASK_API_URL`: zone base URL (discovered when absent)
    /// - `AUTOTASK_TIMEOUT_SECS`: per-request timeout (default 30)
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::Config` if any required variable is missing
    /// or if values fail validation.
    pub fn from_env() -> Result<Self, AutotaskError> {
        let username = Self::get_required_env("AUTOTASK_USERNAME")?;
        let secret = Self::get_required_env("AUTOTASK_SECRET")?;
        let integration_code = Self::get_required_env("AUTOTASK_INTEGRATION_CODE")?;
        let base_url = Self::get_optional_env("AUTOTASK_API_URL");

        let mut config = Self::new(base_url.as_deref(), username, secret, integration_code)?;

        if let Some(raw) = Self::get_optional_env("AUTOTASK_TIMEOUT_SECS") {
            config.timeout = Self::parse_timeout(&raw)?;
        }

        Ok(config)
    }

    /// Returns the API secret for building authentication headers.
    ///
    /// Only transports and sanitizers should call this.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Sets the per-request transport timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, AutotaskError> {
        env::var(name)
            .map_err(|_| AutotaskError::missing_env(name))
            .and_then(|value| {
                if value.trim().is_empty() {
                    Err(AutotaskError::missing_env(name))
                } else {
                    Ok(value.trim().to_string())
                }
            })
    }

    fn get_optional_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_timeout(raw: &str) -> Result<Duration, AutotaskError> {
        match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(AutotaskError::invalid_config(
                "AUTOTASK_TIMEOUT_SECS must be a positive integer",
            )),
        }
    }

    /// Validates and normalizes a zone base URL so it ends in `/V1.0`.
    pub(crate) fn validate_base_url(url: &str) -> Result<String, AutotaskError> {
        let url = url.trim().trim_end_matches('/');

        let parsed = Url::parse(url)
            .map_err(|e| AutotaskError::invalid_config(format!("AUTOTASK_API_URL is invalid: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AutotaskError::invalid_config(
                "AUTOTASK_API_URL must start with http:// or https://",
            ));
        }

        let lower = url.to_ascii_lowercase();
        if lower.ends_with("/v1.0") {
            Ok(url.to_string())
        } else {
            Ok(format!("{}/{}", url, API_VERSION_SEGMENT))
        }
    }

    /// Validates the secret is not a placeholder value.
    fn validate_secret(secret: &str) -> Result<(), AutotaskError> {
        let lower = secret.to_lowercase();
        let placeholder_patterns = ["your_secret", "your_key", "placeholder", "xxx", "changeme"];

        for pattern in placeholder_patterns {
            if lower.contains(pattern) {
                return Err(AutotaskError::invalid_config(
                    "AUTOTASK_SECRET appears to be a placeholder value",
                ));
            }
        }

        Ok(())
    }
}
