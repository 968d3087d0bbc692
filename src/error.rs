//! Error types for the Autotask client.
//!
//! This module defines `AutotaskError`, the unified error type returned by
//! every entity operation. Variants mirror how a failure should be handled
//! by the caller: validation problems never reach the network, client
//! errors are never retried, and transient/server failures are retried by
//! the request executor before being surfaced.
//!
//! # Security
//!
//! Server-provided messages are sanitized so the API secret never appears
//! in logs or error output. Use `sanitize_message()` when building messages
//! from external sources.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for all Autotask client operations.
#[derive(Error, Debug)]
pub enum AutotaskError {
    /// Configuration error - missing or invalid environment variables.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The caller passed a structurally invalid argument. Raised before any
    /// network call is made.
    #[error("validation error: {0}")]
    Validation(String),

    /// The resource does not support the requested operation.
    #[error("{resource} does not support {operation}")]
    Unsupported {
        /// Resource name (e.g. `Tickets`).
        resource: String,
        /// Operation name (e.g. `patch`).
        operation: String,
    },

    /// The server returned 404 for a single-record operation.
    #[error("not found: {path}")]
    NotFound {
        /// Request path that produced the 404.
        path: String,
    },

    /// The server rejected the request with a 4xx status other than 404.
    #[error("HTTP {status} for {path}: {message}")]
    ClientRequest {
        /// HTTP status code.
        status: u16,
        /// Request path.
        path: String,
        /// Server-provided message, sanitized and truncated.
        message: String,
    },

    /// Connection or transport-level timeout failure.
    #[error("network error for {path}: {message}")]
    TransientNetwork {
        /// Request path.
        path: String,
        /// Transport error description.
        message: String,
    },

    /// The server failed with a 5xx status.
    #[error("server error {status} for {path}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Request path.
        path: String,
        /// Server-provided message, sanitized and truncated.
        message: String,
    },

    /// The caller-side deadline elapsed before the call completed.
    #[error("{operation} gave up after {duration:?}")]
    Timeout {
        /// How long we waited before giving up.
        duration: Duration,
        /// The operation that timed out (`METHOD path`).
        operation: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response did not carry the expected envelope or payload.
    #[error("unexpected response from {path}: {message}")]
    UnexpectedResponse {
        /// Request path.
        path: String,
        /// What was missing or malformed.
        message: String,
    },

    /// Connection test failed.
    #[error("connection test failed: {message}")]
    ConnectionTest {
        /// Details about why the connection test failed.
        message: String,
    },

    /// Zone discovery for the API user failed.
    #[error("zone lookup failed: {0}")]
    ZoneLookup(String),
}

impl AutotaskError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        AutotaskError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        AutotaskError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AutotaskError::Validation(message.into())
    }

    /// Creates a not found error for a request path.
    pub fn not_found(path: impl Into<String>) -> Self {
        AutotaskError::NotFound { path: path.into() }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        AutotaskError::Unsupported {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    /// Creates a caller-side timeout error.
    pub fn timeout(duration: Duration, operation: impl Into<String>) -> Self {
        AutotaskError::Timeout {
            duration,
            operation: operation.into(),
        }
    }

    /// Creates an unexpected-response error.
    pub fn unexpected(path: impl Into<String>, message: impl Into<String>) -> Self {
        AutotaskError::UnexpectedResponse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a connection test error.
    pub fn connection_test(message: impl Into<String>) -> Self {
        AutotaskError::ConnectionTest {
            message: message.into(),
        }
    }

    /// Returns true if this error is transient and an idempotent call may be
    /// retried: network failures and 5xx responses.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AutotaskError::TransientNetwork { .. } | AutotaskError::Server { .. }
        )
    }

    /// Short stable name of the error kind, used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AutotaskError::Config(_) => "config",
            AutotaskError::HttpClient(_) => "http_client",
            AutotaskError::Validation(_) => "validation",
            AutotaskError::Unsupported { .. } => "unsupported",
            AutotaskError::NotFound { .. } => "not_found",
            AutotaskError::ClientRequest { .. } => "client_request",
            AutotaskError::TransientNetwork { .. } => "transient_network",
            AutotaskError::Server { .. } => "server",
            AutotaskError::Timeout { .. } => "timeout",
            AutotaskError::Serialization(_) => "serialization",
            AutotaskError::UnexpectedResponse { .. } => "unexpected_response",
            AutotaskError::ConnectionTest { .. } => "connection_test",
            AutotaskError::ZoneLookup(_) => "zone_lookup",
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            AutotaskError::NotFound { .. } => Some(404),
            AutotaskError::ClientRequest { status, .. } | AutotaskError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Sanitizes an error message to remove any occurrence of the API secret.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to sanitize
    /// * `secret` - The secret to strip from the message
    ///
    /// # Returns
    ///
    /// The message with any occurrence of the secret replaced with `[REDACTED]`
    #[must_use]
    pub fn sanitize_message(message: &str, secret: &str) -> String {
        if secret.is_empty() {
            return message.to_string();
        }
        message.replace(secret, "[REDACTED]")
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secret: &str) -> String {
        Self::sanitize_message(&self.to_string(), secret)
    }
}
