//! HTTP transport seam.
//!
//! The request executor never talks to `reqwest` directly. It builds an
//! `HttpRequest` as plain data and hands it to a `Transport`, which returns
//! an `HttpResponse` for every answer the server gave (including 4xx/5xx)
//! and a `TransportError` only when no answer arrived at all. Status
//! interpretation stays in the executor.
//!
//! `ReqwestTransport` is the production implementation; tests inject their
//! own transports to script failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use thiserror::Error;

use crate::config::Config;
use crate::error::AutotaskError;

/// Header carrying the integration tracking identifier.
pub const INTEGRATION_CODE_HEADER: &str = "ApiIntegrationCode";

/// Header carrying the API user name.
pub const USERNAME_HEADER: &str = "UserName";

/// Header carrying the API user secret.
pub const SECRET_HEADER: &str = "Secret";

/// An outbound HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, including any query string.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response from a status and a JSON body.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a request produced no HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The transport's own timeout elapsed.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// Any other I/O or protocol failure.
    Other,
}

/// A failure below the HTTP layer.
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    /// Failure category.
    pub kind: TransportErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Executes HTTP round trips on behalf of the request executor.
///
/// Implementations must be safe for concurrent use; a single instance is
/// shared by every resource client of a facade.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and returns whatever the server answered.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport that adds the Autotask authentication headers.
#[derive(Clone)]
pub struct ReqwestTransport {
    /// The underlying HTTP client (cloning is cheap, the pool is shared).
    http: Client,
    username: String,
    /// SECURITY: Never log this value!
    secret: String,
    integration_code: String,
}

impl ReqwestTransport {
    /// Creates a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, AutotaskError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(AutotaskError::HttpClient)?;

        Ok(Self {
            http,
            username: config.username.clone(),
            secret: config.secret().to_string(),
            integration_code: config.integration_code.clone(),
        })
    }

    fn classify(error: &reqwest::Error) -> TransportErrorKind {
        if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req = self
            .http
            .request(request.method, &request.url)
            .header(INTEGRATION_CODE_HEADER, &self.integration_code)
            .header(USERNAME_HEADER, &self.username)
            .header(SECRET_HEADER, &self.secret)
            .header("Accept", "application/json");

        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            let message = AutotaskError::sanitize_message(&e.to_string(), &self.secret);
            TransportError::new(Self::classify(&e), message)
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            let message = AutotaskError::sanitize_message(&e.to_string(), &self.secret);
            TransportError::new(Self::classify(&e), message)
        })?;

        Ok(HttpResponse { status, body })
    }
}
