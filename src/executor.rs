//! Request executor for the Autotask REST API.
//!
//! Every entity operation funnels through `RequestExecutor::execute`, which
//! logs the call, sends it through the injected `Transport`, classifies the
//! outcome and returns the parsed JSON body.
//!
//! # Retry Logic
//!
//! Only `GET` is retried, because the API does not document idempotency for
//! the other verbs. Retries apply to:
//! - Network failures (connect errors, transport timeouts)
//! - HTTP 5xx responses
//!
//! with bounded exponential backoff (250ms, 500ms, 1s, capped at 2s by
//! default). Client errors (4xx) are never retried.
//!
//! # Deadline
//!
//! An optional deadline bounds the whole call, retries and backoff included.
//! Exceeding it yields `AutotaskError::Timeout`, distinct from any server
//! failure. Dropping the returned future cancels the call.
//!
//! # Security
//!
//! Payloads are redacted before logging and error bodies are stripped of the
//! API secret.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::AutotaskError;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Maximum length for HTTP error messages carried in errors.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Keys whose values are never logged, compared case-insensitively.
const SENSITIVE_KEYS: &[&str] = &[
    "secret",
    "password",
    "token",
    "apikey",
    "api_key",
    "integrationcode",
];

/// Bounded exponential backoff for idempotent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied per retry.
    pub factor: u32,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            factor: 2,
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let multiplier = self.factor.saturating_pow(exponent);
        self.base_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }
}

/// What accompanies a request.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// Nothing.
    #[default]
    Empty,
    /// A JSON body.
    Body(Value),
    /// Query-string parameters, URL-encoded on dispatch.
    Params(Vec<(String, String)>),
}

impl Payload {
    fn redacted(&self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Body(body) => redact(body),
            Payload::Params(params) => Value::Object(
                params
                    .iter()
                    .map(|(k, v)| {
                        let value = if is_sensitive(k) {
                            Value::String("[REDACTED]".to_string())
                        } else {
                            parse_or_string(v)
                        };
                        (k.clone(), redact(&value))
                    })
                    .collect(),
            ),
        }
    }
}

/// Sends requests, classifies responses and retries transient failures.
///
/// A single executor is shared by every resource client of a facade; it
/// holds no per-call state.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,

    /// Zone base URL without trailing slash.
    base_url: String,

    retry: RetryPolicy,

    deadline: Option<Duration>,

    /// Secret to strip from error messages.
    /// SECURITY: Never log this value!
    secret: String,
}

impl RequestExecutor {
    /// Creates an executor for `base_url` using `transport`.
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
            deadline: None,
            secret: String::new(),
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Bounds every call, retries included.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Registers the secret that must be stripped from error messages.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Zone base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Active retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Executes one API call against `path` (relative to the base URL).
    ///
    /// Returns the parsed response body, or `Value::Null` for an empty one.
    ///
    /// # Errors
    ///
    /// - `NotFound` for 404
    /// - `ClientRequest` for other 4xx
    /// - `Server` for 5xx, after retries for `GET`
    /// - `TransientNetwork` when no response arrived, after retries for `GET`
    /// - `Timeout` when the deadline elapsed
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> Result<Value, AutotaskError> {
        let url = self.build_url(path, &payload);
        let body = match payload {
            Payload::Body(ref body) => Some(body.clone()),
            _ => None,
        };

        tracing::info!(
            method = %method,
            path = %path,
            payload = %payload.redacted(),
            "Dispatching Autotask request"
        );

        self.run(method, path, url, body).await
    }

    /// Executes a `GET` against an absolute URL handed out by the server,
    /// such as a next-page link.
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::Validation` if the URL is malformed or does
    /// not share the base URL's scheme, host and port; otherwise as `execute`.
    pub async fn execute_absolute(&self, url: &str) -> Result<Value, AutotaskError> {
        let path = match self.same_origin_path(url) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(
                    kind = e.kind(),
                    method = %Method::GET,
                    url = %url,
                    error = %e.sanitized_display(&self.secret),
                    "Autotask request failed"
                );
                return Err(e);
            }
        };

        tracing::info!(method = %Method::GET, path = %path, "Dispatching Autotask request");

        self.run(Method::GET, &path, url.to_string(), None).await
    }

    /// Path of `url` if it points at the same origin as the base URL.
    ///
    /// Credentials ride on every request, so a page link must not downgrade
    /// the scheme or move to another port.
    fn same_origin_path(&self, url: &str) -> Result<String, AutotaskError> {
        let parsed = Url::parse(url)
            .map_err(|e| AutotaskError::validation(format!("invalid page URL: {}", e)))?;
        let base = Url::parse(&self.base_url)
            .map_err(|e| AutotaskError::validation(format!("invalid base URL: {}", e)))?;

        if parsed.scheme() != base.scheme()
            || parsed.host() != base.host()
            || parsed.port_or_known_default() != base.port_or_known_default()
        {
            return Err(AutotaskError::validation(format!(
                "page URL origin mismatch: expected {}, got {}",
                base.origin().ascii_serialization(),
                parsed.origin().ascii_serialization()
            )));
        }

        Ok(parsed.path().to_string())
    }

    /// Applies deadline, retry and failure logging around the round trips.
    async fn run(
        &self,
        method: Method,
        path: &str,
        url: String,
        body: Option<Value>,
    ) -> Result<Value, AutotaskError> {
        let operation = format!("{} {}", method, path);
        let attempt = self.with_retry(&method, &operation, || {
            self.execute_once(method.clone(), path, url.clone(), body.clone())
        });

        let result = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, attempt)
                .await
                .unwrap_or_else(|_| Err(AutotaskError::timeout(deadline, operation.clone()))),
            None => attempt.await,
        };

        if let Err(e) = &result {
            tracing::error!(
                kind = e.kind(),
                method = %method,
                path = %path,
                error = %e.sanitized_display(&self.secret),
                "Autotask request failed"
            );
        }

        result
    }

    /// Retries `f` while it fails with a retryable error, for `GET` only.
    async fn with_retry<T, F, Fut>(
        &self,
        method: &Method,
        operation: &str,
        f: F,
    ) -> Result<T, AutotaskError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, AutotaskError>>,
    {
        let idempotent = *method == Method::GET;
        let mut retries = 0u32;

        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if idempotent && e.is_retryable() && retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = self.retry.delay_for(retries);

                    tracing::debug!(
                        operation = operation,
                        retry = retries,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e.sanitized_display(&self.secret),
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if retries > 0 {
                        tracing::debug!(
                            operation = operation,
                            attempts = retries + 1,
                            "All retry attempts exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    /// One round trip without retry.
    async fn execute_once(
        &self,
        method: Method,
        path: &str,
        url: String,
        body: Option<Value>,
    ) -> Result<Value, AutotaskError> {
        let request = HttpRequest { method, url, body };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| self.handle_transport_error(path, e))?;

        if !response.is_success() {
            return Err(self.handle_http_error(path, response));
        }

        tracing::trace!(status = response.status, body = %response.body, "Autotask API response");

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| {
            AutotaskError::unexpected(path, format!("response is not valid JSON: {}", e))
        })
    }

    fn handle_transport_error(&self, path: &str, error: TransportError) -> AutotaskError {
        let message = AutotaskError::sanitize_message(&error.to_string(), &self.secret);
        tracing::warn!(path = %path, error = %message, "Autotask transport failure");
        AutotaskError::TransientNetwork {
            path: path.to_string(),
            message,
        }
    }

    /// Converts a non-2xx response into the matching error kind.
    fn handle_http_error(&self, path: &str, response: HttpResponse) -> AutotaskError {
        let status = response.status;
        let message = extract_message(&response.body, &self.secret);

        match status {
            404 => AutotaskError::not_found(path),
            400..=499 => AutotaskError::ClientRequest {
                status,
                path: path.to_string(),
                message,
            },
            500..=599 => {
                tracing::warn!(status = status, path = %path, "Autotask server error");
                AutotaskError::Server {
                    status,
                    path: path.to_string(),
                    message,
                }
            }
            _ => AutotaskError::unexpected(path, format!("unexpected HTTP status {}", status)),
        }
    }

    fn build_url(&self, path: &str, payload: &Payload) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if let Payload::Params(params) = payload {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
        }
        url
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Error bodies look like `{"errors": ["..."]}`; anything else falls back
/// to `message` or the raw text. The result is sanitized and truncated.
fn extract_message(body: &str, secret: &str) -> String {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            if let Some(errors) = json.get("errors").and_then(Value::as_array) {
                errors
                    .iter()
                    .map(|e| match e {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            } else if let Some(message) = json
                .get("message")
                .or_else(|| json.get("Message"))
                .and_then(Value::as_str)
            {
                message.to_string()
            } else {
                body.to_string()
            }
        }
        Err(_) => body.to_string(),
    };

    let message = AutotaskError::sanitize_message(message.trim(), secret);
    truncate(message, MAX_ERROR_BODY_LEN)
}

fn truncate(mut text: String, max_len: usize) -> String {
    if text.len() <= max_len {
        return text;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("...[truncated]");
    text
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|s| key.contains(s))
}

fn parse_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Returns a copy of `value` with every sensitive key's value replaced.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_sensitive(k) {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}
