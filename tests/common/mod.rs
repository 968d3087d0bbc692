//! Shared test fixtures.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use autotask_client::{
    AutotaskClient, HttpRequest, HttpResponse, RequestExecutor, RetryPolicy, Transport,
    TransportError, TransportErrorKind,
};
use serde_json::Value;

pub const BASE_URL: &str = "https://webservices5.autotask.net/ATServicesRest/V1.0";

/// Transport that replays canned outcomes in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpResponse::json(status, &body)))
    }

    pub fn respond_empty(self, status: u16) -> Self {
        self.push(Ok(HttpResponse {
            status,
            body: String::new(),
        }))
    }

    pub fn respond_raw(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }))
    }

    pub fn fail(self, kind: TransportErrorKind) -> Self {
        self.push(Err(TransportError::new(kind, "connection reset by peer")))
    }

    fn push(self, outcome: Result<HttpResponse, TransportError>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new(TransportErrorKind::Other, "script exhausted")))
    }
}

/// Retry policy with millisecond backoff so tests stay fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        ..RetryPolicy::default()
    }
}

pub fn executor(transport: &Arc<ScriptedTransport>) -> RequestExecutor {
    RequestExecutor::new(BASE_URL, Arc::clone(transport) as Arc<dyn Transport>)
        .with_retry_policy(fast_retry())
}

pub fn client(transport: &Arc<ScriptedTransport>) -> AutotaskClient {
    AutotaskClient::from_executor(executor(transport))
}
