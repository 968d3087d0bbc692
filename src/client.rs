//! Top-level client facade.
//!
//! `AutotaskClient` owns the shared `RequestExecutor` (and through it the
//! transport's connection pool) and hands out `ResourceClient`s, one per
//! collection in the catalog. Cloning the facade is cheap and every clone
//! shares the same pool.

use std::sync::Arc;

use reqwest::Method;

use crate::config::Config;
use crate::error::AutotaskError;
use crate::executor::RequestExecutor;
use crate::models::{QuerySpec, ZoneInformation};
use crate::resource::{ResourceClient, ResourceConfig};
use crate::transport::{HttpRequest, ReqwestTransport, Transport};

/// Zone lookup endpoint shared by every Autotask zone.
pub const ZONE_LOOKUP_URL: &str =
    "https://webservices.autotask.net/ATServicesRest/V1.0/zoneInformation";

/// Client for the Autotask REST API.
///
/// # Example
///
/// ```ignore
/// let config = Config::from_env()?;
/// let client = AutotaskClient::connect(&config).await?;
///
/// let tickets = client
///     .tickets()
///     .list(QuerySpec::new().with_filter(FilterClause::eq("status", 1)))
///     .await?;
/// ```
#[derive(Clone)]
pub struct AutotaskClient {
    executor: Arc<RequestExecutor>,
}

impl AutotaskClient {
    /// Creates a client from configuration that already names the zone.
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::Config` if no base URL is configured (use
    /// `connect` to discover it) and `AutotaskError::HttpClient` if the HTTP
    /// client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, AutotaskError> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            AutotaskError::invalid_config(
                "AUTOTASK_API_URL is not set; use AutotaskClient::connect to discover the zone",
            )
        })?;
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Ok(Self::from_executor(
            RequestExecutor::new(base_url, transport).with_secret(config.secret()),
        ))
    }

    /// Creates a client, discovering the zone base URL from the user name
    /// when the configuration does not name one.
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::ZoneLookup` if discovery fails.
    pub async fn connect(config: &Config) -> Result<Self, AutotaskError> {
        if config.base_url.is_some() {
            return Self::new(config);
        }

        let transport = Arc::new(ReqwestTransport::new(config)?);
        let base_url = discover_zone(transport.as_ref(), ZONE_LOOKUP_URL, &config.username).await?;
        tracing::info!(base_url = %base_url, "Discovered Autotask zone");

        Ok(Self::from_executor(
            RequestExecutor::new(&base_url, transport).with_secret(config.secret()),
        ))
    }

    /// Creates a client over an injected transport.
    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self::from_executor(RequestExecutor::new(base_url, transport))
    }

    /// Creates a client over a fully configured executor.
    pub fn from_executor(executor: RequestExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    /// The shared request executor.
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Client for any configured collection, with a caller-chosen record type.
    pub fn resource<T>(&self, config: &'static ResourceConfig) -> ResourceClient<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        ResourceClient::new(config, Arc::clone(&self.executor))
    }

    /// Client for a catalog collection looked up by name.
    pub fn entity(&self, name: &str) -> Option<ResourceClient> {
        crate::catalog::find(name).map(|config| self.resource(config))
    }

    /// Tests connectivity and credentials by listing a single company.
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::ConnectionTest` with a hint about the cause.
    pub async fn test_connection(&self) -> Result<(), AutotaskError> {
        tracing::debug!("Testing connection to Autotask");

        let result = self
            .companies()
            .list(QuerySpec::new().with_page_size(1))
            .await;

        match result {
            Ok(_) => {
                tracing::info!("Connection test successful");
                Ok(())
            }
            Err(AutotaskError::ClientRequest { status: 401, .. })
            | Err(AutotaskError::ClientRequest { status: 403, .. }) => Err(
                AutotaskError::connection_test(
                    "Authentication failed - verify AUTOTASK_USERNAME, AUTOTASK_SECRET and AUTOTASK_INTEGRATION_CODE",
                ),
            ),
            Err(AutotaskError::Timeout { duration, .. }) => {
                Err(AutotaskError::connection_test(format!(
                    "Connection timed out after {:?} - verify AUTOTASK_API_URL and network access",
                    duration
                )))
            }
            Err(AutotaskError::TransientNetwork { message, .. }) => {
                Err(AutotaskError::connection_test(format!(
                    "Network error: {} - verify AUTOTASK_API_URL is correct",
                    message
                )))
            }
            Err(e) => Err(AutotaskError::connection_test(e.to_string())),
        }
    }
}

/// Looks up the zone REST base URL for `username` at `lookup_url`.
///
/// Returns the zone URL with the `V1.0` version segment appended.
///
/// # Errors
///
/// Returns `AutotaskError::ZoneLookup` on any failure.
pub async fn discover_zone(
    transport: &dyn Transport,
    lookup_url: &str,
    username: &str,
) -> Result<String, AutotaskError> {
    if username.trim().is_empty() {
        return Err(AutotaskError::ZoneLookup("user name is empty".to_string()));
    }

    let url = format!("{}?user={}", lookup_url, urlencoding::encode(username.trim()));
    let response = transport
        .send(HttpRequest {
            method: Method::GET,
            url,
            body: None,
        })
        .await
        .map_err(|e| AutotaskError::ZoneLookup(e.to_string()))?;

    if !response.is_success() {
        return Err(AutotaskError::ZoneLookup(format!(
            "zone lookup returned HTTP {}",
            response.status
        )));
    }

    let zone: ZoneInformation = serde_json::from_str(&response.body)
        .map_err(|e| AutotaskError::ZoneLookup(format!("malformed zone information: {}", e)))?;

    Config::validate_base_url(&zone.url).map_err(|e| AutotaskError::ZoneLookup(e.to_string()))
}
