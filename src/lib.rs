//! # autotask-client
//!
//! Async client for the Autotask PSA REST API.
//!
//! Every Autotask collection (Tickets, Companies, Contracts, ...) is served
//! by one generic [`ResourceClient`](resource::ResourceClient) configured by
//! a row of the [`catalog`], instead of a hand-written type per entity.
//!
//! ## Features
//!
//! - **CRUD**: `create`, `get`, `update`, `patch`, `delete` per collection,
//!   gated by the collection's capability set
//! - **Queries**: loosely-typed filters normalized into `{op, field, value}`
//!   clauses, with paging, counting and next-page following
//! - **Error handling**: typed error kinds, bounded exponential backoff for
//!   idempotent requests, optional per-call deadline
//! - **Security**: the API secret is never logged; payloads are redacted
//!   before logging
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Error types with retry classification and sanitization
//! - [`transport`] - Injected HTTP transport and the reqwest implementation
//! - [`executor`] - Request execution, classification, retry and logging
//! - [`models`] - Filters, query specifications, envelopes, descriptors
//! - [`resource`] - Per-collection configuration and the generic client
//! - [`catalog`] - The table of known collections
//! - [`client`] - The [`AutotaskClient`] facade
//!
//! ## Configuration
//!
//! - `AUTOTASK_USERNAME`, `AUTOTASK_SECRET`, `AUTOTASK_INTEGRATION_CODE` (required)
//! - `AUTOTASK_API_URL` (optional; discovered from the user name when absent)
//! - `AUTOTASK_TIMEOUT_SECS` (optional, default 30)
//!
//! ## Example
//!
//! ```ignore
//! use autotask_client::{AutotaskClient, Config, FilterInput, QuerySpec};
//! use serde_json::json;
//!
//! async fn example() -> Result<(), autotask_client::AutotaskError> {
//!     let config = Config::from_env()?;
//!     let client = AutotaskClient::connect(&config).await?;
//!
//!     // Open tickets for one company, newest first
//!     let filter = FilterInput::from_value(json!({"status": 1, "companyID": 42}))?;
//!     let tickets = client
//!         .tickets()
//!         .list(QuerySpec::new().with_filter(filter).with_page_size(20))
//!         .await?;
//!
//!     for ticket in tickets {
//!         println!("{}: {}", ticket["id"], ticket["title"]);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod resource;
pub mod transport;

pub use client::AutotaskClient;
pub use config::Config;
pub use error::AutotaskError;
pub use executor::{Payload, RequestExecutor, RetryPolicy};
pub use models::{
    FilterClause, FilterInput, FilterOperator, OperationDescriptor, Page, PageDetails,
    PageSizeKey, QuerySpec, Record,
};
pub use resource::{Capabilities, ListTransport, Operation, ResourceClient, ResourceConfig};
pub use transport::{HttpRequest, HttpResponse, Transport, TransportError, TransportErrorKind};
