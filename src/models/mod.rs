//! Data models for the Autotask REST API.
//!
//! This module contains the query-side types (filters, query
//! specifications), response envelopes, and operation descriptors.
//! Record bodies themselves are server-defined and stay open-ended.

mod descriptor;
mod envelope;
mod filter;
mod query;

pub use descriptor::*;
pub use envelope::{CountEnvelope, Page, PageDetails, ZoneInformation};
pub(crate) use envelope::{unwrap_item, unwrap_items, SingleRecord};
pub use filter::*;
pub use query::*;

/// An open record: field names and values exactly as the server sends them.
pub type Record = serde_json::Map<String, serde_json::Value>;
