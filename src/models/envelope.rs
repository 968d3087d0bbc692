//! Response envelopes.
//!
//! The API wraps single records as `{"item": {...}}`, collections as
//! `{"items": [...], "pageDetails": {...}}`, and write results sometimes as
//! `{"itemId": 123}`. Callers never see these wrappers; the helpers here
//! strip them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AutotaskError;

/// Pagination metadata returned alongside collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDetails {
    /// Records in this page.
    #[serde(default)]
    pub count: u32,

    /// Page size the server applied.
    #[serde(default)]
    pub request_count: u32,

    /// Absolute URL of the previous page.
    #[serde(default)]
    pub prev_page_url: Option<String>,

    /// Absolute URL of the next page, absent on the last page.
    #[serde(default)]
    pub next_page_url: Option<String>,
}

/// One page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Unwrapped records.
    pub items: Vec<T>,

    /// Pagination info, when the server sent it.
    pub page_details: Option<PageDetails>,
}

impl<T> Page<T> {
    /// URL of the following page, if there is one.
    pub fn next_page_url(&self) -> Option<&str> {
        self.page_details
            .as_ref()
            .and_then(|d| d.next_page_url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// Response of a count endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountEnvelope {
    /// Number of matching records.
    pub query_count: u64,
}

/// Zone lookup response for an API user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInformation {
    /// Zone display name.
    #[serde(default)]
    pub zone_name: Option<String>,

    /// REST root of the zone (e.g. `https://webservices5.autotask.net/ATServicesRest/`).
    pub url: String,

    /// Web UI root of the zone.
    #[serde(default)]
    pub web_url: Option<String>,

    /// Zone numeric identifier.
    #[serde(default)]
    pub ci: Option<i64>,
}

/// A single-record response after envelope stripping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SingleRecord {
    /// The record itself.
    Record(Value),
    /// Only the identifier of the affected record.
    ItemId(i64),
}

/// Strips a single-record envelope.
///
/// `{"item": null}` is how the API answers a lookup of a missing id, so it
/// is reported as not found.
pub(crate) fn unwrap_item(path: &str, body: Value) -> Result<SingleRecord, AutotaskError> {
    let Value::Object(mut map) = body else {
        return Err(AutotaskError::unexpected(path, "expected a JSON object"));
    };

    if let Some(item) = map.remove("item") {
        return match item {
            Value::Null => Err(AutotaskError::not_found(path)),
            Value::Object(_) => Ok(SingleRecord::Record(item)),
            _ => Err(AutotaskError::unexpected(path, "'item' is not an object")),
        };
    }

    if map.len() == 1 {
        if let Some(id) = map.get("itemId").and_then(Value::as_i64) {
            return Ok(SingleRecord::ItemId(id));
        }
    }

    Ok(SingleRecord::Record(Value::Object(map)))
}

/// Strips a multi-record envelope. A bare JSON array is accepted as well.
pub(crate) fn unwrap_items(path: &str, body: Value) -> Result<Page<Value>, AutotaskError> {
    match body {
        Value::Array(items) => Ok(Page {
            items,
            page_details: None,
        }),
        Value::Object(mut map) => {
            let items = match map.remove("items") {
                Some(Value::Array(items)) => items,
                Some(Value::Null) => Vec::new(),
                Some(_) => return Err(AutotaskError::unexpected(path, "'items' is not an array")),
                None => return Err(AutotaskError::unexpected(path, "missing 'items'")),
            };
            let page_details = map
                .remove("pageDetails")
                .filter(|v| !v.is_null())
                .map(serde_json::from_value::<PageDetails>)
                .transpose()?;
            Ok(Page {
                items,
                page_details,
            })
        }
        _ => Err(AutotaskError::unexpected(path, "expected a JSON object")),
    }
}
