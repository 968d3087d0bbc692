//! Query specification for list operations.

use serde_json::{Map, Value};

use super::filter::{normalize, FilterInput};
use crate::error::AutotaskError;

/// Name of the page-size key in a resource's query body.
///
/// Resources disagree on the spelling, so it is part of each resource's
/// configuration rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizeKey {
    /// `MaxRecords`
    MaxRecords,
    /// `maxRecords`
    MaxRecordsCamel,
    /// `pageSize`
    PageSize,
}

impl PageSizeKey {
    /// Wire name of the key.
    pub fn as_str(self) -> &'static str {
        match self {
            PageSizeKey::MaxRecords => "MaxRecords",
            PageSizeKey::MaxRecordsCamel => "maxRecords",
            PageSizeKey::PageSize => "pageSize",
        }
    }
}

/// Filter, sort and paging parameters for a list call.
///
/// Use the builder methods to construct a query; an empty query lists
/// everything (the match-all clause is injected on the wire).
///
/// # Example
///
/// ```ignore
/// let query = QuerySpec::new()
///     .with_filter(FilterClause::eq("status", 1))
///     .with_sort("id")
///     .with_page_size(50);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// Caller filter; `None` means match all.
    pub filter: Option<FilterInput>,

    /// Sort expression passed through to the server.
    pub sort: Option<String>,

    /// 1-based page number.
    pub page: Option<u32>,

    /// Maximum number of records per page.
    pub page_size: Option<u32>,

    /// Restricts the fields returned per record.
    pub include_fields: Vec<String>,
}

impl QuerySpec {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: impl Into<FilterInput>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the sort expression.
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Sets the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Limits the returned fields.
    pub fn with_include_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Renders the query body for a resource using `page_size_key`.
    ///
    /// # Errors
    ///
    /// Returns `AutotaskError::Validation` if the filter cannot be normalized
    /// or the page number is zero.
    pub fn to_body(&self, page_size_key: PageSizeKey) -> Result<Value, AutotaskError> {
        let filter = normalize(self.filter.as_ref())?;

        let mut body = Map::new();
        body.insert("filter".to_string(), serde_json::to_value(filter)?);

        if let Some(sort) = &self.sort {
            body.insert("sort".to_string(), Value::String(sort.clone()));
        }
        if let Some(page) = self.page {
            if page == 0 {
                return Err(AutotaskError::validation("page numbers start at 1"));
            }
            body.insert("page".to_string(), Value::from(page));
        }
        if let Some(size) = self.page_size {
            body.insert(page_size_key.as_str().to_string(), Value::from(size));
        }
        if !self.include_fields.is_empty() {
            body.insert(
                "IncludeFields".to_string(),
                Value::from(self.include_fields.clone()),
            );
        }

        Ok(Value::Object(body))
    }

    /// Renders only the filter part, as used by count endpoints.
    pub(crate) fn to_filter_body(&self) -> Result<Value, AutotaskError> {
        let filter = normalize(self.filter.as_ref())?;
        let mut body = Map::new();
        body.insert("filter".to_string(), serde_json::to_value(filter)?);
        Ok(Value::Object(body))
    }
}
