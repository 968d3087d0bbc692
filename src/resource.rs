//! Generic entity resource client.
//!
//! Every Autotask collection (Tickets, Companies, ...) is served by the same
//! `ResourceClient`, parameterized by a static `ResourceConfig` row that
//! records what differs between collections: the path, which operations it
//! supports, how its page-size key is spelled, and whether list queries are
//! POSTed or sent as a GET `search` parameter.
//!
//! Operation descriptors are derived from the same row, so the documented
//! operations always match what the client will actually execute.

use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::AutotaskError;
use crate::executor::{Payload, RequestExecutor};
use crate::models::{
    unwrap_item, unwrap_items, CountEnvelope, OperationDescriptor, Page, PageSizeKey, QuerySpec,
    Record, SingleRecord,
};

/// Upper bound on pages fetched by `list_all`.
pub const MAX_PAGES: usize = 1000;

/// An operation a resource may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// POST a new record.
    Create,
    /// GET one record by id.
    Get,
    /// PUT a full replacement.
    Update,
    /// PATCH a partial update.
    Patch,
    /// DELETE by id.
    Delete,
    /// Query the collection (includes paging and counting).
    List,
}

impl Operation {
    /// All operations in descriptor order.
    pub const ALL: [Operation; 6] = [
        Operation::Create,
        Operation::Get,
        Operation::Update,
        Operation::Patch,
        Operation::Delete,
        Operation::List,
    ];

    /// Operation name as used in descriptors and errors.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::Patch => "patch",
            Operation::Delete => "delete",
            Operation::List => "list",
        }
    }
}

/// The subset of operations a resource supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `create`
    pub create: bool,
    /// `get`
    pub get: bool,
    /// `update`
    pub update: bool,
    /// `patch`
    pub patch: bool,
    /// `delete`
    pub delete: bool,
    /// `list`, `list_page`, `list_all`, `count`
    pub list: bool,
}

impl Capabilities {
    /// Every operation.
    pub const ALL: Self = Self {
        create: true,
        get: true,
        update: true,
        patch: true,
        delete: true,
        list: true,
    };

    /// Everything except delete.
    pub const NO_DELETE: Self = Self {
        delete: false,
        ..Self::ALL
    };

    /// Create, read and delete; no in-place updates.
    pub const CREATE_READ_DELETE: Self = Self {
        update: false,
        patch: false,
        ..Self::ALL
    };

    /// Read and update existing records only.
    pub const READ_UPDATE: Self = Self {
        create: false,
        delete: false,
        ..Self::ALL
    };

    /// Lookup collections.
    pub const READ_ONLY: Self = Self {
        create: false,
        get: true,
        update: false,
        patch: false,
        delete: false,
        list: true,
    };

    /// Whether `operation` is supported.
    pub const fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Create => self.create,
            Operation::Get => self.get,
            Operation::Update => self.update,
            Operation::Patch => self.patch,
            Operation::Delete => self.delete,
            Operation::List => self.list,
        }
    }
}

/// How a resource's list queries travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTransport {
    /// `POST {path}/query` with the query as JSON body.
    PostQuery,
    /// `GET {path}/query?search=<json>`.
    GetQuery,
}

/// Static configuration of one API collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Collection name (e.g. `Tickets`).
    pub name: &'static str,
    /// Path relative to the zone base URL (e.g. `/Tickets`).
    pub path: &'static str,
    /// Supported operations.
    pub capabilities: Capabilities,
    /// Spelling of the page-size key in query bodies.
    pub page_size_key: PageSizeKey,
    /// How list queries are sent.
    pub list_transport: ListTransport,
}

impl ResourceConfig {
    /// Describes the operations this resource supports.
    pub fn describe_operations(&self) -> Vec<OperationDescriptor> {
        let mut ops: Vec<OperationDescriptor> = Operation::ALL
            .into_iter()
            .filter(|op| self.capabilities.supports(*op))
            .map(|op| self.describe(op))
            .collect();

        if self.capabilities.list {
            let (method, endpoint) = self.list_endpoint("/query/count");
            ops.push(OperationDescriptor {
                name: "count",
                method,
                endpoint,
                required_params: vec![],
                optional_params: vec!["filter"],
                returns: "u64",
            });
        }

        ops
    }

    fn describe(&self, op: Operation) -> OperationDescriptor {
        let item = format!("{}/{{id}}", self.path);
        let (method, endpoint, required, optional, returns) = match op {
            Operation::Create => ("POST", self.path.to_string(), vec!["record"], vec![], "Record"),
            Operation::Get => ("GET", item, vec!["id"], vec![], "Record"),
            Operation::Update => ("PUT", item, vec!["id", "record"], vec![], "Record"),
            Operation::Patch => ("PATCH", item, vec!["id", "partial_record"], vec![], "Record"),
            Operation::Delete => ("DELETE", item, vec!["id"], vec![], "()"),
            Operation::List => {
                let (method, endpoint) = self.list_endpoint("/query");
                (
                    method,
                    endpoint,
                    vec![],
                    vec!["filter", "sort", "page", self.page_size_key.as_str(), "IncludeFields"],
                    "Vec<Record>",
                )
            }
        };

        OperationDescriptor {
            name: op.name(),
            method,
            endpoint,
            required_params: required,
            optional_params: optional,
            returns,
        }
    }

    fn list_endpoint(&self, suffix: &str) -> (&'static str, String) {
        match self.list_transport {
            ListTransport::PostQuery => ("POST", format!("{}{}", self.path, suffix)),
            ListTransport::GetQuery => ("GET", format!("{}{}?search={{query}}", self.path, suffix)),
        }
    }
}

/// Client for one API collection.
///
/// `T` is the record shape; it defaults to an open `Record` map, since the
/// schema is defined by the server. Cloning is cheap.
///
/// # Example
///
/// ```ignore
/// let tickets = client.tickets();
/// let open = tickets
///     .list(QuerySpec::new().with_filter(FilterClause::eq("status", 1)))
///     .await?;
/// ```
pub struct ResourceClient<T = Record> {
    config: &'static ResourceConfig,
    executor: Arc<RequestExecutor>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            executor: Arc::clone(&self.executor),
            _record: PhantomData,
        }
    }
}

impl<T> ResourceClient<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Binds `config` to a shared executor.
    pub fn new(config: &'static ResourceConfig, executor: Arc<RequestExecutor>) -> Self {
        Self {
            config,
            executor,
            _record: PhantomData,
        }
    }

    /// The resource configuration.
    pub fn config(&self) -> &'static ResourceConfig {
        self.config
    }

    /// Describes the operations this resource supports. No I/O.
    pub fn describe_operations(&self) -> Vec<OperationDescriptor> {
        self.config.describe_operations()
    }

    /// Creates a record.
    ///
    /// # Errors
    ///
    /// `Validation` if `record` does not serialize to a JSON object;
    /// `Unsupported` if the resource cannot create.
    pub async fn create(&self, record: &T) -> Result<T, AutotaskError> {
        self.require(Operation::Create)?;
        let body = Self::record_body(record, "record")?;

        let response = self
            .executor
            .execute(Method::POST, self.config.path, Payload::Body(body))
            .await
            .map_err(collection_not_found)?;

        self.resolve_single(self.config.path, response).await
    }

    /// Fetches a record by id.
    ///
    /// # Errors
    ///
    /// `Validation` for ids below 1; `NotFound` if no such record exists.
    pub async fn get(&self, id: i64) -> Result<T, AutotaskError> {
        self.require(Operation::Get)?;
        Self::validate_id(id)?;
        self.fetch(id).await
    }

    /// Replaces a record.
    pub async fn update(&self, id: i64, record: &T) -> Result<T, AutotaskError> {
        self.require(Operation::Update)?;
        Self::validate_id(id)?;
        let body = Self::record_body(record, "record")?;

        let path = self.item_path(id);
        let response = self
            .executor
            .execute(Method::PUT, &path, Payload::Body(body))
            .await?;

        self.resolve_single(&path, response).await
    }

    /// Merges `partial` into a record.
    ///
    /// # Errors
    ///
    /// `Unsupported` for resources without partial update.
    pub async fn patch<P>(&self, id: i64, partial: &P) -> Result<T, AutotaskError>
    where
        P: Serialize + ?Sized,
    {
        self.require(Operation::Patch)?;
        Self::validate_id(id)?;
        let body = Self::record_body(partial, "partial record")?;

        let path = self.item_path(id);
        let response = self
            .executor
            .execute(Method::PATCH, &path, Payload::Body(body))
            .await?;

        self.resolve_single(&path, response).await
    }

    /// Deletes a record.
    pub async fn delete(&self, id: i64) -> Result<(), AutotaskError> {
        self.require(Operation::Delete)?;
        Self::validate_id(id)?;

        self.executor
            .execute(Method::DELETE, &self.item_path(id), Payload::Empty)
            .await?;
        Ok(())
    }

    /// Lists records matching `query`.
    pub async fn list(&self, query: QuerySpec) -> Result<Vec<T>, AutotaskError> {
        Ok(self.list_page(query).await?.items)
    }

    /// Lists one page of records with its pagination details.
    pub async fn list_page(&self, query: QuerySpec) -> Result<Page<T>, AutotaskError> {
        self.require(Operation::List)?;
        let path = format!("{}/query", self.config.path);
        let body = query.to_body(self.config.page_size_key)?;

        let response = self.send_query(&path, body).await?;
        Self::decode_page(&path, response)
    }

    /// Lists every record matching `query`, following next-page links.
    ///
    /// # Errors
    ///
    /// `Validation` if a next-page link leaves the API host or more than
    /// `MAX_PAGES` pages are returned.
    pub async fn list_all(&self, query: QuerySpec) -> Result<Vec<T>, AutotaskError> {
        let mut page = self.list_page(query).await?;
        let mut records = Vec::new();
        let mut pages = 1usize;

        loop {
            let next = page.next_page_url().map(str::to_string);
            records.append(&mut page.items);

            let Some(next) = next else {
                return Ok(records);
            };
            if pages >= MAX_PAGES {
                return Err(AutotaskError::validation(format!(
                    "{} returned more than {} pages",
                    self.config.name, MAX_PAGES
                )));
            }

            tracing::debug!(resource = self.config.name, page = pages + 1, "Fetching next page");
            let response = self.executor.execute_absolute(&next).await?;
            page = Self::decode_page(&next, response)?;
            pages += 1;
        }
    }

    /// Counts records matching `query`.
    pub async fn count(&self, query: QuerySpec) -> Result<u64, AutotaskError> {
        self.require(Operation::List)?;
        let path = format!("{}/query/count", self.config.path);
        let body = query.to_filter_body()?;

        let response = self.send_query(&path, body).await?;
        let envelope: CountEnvelope = serde_json::from_value(response)?;
        Ok(envelope.query_count)
    }

    async fn send_query(&self, path: &str, body: Value) -> Result<Value, AutotaskError> {
        let result = match self.config.list_transport {
            ListTransport::PostQuery => {
                self.executor
                    .execute(Method::POST, path, Payload::Body(body))
                    .await
            }
            ListTransport::GetQuery => {
                let search = serde_json::to_string(&body)?;
                self.executor
                    .execute(
                        Method::GET,
                        path,
                        Payload::Params(vec![("search".to_string(), search)]),
                    )
                    .await
            }
        };
        result.map_err(collection_not_found)
    }

    async fn fetch(&self, id: i64) -> Result<T, AutotaskError> {
        let path = self.item_path(id);
        let response = self
            .executor
            .execute(Method::GET, &path, Payload::Empty)
            .await?;

        match unwrap_item(&path, response)? {
            SingleRecord::Record(record) => Ok(serde_json::from_value(record)?),
            SingleRecord::ItemId(_) => Err(AutotaskError::unexpected(&path, "missing 'item'")),
        }
    }

    /// Unwraps a write response; `{itemId}` answers are resolved with a follow-up GET.
    async fn resolve_single(&self, path: &str, response: Value) -> Result<T, AutotaskError> {
        match unwrap_item(path, response)? {
            SingleRecord::Record(record) => Ok(serde_json::from_value(record)?),
            SingleRecord::ItemId(id) if self.config.capabilities.get => self.fetch(id).await,
            SingleRecord::ItemId(id) => Ok(serde_json::from_value(serde_json::json!({ "id": id }))?),
        }
    }

    fn decode_page(path: &str, response: Value) -> Result<Page<T>, AutotaskError> {
        let page = unwrap_items(path, response)?;
        let items = page
            .items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Page {
            items,
            page_details: page.page_details,
        })
    }

    fn require(&self, operation: Operation) -> Result<(), AutotaskError> {
        if self.config.capabilities.supports(operation) {
            Ok(())
        } else {
            Err(AutotaskError::unsupported(self.config.name, operation.name()))
        }
    }

    fn item_path(&self, id: i64) -> String {
        format!("{}/{}", self.config.path, id)
    }

    fn validate_id(id: i64) -> Result<(), AutotaskError> {
        if id <= 0 {
            return Err(AutotaskError::validation(format!(
                "id must be a positive integer, got {}",
                id
            )));
        }
        Ok(())
    }

    fn record_body<R>(record: &R, what: &str) -> Result<Value, AutotaskError>
    where
        R: Serialize + ?Sized,
    {
        match serde_json::to_value(record)? {
            body @ Value::Object(_) => Ok(body),
            Value::Null => Err(AutotaskError::validation(format!("{} is required", what))),
            _ => Err(AutotaskError::validation(format!(
                "{} must be a JSON object",
                what
            ))),
        }
    }
}

/// A 404 on a collection endpoint is a client error, not a missing record.
fn collection_not_found(error: AutotaskError) -> AutotaskError {
    match error {
        AutotaskError::NotFound { path } => AutotaskError::ClientRequest {
            status: 404,
            path,
            message: "collection endpoint not found".to_string(),
        },
        other => other,
    }
}
