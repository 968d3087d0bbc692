//! Autotask command-line client.
//!
//! A thin command-line harness over the library: every subcommand maps to
//! one entity operation and prints the result as JSON on stdout.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `AUTOTASK_USERNAME`, `AUTOTASK_SECRET`, `AUTOTASK_INTEGRATION_CODE`
//! - `AUTOTASK_API_URL` (optional, discovered when absent)
//!
//! # Usage
//!
//! ```bash
//! autotask list tickets --filter '{"status": 1}' --page-size 20
//! autotask get companies 1234
//! autotask describe time-off-requests
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use autotask_client::{catalog, AutotaskClient, Config, FilterInput, QuerySpec, ResourceClient};

#[derive(Parser)]
#[command(name = "autotask", version, about = "Autotask PSA REST API client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List known collections
    Entities,
    /// Show the operations a collection supports
    Describe { entity: String },
    /// Check credentials and connectivity
    Ping,
    /// Fetch one record
    Get { entity: String, id: i64 },
    /// Query records
    List {
        entity: String,
        /// Filter as JSON: {"field": value}, {"field": {"op": value}} or a clause array
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Follow next-page links until exhausted
        #[arg(long)]
        all: bool,
    },
    /// Count records matching a filter
    Count {
        entity: String,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Create a record from JSON
    Create {
        entity: String,
        #[arg(long)]
        data: String,
    },
    /// Replace a record with JSON
    Update {
        entity: String,
        id: i64,
        #[arg(long)]
        data: String,
    },
    /// Merge JSON into a record
    Patch {
        entity: String,
        id: i64,
        #[arg(long)]
        data: String,
    },
    /// Delete a record
    Delete { entity: String, id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries command output only
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("autotask_client=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Entities => {
            let names: Vec<&str> = catalog::CATALOG.iter().map(|e| e.config.name).collect();
            return print_json(&serde_json::to_value(names)?);
        }
        Command::Describe { entity } => {
            let config = catalog::find(&entity)
                .with_context(|| format!("unknown entity '{}'", entity))?;
            return print_json(&serde_json::to_value(config.describe_operations())?);
        }
        _ => {}
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let client = AutotaskClient::connect(&config)
        .await
        .context("Failed to create Autotask client")?;

    tracing::debug!(base_url = %client.executor().base_url(), "Autotask client initialized");

    match cli.command {
        Command::Entities | Command::Describe { .. } => Ok(()),
        Command::Ping => {
            client.test_connection().await?;
            print_json(&Value::String("ok".to_string()))
        }
        Command::Get { entity, id } => {
            let record = resource(&client, &entity)?.get(id).await?;
            print_json(&Value::Object(record))
        }
        Command::List {
            entity,
            filter,
            sort,
            page,
            page_size,
            all,
        } => {
            let mut query = QuerySpec::new();
            if let Some(filter) = filter {
                query = query.with_filter(parse_filter(&filter)?);
            }
            if let Some(sort) = sort {
                query = query.with_sort(sort);
            }
            if let Some(page) = page {
                query = query.with_page(page);
            }
            if let Some(page_size) = page_size {
                query = query.with_page_size(page_size);
            }

            let resource = resource(&client, &entity)?;
            let records = if all {
                resource.list_all(query).await?
            } else {
                resource.list(query).await?
            };
            print_json(&Value::Array(records.into_iter().map(Value::Object).collect()))
        }
        Command::Count { entity, filter } => {
            let mut query = QuerySpec::new();
            if let Some(filter) = filter {
                query = query.with_filter(parse_filter(&filter)?);
            }
            let count = resource(&client, &entity)?.count(query).await?;
            print_json(&Value::from(count))
        }
        Command::Create { entity, data } => {
            let record = resource(&client, &entity)?
                .create(&parse_record(&data)?)
                .await?;
            print_json(&Value::Object(record))
        }
        Command::Update { entity, id, data } => {
            let record = resource(&client, &entity)?
                .update(id, &parse_record(&data)?)
                .await?;
            print_json(&Value::Object(record))
        }
        Command::Patch { entity, id, data } => {
            let record = resource(&client, &entity)?
                .patch(id, &parse_record(&data)?)
                .await?;
            print_json(&Value::Object(record))
        }
        Command::Delete { entity, id } => {
            resource(&client, &entity)?.delete(id).await?;
            print_json(&Value::String(format!("deleted {} {}", entity, id)))
        }
    }
}

fn resource(client: &AutotaskClient, entity: &str) -> Result<ResourceClient> {
    client
        .entity(entity)
        .with_context(|| format!("unknown entity '{}'; run `autotask entities`", entity))
}

fn parse_filter(raw: &str) -> Result<FilterInput> {
    let value: Value = serde_json::from_str(raw).context("--filter is not valid JSON")?;
    Ok(FilterInput::from_value(value)?)
}

fn parse_record(raw: &str) -> Result<autotask_client::Record> {
    match serde_json::from_str::<Value>(raw).context("--data is not valid JSON")? {
        Value::Object(record) => Ok(record),
        _ => bail!("--data must be a JSON object"),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
