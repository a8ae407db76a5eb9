//! searchsync command line.
//!
//! Runs searches and aggregations against a synchronised index and indexes or
//! removes single documents by hand.

mod config;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use searchsync::config::SyncConfig;
use searchsync::query::{AggregationOptions, SearchOptions};
use searchsync::serializer::DocValue;
use searchsync::sync::SearchSync;
use searchsync::transport::ReqwestClient;
use serde_json::{Value, json};
use tracing::info;

use crate::config::{CliConfig, Command};

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("searchsync={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Reads a JSON file, or stdin for `-`.
fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(sync: SearchSync, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Search { options } => {
            let options: SearchOptions = serde_json::from_value(read_json(&options)?)
                .context("Invalid search options")?;
            let result = sync.search(&options).await?;
            print_json(&serde_json::to_value(result)?)
        }
        Command::Aggregate { options } => {
            let options: AggregationOptions = serde_json::from_value(read_json(&options)?)
                .context("Invalid aggregation options")?;
            let result = sync.aggregate(&options).await?;
            let buckets = result.buckets();
            print_json(&json!({
                "total": result.total,
                "hits": result.hits,
                "aggregation": result.aggregation,
                "buckets": buckets,
            }))
        }
        Command::Index { id, document } => {
            let document = DocValue::from(read_json(&document)?);
            let reply = sync.index(&id, &document).await?;
            print_json(&reply)
        }
        Command::Unindex { id } => {
            let reply = sync.unindex(&id).await?;
            print_json(&reply)
        }
        Command::Endpoints { id } => {
            let endpoints = sync.endpoints();
            let mut out = json!({
                "index": endpoints.index_name(),
                "domain": endpoints.domain_uri(),
                "indexUri": endpoints.index_uri(),
                "typeUri": endpoints.type_uri(),
                "searchUri": endpoints.search_uri(),
                "bulkUri": endpoints.bulk_uri(),
                "aliasesUri": endpoints.aliases_uri(),
            });
            if let Some(id) = id {
                out["documentUri"] = Value::String(endpoints.document_uri(&id));
            }
            print_json(&out)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let sync_config = SyncConfig::resolve(&config.sync_settings())
        .context("Invalid connection configuration")?;
    let client = ReqwestClient::with_timeout(config.request_timeout())?;

    info!(
        domain = %sync_config.connection.domain_uri(),
        doc_type = %sync_config.doc_type,
        max_attempts = sync_config.retry.max_attempts,
        "Starting searchsync"
    );

    let sync = SearchSync::with_client(sync_config, client);
    run(sync, config.command).await
}
