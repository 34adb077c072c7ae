//! Braincube command-line client (bcc)
//!
//! Lists cubes, memory bases and variables, and fetches data as JSON on
//! stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bcc_connector::{Client, DataLabel, EntityId, FilterExpr, Pagination};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for bcc
#[derive(Parser, Debug)]
#[command(name = "bcc")]
#[command(about = "Command-line client for the Braincube web services")]
#[command(version)]
struct Args {
    /// Configuration file (JSON, or TOML when ending in .toml)
    #[arg(short, long, env = "BCC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the accessible cubes
    Cubes,

    /// List the memory bases of a cube
    MemoryBases {
        cube: String,

        /// Zero-based page; every page when omitted
        #[arg(long)]
        page: Option<usize>,

        #[arg(long)]
        page_size: Option<usize>,
    },

    /// List the variables of a memory base
    Variables { cube: String, memory_base: String },

    /// Fetch the data of some variables
    Data {
        cube: String,
        memory_base: String,

        #[arg(required = true)]
        variables: Vec<String>,

        /// Wire JSON filter, may be repeated
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Parse datetime columns
        #[arg(long)]
        parse_date: bool,

        /// Key columns by variable name instead of id
        #[arg(long)]
        names: bool,
    },
}

/// Numeric ids are sent as numbers, anything else as text
fn parse_id(raw: &str) -> EntityId {
    raw.parse::<i64>().map(EntityId::Int).unwrap_or_else(|_| EntityId::from(raw))
}

fn parse_filter(raw: &str) -> Result<FilterExpr> {
    let value: Value = serde_json::from_str(raw).with_context(|| format!("Filter is not JSON: {}", raw))?;
    FilterExpr::from_json(&value).with_context(|| format!("Invalid filter: {}", raw))
}

fn summary<T: std::ops::Deref<Target = bcc_connector::Entity>>(entities: &[T]) -> Value {
    entities
        .iter()
        .map(|e| json!({"id": e.id().to_json(), "name": e.display_name()}))
        .collect()
}

fn run(args: Args) -> Result<Value> {
    let client = Client::from_sources(None, args.config.as_deref()).context("Failed to connect")?;

    match args.command {
        Command::Cubes => {
            let cubes = client.braincube_list(None)?;
            Ok(cubes.iter().map(|c| json!(c.display_name())).collect())
        }
        Command::MemoryBases { cube, page, page_size } => {
            let cube = client.braincube(&cube)?;
            let pagination = Pagination { page, page_size };
            let memory_bases = cube.memory_base_list(pagination).context("Failed to list memory bases")?;
            Ok(summary(&memory_bases))
        }
        Command::Variables { cube, memory_base } => {
            let memory_base = client.braincube(&cube)?.memory_base(parse_id(&memory_base))?;
            let variables = memory_base
                .variable_list(Pagination::all())
                .context("Failed to list variables")?;
            Ok(summary(&variables))
        }
        Command::Data { cube, memory_base, variables, filters, parse_date, names } => {
            client.params().set_parse_date(parse_date);
            let filters = filters.iter().map(|f| parse_filter(f)).collect::<Result<Vec<_>>>()?;
            let ids = variables.iter().map(|v| parse_id(v)).collect::<Vec<_>>();
            let label = if names { DataLabel::Name } else { DataLabel::Id };

            let memory_base = client.braincube(&cube)?.memory_base(parse_id(&memory_base))?;
            let dataset = memory_base
                .get_data(&ids, filters, label)
                .context("Failed to fetch data")?;
            info!(columns = dataset.len(), "Data fetched");
            Ok(serde_json::to_value(&dataset)?)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bcc_connector=info,bcc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let output = run(args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
