//! dashdata - dashboard queries over a table fixture.
//!
//! Loads tables from a JSON file (an object mapping table names to arrays of
//! rows), runs one dashboard operation and prints the result as JSON.
//!
//! Usage:
//!   dashdata -d data.json list leads
//!   dashdata -d data.json page leads --page 2 --size 25
//!   dashdata -d data.json chart leads status
//!   dashdata -d data.json stats leads --value-column value
//!   dashdata -d data.json ranked leads value --limit 5

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use dashdata::{DashboardService, Error, MemoryClient, RankOptions, ServiceConfig};

/// Dashboard queries over a table fixture.
#[derive(Parser)]
#[command(name = "dashdata", about = "Dashboard data queries")]
struct Args {
    /// JSON file with the tables to query.
    #[arg(short, long, value_name = "PATH")]
    data: PathBuf,

    /// JSON file overriding column conventions and defaults.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Exit with an error when a query fails instead of printing an empty result.
    #[arg(long)]
    strict: bool,

    /// Increase logging verbosity (-v for info, -vv for debug). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// All rows, newest first.
    List { table: String },
    /// One page of rows with the total count.
    Page {
        table: String,
        /// Zero-based page index.
        #[arg(long, default_value_t = 0)]
        page: usize,
        /// Rows per page (default from config).
        #[arg(long)]
        size: Option<usize>,
    },
    /// Row counts per value of a column.
    Chart { table: String, column: String },
    /// Totals, recent activity, value sum/average and status breakdown.
    Stats {
        table: String,
        #[arg(long)]
        value_column: Option<String>,
    },
    /// Top rows by a numeric column.
    Ranked {
        table: String,
        value_column: String,
        #[arg(long, default_value = "name")]
        name_column: String,
        /// Number of rows (default from config).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Names of the loaded tables.
    Tables,
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays JSON.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("dashdata={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value, Error> {
    Ok(serde_json::to_value(value)?)
}

async fn run(
    service: &DashboardService<MemoryClient>,
    command: Command,
    strict: bool,
) -> Result<serde_json::Value, Error> {
    match command {
        Command::List { table } => {
            if strict {
                to_json(service.try_list(&table).await?)
            } else {
                to_json(service.list(&table).await)
            }
        }
        Command::Page { table, page, size } => {
            let size = size.unwrap_or(service.config().default_page_size);
            if strict {
                to_json(service.try_page(&table, page, size).await?)
            } else {
                to_json(service.page(&table, page, size).await)
            }
        }
        Command::Chart { table, column } => {
            if strict {
                to_json(service.try_grouped_counts(&table, &column).await?)
            } else {
                to_json(service.grouped_counts(&table, &column).await)
            }
        }
        Command::Stats { table, value_column } => {
            let value_column = value_column.as_deref();
            if strict {
                to_json(service.try_statistics(&table, value_column).await?)
            } else {
                to_json(service.statistics(&table, value_column).await)
            }
        }
        Command::Ranked {
            table,
            value_column,
            name_column,
            limit,
        } => {
            let options = RankOptions {
                name_column,
                limit: limit.unwrap_or(service.config().default_rank_limit),
            };
            if strict {
                to_json(service.try_ranked(&table, &value_column, &options).await?)
            } else {
                to_json(service.ranked(&table, &value_column, &options).await)
            }
        }
        Command::Tables => to_json(service.client().table_names().await),
    }
}

async fn try_main(args: Args) -> Result<serde_json::Value, Error> {
    let config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };

    let client = MemoryClient::load_json_file(&args.data)?;
    info!(path = %args.data.display(), "loaded tables");

    let service = DashboardService::with_config(client, config);
    run(&service, args.command, args.strict).await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match try_main(args).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
