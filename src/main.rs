//! rowquery - filter and edit rows of a JSON data file with a condition string

use anyhow::{bail, Context, Result};
use chrono::FixedOffset;
use clap::{Parser as ClapParser, Subcommand};
use log::info;
use rowquery::row::Row;
use rowquery::store::JsonFileStore;
use rowquery::QuerySet;
use std::path::PathBuf;
use std::sync::Arc;

/// rowquery - select rows with conditions like `age>=18 and name like %ann%`
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON data file holding the tables
    #[arg(short = 'D', long)]
    data: PathBuf,

    /// Table to query
    #[arg(short, long)]
    table: String,

    /// Query a view of the table instead of every row
    #[arg(long)]
    view: Option<String>,

    /// Offset for ctime/mtime cells, e.g. +09:00 (local time by default)
    #[arg(long, value_parser = parse_utc_offset)]
    utc_offset: Option<FixedOffset>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Condition to filter with; an empty string selects every row
    condition: String,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print every matching row (default)
    List,
    /// Print the number of matching rows
    Count,
    /// Print whether any row matches
    Exists,
    /// Print the first matching row
    First,
    /// Print the last matching row
    Last,
    /// Merge a JSON object into every matching row
    Update { patch: String },
    /// Delete every matching row
    Delete,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let store = JsonFileStore::open(&args.data)
        .with_context(|| format!("Failed to open data file {}", args.data.display()))?;

    let mut qs = QuerySet::new(Arc::new(store), args.table.as_str());
    if let Some(view) = &args.view {
        qs = qs.with_view(view.as_str());
    }
    if let Some(offset) = args.utc_offset {
        qs = qs.with_utc_offset(offset);
    }

    let mut result = qs
        .filter(&args.condition)
        .with_context(|| format!("Failed to filter table {}", args.table))?;
    info!(
        "{} rows of {} match `{}`",
        result.count(),
        result.table(),
        result.conditions()
    );

    match args.action.unwrap_or(Action::List) {
        Action::List => {
            for row in result.rows().unwrap_or_default() {
                print_row(row)?;
            }
        }
        Action::Count => println!("{}", result.count()),
        Action::Exists => println!("{}", result.exists()),
        Action::First => {
            if let Some(row) = result.first() {
                print_row(row)?;
            }
        }
        Action::Last => {
            if let Some(row) = result.last() {
                print_row(row)?;
            }
        }
        Action::Update { patch } => {
            let patch = parse_patch(&patch)?;
            let updated = result.update(&patch).context("Failed to update rows")?;
            for row in updated {
                print_row(row)?;
            }
        }
        Action::Delete => {
            let deleted = result.delete().context("Failed to delete rows")?;
            println!("{}", deleted);
        }
    }

    Ok(())
}

fn print_row(row: &Row) -> Result<()> {
    println!("{}", serde_json::to_string(row)?);
    Ok(())
}

fn parse_patch(patch: &str) -> Result<Row> {
    let value: serde_json::Value = serde_json::from_str(patch).context("Patch is not valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => bail!("Patch must be a JSON object, got {}", other),
    }
}

/// Parse an offset such as `+09:00`, also accepting `Z` for UTC
fn parse_utc_offset(s: &str) -> Result<FixedOffset, String> {
    if s.eq_ignore_ascii_case("z") {
        return "+00:00".parse::<FixedOffset>().map_err(|e| e.to_string());
    }
    s.parse::<FixedOffset>()
        .map_err(|e| format!("invalid UTC offset {}: {}", s, e))
}
