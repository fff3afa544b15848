//! colquery CLI
//!
//! Resolves addresses against an in-memory store seeded from a JSON file.
//!
//! Seed file format:
//! ```text
//! [{"table":"orders","row":"1001","family":"cf","qualifier":"qty","value":"5"}]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use clap::Parser;
use serde::Deserialize;

use colquery::config::{ConfigEntry, ENDPOINT_KEY};
use colquery::logging::init_logging_to;
use colquery::store::{MemoryStore, PutRequest};
use colquery::Connector;

/// colquery CLI
#[derive(Parser, Debug)]
#[command(name = "colquery-cli")]
#[command(about = "Resolve table@row@family:qualifier addresses to JSON")]
#[command(version)]
struct Args {
    /// Store endpoint
    #[arg(short, long, default_value = "localhost:2181")]
    endpoint: String,

    /// Extra configuration entry (repeatable)
    #[arg(short, long = "config", value_name = "KEY=VALUE", value_parser = parse_entry)]
    config: Vec<ConfigEntry>,

    /// JSON file of cells to load before querying
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Append logs to this file (defaults to $COLQUERY_LOG_FILE)
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Addresses to resolve
    #[arg(required = true)]
    commands: Vec<String>,
}

/// One seeded cell
#[derive(Debug, Deserialize)]
struct SeedCell {
    table: String,
    row: String,
    family: String,
    qualifier: String,
    value: String,
}

fn parse_entry(raw: &str) -> Result<ConfigEntry, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", raw))?;
    Ok(ConfigEntry::new(key.trim(), value.trim()))
}

fn load_seed(path: &Path) -> colquery::Result<Vec<SeedCell>> {
    let text = std::fs::read_to_string(path)?;
    let cells = serde_json::from_str(&text)?;
    Ok(cells)
}

/// Write seed cells through the client, one put per row
fn seed(connector: &Connector, store: &MemoryStore, cells: Vec<SeedCell>) -> colquery::Result<()> {
    let mut rows: BTreeMap<(String, String), Vec<(Bytes, Bytes, Bytes)>> = BTreeMap::new();
    for cell in cells {
        store.create_table(&cell.table);
        rows.entry((cell.table, cell.row)).or_default().push((
            Bytes::from(cell.family),
            Bytes::from(cell.qualifier),
            Bytes::from(cell.value),
        ));
    }

    connector.with_client(|client, bridge| {
        for ((table, row), cells) in rows {
            let request = PutRequest {
                table,
                row: Bytes::from(row),
                cells,
                timestamp: None,
            };
            bridge.put(client, request)?;
        }
        Ok(())
    })
}

fn main() {
    let args = Args::parse();

    let log_file = args.log_file.clone().or_else(colquery::logging::log_file_from_env);
    if let Err(e) = init_logging_to(log_file) {
        eprintln!("Failed to set up logging: {}", e);
        std::process::exit(1);
    }

    tracing::info!("colquery CLI v{}", colquery::VERSION);

    let mut entries = vec![ConfigEntry::new(ENDPOINT_KEY, args.endpoint.as_str())];
    entries.extend(args.config);

    let store = MemoryStore::new();
    let connector = match Connector::init(&entries, Arc::new(store.clone())) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to initialize connector: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.seed {
        let seeded = load_seed(path).and_then(|cells| seed(&connector, &store, cells));
        if let Err(e) = seeded {
            tracing::error!("Failed to load seed file {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    let mut failed = false;
    for command in &args.commands {
        match connector.execute(command) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}: {}", command, e);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
