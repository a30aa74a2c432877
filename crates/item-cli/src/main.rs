//! Item Ledger CLI
//!
//! The `itemctl` command submits operations to the item ledger.
//!
//! ## Commands
//!
//! - `init`: Run the lifecycle hook
//! - `invoke`: Run one operation (`create`, `updatePrice`, `softDelete`,
//!   `query`, `history`, or their legacy names)
//! - `batch`: Run a file of operations against one store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use item_core::{Dispatcher, LedgerStore, MemoryLedgerStore, Response, SurrealLedgerStore};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "itemctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Record lifecycle and audit history over an ordered key-value ledger", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Ledger backend
    #[arg(long, value_enum, default_value_t = Backend::Surreal, env = "ITEMCTL_BACKEND", global = true)]
    backend: Backend,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Process-local, discarded on exit
    Memory,
    /// SurrealDB, configured from LEDGER_DB_* variables
    Surreal,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the lifecycle hook
    Init,

    /// Run one operation
    Invoke {
        /// Operation name (e.g. create, updatePrice, softDelete, query, history)
        function: String,

        /// Operation arguments, in order
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run operations from a file, one JSON array `[function, args...]` per line
    Batch {
        /// Path to the batch file
        path: PathBuf,
    },
}

/// JSON view of a response, with the payload embedded when it is JSON.
#[derive(Debug, Serialize)]
struct Envelope {
    status: i32,
    message: String,
    payload: Value,
}

impl From<&Response> for Envelope {
    fn from(response: &Response) -> Self {
        let payload = if response.payload.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&response.payload)
                .unwrap_or_else(|_| Value::String(response.payload_str().into_owned()))
        };
        Envelope {
            status: response.status,
            message: response.message.clone(),
            payload,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    item_core::init_tracing(cli.json, level);

    let store = open_store(cli.backend).await?;
    let dispatcher = Dispatcher::new(store);

    match cli.command {
        Commands::Init => cmd_init(&dispatcher),
        Commands::Invoke { function, args } => cmd_invoke(&dispatcher, &function, &args).await,
        Commands::Batch { path } => cmd_batch(&dispatcher, &path).await,
    }
}

async fn open_store(backend: Backend) -> Result<Arc<dyn LedgerStore>> {
    Ok(match backend {
        Backend::Memory => {
            info!("Using in-memory ledger");
            Arc::new(MemoryLedgerStore::new())
        }
        Backend::Surreal => Arc::new(
            SurrealLedgerStore::from_env()
                .await
                .context("Failed to connect to the ledger database")?,
        ),
    })
}

fn cmd_init<S: LedgerStore>(dispatcher: &Dispatcher<S>) -> Result<()> {
    let response = dispatcher.init();
    if !response.is_success() {
        bail!("{}", response.message);
    }
    println!("Initialized");
    Ok(())
}

async fn cmd_invoke<S: LedgerStore>(
    dispatcher: &Dispatcher<S>,
    function: &str,
    args: &[String],
) -> Result<()> {
    let response = dispatcher.invoke(function, args).await;
    if !response.is_success() {
        bail!("{}", response.message);
    }
    println!("{}", response.payload_str());
    Ok(())
}

async fn cmd_batch<S: LedgerStore>(dispatcher: &Dispatcher<S>, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {:?}", path))?;

    let envelopes = run_batch(dispatcher, &content).await?;
    let failures = envelopes.iter().filter(|e| e.status != 200).count();
    for envelope in &envelopes {
        println!("{}", serde_json::to_string(envelope)?);
    }
    info!(total = envelopes.len(), failures, "batch finished");
    Ok(())
}

/// Parse one batch line: a JSON array of strings, function name first.
fn parse_batch_line(line: &str) -> Result<(String, Vec<String>)> {
    let mut parts: Vec<String> =
        serde_json::from_str(line).context("Batch line must be a JSON array of strings")?;
    if parts.is_empty() {
        bail!("Batch line must name a function");
    }
    let function = parts.remove(0);
    Ok((function, parts))
}

/// Run every non-blank line in order. A malformed line stops the batch;
/// failed operations do not.
async fn run_batch<S: LedgerStore>(
    dispatcher: &Dispatcher<S>,
    content: &str,
) -> Result<Vec<Envelope>> {
    let mut envelopes = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (function, args) =
            parse_batch_line(line).with_context(|| format!("line {}", number + 1))?;
        let response = dispatcher.invoke(&function, &args).await;
        envelopes.push(Envelope::from(&response));
    }
    Ok(envelopes)
}
