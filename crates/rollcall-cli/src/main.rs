//! rollcall - command line client for the student records service.
//!
//! Logs in, keeps the session token in the configured store, shows the
//! session status, and runs the record queries with the token attached.

mod commands;
mod output;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rollcall_core::config::Config;
use rollcall_core::models::RecordKind;
use rollcall_core::ApiClient;

// ============================================================================
// Command line
// ============================================================================

#[derive(Parser)]
#[command(name = "rollcall", version, about = "Student records from the command line")]
struct Cli {
    /// Server base URL, e.g. http://localhost:3000
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Token store backend: file, keyring or memory
    #[arg(long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store a session token
    Login {
        /// User id (prompted for when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show the stored token's status
    Status,
    /// Re-check the session status periodically
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
    /// Search students
    Students(StudentArgs),
    /// Query any record collection with raw key=value filters
    Query {
        /// student, score, course or department
        #[arg(value_parser = parse_kind)]
        kind: RecordKind,

        /// Filter as key=value, repeatable
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

#[derive(Args, Default)]
struct StudentArgs {
    #[arg(long, default_value = "")]
    keyword: String,
    #[arg(long, default_value = "")]
    department: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    age: String,
    /// Rows per page
    #[arg(long, default_value = "")]
    size: String,
    /// Page number, starting at 1
    #[arg(long, default_value = "")]
    index: String,
}

fn parse_kind(s: &str) -> Result<RecordKind, String> {
    s.parse()
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

// ============================================================================
// Logging
// ============================================================================

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "rollcall";

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = log_dir.and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .build(dir)
            .ok()
    });
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_env()?;
    if let Some(url) = cli.base_url {
        config.base_url = Some(url);
    }
    if let Some(ref store) = cli.store {
        config.store = store.parse()?;
    }

    let log_dir = config.cache_dir().ok();
    let guard = init_tracing(log_dir.as_deref());
    info!(store = %config.store, "rollcall starting");
    if config.base_url.is_none() {
        warn!("No base URL configured; set ROLLCALL_BASE_URL or pass --base-url");
    }

    let store = config.open_store()?;
    let client = ApiClient::new(&config, store)?;

    let result = commands::run(cli.command, &mut config, &client).await;

    // Flush the file log before a possible early exit
    drop(guard);

    if let Err(e) = result {
        output::report_error(&e);
        std::process::exit(1);
    }
    Ok(())
}
