//! McpSync service entrypoint.
//!
//! Wires configuration, logging, storage, and the trigger HTTP service.
//! Scheduling lives outside: a cron (or equivalent) hits the trigger
//! endpoints with the shared secret.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use mcpsync_core::ServiceConfig;
use mcpsync_server::SyncServer;
use mcpsync_storage::{Database, SqliteServerRecordRepository};

/// Get the app data directory path.
fn get_app_data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("mcpsync")
}

/// Get the logs directory path (under app data directory)
fn get_logs_dir() -> std::path::PathBuf {
    get_app_data_dir().join("logs")
}

/// Initialize tracing with console and file logging
///
/// - Console: colored, compact format
/// - File: daily rotation in the platform data directory
fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    let logs_dir = get_logs_dir();

    if let Err(e) = std::fs::create_dir_all(&logs_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
    }

    // File appender with daily rotation, e.g. mcpsync.2026-08-07.log
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("mcpsync")
        .filename_suffix("log")
        .build(&logs_dir)
        .expect("Failed to create log file appender");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG takes precedence, with sensible defaults for our crates
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info")
            .add_directive("mcpsync_core=debug".parse().unwrap())
            .add_directive("mcpsync_server=debug".parse().unwrap())
            .add_directive("mcpsync_storage=debug".parse().unwrap())
            .add_directive("tower_http=info".parse().unwrap())
    });

    // Console layer: colored, compact
    let console_layer = fmt::layer()
        .with_ansi(true)
        .compact()
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    // File layer: no colors, include more detail
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    // Guard must be kept alive for the duration of the program
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_tracing();

    let config = ServiceConfig::from_env();

    let database_path = config
        .database_path
        .clone()
        .or_else(mcpsync_storage::default_database_path)
        .context("Could not determine a database path")?;

    tracing::info!("Using database at {:?}", database_path);

    let db = Database::open(&database_path)?;
    let db = Arc::new(Mutex::new(db));
    let repository = Arc::new(SqliteServerRecordRepository::new(db));

    SyncServer::new(config, repository).serve().await
}
