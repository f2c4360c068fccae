//! McpSync Storage Layer
//!
//! SQLite persistence for canonical server records.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    Reconciler                        │
//! ├──────────────────────────────────────────────────────┤
//! │               Repository Trait                       │
//! │            (ServerRecordRepository)                  │
//! ├──────────────────────────────────────────────────────┤
//! │            SQLite Implementation                     │
//! │        (SqliteServerRecordRepository)                │
//! ├──────────────────────────────────────────────────────┤
//! │                   Database                           │
//! │              (SQLite, WAL mode)                      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mcpsync_storage::{Database, SqliteServerRecordRepository};
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! let db = Database::open(&path)?;
//! let db = Arc::new(Mutex::new(db));
//! let repo = SqliteServerRecordRepository::new(db);
//! ```

mod database;
mod repositories;

pub use database::Database;
pub use repositories::SqliteServerRecordRepository;

/// Default database file name.
pub const DATABASE_FILE: &str = "mcpsync.db";

/// Get the default database path for the current platform.
pub fn default_database_path() -> Option<std::path::PathBuf> {
    dirs::data_local_dir().map(|p| p.join("mcpsync").join(DATABASE_FILE))
}
