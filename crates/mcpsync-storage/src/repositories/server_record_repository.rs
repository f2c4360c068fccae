//! SQLite implementation of ServerRecordRepository.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (millisecond
//! precision, `Z` suffix) so `MAX(updated_at)` and lexicographic comparison
//! order chronologically. The `meta` column is merged, not replaced, on
//! conflict: each source owns its namespace key and an upsert from one
//! source must not erase another source's blob.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use mcpsync_core::{RepoResult, ServerRecord, ServerRecordRepository, ServerStatus};
use rusqlite::{params, OptionalExtension};
use tokio::sync::Mutex;

use crate::Database;

/// SQLite-backed implementation of ServerRecordRepository.
pub struct SqliteServerRecordRepository {
    db: Arc<Mutex<Database>>,
}

impl SqliteServerRecordRepository {
    /// Create a new SQLite server record repository.
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Serialize a datetime into the canonical column format.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Parse a datetime string to DateTime<Utc>.
    fn parse_datetime(s: &str) -> DateTime<Utc> {
        // Try RFC3339 first
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return dt.with_timezone(&Utc);
        }
        // Try SQLite datetime format
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return dt.and_utc();
        }
        Utc::now()
    }

    /// Parse a JSON column into a value, or `None` for NULL/invalid.
    fn parse_json<T: serde::de::DeserializeOwned>(s: Option<String>) -> Option<T> {
        s.and_then(|json| serde_json::from_str(&json).ok())
    }

    /// `json_extract` path for a meta namespace key. The key contains dots
    /// and a slash, so it must be quoted inside the path expression.
    fn meta_path(namespace: &str) -> String {
        format!("$.\"{}\"", namespace)
    }

    /// Standard column list for SELECT queries
    const SELECT_COLUMNS: &'static str =
        "id, name, description, status, latest_version, website_url, repository,
         packages, remotes, meta, published_at, updated_at";

    /// Map a row to ServerRecord
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ServerRecord> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let description: Option<String> = row.get(2)?;
        let status: String = row.get(3)?;
        let latest_version: Option<String> = row.get(4)?;
        let website_url: Option<String> = row.get(5)?;
        let repository: Option<String> = row.get(6)?;
        let packages: Option<String> = row.get(7)?;
        let remotes: Option<String> = row.get(8)?;
        let meta: Option<String> = row.get(9)?;
        let published_at: String = row.get(10)?;
        let updated_at: String = row.get(11)?;

        Ok(ServerRecord {
            id,
            name,
            description,
            status: status.parse::<ServerStatus>().unwrap_or_default(),
            latest_version,
            website_url,
            repository: Self::parse_json(repository),
            packages: Self::parse_json(packages),
            remotes: Self::parse_json(remotes).unwrap_or_default(),
            meta: Self::parse_json(meta).unwrap_or_default(),
            published_at: Self::parse_datetime(&published_at),
            updated_at: Self::parse_datetime(&updated_at),
        })
    }
}

#[async_trait]
impl ServerRecordRepository for SqliteServerRecordRepository {
    async fn latest_updated_at(&self, namespace: &str) -> RepoResult<Option<DateTime<Utc>>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let max: Option<String> = conn
            .query_row(
                "SELECT MAX(updated_at) FROM server_records
                 WHERE json_extract(meta, ?1) IS NOT NULL",
                params![Self::meta_path(namespace)],
                |row| row.get(0),
            )
            .context("Failed to query watermark")?;

        Ok(max.as_deref().map(Self::parse_datetime))
    }

    async fn upsert_batch(&self, records: &[ServerRecord]) -> RepoResult<usize> {
        let db = self.db.lock().await;

        db.transaction(|conn| {
            let mut written = 0usize;

            for record in records {
                // Merge the incoming namespaces over whatever meta the row
                // already carries; other sources' blobs survive.
                let existing_meta: Option<String> = conn
                    .query_row(
                        "SELECT meta FROM server_records WHERE id = ?1",
                        params![record.id],
                        |row| row.get(0),
                    )
                    .optional()?;

                let mut merged: BTreeMap<String, serde_json::Value> =
                    Self::parse_json(existing_meta).unwrap_or_default();
                for (namespace, blob) in &record.meta {
                    merged.insert(namespace.clone(), blob.clone());
                }

                conn.execute(
                    "INSERT INTO server_records (
                        id, name, description, status, latest_version, website_url,
                        repository, packages, remotes, meta, published_at, updated_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        description = excluded.description,
                        status = excluded.status,
                        latest_version = excluded.latest_version,
                        website_url = excluded.website_url,
                        repository = excluded.repository,
                        packages = excluded.packages,
                        remotes = excluded.remotes,
                        meta = excluded.meta,
                        published_at = excluded.published_at,
                        updated_at = excluded.updated_at",
                    params![
                        record.id,
                        record.name,
                        record.description,
                        record.status.as_str(),
                        record.latest_version,
                        record.website_url,
                        record
                            .repository
                            .as_ref()
                            .map(serde_json::to_string)
                            .transpose()?,
                        record
                            .packages
                            .as_ref()
                            .map(serde_json::to_string)
                            .transpose()?,
                        serde_json::to_string(&record.remotes)?,
                        serde_json::to_string(&merged)?,
                        Self::format_datetime(&record.published_at),
                        Self::format_datetime(&record.updated_at),
                    ],
                )?;

                written += 1;
            }

            Ok(written)
        })
    }

    async fn get(&self, id: &str) -> RepoResult<Option<ServerRecord>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM server_records WHERE id = ?1",
                    Self::SELECT_COLUMNS
                ),
                params![id],
                Self::map_row,
            )
            .optional()?;

        Ok(record)
    }

    async fn count(&self) -> RepoResult<u64> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM server_records", [], |row| row.get(0))?;

        Ok(count as u64)
    }

    async fn count_for_namespace(&self, namespace: &str) -> RepoResult<u64> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM server_records WHERE json_extract(meta, ?1) IS NOT NULL",
            params![Self::meta_path(namespace)],
            |row| row.get(0),
        )?;

        Ok(count as u64)
    }

    async fn latest_record(&self) -> RepoResult<Option<ServerRecord>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM server_records ORDER BY updated_at DESC LIMIT 1",
                    Self::SELECT_COLUMNS
                ),
                [],
                Self::map_row,
            )
            .optional()?;

        Ok(record)
    }
}
