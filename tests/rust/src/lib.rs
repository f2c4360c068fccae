//! Shared test utilities and fixtures for McpSync integration tests.

pub mod mocks;
pub use mocks::{FailingFetcher, RecordingRepository, StaticFetcher};

/// Test fixture utilities
pub mod fixtures {
    use chrono::Utc;
    use mcpsync_core::{RawServerRecord, RegistryServer, ServerRecord};

    /// A registry wire object with a single remote, as JSON.
    pub fn registry_server_json(name: &str, url: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "description": format!("Test server {}", name),
            "status": "active",
            "version": "1.0.0",
            "remotes": [{"url": url}],
            "_meta": {
                "io.modelcontextprotocol.registry/official": {
                    "published_at": "2025-12-01T00:00:00Z",
                    "updated_at": "2026-01-20T00:00:00Z",
                }
            }
        })
    }

    /// A registry wire object carrying version metadata, as JSON.
    pub fn versioned_registry_server_json(
        name: &str,
        version: &str,
        is_latest: bool,
        updated_at: &str,
    ) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "version": version,
            "remotes": [{"url": format!("https://{}.example.com/mcp", version)}],
            "_meta": {
                "io.modelcontextprotocol.registry/official": {
                    "is_latest": is_latest,
                    "updated_at": updated_at,
                }
            }
        })
    }

    /// A package-only registry wire object (no remotes), as JSON.
    pub fn package_only_server_json(name: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "packages": [{"registry": "npm", "name": name}],
        })
    }

    /// A chain wire object with a single server URL, as JSON.
    pub fn chain_server_json(namespace: &str, url: &str) -> serde_json::Value {
        serde_json::json!({
            "namespace": namespace,
            "name": "Test Chain Server",
            "category": "Testing",
            "details": {
                "latestVersion": {
                    "versionString": "0.9.0",
                    "status": "Verified",
                    "serverUrl": url,
                }
            }
        })
    }

    /// A raw registry record for driving the reconciler directly.
    pub fn raw_registry_record(name: &str, url: &str) -> RawServerRecord {
        RawServerRecord::Registry(
            serde_json::from_value::<RegistryServer>(registry_server_json(name, url)).unwrap(),
        )
    }

    /// A raw package-only registry record (rejected by the transformer).
    pub fn raw_package_only_record(name: &str) -> RawServerRecord {
        RawServerRecord::Registry(
            serde_json::from_value::<RegistryServer>(package_only_server_json(name)).unwrap(),
        )
    }

    /// A raw chain record for driving the reconciler directly.
    pub fn raw_chain_record(namespace: &str, url: &str) -> RawServerRecord {
        RawServerRecord::Chain(
            serde_json::from_value(chain_server_json(namespace, url)).unwrap(),
        )
    }

    /// A canonical record ready for direct upserts.
    pub fn canonical_record(id: &str, name: &str, namespace: &str) -> ServerRecord {
        let now = Utc::now();
        ServerRecord {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(format!("Test record {}", name)),
            status: Default::default(),
            latest_version: Some("1.0.0".to_string()),
            website_url: None,
            repository: None,
            packages: None,
            remotes: vec![mcpsync_core::Remote {
                url: format!("https://{}.example.com/mcp", name.replace('/', "-")),
                remote_type: mcpsync_core::RemoteType::StreamableHttp,
            }],
            meta: [(
                namespace.to_string(),
                serde_json::json!({"display_name": name}),
            )]
            .into(),
            published_at: now,
            updated_at: now,
        }
    }
}

/// Database test helpers
pub mod db {
    use mcpsync_storage::Database;
    use tempfile::TempDir;

    /// Database file name
    const DB_FILE: &str = "mcpsync.db";

    /// Open an in-memory database for fast repository tests.
    pub fn in_memory() -> Database {
        Database::open_in_memory().expect("Failed to open in-memory database")
    }

    /// Open a file-backed database in a fresh temp directory. The returned
    /// guard must outlive every handle to the database.
    pub fn file_backed() -> (Database, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open(&temp_dir.path().join(DB_FILE))
            .expect("Failed to open test database");
        (db, temp_dir)
    }
}
