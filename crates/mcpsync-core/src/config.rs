//! Service configuration.
//!
//! All recognized environment options are materialized here once, at
//! startup, and flow down the call chain as plain values. Nothing below
//! this boundary reads the process environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::sources::registry::DEFAULT_CURSOR_FIELD;
use crate::sources::RegistryFetcherConfig;

/// Public base URL of the official MCP registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.modelcontextprotocol.io";

/// Default delegate location for local development.
pub const DEFAULT_DELEGATE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Shared secret gating the trigger endpoints and authenticating
    /// against the delegate. Absence is reported per-request, not at load.
    pub trigger_secret: Option<String>,
    /// Store location; `None` falls back to the platform data directory.
    pub database_path: Option<PathBuf>,
    pub registry_url: String,
    pub registry_cursor_field: String,
    pub registry_version_filter: Option<String>,
    pub delegate_url: String,
    /// Standing override: every run behaves as if the trigger requested a
    /// full resync.
    pub force_full_sync: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            trigger_secret: None,
            database_path: None,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            registry_cursor_field: DEFAULT_CURSOR_FIELD.to_string(),
            registry_version_filter: None,
            delegate_url: DEFAULT_DELEGATE_URL.to_string(),
            force_full_sync: false,
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl ServiceConfig {
    /// Build the configuration from the environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            trigger_secret: non_empty(env::var("MCPSYNC_TRIGGER_SECRET").ok()),
            database_path: non_empty(env::var("MCPSYNC_DATABASE_PATH").ok()).map(PathBuf::from),
            registry_url: non_empty(env::var("MCPSYNC_REGISTRY_URL").ok())
                .unwrap_or(defaults.registry_url),
            registry_cursor_field: non_empty(env::var("MCPSYNC_REGISTRY_CURSOR_FIELD").ok())
                .unwrap_or(defaults.registry_cursor_field),
            registry_version_filter: non_empty(env::var("MCPSYNC_REGISTRY_VERSION_FILTER").ok()),
            delegate_url: non_empty(env::var("MCPSYNC_DELEGATE_URL").ok())
                .unwrap_or(defaults.delegate_url),
            force_full_sync: env::var("MCPSYNC_FORCE_FULL_SYNC")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            host: non_empty(env::var("MCPSYNC_HOST").ok()).unwrap_or(defaults.host),
            port: env::var("MCPSYNC_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// The socket address to bind the trigger service to.
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid bind address")
    }

    /// Fetcher configuration for the official registry source.
    pub fn registry_fetcher_config(&self) -> RegistryFetcherConfig {
        RegistryFetcherConfig {
            base_url: self.registry_url.clone(),
            cursor_field: self.registry_cursor_field.clone(),
            version_filter: self.registry_version_filter.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
