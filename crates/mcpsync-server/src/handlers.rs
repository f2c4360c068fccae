//! HTTP handlers for the trigger service.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use mcpsync_core::{
    ChainFetcher, Reconciler, RegistryFetcher, SourceFetcher, SourceId, SyncOptions, SyncOutcome,
};

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Optional trigger body; GET triggers carry none.
#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Bypass the stored watermark and resync everything.
    #[serde(default)]
    pub force: bool,
}

/// Successful trigger response.
#[derive(Serialize)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

/// Verify the shared-secret bearer gate. Runs before any sync work:
/// an unconfigured secret is a deployment fault (500), a missing or wrong
/// token is an unauthorized caller (401).
fn authorize(headers: &HeaderMap, state: &AppState) -> Result<(), Response> {
    let Some(secret) = state.config.trigger_secret.as_deref() else {
        error!("MCPSYNC_TRIGGER_SECRET is not set");
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
            None,
        ));
    };

    let presented = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    if presented != Some(format!("Bearer {}", secret).as_str()) {
        warn!("unauthorized trigger request");
        return Err(error_response(StatusCode::UNAUTHORIZED, "Unauthorized", None));
    }

    Ok(())
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": error, "details": details }),
        None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
}

/// Trigger a sync of the official registry source.
pub async fn sync_registry(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<SyncRequest>>,
) -> Response {
    run_sync(state, headers, body, SourceId::Registry).await
}

/// Trigger a sync of the chain source.
pub async fn sync_chain(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<SyncRequest>>,
) -> Response {
    run_sync(state, headers, body, SourceId::Chain).await
}

async fn run_sync(
    state: AppState,
    headers: HeaderMap,
    body: Option<Json<SyncRequest>>,
    source: SourceId,
) -> Response {
    if let Err(response) = authorize(&headers, &state) {
        return response;
    }

    // Same-source runs are serialized; a held guard means one is in flight.
    let Ok(_guard) = state.sync_locks.for_source(source).try_lock() else {
        warn!(%source, "rejecting trigger, sync already in flight");
        return error_response(
            StatusCode::CONFLICT,
            "Sync already in flight",
            Some(format!("a {} sync is currently running", source)),
        );
    };

    let request = body.map(|Json(request)| request).unwrap_or_default();
    let force_full = request.force || state.config.force_full_sync;

    info!(%source, force_full, "starting triggered sync");

    let fetcher: Box<dyn SourceFetcher> = match source {
        SourceId::Registry => Box::new(RegistryFetcher::new(state.config.registry_fetcher_config())),
        SourceId::Chain => Box::new(ChainFetcher::new(
            state.config.delegate_url.clone(),
            // Authorization succeeded, so the secret exists.
            state.config.trigger_secret.clone().unwrap_or_default(),
        )),
    };

    let reconciler = Reconciler::new(fetcher, state.repository.clone());

    match reconciler.run(SyncOptions { force_full }).await {
        Ok(outcome) => Json(SyncResponse {
            success: true,
            outcome,
        })
        .into_response(),
        Err(e) => {
            error!(%source, kind = e.kind(), "triggered sync failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("{} sync failed", source),
                Some(e.to_string()),
            )
        }
    }
}

/// The most recently updated row, for status reporting.
#[derive(Serialize)]
pub struct LastSynced {
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// Status response body.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub total_servers: u64,
    pub registry_servers: u64,
    pub chain_servers: u64,
    pub last_synced: Option<LastSynced>,
    pub system_time: DateTime<Utc>,
}

/// Report stored totals per source and the most recent sync activity.
pub async fn sync_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&headers, &state) {
        return response;
    }

    let counts = async {
        let total = state.repository.count().await?;
        let registry = state
            .repository
            .count_for_namespace(SourceId::Registry.meta_namespace())
            .await?;
        let chain = state
            .repository
            .count_for_namespace(SourceId::Chain.meta_namespace())
            .await?;
        let latest = state.repository.latest_record().await?;
        anyhow::Ok((total, registry, chain, latest))
    };

    match counts.await {
        Ok((total_servers, registry_servers, chain_servers, latest)) => Json(StatusResponse {
            status: "healthy".to_string(),
            total_servers,
            registry_servers,
            chain_servers,
            last_synced: latest.map(|record| LastSynced {
                name: record.name,
                updated_at: record.updated_at,
            }),
            system_time: Utc::now(),
        })
        .into_response(),
        Err(e) => {
            error!("status query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
