use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::StatsSnapshot;
use crate::AppState;

// ─── GET /api/stats ──────────────────────────────────────────────
/// Collector and request self-metrics as one JSON snapshot.

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.metrics.snapshot())
}

// ─── GET /api/health ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Health {
    pub store: &'static str,
    pub reachable: bool,
    pub rows: Option<i64>,
    pub error: Option<String>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Health>) {
    let store = state.query.store();
    let timeout = state.query.display().load_timeout;

    let counted = match tokio::time::timeout(timeout, store.count()).await {
        Ok(r) => r.map_err(|e| e.to_string()),
        Err(_) => Err(format!("store round-trip timed out after {timeout:?}")),
    };

    let (status, rows, error) = match counted {
        Ok(n) => (StatusCode::OK, Some(n), None),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, None, Some(e)),
    };

    (
        status,
        Json(Health {
            store: store.backend(),
            reachable: rows.is_some(),
            rows,
            error,
        }),
    )
}
