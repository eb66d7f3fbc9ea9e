//! Health, metrics, and usage routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use std::collections::BTreeMap;

use arbor_llm::ModelUsage;

use crate::state::AppState;

/// `GET /health`.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /metrics` — Prometheus text format.
pub async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .as_ref()
        .map(metrics_exporter_prometheus::PrometheusHandle::render)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

/// `GET /api/usage` — per-model token accounting snapshot.
pub async fn usage(State(state): State<AppState>) -> Json<BTreeMap<String, ModelUsage>> {
    Json(state.ledger.snapshot())
}
