//! Session lifecycle and active-node routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use arbor_store::SessionRow;

use crate::errors::ApiError;
use crate::state::AppState;

/// `POST /api/sessions` — create a session with a placeholder name.
pub async fn create_session(State(state): State<AppState>) -> Result<Json<SessionRow>, ApiError> {
    Ok(Json(state.store.create_session()?))
}

/// `GET /api/sessions` — list all sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Result<Json<Vec<SessionRow>>, ApiError> {
    Ok(Json(state.store.list_sessions()?))
}

/// `DELETE /api/sessions` — drop every session and node.
pub async fn clear_sessions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let cleared = state.store.clear_all_sessions()?;
    Ok(Json(json!({ "cleared": cleared })))
}

/// `GET /api/sessions/{session_id}`.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionRow>, ApiError> {
    Ok(Json(state.store.get_session(&session_id)?))
}

/// `DELETE /api/sessions/{session_id}` — cascade delete.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_session(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body of `PUT /api/sessions/{session_id}/active-node`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveNodeRequest {
    /// New active node index; null clears the pointer.
    pub active_node_index: Option<i64>,
}

/// `PUT /api/sessions/{session_id}/active-node` — repoint the active node.
pub async fn update_active_node(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ActiveNodeRequest>,
) -> Result<Json<SessionRow>, ApiError> {
    let session = state
        .store
        .update_active_node(&session_id, request.active_node_index)?;
    Ok(Json(session))
}

/// `GET /api/sessions/{session_id}/active-node`.
pub async fn get_active_node(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let active = state.store.active_node(&session_id)?;
    Ok(Json(json!({ "activeNodeIndex": active })))
}
