//! Node snapshot and subtree-delete routes.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use arbor_store::NodeRow;

use crate::errors::ApiError;
use crate::state::AppState;

/// `GET /api/nodes/{session_id}` — unordered snapshot of a session's nodes.
pub async fn list_nodes(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<NodeRow>>, ApiError> {
    Ok(Json(state.store.nodes_for_session(&session_id)?))
}

/// Body of `DELETE /api/sessions/{session_id}/nodes`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNodesRequest {
    /// Seed set; the full descendant closure is deleted.
    pub node_indices: Vec<i64>,
}

/// `DELETE /api/sessions/{session_id}/nodes` — delete the closure and
/// return the recomputed active node.
pub async fn delete_nodes(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<DeleteNodesRequest>,
) -> Result<Json<Value>, ApiError> {
    let new_active = state.engine.delete_nodes(&session_id, &request.node_indices)?;
    Ok(Json(json!({ "newActiveNode": new_active })))
}
