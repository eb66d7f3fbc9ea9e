//! Chat exchange route.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use arbor_store::NodeRow;

use crate::errors::ApiError;
use crate::state::AppState;

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Session to append to.
    pub session_id: String,
    /// New user message.
    pub message: String,
    /// Parent node index; omitted or null appends a new root.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// `POST /api/chat` — run one exchange and return the committed node.
pub async fn create_exchange(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<NodeRow>, ApiError> {
    let node = state
        .engine
        .append_exchange(&request.session_id, request.parent_id, &request.message)
        .await?;
    Ok(Json(node))
}
