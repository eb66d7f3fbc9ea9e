//! Shared handler state.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use arbor_engine::ChatEngine;
use arbor_llm::UsageLedger;
use arbor_store::TreeStore;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Tree persistence, used directly by session and node routes.
    pub store: Arc<TreeStore>,
    /// Chat orchestration, used by the chat and delete routes.
    pub engine: Arc<ChatEngine>,
    /// Token accounting, rendered at `/api/usage`.
    pub ledger: Arc<UsageLedger>,
    /// Renders the `/metrics` endpoint. `None` when no recorder was
    /// installed (tests).
    pub metrics: Option<PrometheusHandle>,
}
