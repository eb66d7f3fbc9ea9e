//! Prometheus metrics recorder and metric name constants.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render the `/metrics` endpoint. Must be
/// called once at startup before any metrics are recorded.
pub fn install_recorder() -> Result<PrometheusHandle, String> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("failed to install metrics recorder: {e}"))?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

// Metric name constants to avoid typos across crates.

/// HTTP requests total (counter, labels: method).
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
/// Committed exchanges total (counter).
pub const CHAT_EXCHANGES_TOTAL: &str = "chat_exchanges_total";
/// Model calls total (counter, labels: model).
pub const LLM_CALLS_TOTAL: &str = "llm_calls_total";
/// Model call failures total (counter, labels: model).
pub const LLM_ERRORS_TOTAL: &str = "llm_errors_total";
/// Truncated ancestor walks total (counter).
pub const BROKEN_PARENT_LINKS_TOTAL: &str = "tree_broken_parent_links_total";
