//! # arbor-server
//!
//! REST surface for the Arbor service.
//!
//! - [`routes`] — axum router: chat, sessions, nodes, health/metrics/usage
//! - [`errors::ApiError`] — error kind → status code mapping
//! - [`metrics`] — Prometheus recorder install and metric name constants
//! - [`state::AppState`] — store + engine + ledger shared by handlers
//!
//! ## Crate Position
//!
//! Depends on `arbor-store`, `arbor-engine`, and `arbor-llm`. Consumed by
//! the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod metrics;
pub mod routes;
pub mod state;

pub use errors::ApiError;
pub use routes::router;
pub use state::AppState;
