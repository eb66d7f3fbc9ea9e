//! Store error taxonomy.
//!
//! Each variant is a distinguishable error kind so the API layer can map
//! failures to status codes without string matching.

use thiserror::Error;

/// Result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the tree store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Session id did not resolve.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A node reference did not resolve within its session.
    #[error("node {node_index} not found in session {session_id}")]
    NodeNotFound {
        /// Session the lookup ran against.
        session_id: String,
        /// Index that failed to resolve.
        node_index: i64,
    },

    /// Append referenced a parent node that does not exist in the session.
    #[error("parent node {parent_node_index} not found in session {session_id}")]
    ParentNotFound {
        /// Session the append ran against.
        session_id: String,
        /// Parent index that failed to resolve.
        parent_node_index: i64,
    },

    /// Underlying SQLite failure (transaction rolled back).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool failure.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Invariant violation inside the store itself.
    #[error("internal store error: {0}")]
    Internal(String),
}
