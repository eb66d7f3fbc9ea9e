//! Engine error taxonomy.
//!
//! Folds store and model failures into the kinds the API layer maps to
//! status codes: missing session, bad parent, bad node reference, upstream
//! model failure, everything else.

use thiserror::Error;

use arbor_llm::LlmError;
use arbor_store::StoreError;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while orchestrating chat exchanges.
#[derive(Debug, Error)]
pub enum EngineError {
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

    /// Append named a parent node that does not exist in the session.
    #[error("parent node {parent_node_index} not found in session {session_id}")]
    InvalidParent {
        /// Session the append ran against.
        session_id: String,
        /// Parent index that failed to resolve.
        parent_node_index: i64,
    },

    /// The model collaborator failed.
    #[error("model call failed: {0}")]
    Upstream(#[from] LlmError),

    /// Persistence failure outside the not-found family.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(id) => Self::SessionNotFound(id),
            StoreError::NodeNotFound {
                session_id,
                node_index,
            } => Self::NodeNotFound {
                session_id,
                node_index,
            },
            StoreError::ParentNotFound {
                session_id,
                parent_node_index,
            } => Self::InvalidParent {
                session_id,
                parent_node_index,
            },
            other => Self::Store(other),
        }
    }
}
