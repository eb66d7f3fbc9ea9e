//! Typed rows for the `sessions` and `nodes` tables.
//!
//! Rows serialize camelCase so the API layer can return them unchanged.

use serde::{Deserialize, Serialize};

/// A row of the `sessions` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    /// Opaque unique id (`sess_<uuid-v7>`), immutable.
    pub id: String,
    /// Human-readable label; placeholder until the first exchange is named.
    pub name: String,
    /// Lifecycle state. Only `active` is interpreted today.
    pub status: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Node the session currently points at; null when the session is empty.
    pub active_node_index: Option<i64>,
}

/// A row of the `nodes` table — one user/assistant exchange.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRow {
    /// Owning session.
    pub session_id: String,
    /// Per-session index, monotonic from 1, never reused.
    pub node_index: i64,
    /// User side of the exchange.
    pub user_message: String,
    /// Assistant side of the exchange.
    pub ai_response: String,
    /// Compressed description of the exchange (word-capped).
    pub summary: Option<String>,
    /// Parent node in the same session; null marks a root.
    pub parent_node_index: Option<i64>,
    /// RFC 3339 creation timestamp (millisecond precision).
    pub timestamp: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
