//! Schema migrations, versioned via `PRAGMA user_version`.

use rusqlite::Connection;
use tracing::debug;

use crate::errors::Result;

/// Current schema version.
const SCHEMA_VERSION: i64 = 1;

/// Run all pending migrations.
///
/// Idempotent: each migration runs at most once, gated by `user_version`.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    if version < SCHEMA_VERSION {
        // PRAGMA does not support parameter binding.
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
        debug!(from = version, to = SCHEMA_VERSION, "schema migrated");
    }
    Ok(())
}

/// v1: sessions and nodes tables.
///
/// Nodes are keyed by `(session_id, node_index)` — indices are per-session.
/// The composite parent FK keeps parent links inside the owning session.
/// It is deferred: subtree deletion removes a parent and its children in
/// one statement, in unspecified row order.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id                 TEXT PRIMARY KEY,
            name               TEXT NOT NULL,
            status             TEXT NOT NULL DEFAULT 'active',
            created_at         TEXT NOT NULL,
            active_node_index  INTEGER
        );

        CREATE TABLE IF NOT EXISTS nodes (
            session_id         TEXT NOT NULL REFERENCES sessions(id),
            node_index         INTEGER NOT NULL,
            user_message       TEXT NOT NULL,
            ai_response        TEXT NOT NULL,
            summary            TEXT,
            parent_node_index  INTEGER,
            timestamp          TEXT NOT NULL,
            PRIMARY KEY (session_id, node_index),
            FOREIGN KEY (session_id, parent_node_index)
                REFERENCES nodes(session_id, node_index)
                DEFERRABLE INITIALLY DEFERRED
        );

        CREATE INDEX IF NOT EXISTS idx_nodes_parent
            ON nodes(session_id, parent_node_index);
        CREATE INDEX IF NOT EXISTS idx_nodes_timestamp
            ON nodes(session_id, timestamp);",
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
