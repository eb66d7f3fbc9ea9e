//! Session repository — CRUD for the `sessions` table.

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::errors::Result;
use crate::sqlite::row_types::SessionRow;

const SELECT_COLUMNS: &str = "id, name, status, created_at, active_node_index";

/// Session repository — stateless, every method takes `&Connection`.
pub struct SessionRepo;

impl SessionRepo {
    /// Create a new session with a placeholder name and no active node.
    pub fn create(conn: &Connection) -> Result<SessionRow> {
        let id = format!("sess_{}", Uuid::now_v7());
        // Placeholder until the summarizer names the session after node 1.
        let name = format!("New Session {}", &id[5..13]);
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO sessions (id, name, status, created_at, active_node_index)
             VALUES (?1, ?2, 'active', ?3, NULL)",
            params![id, name, now],
        )?;
        Ok(SessionRow {
            id,
            name,
            status: "active".to_string(),
            created_at: now,
            active_node_index: None,
        })
    }

    /// Get session by ID.
    pub fn get_by_id(conn: &Connection, session_id: &str) -> Result<Option<SessionRow>> {
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM sessions WHERE id = ?1"),
                params![session_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List all sessions, newest first.
    pub fn list(conn: &Connection) -> Result<Vec<SessionRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM sessions ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Update the active node pointer. Returns `true` if the session exists.
    pub fn update_active_node(
        conn: &Connection,
        session_id: &str,
        node_index: Option<i64>,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET active_node_index = ?1 WHERE id = ?2",
            params![node_index, session_id],
        )?;
        Ok(changed > 0)
    }

    /// Update the session name. Returns `true` if the session exists.
    pub fn update_name(conn: &Connection, session_id: &str, name: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET name = ?1 WHERE id = ?2",
            params![name, session_id],
        )?;
        Ok(changed > 0)
    }

    /// Delete a session row. Returns `true` if deleted.
    pub fn delete(conn: &Connection, session_id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        Ok(changed > 0)
    }

    /// Delete all sessions. Returns count deleted.
    pub fn delete_all(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM sessions", [])?)
    }

    /// Check if a session exists.
    pub fn exists(conn: &Connection, session_id: &str) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE id = ?1)",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
        Ok(SessionRow {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            created_at: row.get(3)?,
            active_node_index: row.get(4)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
