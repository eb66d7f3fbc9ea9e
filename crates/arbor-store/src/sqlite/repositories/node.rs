//! Node repository — CRUD and tree queries for the `nodes` table.
//!
//! Node identity is the composite `(session_id, node_index)`; indices are
//! per-session and never reused. All multi-index operations build their
//! `IN (...)` lists dynamically and bind with `params_from_iter`.

use std::collections::BTreeSet;

use chrono::SecondsFormat;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use crate::errors::Result;
use crate::sqlite::row_types::NodeRow;

const SELECT_COLUMNS: &str =
    "session_id, node_index, user_message, ai_response, summary, parent_node_index, timestamp";

/// Options for inserting a node.
pub struct CreateNodeOptions<'a> {
    /// Owning session.
    pub session_id: &'a str,
    /// Index to insert at (caller computes `1 + max`).
    pub node_index: i64,
    /// User side of the exchange.
    pub user_message: &'a str,
    /// Assistant side of the exchange.
    pub ai_response: &'a str,
    /// Word-capped summary, if one was produced.
    pub summary: Option<&'a str>,
    /// Parent node in the same session; `None` inserts a root.
    pub parent_node_index: Option<i64>,
}

/// Node repository — stateless, every method takes `&Connection`.
pub struct NodeRepo;

impl NodeRepo {
    /// Insert a node.
    pub fn insert(conn: &Connection, opts: &CreateNodeOptions<'_>) -> Result<NodeRow> {
        let now = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let _ = conn.execute(
            "INSERT INTO nodes (session_id, node_index, user_message, ai_response, summary, parent_node_index, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                opts.session_id,
                opts.node_index,
                opts.user_message,
                opts.ai_response,
                opts.summary,
                opts.parent_node_index,
                now
            ],
        )?;
        Ok(NodeRow {
            session_id: opts.session_id.to_string(),
            node_index: opts.node_index,
            user_message: opts.user_message.to_string(),
            ai_response: opts.ai_response.to_string(),
            summary: opts.summary.map(String::from),
            parent_node_index: opts.parent_node_index,
            timestamp: now,
        })
    }

    /// Get one node by its session-scoped index.
    pub fn get(conn: &Connection, session_id: &str, node_index: i64) -> Result<Option<NodeRow>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM nodes WHERE session_id = ?1 AND node_index = ?2"
                ),
                params![session_id, node_index],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All nodes for a session (snapshot, index order for determinism).
    pub fn get_by_session(conn: &Connection, session_id: &str) -> Result<Vec<NodeRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM nodes WHERE session_id = ?1 ORDER BY node_index ASC"
        ))?;
        let rows = stmt
            .query_map(params![session_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Next free index: `1 + max(node_index)`, counting deleted indices.
    ///
    /// Must be called inside the same transaction as the insert (the caller
    /// holds the per-session write lock), otherwise two appends can race to
    /// the same index.
    pub fn next_index(conn: &Connection, session_id: &str) -> Result<i64> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(node_index) FROM nodes WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// Check whether a node exists.
    pub fn exists(conn: &Connection, session_id: &str, node_index: i64) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM nodes WHERE session_id = ?1 AND node_index = ?2)",
            params![session_id, node_index],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Indices of direct children of any node in `parents`, excluding
    /// indices already in `excluding`. One worklist step of the descendant
    /// closure.
    pub fn children_of(
        conn: &Connection,
        session_id: &str,
        parents: &BTreeSet<i64>,
        excluding: &BTreeSet<i64>,
    ) -> Result<Vec<i64>> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }
        let parent_list = placeholders(parents.len(), 2);
        let mut sql = format!(
            "SELECT node_index FROM nodes
             WHERE session_id = ?1 AND parent_node_index IN ({parent_list})"
        );
        if !excluding.is_empty() {
            let exclude_list = placeholders(excluding.len(), 2 + parents.len());
            sql.push_str(&format!(" AND node_index NOT IN ({exclude_list})"));
        }

        let mut stmt = conn.prepare(&sql)?;
        let bound = std::iter::once(rusqlite::types::Value::from(session_id.to_string()))
            .chain(parents.iter().map(|&i| rusqlite::types::Value::from(i)))
            .chain(excluding.iter().map(|&i| rusqlite::types::Value::from(i)));
        let rows = stmt
            .query_map(params_from_iter(bound), |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;
        Ok(rows)
    }

    /// Delete the given indices. Returns count deleted.
    pub fn delete_many(
        conn: &Connection,
        session_id: &str,
        node_indices: &BTreeSet<i64>,
    ) -> Result<usize> {
        if node_indices.is_empty() {
            return Ok(0);
        }
        let list = placeholders(node_indices.len(), 2);
        let bound = std::iter::once(rusqlite::types::Value::from(session_id.to_string()))
            .chain(node_indices.iter().map(|&i| rusqlite::types::Value::from(i)));
        let deleted = conn.execute(
            &format!("DELETE FROM nodes WHERE session_id = ?1 AND node_index IN ({list})"),
            params_from_iter(bound),
        )?;
        Ok(deleted)
    }

    /// Most recently created surviving node, newest timestamp first with
    /// the higher index winning ties (second-resolution clocks collide).
    pub fn most_recent(conn: &Connection, session_id: &str) -> Result<Option<NodeRow>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM nodes WHERE session_id = ?1
                     ORDER BY timestamp DESC, node_index DESC LIMIT 1"
                ),
                params![session_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Delete all nodes for a session. Returns count deleted.
    pub fn delete_by_session(conn: &Connection, session_id: &str) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM nodes WHERE session_id = ?1",
            params![session_id],
        )?)
    }

    /// Delete every node in the store. Returns count deleted.
    pub fn delete_all(conn: &Connection) -> Result<usize> {
        Ok(conn.execute("DELETE FROM nodes", [])?)
    }

    /// Count nodes in a session.
    pub fn count_by_session(conn: &Connection, session_id: &str) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM nodes WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NodeRow> {
        Ok(NodeRow {
            session_id: row.get(0)?,
            node_index: row.get(1)?,
            user_message: row.get(2)?,
            ai_response: row.get(3)?,
            summary: row.get(4)?,
            parent_node_index: row.get(5)?,
            timestamp: row.get(6)?,
        })
    }
}

/// Build `?N,?N+1,...` placeholder lists for dynamic `IN` clauses.
fn placeholders(count: usize, start: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(",")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;
    use crate::sqlite::repositories::session::SessionRepo;

    fn setup() -> (Connection, String) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        let session = SessionRepo::create(&conn).unwrap();
        (conn, session.id)
    }

    fn insert(conn: &Connection, session_id: &str, index: i64, parent: Option<i64>) -> NodeRow {
        NodeRepo::insert(
            conn,
            &CreateNodeOptions {
                session_id,
                node_index: index,
                user_message: "u",
                ai_response: "a",
                summary: Some("s"),
                parent_node_index: parent,
            },
        )
        .unwrap()
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let (conn, sid) = setup();
        let node = insert(&conn, &sid, 1, None);
        let found = NodeRepo::get(&conn, &sid, 1).unwrap().unwrap();
        assert_eq!(found, node);
    }

    #[test]
    fn next_index_starts_at_one() {
        let (conn, sid) = setup();
        assert_eq!(NodeRepo::next_index(&conn, &sid).unwrap(), 1);
    }

    #[test]
    fn next_index_skips_deleted() {
        let (conn, sid) = setup();
        insert(&conn, &sid, 1, None);
        insert(&conn, &sid, 2, Some(1));
        NodeRepo::delete_many(&conn, &sid, &BTreeSet::from([2])).unwrap();
        // Index 2 is gone but never reused.
        assert_eq!(NodeRepo::next_index(&conn, &sid).unwrap(), 3);
    }

    #[test]
    fn children_of_single_step() {
        let (conn, sid) = setup();
        insert(&conn, &sid, 1, None);
        insert(&conn, &sid, 2, Some(1));
        insert(&conn, &sid, 3, Some(1));
        insert(&conn, &sid, 4, Some(2));

        let children =
            NodeRepo::children_of(&conn, &sid, &BTreeSet::from([1]), &BTreeSet::new()).unwrap();
        assert_eq!(BTreeSet::from_iter(children), BTreeSet::from([2, 3]));
    }

    #[test]
    fn children_of_respects_exclusions() {
        let (conn, sid) = setup();
        insert(&conn, &sid, 1, None);
        insert(&conn, &sid, 2, Some(1));
        insert(&conn, &sid, 3, Some(1));

        let children =
            NodeRepo::children_of(&conn, &sid, &BTreeSet::from([1]), &BTreeSet::from([2])).unwrap();
        assert_eq!(children, vec![3]);
    }

    #[test]
    fn children_of_empty_parents() {
        let (conn, sid) = setup();
        let children =
            NodeRepo::children_of(&conn, &sid, &BTreeSet::new(), &BTreeSet::new()).unwrap();
        assert!(children.is_empty());
    }

    #[test]
    fn delete_many_counts() {
        let (conn, sid) = setup();
        insert(&conn, &sid, 1, None);
        insert(&conn, &sid, 2, None);
        assert_eq!(
            NodeRepo::delete_many(&conn, &sid, &BTreeSet::from([1, 2, 99])).unwrap(),
            2
        );
        assert_eq!(NodeRepo::count_by_session(&conn, &sid).unwrap(), 0);
    }

    #[test]
    fn most_recent_prefers_higher_index_on_tie() {
        let (conn, sid) = setup();
        // Same-millisecond inserts are realistic under test speed.
        insert(&conn, &sid, 1, None);
        insert(&conn, &sid, 2, None);
        let recent = NodeRepo::most_recent(&conn, &sid).unwrap().unwrap();
        assert_eq!(recent.node_index, 2);
    }

    #[test]
    fn most_recent_empty_session() {
        let (conn, sid) = setup();
        assert!(NodeRepo::most_recent(&conn, &sid).unwrap().is_none());
    }

    #[test]
    fn cross_session_indices_are_independent() {
        let (conn, sid_a) = setup();
        let sid_b = SessionRepo::create(&conn).unwrap().id;
        insert(&conn, &sid_a, 1, None);
        insert(&conn, &sid_b, 1, None);
        assert_eq!(NodeRepo::next_index(&conn, &sid_a).unwrap(), 2);
        assert_eq!(NodeRepo::next_index(&conn, &sid_b).unwrap(), 2);
    }

    #[test]
    fn snapshot_is_index_ordered() {
        let (conn, sid) = setup();
        insert(&conn, &sid, 1, None);
        insert(&conn, &sid, 2, Some(1));
        insert(&conn, &sid, 3, Some(1));
        let all = NodeRepo::get_by_session(&conn, &sid).unwrap();
        let indices: Vec<i64> = all.iter().map(|n| n.node_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
