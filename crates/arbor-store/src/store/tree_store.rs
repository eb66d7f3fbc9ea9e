//! High-level transactional `TreeStore` API.
//!
//! Composes the session and node repositories into atomic, session-centric
//! operations. Every write method runs inside a single SQLite transaction —
//! callers never observe partial state (a node without its active-pointer
//! update, or a half-deleted subtree).

use rusqlite::Connection;
use tracing::{debug, instrument, warn};

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repositories::node::{CreateNodeOptions, NodeRepo};
use crate::sqlite::repositories::session::SessionRepo;
use crate::sqlite::row_types::{NodeRow, SessionRow};

/// Counter incremented when an ancestor walk hits a dangling parent link.
pub const BROKEN_PARENT_LINKS_TOTAL: &str = "tree_broken_parent_links_total";

/// Options for appending a node.
pub struct AppendNodeOptions<'a> {
    /// Session to append to.
    pub session_id: &'a str,
    /// Parent node index; `None` appends a new root.
    pub parent_node_index: Option<i64>,
    /// User side of the exchange.
    pub user_message: &'a str,
    /// Assistant side of the exchange.
    pub ai_response: &'a str,
    /// Word-capped summary, if one was produced.
    pub summary: Option<&'a str>,
}

/// High-level `TreeStore` wrapping a connection pool and the repositories.
///
/// INVARIANT: writes to one session are serialized via in-process mutex
/// locks (`with_session_write_lock`), so `1 + max(node_index)` is race-free.
/// Global mutations (create/clear) use a separate global lock. The
/// `(session_id, node_index)` primary key enforces uniqueness at the DB
/// level as a backstop.
pub struct TreeStore {
    pool: ConnectionPool,
    global_write_lock: Mutex<()>,
    session_write_locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl TreeStore {
    const SQLITE_BUSY_MAX_RETRIES: u32 = 32;

    /// Create a new `TreeStore` with the given connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            global_write_lock: Mutex::new(()),
            session_write_locks: Mutex::new(HashMap::new()),
        }
    }

    fn acquire_session_write_lock(&self, session_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .session_write_locks
            .lock()
            .map_err(|_| StoreError::Internal("session lock map poisoned".into()))?;

        // Opportunistically prune dead weak refs when the map grows.
        if locks.len() > 128 {
            locks.retain(|_, weak| weak.strong_count() > 0);
        }

        if let Some(existing) = locks.get(session_id).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        let lock = Arc::new(Mutex::new(()));
        let _ = locks.insert(session_id.to_string(), Arc::downgrade(&lock));
        Ok(lock)
    }

    fn with_session_write_lock<T>(
        &self,
        session_id: &str,
        f: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let session_lock = self.acquire_session_write_lock(session_id)?;
        let _guard = session_lock
            .lock()
            .map_err(|_| StoreError::Internal("session write lock poisoned".into()))?;
        self.retry_on_sqlite_busy(f)
    }

    fn with_global_write_lock<T>(&self, f: impl FnMut() -> Result<T>) -> Result<T> {
        let _guard = self
            .global_write_lock
            .lock()
            .map_err(|_| StoreError::Internal("global write lock poisoned".into()))?;
        self.retry_on_sqlite_busy(f)
    }

    /// Retry an operation on SQLite BUSY/LOCKED with linear backoff + jitter.
    #[allow(clippy::unused_self)]
    fn retry_on_sqlite_busy<T>(&self, mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempts = 0;

        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err)
                    if Self::is_sqlite_busy_or_locked(&err)
                        && attempts < Self::SQLITE_BUSY_MAX_RETRIES =>
                {
                    attempts += 1;
                    let base_ms = u64::from(attempts).saturating_mul(10).min(500);
                    let jitter_range = base_ms / 4;
                    let jitter = if jitter_range > 0 {
                        rand::random::<u64>() % (jitter_range * 2 + 1)
                    } else {
                        0
                    };
                    let backoff_ms = base_ms.saturating_sub(jitter_range) + jitter;
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn is_sqlite_busy_or_locked(err: &StoreError) -> bool {
        match err {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(code, _)) => matches!(
                code.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    fn remove_session_write_lock(&self, session_id: &str) -> Result<()> {
        let mut locks = self
            .session_write_locks
            .lock()
            .map_err(|_| StoreError::Internal("session lock map poisoned".into()))?;
        let _ = locks.remove(session_id);
        Ok(())
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection> {
        self.pool.get()
    }

    fn require_session(conn: &Connection, session_id: &str) -> Result<SessionRow> {
        SessionRepo::get_by_id(conn, session_id)?
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Create a new, empty session with a placeholder name.
    #[instrument(skip(self))]
    pub fn create_session(&self) -> Result<SessionRow> {
        self.with_global_write_lock(|| {
            let conn = self.conn()?;
            let session = SessionRepo::create(&conn)?;
            debug!(session_id = %session.id, "session created");
            Ok(session)
        })
    }

    /// Get session by ID.
    pub fn get_session(&self, session_id: &str) -> Result<SessionRow> {
        let conn = self.conn()?;
        Self::require_session(&conn, session_id)
    }

    /// List all sessions, newest first.
    pub fn list_sessions(&self) -> Result<Vec<SessionRow>> {
        let conn = self.conn()?;
        SessionRepo::list(&conn)
    }

    /// Rename a session.
    #[instrument(skip(self, name))]
    pub fn rename_session(&self, session_id: &str, name: &str) -> Result<SessionRow> {
        self.with_session_write_lock(session_id, || {
            let conn = self.conn()?;
            if !SessionRepo::update_name(&conn, session_id, name)? {
                return Err(StoreError::SessionNotFound(session_id.to_string()));
            }
            Self::require_session(&conn, session_id)
        })
    }

    /// Delete a session and all of its nodes (cascade).
    #[instrument(skip(self))]
    pub fn delete_session(&self, session_id: &str) -> Result<()> {
        self.with_session_write_lock(session_id, || {
            let conn = self.conn()?;
            let tx = conn.unchecked_transaction()?;
            if !SessionRepo::exists(&tx, session_id)? {
                return Err(StoreError::SessionNotFound(session_id.to_string()));
            }
            // Nodes first: the session FK would reject the reverse order.
            let removed = NodeRepo::delete_by_session(&tx, session_id)?;
            let _ = SessionRepo::delete(&tx, session_id)?;
            tx.commit()?;
            debug!(session_id, removed_nodes = removed, "session deleted");
            Ok(())
        })?;
        self.remove_session_write_lock(session_id)
    }

    /// Delete every session and node in the store.
    #[instrument(skip(self))]
    pub fn clear_all_sessions(&self) -> Result<usize> {
        let cleared = self.with_global_write_lock(|| {
            let conn = self.conn()?;
            let tx = conn.unchecked_transaction()?;
            let _ = NodeRepo::delete_all(&tx)?;
            let cleared = SessionRepo::delete_all(&tx)?;
            tx.commit()?;
            Ok(cleared)
        })?;
        let mut locks = self
            .session_write_locks
            .lock()
            .map_err(|_| StoreError::Internal("session lock map poisoned".into()))?;
        locks.clear();
        Ok(cleared)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tree engine
    // ─────────────────────────────────────────────────────────────────────

    /// Append a node under an arbitrary parent (or as a new root).
    ///
    /// Atomic: next-index resolution, parent validation, node insertion,
    /// and the active-pointer update commit together. The per-session lock
    /// makes `1 + max(node_index)` race-free across concurrent appends.
    #[instrument(skip(self, opts), fields(session_id = opts.session_id, parent = opts.parent_node_index))]
    pub fn append_node(&self, opts: &AppendNodeOptions<'_>) -> Result<NodeRow> {
        self.with_session_write_lock(opts.session_id, || {
            let conn = self.conn()?;
            let tx = conn.unchecked_transaction()?;

            let _ = Self::require_session(&tx, opts.session_id)?;

            if let Some(parent) = opts.parent_node_index
                && !NodeRepo::exists(&tx, opts.session_id, parent)?
            {
                return Err(StoreError::ParentNotFound {
                    session_id: opts.session_id.to_string(),
                    parent_node_index: parent,
                });
            }

            let next_index = NodeRepo::next_index(&tx, opts.session_id)?;
            let node = NodeRepo::insert(
                &tx,
                &CreateNodeOptions {
                    session_id: opts.session_id,
                    node_index: next_index,
                    user_message: opts.user_message,
                    ai_response: opts.ai_response,
                    summary: opts.summary,
                    parent_node_index: opts.parent_node_index,
                },
            )?;
            let _ = SessionRepo::update_active_node(&tx, opts.session_id, Some(next_index))?;

            tx.commit()?;
            debug!(session_id = opts.session_id, node_index = next_index, "node appended");
            Ok(node)
        })
    }

    /// Ancestor path from root to `start` (inclusive), oldest first.
    ///
    /// Returns an empty path when `start` is `None`. A dangling reference
    /// mid-walk (the start node itself, or any parent) truncates the path
    /// instead of failing: the remaining chain is still valid conversation
    /// context. Truncation is surfaced via a warning and
    /// [`BROKEN_PARENT_LINKS_TOTAL`].
    pub fn ancestor_path(&self, session_id: &str, start: Option<i64>) -> Result<Vec<NodeRow>> {
        let conn = self.conn()?;
        let _ = Self::require_session(&conn, session_id)?;

        let mut path = Vec::new();
        let mut visited = BTreeSet::new();
        let mut cursor = start;

        while let Some(index) = cursor {
            // A cycle cannot be produced by append-only parent links, but a
            // corrupted store must not hang the walk.
            if !visited.insert(index) {
                warn!(session_id, node_index = index, "cycle in ancestor walk, truncating");
                metrics::counter!(BROKEN_PARENT_LINKS_TOTAL).increment(1);
                break;
            }
            match NodeRepo::get(&conn, session_id, index)? {
                Some(node) => {
                    cursor = node.parent_node_index;
                    path.push(node);
                }
                None => {
                    warn!(session_id, node_index = index, "dangling parent link, truncating walk");
                    metrics::counter!(BROKEN_PARENT_LINKS_TOTAL).increment(1);
                    break;
                }
            }
        }

        path.reverse();
        Ok(path)
    }

    /// Delete a set of nodes plus their full descendant closure.
    ///
    /// The closure is computed as a worklist fixed point (no recursion):
    /// any node whose parent is in the delete set joins the set until no
    /// new nodes appear. Deletion and the active-pointer recompute commit
    /// as one transaction. Returns the new active node index.
    ///
    /// Deleting an empty or already-absent set is a no-op that still
    /// recomputes the pointer, which makes the operation idempotent.
    #[instrument(skip(self, node_indices), fields(session_id, seed = node_indices.len()))]
    pub fn delete_subtree(&self, session_id: &str, node_indices: &[i64]) -> Result<Option<i64>> {
        self.with_session_write_lock(session_id, || {
            let conn = self.conn()?;
            let tx = conn.unchecked_transaction()?;

            let _ = Self::require_session(&tx, session_id)?;

            let mut doomed: BTreeSet<i64> = node_indices.iter().copied().collect();
            let mut frontier: VecDeque<BTreeSet<i64>> = VecDeque::new();
            frontier.push_back(doomed.clone());

            // Fixed point: each step only asks for children of the newest
            // additions, so the loop terminates once a level adds nothing.
            while let Some(recent) = frontier.pop_front() {
                if recent.is_empty() {
                    break;
                }
                let children: BTreeSet<i64> =
                    NodeRepo::children_of(&tx, session_id, &recent, &doomed)?
                        .into_iter()
                        .collect();
                if children.is_empty() {
                    break;
                }
                doomed.extend(children.iter().copied());
                frontier.push_back(children);
            }

            let removed = NodeRepo::delete_many(&tx, session_id, &doomed)?;

            let new_active = NodeRepo::most_recent(&tx, session_id)?.map(|node| node.node_index);
            let _ = SessionRepo::update_active_node(&tx, session_id, new_active)?;

            tx.commit()?;
            debug!(session_id, removed, ?new_active, "subtree deleted");
            Ok(new_active)
        })
    }

    /// Snapshot of all nodes in a session.
    pub fn nodes_for_session(&self, session_id: &str) -> Result<Vec<NodeRow>> {
        let conn = self.conn()?;
        let _ = Self::require_session(&conn, session_id)?;
        NodeRepo::get_by_session(&conn, session_id)
    }

    /// Fetch one node.
    pub fn get_node(&self, session_id: &str, node_index: i64) -> Result<NodeRow> {
        let conn = self.conn()?;
        NodeRepo::get(&conn, session_id, node_index)?.ok_or(StoreError::NodeNotFound {
            session_id: session_id.to_string(),
            node_index,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Active-node maintenance
    // ─────────────────────────────────────────────────────────────────────

    /// Explicitly repoint the active node.
    ///
    /// A non-null index must reference an existing node; `None` clears the
    /// pointer. Keeps the active-pointer validity invariant intact.
    #[instrument(skip(self))]
    pub fn update_active_node(
        &self,
        session_id: &str,
        node_index: Option<i64>,
    ) -> Result<SessionRow> {
        self.with_session_write_lock(session_id, || {
            let conn = self.conn()?;
            let tx = conn.unchecked_transaction()?;

            let _ = Self::require_session(&tx, session_id)?;
            if let Some(index) = node_index
                && !NodeRepo::exists(&tx, session_id, index)?
            {
                return Err(StoreError::NodeNotFound {
                    session_id: session_id.to_string(),
                    node_index: index,
                });
            }
            let _ = SessionRepo::update_active_node(&tx, session_id, node_index)?;
            tx.commit()?;
            Self::require_session(&conn, session_id)
        })
    }

    /// Current active node index for a session.
    pub fn active_node(&self, session_id: &str) -> Result<Option<i64>> {
        Ok(self.get_session(session_id)?.active_node_index)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
