//! r2d2 connection pool over SQLite with required pragmas.

use std::path::Path;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::Result;
use crate::sqlite::migrations::run_migrations;

/// Pooled SQLite connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Connection pool wrapper. Every connection runs the same init pragmas;
/// migrations run once against the first connection at open time.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: r2d2::Pool<SqliteConnectionManager>,
}

impl ConnectionPool {
    /// Open (or create) a database file and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(init_pragmas);
        Self::build(manager, 8)
    }

    /// Open a private in-memory database (single connection, test use).
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(init_pragmas);
        Self::build(manager, 1)
    }

    fn build(manager: SqliteConnectionManager, max_size: u32) -> Result<Self> {
        let inner = r2d2::Pool::builder()
            .max_size(max_size)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)?;
        let conn = inner.get()?;
        run_migrations(&conn)?;
        Ok(Self { inner })
    }

    /// Check out a connection.
    pub fn get(&self) -> Result<PooledConnection> {
        Ok(self.inner.get()?)
    }
}

fn init_pragmas(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
