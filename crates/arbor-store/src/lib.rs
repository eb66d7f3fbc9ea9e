//! # arbor-store
//!
//! SQLite persistence and tree algorithms for the Arbor service.
//!
//! Layout mirrors the repository pattern: stateless repos in
//! [`sqlite::repositories`] take a `&Connection` and own the SQL; the
//! transactional facade [`store::TreeStore`] composes them into atomic,
//! session-centric operations (append, subtree delete, active-pointer
//! maintenance) under per-session write locks.
//!
//! ## Crate Position
//!
//! Foundation of the persistence stack. Consumed by `arbor-engine` and
//! `arbor-server`.

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use sqlite::connection::ConnectionPool;
pub use sqlite::row_types::{NodeRow, SessionRow};
pub use store::tree_store::{AppendNodeOptions, TreeStore};
