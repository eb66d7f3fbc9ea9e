//! High-level transactional store facade.

pub mod tree_store;
