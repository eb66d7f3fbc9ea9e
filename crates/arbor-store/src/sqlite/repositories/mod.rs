//! Stateless repositories — every method takes a `&Connection`.

pub mod node;
pub mod session;
