//! # arbor-engine
//!
//! Orchestration layer between the tree store and the language model.
//!
//! - [`context`] — rebuild the linear model context from an ancestor path
//! - [`summarizer`] — word-budgeted exchange summaries and session naming
//! - [`engine::ChatEngine`] — the append/delete flow the API layer calls
//!
//! ## Crate Position
//!
//! Depends on `arbor-core`, `arbor-store`, and `arbor-llm`. Consumed by
//! `arbor-server` and the binary.

#![deny(unsafe_code)]

pub mod context;
pub mod engine;
pub mod errors;
pub mod summarizer;

pub use engine::{ChatEngine, SummaryLimits};
pub use errors::{EngineError, Result};
