//! # arbor-llm
//!
//! The language-model collaborator for the Arbor service.
//!
//! - [`generate::TextGenerator`] — the single opaque `generate(messages)`
//!   seam the engine depends on
//! - [`ollama::OllamaClient`] — streaming NDJSON chat client for
//!   Ollama-compatible endpoints, with a strict typed chunk format
//! - [`usage::UsageLedger`] — injected per-process token accounting keyed
//!   by model name
//!
//! ## Crate Position
//!
//! Depends on `arbor-core`. Consumed by `arbor-engine` and the binary.

#![deny(unsafe_code)]

pub mod errors;
pub mod generate;
pub mod ollama;
pub mod usage;

pub use errors::{LlmError, Result};
pub use generate::{Generated, TextGenerator, TokenUsage};
pub use ollama::OllamaClient;
pub use usage::{ModelUsage, UsageLedger};
