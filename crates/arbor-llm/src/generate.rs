//! The opaque text-generation seam.
//!
//! Everything above this crate treats the model as a single function:
//! an ordered role-tagged message list in, generated text out. The trait
//! object form (`Arc<dyn TextGenerator>`) lets tests substitute a stub.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use arbor_core::messages::ChatMessage;

use crate::errors::Result;

/// Token counts reported by the provider for one call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u64,
    /// Tokens produced by the completion.
    pub completion_tokens: u64,
}

/// Result of one generation call: the full text plus an explicit
/// completion signal. Replaces the loosely-shaped streamed data of typical
/// chat endpoints with a strict type.
#[derive(Clone, Debug, PartialEq)]
pub struct Generated {
    /// Accumulated completion text.
    pub text: String,
    /// Provider-reported usage, when the endpoint supplies it.
    pub usage: Option<TokenUsage>,
}

/// Opaque language-model call: `generate(messages) -> text`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the ordered message list.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generated>;
}
