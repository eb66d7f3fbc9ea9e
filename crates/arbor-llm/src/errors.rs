//! LLM error types.

use thiserror::Error;

/// Result alias for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors raised by the language-model collaborator.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The upstream model endpoint failed (HTTP error status, transport
    /// failure, or an in-stream `error` chunk).
    #[error("upstream model error: {0}")]
    Upstream(String),

    /// The endpoint answered but the stream did not match the expected
    /// chunk shape.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}
