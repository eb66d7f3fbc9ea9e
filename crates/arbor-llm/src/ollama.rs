//! Streaming chat client for Ollama-compatible endpoints.
//!
//! The endpoint streams newline-delimited JSON chunks. Each chunk either
//! carries a `message.content` fragment, an `error`, or `done: true` with
//! final token counts. The duck-typed stream is parsed into the strict
//! [`ChatChunk`] shape and folded into one [`Generated`] value.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use arbor_core::messages::ChatMessage;

use crate::errors::{LlmError, Result};
use crate::generate::{Generated, TextGenerator, TokenUsage};
use crate::usage::UsageLedger;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama chat client.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
    ledger: Arc<UsageLedger>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// One NDJSON chunk of the streamed response.
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

impl OllamaClient {
    /// Create a client for `base_url` (default `http://localhost:11434`).
    pub fn new(base_url: Option<&str>, model: impl Into<String>, ledger: Arc<UsageLedger>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.into(),
            // Local generation can be slow; transport failures still error.
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            ledger,
        }
    }

    /// Model name this client sends with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn fold_chunk(
        chunk: &ChatChunk,
        output: &mut String,
        usage: &mut Option<TokenUsage>,
    ) -> Result<bool> {
        if let Some(error) = &chunk.error {
            return Err(LlmError::Upstream(error.clone()));
        }
        if let Some(message) = &chunk.message {
            output.push_str(&message.content);
        }
        if chunk.done {
            if let (Some(prompt), Some(completion)) = (chunk.prompt_eval_count, chunk.eval_count) {
                *usage = Some(TokenUsage {
                    prompt_tokens: prompt,
                    completion_tokens: completion,
                });
            }
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Generated> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                model: &self.model,
                messages,
                stream: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            metrics::counter!("llm_errors_total", "model" => self.model.clone()).increment(1);
            return Err(LlmError::Upstream(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        let mut output = String::new();
        let mut usage = None;
        let mut done = false;
        let mut buffer = Vec::new();
        let mut stream = response.bytes_stream();

        'stream: while let Some(bytes) = stream.next().await {
            let bytes = bytes?;
            buffer.extend_from_slice(&bytes);
            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let chunk: ChatChunk = serde_json::from_str(line)
                    .map_err(|e| LlmError::InvalidResponse(format!("bad chunk: {e}")))?;
                if Self::fold_chunk(&chunk, &mut output, &mut usage)? {
                    done = true;
                    break 'stream;
                }
            }
        }

        // A final chunk without a trailing newline is still valid.
        if !done {
            let tail = String::from_utf8_lossy(&buffer);
            let tail = tail.trim();
            if !tail.is_empty() {
                let chunk: ChatChunk = serde_json::from_str(tail)
                    .map_err(|e| LlmError::InvalidResponse(format!("bad chunk: {e}")))?;
                done = Self::fold_chunk(&chunk, &mut output, &mut usage)?;
            }
        }

        if !done {
            warn!(model = %self.model, "stream ended without done chunk");
        }

        self.ledger.record(&self.model, usage);
        debug!(model = %self.model, chars = output.len(), "generation complete");
        Ok(Generated {
            text: output,
            usage,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
