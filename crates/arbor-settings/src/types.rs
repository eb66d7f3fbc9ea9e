//! Settings schema with compiled defaults.

use serde::{Deserialize, Serialize};

/// Top-level Arbor settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArborSettings {
    /// Settings schema version.
    pub version: String,
    /// Service name (used in logs and the health endpoint).
    pub name: String,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Language-model settings.
    pub llm: LlmSettings,
    /// Durable store settings.
    pub store: StoreSettings,
    /// Summarizer word budgets.
    pub summarizer: SummarizerSettings,
}

impl Default for ArborSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "arbor".to_string(),
            server: ServerSettings::default(),
            llm: LlmSettings::default(),
            store: StoreSettings::default(),
            summarizer: SummarizerSettings::default(),
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub bind: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

/// Language-model settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Base URL of the Ollama-compatible chat endpoint.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "phi3:3.8b".to_string(),
        }
    }
}

/// Durable store settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// SQLite database path. `:memory:` opens an in-memory store.
    pub db_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: "arbor.db".to_string(),
        }
    }
}

/// Summarizer word budgets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummarizerSettings {
    /// Maximum words in a node summary.
    pub summary_max_words: usize,
    /// Maximum words in a generated session name.
    pub name_max_words: usize,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            summary_max_words: 10,
            name_max_words: 4,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
