//! Injected usage accounting.
//!
//! The ledger is constructed once at startup and handed to whoever makes
//! model calls — deliberately not a module-level global, so each process
//! (and each test) owns its own instance and can inspect it directly.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use serde::Serialize;

use crate::generate::TokenUsage;

/// Accumulated usage for one model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    /// Number of generation calls.
    pub calls: u64,
    /// Total prompt tokens.
    pub prompt_tokens: u64,
    /// Total completion tokens.
    pub completion_tokens: u64,
}

/// Token accounting keyed by model name.
#[derive(Debug, Default)]
pub struct UsageLedger {
    inner: Mutex<HashMap<String, ModelUsage>>,
}

impl UsageLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call against `model`. Calls without provider-reported
    /// usage still count, with zero token deltas.
    pub fn record(&self, model: &str, usage: Option<TokenUsage>) {
        let mut inner = self.inner.lock();
        let entry = inner.entry(model.to_string()).or_default();
        entry.calls += 1;
        if let Some(usage) = usage {
            entry.prompt_tokens += usage.prompt_tokens;
            entry.completion_tokens += usage.completion_tokens;
        }
        metrics::counter!("llm_calls_total", "model" => model.to_string()).increment(1);
    }

    /// Ordered snapshot of all per-model totals.
    pub fn snapshot(&self) -> BTreeMap<String, ModelUsage> {
        self.inner
            .lock()
            .iter()
            .map(|(model, usage)| (model.clone(), *usage))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
