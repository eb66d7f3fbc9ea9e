//! Chat orchestration.
//!
//! `ChatEngine` drives the full exchange flow: resolve the ancestor path,
//! rebuild the model context, generate the reply, summarize the exchange,
//! commit the node, and name the session after the very first exchange.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use arbor_llm::TextGenerator;
use arbor_store::{AppendNodeOptions, NodeRow, StoreError, TreeStore};

use crate::context::{build_context, summary_chain};
use crate::errors::{EngineError, Result};
use crate::summarizer::{name_session, summarize, NAME_MAX_WORDS, SUMMARY_MAX_WORDS};

/// Word budgets for the summarizer, injected from configuration.
#[derive(Clone, Copy, Debug)]
pub struct SummaryLimits {
    /// Maximum words in a node summary.
    pub summary_max_words: usize,
    /// Maximum words in a generated session name.
    pub name_max_words: usize,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            summary_max_words: SUMMARY_MAX_WORDS,
            name_max_words: NAME_MAX_WORDS,
        }
    }
}

/// Orchestrates exchanges against one store and one model collaborator.
pub struct ChatEngine {
    store: Arc<TreeStore>,
    generator: Arc<dyn TextGenerator>,
    limits: SummaryLimits,
}

impl ChatEngine {
    /// Create an engine with default word budgets.
    pub fn new(store: Arc<TreeStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_limits(store, generator, SummaryLimits::default())
    }

    /// Create an engine with explicit word budgets.
    pub fn with_limits(
        store: Arc<TreeStore>,
        generator: Arc<dyn TextGenerator>,
        limits: SummaryLimits,
    ) -> Self {
        Self {
            store,
            generator,
            limits,
        }
    }

    /// Append one exchange under `parent_node_index` (or as a new root).
    ///
    /// The parent is validated before any model call, so a bad reference
    /// never spends tokens and never burns a node index. Generation and
    /// summarization happen outside the store transaction; the node plus
    /// active-pointer update then commit atomically. After node index 1
    /// commits, the session is named from the first exchange; a naming
    /// failure at that point keeps the placeholder name since the node
    /// itself is already durable.
    #[instrument(skip(self, user_message), fields(session_id, parent = parent_node_index))]
    pub async fn append_exchange(
        &self,
        session_id: &str,
        parent_node_index: Option<i64>,
        user_message: &str,
    ) -> Result<NodeRow> {
        let _ = self.store.get_session(session_id)?;
        if let Some(parent) = parent_node_index {
            match self.store.get_node(session_id, parent) {
                Ok(_) => {}
                Err(StoreError::NodeNotFound { .. }) => {
                    return Err(EngineError::InvalidParent {
                        session_id: session_id.to_string(),
                        parent_node_index: parent,
                    });
                }
                Err(other) => return Err(other.into()),
            }
        }

        let path = self.store.ancestor_path(session_id, parent_node_index)?;
        let context = build_context(&path, user_message);
        let generated = self.generator.generate(&context).await?;

        let previous = summary_chain(&path);
        let summary = summarize(
            self.generator.as_ref(),
            &previous,
            user_message,
            &generated.text,
            self.limits.summary_max_words,
        )
        .await?;

        let node = self.store.append_node(&AppendNodeOptions {
            session_id,
            parent_node_index,
            user_message,
            ai_response: &generated.text,
            summary: Some(&summary),
        })?;
        metrics::counter!("chat_exchanges_total").increment(1);
        debug!(node_index = node.node_index, "exchange committed");

        if node.node_index == 1 {
            self.name_from_first_exchange(session_id, user_message, &generated.text)
                .await;
        }

        Ok(node)
    }

    /// Name the session from its first exchange. Failures only warn: the
    /// node is already committed and the placeholder name remains usable.
    async fn name_from_first_exchange(
        &self,
        session_id: &str,
        user_message: &str,
        ai_response: &str,
    ) {
        let name = match name_session(
            self.generator.as_ref(),
            user_message,
            ai_response,
            self.limits.name_max_words,
        )
        .await
        {
            Ok(name) => name,
            Err(err) => {
                warn!(session_id, %err, "session naming failed, keeping placeholder");
                return;
            }
        };
        if let Err(err) = self.store.rename_session(session_id, &name) {
            warn!(session_id, %err, "session rename failed, keeping placeholder");
        }
    }

    /// Delete nodes plus their descendant closure and repoint the active
    /// node. Returns the new active node index.
    #[instrument(skip(self, node_indices), fields(session_id))]
    pub fn delete_nodes(&self, session_id: &str, node_indices: &[i64]) -> Result<Option<i64>> {
        Ok(self.store.delete_subtree(session_id, node_indices)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
