//! Context reconstruction from an ancestor path.
//!
//! The model sees the conversation as one linear transcript: the system
//! directive, then every ancestor exchange from the root down to the chosen
//! parent, then the new user message. Branches other than the chosen one
//! contribute nothing. No truncation or windowing is applied.

use arbor_core::messages::ChatMessage;
use arbor_store::NodeRow;

/// System directive prepended to every chat context.
pub const ASSISTANT_DIRECTIVE: &str = "You are a helpful AI assistant. \
     Provide short and concise answers to users' questions. \
     Do not make long responses that are unnecessary.";

/// Build the full message list for one exchange.
///
/// `path` must be oldest-first (root → parent), as produced by
/// `TreeStore::ancestor_path`. An empty path yields just the directive and
/// the new user message.
pub fn build_context(path: &[NodeRow], user_message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(path.len() * 2 + 2);
    messages.push(ChatMessage::system(ASSISTANT_DIRECTIVE));
    for node in path {
        messages.push(ChatMessage::user(&node.user_message));
        messages.push(ChatMessage::assistant(&node.ai_response));
    }
    messages.push(ChatMessage::user(user_message));
    messages
}

/// Summaries along the path, oldest first. Nodes without a stored summary
/// are skipped.
pub fn summary_chain(path: &[NodeRow]) -> Vec<String> {
    path.iter()
        .filter_map(|node| node.summary.clone())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use arbor_core::messages::Role;

    fn node(index: i64, user: &str, ai: &str, summary: Option<&str>) -> NodeRow {
        NodeRow {
            session_id: "sess_test".into(),
            node_index: index,
            user_message: user.into(),
            ai_response: ai.into(),
            summary: summary.map(Into::into),
            parent_node_index: if index > 1 { Some(index - 1) } else { None },
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn empty_path_is_directive_plus_user_message() {
        let messages = build_context(&[], "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, ASSISTANT_DIRECTIVE);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn ancestors_expand_to_ordered_pairs() {
        let path = vec![
            node(1, "q1", "a1", Some("s1")),
            node(2, "q2", "a2", Some("s2")),
        ];
        let messages = build_context(&path, "q3");

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[1].content, "q1");
        assert_eq!(messages[2].content, "a1");
        assert_eq!(messages[3].content, "q2");
        assert_eq!(messages[4].content, "a2");
        assert_eq!(messages[5].content, "q3");
    }

    #[test]
    fn summary_chain_preserves_order_and_skips_missing() {
        let path = vec![
            node(1, "q1", "a1", Some("first")),
            node(2, "q2", "a2", None),
            node(3, "q3", "a3", Some("third")),
        ];
        assert_eq!(summary_chain(&path), vec!["first".to_string(), "third".to_string()]);
    }
}
