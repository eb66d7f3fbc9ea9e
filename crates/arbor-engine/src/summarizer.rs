//! Incremental exchange summaries and one-shot session naming.
//!
//! Both helpers prompt the model with a hard word budget and then enforce
//! the budget themselves with [`clamp_words`], since the model is not
//! trusted to obey. Upstream failures propagate to the caller.

use tracing::debug;

use arbor_core::messages::ChatMessage;
use arbor_core::text::clamp_words;
use arbor_llm::{LlmError, TextGenerator};

/// Word budget for node summaries.
pub const SUMMARY_MAX_WORDS: usize = 10;

/// Word budget for session names.
pub const NAME_MAX_WORDS: usize = 4;

/// Summarize one exchange in at most `max_words` words.
///
/// `previous_summaries` is the summary chain along the ancestor path,
/// oldest first. It is offered to the model as context only; the produced
/// summary covers just this exchange.
pub async fn summarize(
    generator: &dyn TextGenerator,
    previous_summaries: &[String],
    user_message: &str,
    ai_response: &str,
    max_words: usize,
) -> Result<String, LlmError> {
    let previous = previous_summaries.join("\n");
    let messages = vec![
        ChatMessage::system(
            "You are a summarization AI. Your task is to create an EXTREMELY concise summary.",
        ),
        ChatMessage::system(format!(
            "CRITICAL INSTRUCTION: Your response MUST be EXACTLY {max_words} WORDS OR LESS. \
             No exceptions."
        )),
        ChatMessage::system(
            "DO NOT include any text other than the summary itself. \
             No introductions or explanations.",
        ),
        ChatMessage::system("Examples of good summaries:"),
        ChatMessage::system("User asked about Python; AI explained basic syntax"),
        ChatMessage::system("Discussed benefits and drawbacks of machine learning"),
        ChatMessage::system("User requested recipe; AI provided pasta instructions"),
        ChatMessage::system(format!("Previous summaries for context:\n{previous}")),
        ChatMessage::user(format!(
            "Summarize this exchange in {max_words} words or less:\n\
             User: {user_message}\nAI: {ai_response}\n\nHere is the summary:"
        )),
    ];

    let generated = generator.generate(&messages).await?;
    let summary = clamp_words(generated.text.trim(), max_words);
    debug!(words = max_words, summary, "exchange summarized");
    Ok(summary)
}

/// Produce a session name of at most `max_words` words from the first
/// exchange.
pub async fn name_session(
    generator: &dyn TextGenerator,
    user_message: &str,
    ai_response: &str,
    max_words: usize,
) -> Result<String, LlmError> {
    let messages = vec![
        ChatMessage::system(
            "You are a naming AI. Your task is to create an EXTREMELY concise session name.",
        ),
        ChatMessage::system(format!(
            "CRITICAL INSTRUCTION: Your response MUST be EXACTLY {max_words} WORDS OR LESS. \
             No exceptions."
        )),
        ChatMessage::system(
            "DO NOT include any text other than the session name itself. \
             No introductions or explanations.",
        ),
        ChatMessage::user(format!(
            "Create a {max_words}-word or less name for this chat session:\n\
             User: {user_message}\nAI: {ai_response}"
        )),
    ];

    let generated = generator.generate(&messages).await?;
    Ok(clamp_words(generated.text.trim(), max_words))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
