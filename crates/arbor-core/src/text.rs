//! Word-bounded text clamping.
//!
//! The summarizer instructs the model to answer within a word budget, but
//! the model is not trusted to obey. These helpers enforce the budget after
//! the fact by splitting on whitespace.

/// Marker appended when a clamp actually truncates.
pub const CLAMP_MARKER: &str = "...";

/// Clamp `s` to at most `max_words` whitespace-separated words.
///
/// If the input fits, it is returned trimmed but otherwise unchanged. If it
/// exceeds the budget, the first `max_words` words are kept and
/// [`CLAMP_MARKER`] is appended.
pub fn clamp_words(s: &str, max_words: usize) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let mut clamped = words[..max_words].join(" ");
    clamped.push_str(CLAMP_MARKER);
    clamped
}

/// Count whitespace-separated words in `s`.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
