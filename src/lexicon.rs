//! Shared heuristic vocabulary
//!
//! Both fallback pipelines (message classification and query analysis)
//! consume these lists, so the task/idea/query vocabulary cannot drift
//! between them.

/// Phrases that mark a fragment as an actionable task
pub const TASK_KEYWORDS: &[&str] = &[
    "need to", "must", "have to", "should", "finish", "complete", "do", "call", "email", "buy",
    "send", "schedule", "remind",
];

/// Phrases that mark a fragment as an idea. Checked before task keywords.
pub const IDEA_KEYWORDS: &[&str] = &[
    "idea:", "thought:", "maybe", "could", "what if", "consider", "explore", "think about",
    "brainstorm",
];

/// Words that mark a whole message as a retrieval question
pub const QUERY_KEYWORDS: &[&str] = &["show", "list", "get", "what", "which", "pending", "display"];

/// Words never worth keeping as tags
pub const TAG_STOPWORDS: &[&str] = &["the", "and", "for", "with", "also", "then"];

/// Words excluded from query keyword extraction
///
/// Includes the type/priority/status vocabulary so filter words are not
/// double-counted as search terms.
pub const QUERY_STOPWORDS: &[&str] = &[
    "show", "list", "get", "all", "the", "and", "for", "with", "about", "task", "tasks", "idea",
    "ideas", "pending", "high", "medium", "low", "priority", "what", "which", "display", "also",
    "then",
];

/// True if `text` contains any of `words` as a substring.
/// Callers are expected to lowercase `text` first.
pub fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_any() {
        assert!(contains_any("i need to call mom", TASK_KEYWORDS));
        assert!(contains_any("what if we tried rust", IDEA_KEYWORDS));
        assert!(contains_any("show pending tasks", QUERY_KEYWORDS));
        assert!(!contains_any("quantum gardening", TASK_KEYWORDS));
    }

    #[test]
    fn test_query_stopwords_cover_filter_vocabulary() {
        for word in ["task", "ideas", "pending", "high", "priority"] {
            assert!(QUERY_STOPWORDS.contains(&word), "missing stopword: {word}");
        }
    }
}
