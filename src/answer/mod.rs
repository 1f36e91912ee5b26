//! Answer synthesis
//!
//! Renders ranked results plus the original question into a conversational
//! answer via the generation service. Empty result sets never reach the
//! service, and a failed generation call degrades to a deterministic
//! enumerated list.

use anyhow::Result;

use crate::ai::{CompletionRequest, LlmService};
use crate::items::StoredItem;
use crate::query::QueryFilters;
use crate::store::ItemStore;

/// Fixed reply for an empty result set. Returned without any AI call.
pub const NO_ITEMS_MESSAGE: &str =
    "No items found matching your query. Try a different search or check your saved tasks and ideas.";

/// At most this many results are rendered into the generation context
const CONTEXT_CAP: usize = 50;

/// How many records the deterministic fallback re-fetches
const FALLBACK_FETCH_CAP: usize = 100;

/// How many matches the deterministic fallback lists
const FALLBACK_LIST_CAP: usize = 5;

/// Answer synthesizer: one generation call, then a deterministic renderer
pub struct AnswerSynthesizer<'a> {
    llm: &'a dyn LlmService,
    store: &'a ItemStore,
}

impl<'a> AnswerSynthesizer<'a> {
    pub fn new(llm: &'a dyn LlmService, store: &'a ItemStore) -> Self {
        Self { llm, store }
    }

    /// Produce an answer for `query` from `results`.
    ///
    /// AI failures are absorbed by the fallback renderer; only a store
    /// failure inside that fallback propagates.
    pub fn synthesize(&self, query: &str, results: &[StoredItem], owner: &str) -> Result<String> {
        if results.is_empty() {
            return Ok(NO_ITEMS_MESSAGE.to_string());
        }

        match self.synthesize_with_service(query, results) {
            Ok(answer) => Ok(answer),
            Err(_) => self.fallback_answer(query, owner),
        }
    }

    fn synthesize_with_service(&self, query: &str, results: &[StoredItem]) -> Result<String> {
        let context = render_context(results);

        let system = format!(
            "You are a helpful assistant that helps users query their saved tasks and ideas.\n\n\
             The user asked: \"{query}\"\n\n\
             Here are the relevant items found ({} total):\n\n\
             {context}\n\n\
             RESPONSE STYLE:\n\
             - Write in natural, conversational language - avoid field labels and bullet points\n\
             - Weave information into flowing sentences\n\
             - Use *single asterisks* for bold text on task/idea content\n\
             - DO NOT use **double asterisks** or emojis\n\
             - Be concise but friendly and professional\n\
             - Format dates naturally (e.g., \"November 10th\" instead of \"2024-11-10\")\n\
             - Group related items when it makes sense\n\n\
             Answer the user's question in a natural, conversational way. Be specific and \
             reference the actual tasks/ideas they've saved, but make it sound like you're \
             talking to them, not listing database fields.",
            results.len(),
        );

        let request = CompletionRequest::conversational(system, query);
        self.llm.complete(&request)
    }

    /// Deterministic renderer: re-fetch the owner's records, substring
    /// match on content, list the top matches.
    fn fallback_answer(&self, query: &str, owner: &str) -> Result<String> {
        let items = self
            .store
            .query(owner, &QueryFilters::default(), FALLBACK_FETCH_CAP)?;

        let keywords: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 3)
            .map(str::to_string)
            .collect();

        let matches: Vec<&StoredItem> = items
            .iter()
            .filter(|item| {
                let content = item.content.to_lowercase();
                keywords.iter().any(|k| content.contains(k))
            })
            .collect();

        if matches.is_empty() {
            return Ok(format!(
                "No items found matching \"{query}\". Try a different search term."
            ));
        }

        let mut response = format!("Found {} item(s) matching \"{query}\":\n\n", matches.len());
        for (idx, item) in matches.iter().take(FALLBACK_LIST_CAP).enumerate() {
            response.push_str(&format!("{}. *{}*\n", idx + 1, item.content));
            if let Some(priority) = item.priority {
                response.push_str(&format!("   Priority: {priority}\n"));
            }
            if let Some(category) = &item.category {
                response.push_str(&format!("   Category: {category}\n"));
            }
            response.push('\n');
        }

        if matches.len() > FALLBACK_LIST_CAP {
            response.push_str(&format!(
                "...and {} more. Try narrowing your search.",
                matches.len() - FALLBACK_LIST_CAP
            ));
        }

        Ok(response.trim_end().to_string())
    }
}

/// Compact multi-line context blocks for the generation prompt
fn render_context(results: &[StoredItem]) -> String {
    results
        .iter()
        .take(CONTEXT_CAP)
        .enumerate()
        .map(|(idx, item)| {
            format!(
                "{}. [{}] {}\n   - Priority: {}\n   - Category: {}\n   - Deadline: {}\n   - Status: {}\n   - Tags: {}\n   - Created: {}",
                idx + 1,
                item.kind.as_str().to_uppercase(),
                item.content,
                item.priority.map(|p| p.as_str()).unwrap_or("not set"),
                item.category.as_deref().unwrap_or("none"),
                item.deadline
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                item.status,
                if item.tags.is_empty() {
                    "none".to_string()
                } else {
                    item.tags.join(",")
                },
                item.created_at.format("%Y-%m-%d"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ClassifiedItem, ItemKind, Priority};
    use anyhow::bail;
    use std::cell::Cell;

    struct Scripted(&'static str);

    impl LlmService for Scripted {
        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl LlmService for Failing {
        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            bail!("generation failed")
        }
    }

    /// Counts calls so tests can assert the service was never touched
    struct Counting {
        calls: Cell<usize>,
    }

    impl LlmService for Counting {
        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok("answer".to_string())
        }
    }

    fn seed(store: &ItemStore, content: &str, priority: Option<Priority>) -> StoredItem {
        let id = store
            .save(
                "a",
                &ClassifiedItem {
                    kind: ItemKind::Task,
                    content: content.to_string(),
                    priority,
                    category: Some("personal".to_string()),
                    deadline: None,
                    tags: vec![],
                },
                None,
            )
            .unwrap();
        store.get("a", id).unwrap().unwrap()
    }

    #[test]
    fn test_empty_results_skip_the_service() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let llm = Counting { calls: Cell::new(0) };

        let answer = AnswerSynthesizer::new(&llm, &store).synthesize("show books", &[], "a")?;

        assert_eq!(answer, NO_ITEMS_MESSAGE);
        assert_eq!(llm.calls.get(), 0);
        Ok(())
    }

    #[test]
    fn test_service_answer_passes_through() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let item = seed(&store, "Read Atomic Habits", None);
        let llm = Scripted("You wanted to read *Atomic Habits*.");

        let answer =
            AnswerSynthesizer::new(&llm, &store).synthesize("which books", &[item], "a")?;
        assert!(answer.contains("Atomic Habits"));
        Ok(())
    }

    #[test]
    fn test_fallback_lists_matches() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let item = seed(&store, "Read Atomic Habits", Some(Priority::Medium));
        seed(&store, "Water the plants", None);

        let answer = AnswerSynthesizer::new(&Failing, &store)
            .synthesize("which books should I read", &[item], "a")?;

        assert!(answer.contains("*Read Atomic Habits*"));
        assert!(answer.contains("Priority: medium"));
        assert!(!answer.contains("Water the plants"));
        Ok(())
    }

    #[test]
    fn test_fallback_no_match_message() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let item = seed(&store, "Water the plants", None);

        let answer = AnswerSynthesizer::new(&Failing, &store)
            .synthesize("anything about sailing", &[item], "a")?;
        assert!(answer.starts_with("No items found matching"));
        Ok(())
    }

    #[test]
    fn test_fallback_truncates_with_suffix() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let mut first = None;
        for i in 0..8 {
            let item = seed(&store, &format!("project milestone {i}"), None);
            first.get_or_insert(item);
        }

        let answer = AnswerSynthesizer::new(&Failing, &store).synthesize(
            "status of the project",
            &[first.unwrap()],
            "a",
        )?;

        assert!(answer.contains("...and 3 more"));
        Ok(())
    }

    #[test]
    fn test_render_context_block_shape() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let item = seed(&store, "Read Atomic Habits", Some(Priority::High));

        let context = render_context(&[item]);
        assert!(context.starts_with("1. [TASK] Read Atomic Habits"));
        assert!(context.contains("- Priority: high"));
        assert!(context.contains("- Status: pending"));
        Ok(())
    }
}
