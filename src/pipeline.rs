//! Ingestion pipeline
//!
//! The entry point the messaging channel hands messages to: classify,
//! gate on confidence, then either persist items (write path) or analyze,
//! search and synthesize (read path). Store failures bubble up to the
//! caller; everything AI-related degrades internally.

use anyhow::Result;
use chrono::NaiveDate;

use crate::ai::LlmService;
use crate::answer::AnswerSynthesizer;
use crate::classify::{Intent, IntentClassifier};
use crate::items::{ClassifiedItem, InboundMessage, ItemKind, Priority};
use crate::query::QueryAnalyzer;
use crate::search::SearchExecutor;
use crate::store::ItemStore;

/// What one handled message produced
#[derive(Debug)]
pub enum Outcome {
    /// Items were persisted on the write path
    Saved {
        items: Vec<SavedItem>,
        /// Fragments the fallback decomposer could not classify
        skipped_fragments: usize,
    },
    /// The read path produced an answer to relay back
    Answer(String),
    /// Not actionable - low confidence, casual chatter, or empty
    Ignored,
}

/// Confirmation payload for one persisted item
#[derive(Debug, Clone)]
pub struct SavedItem {
    pub id: i64,
    pub kind: ItemKind,
    pub content: String,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub deadline: Option<NaiveDate>,
}

/// Message pipeline over one AI service and one store
pub struct Pipeline<'a> {
    llm: &'a dyn LlmService,
    store: &'a ItemStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(llm: &'a dyn LlmService, store: &'a ItemStore) -> Self {
        Self { llm, store }
    }

    /// Handle one inbound message.
    ///
    /// Re-delivered messages are reclassified and re-persisted; dedup is
    /// the delivery layer's responsibility.
    pub fn handle(&self, message: &InboundMessage) -> Result<Outcome> {
        let result = IntentClassifier::new(self.llm).classify(message);

        if !result.is_actionable() {
            return Ok(Outcome::Ignored);
        }

        match result.intent {
            Intent::Query => Ok(Outcome::Answer(self.answer(message)?)),
            Intent::Single(item) => self.persist(message, vec![item], 0),
            Intent::Multi(items) => self.persist(message, items, result.skipped_fragments),
            Intent::None => Ok(Outcome::Ignored),
        }
    }

    /// Read path: analyze the question, run the search, synthesize
    pub fn answer(&self, message: &InboundMessage) -> Result<String> {
        let today = message.timestamp.date_naive();
        let analysis = QueryAnalyzer::new(self.llm).analyze(&message.text, today);
        let results = SearchExecutor::new(self.store).execute(&analysis, &message.owner)?;

        AnswerSynthesizer::new(self.llm, self.store).synthesize(
            &message.text,
            &results,
            &message.owner,
        )
    }

    fn persist(
        &self,
        message: &InboundMessage,
        items: Vec<ClassifiedItem>,
        skipped_fragments: usize,
    ) -> Result<Outcome> {
        let context = serde_json::json!({
            "sender": message.owner,
            "timestamp": message.timestamp.to_rfc3339(),
            "correlation_id": message.correlation_id,
        })
        .to_string();

        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            let id = self.store.save(&message.owner, &item, Some(&context))?;
            saved.push(SavedItem {
                id,
                kind: item.kind,
                content: item.content,
                priority: item.priority,
                category: item.category,
                deadline: item.deadline,
            });
        }

        Ok(Outcome::Saved {
            items: saved,
            skipped_fragments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::CompletionRequest;
    use crate::answer::NO_ITEMS_MESSAGE;
    use crate::query::QueryFilters;
    use anyhow::bail;
    use chrono::{TimeZone, Utc};

    struct Scripted(&'static str);

    impl LlmService for Scripted {
        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl LlmService for Failing {
        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            bail!("service down")
        }
    }

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            text: text.to_string(),
            owner: "owner-a".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 11, 10, 9, 0, 0).unwrap(),
            correlation_id: None,
        }
    }

    #[test]
    fn test_write_path_fallback_two_items() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let pipeline = Pipeline::new(&Failing, &store);

        let outcome = pipeline.handle(&message("Read Atomic Habits, call mom tomorrow"))?;
        match outcome {
            Outcome::Saved { items, skipped_fragments } => {
                assert_eq!(items.len(), 2);
                assert_eq!(skipped_fragments, 0);
                assert!(items[0].deadline.is_none());
                assert_eq!(items[1].deadline.unwrap().to_string(), "2024-11-11");
            }
            other => panic!("expected saved outcome, got {other:?}"),
        }

        let stored = store.query("owner-a", &QueryFilters::default(), 50)?;
        assert_eq!(stored.len(), 2);
        Ok(())
    }

    #[test]
    fn test_read_path_empty_store_fixed_message() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let pipeline = Pipeline::new(&Failing, &store);

        let outcome = pipeline.handle(&message("show ideas about gardening"))?;
        match outcome {
            Outcome::Answer(answer) => assert_eq!(answer, NO_ITEMS_MESSAGE),
            other => panic!("expected answer outcome, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_low_confidence_never_persists() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let llm = Scripted(
            r#"{"type": "task", "content": "might be something", "confidence": 0.2}"#,
        );
        let pipeline = Pipeline::new(&llm, &store);

        let outcome = pipeline.handle(&message("hmm not sure"))?;
        assert!(matches!(outcome, Outcome::Ignored));

        let stored = store.query("owner-a", &QueryFilters::default(), 50)?;
        assert!(stored.is_empty());
        Ok(())
    }

    #[test]
    fn test_none_intent_is_ignored() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let llm = Scripted(r#"{"type": "none", "confidence": 0.9}"#);
        let pipeline = Pipeline::new(&llm, &store);

        let outcome = pipeline.handle(&message("good morning!"))?;
        assert!(matches!(outcome, Outcome::Ignored));
        Ok(())
    }

    #[test]
    fn test_service_classification_persists_item() -> Result<()> {
        let store = ItemStore::open_in_memory()?;
        let llm = Scripted(
            r#"{
                "type": "idea",
                "content": "Start a reading club",
                "priority": "low",
                "category": "personal",
                "deadline": null,
                "tags": ["reading", "books", "club"],
                "confidence": 0.9
            }"#,
        );
        let pipeline = Pipeline::new(&llm, &store);

        let outcome = pipeline.handle(&message("what if we started a reading club"))?;
        let Outcome::Saved { items, .. } = outcome else {
            panic!("expected saved outcome");
        };
        assert_eq!(items[0].kind, ItemKind::Idea);

        let stored = store.get("owner-a", items[0].id)?.unwrap();
        assert_eq!(stored.tags, vec!["reading", "books", "club"]);
        assert!(stored.context.as_deref().unwrap().contains("owner-a"));
        Ok(())
    }
}
