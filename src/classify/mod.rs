//! Intent classification and multi-intent decomposition
//!
//! One inbound message becomes zero or more classified items, a query
//! intent, or nothing. The AI service does the heavy lifting; when it
//! fails, times out, or returns something unusable, a deterministic
//! keyword chain takes over. `classify` never returns an error.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::ai::{CompletionRequest, LlmService};
use crate::heuristics::{classify_fragment, is_query, split_fragments};
use crate::items::{ClassifiedItem, InboundMessage};

/// Results below this confidence are not actionable and must be dropped
/// by the caller - nothing below it is ever persisted or answered.
pub const MIN_ACTIONABLE_CONFIDENCE: f32 = 0.3;

const CLASSIFY_PROMPT: &str = r#"You are an AI assistant that helps categorize messages into tasks and ideas.

Your job is to:
1. Determine if a message is a TASK, IDEA, or QUERY
2. Detect MULTIPLE distinct tasks/ideas in a single message
3. Extract relevant information from each item
4. Generate searchable tags for better retrieval
5. Return structured JSON

TASK: Something that needs to be done, has action items, deadlines, or to-do elements
IDEA: A suggestion, concept, thought, or brainstorming item for the future
QUERY: A question asking to retrieve or show existing tasks/ideas (like "show tasks", "list ideas")

MULTI-INTENT DETECTION:
- If a message contains MULTIPLE distinct tasks/ideas separated by commas, "and", "also", "then", etc., split them into separate items
- Each item should be analyzed independently with its own priority, category, deadline, and tags

For TASKS and IDEAS, extract:
- priority: high (urgent, ASAP, critical), medium (normal), low (nice to have) - infer from context
- category: personal, interns, identity labs, or suggest a new category based on content (lowercase, hyphenated if multiple words)
- deadline: parse natural language dates ("by Friday", "tomorrow", "next week") into ISO format (YYYY-MM-DD)
- content: clean, clear description of the task/idea
- tags: 5-10 searchable keywords/tags that describe the content semantically, lowercase and hyphenated for multi-word tags

Return ONLY valid JSON in this exact format:

For MULTIPLE tasks/ideas:
{
  "items": [
    {
      "type": "task" | "idea",
      "content": "cleaned and clear description",
      "priority": "high" | "medium" | "low",
      "category": "category name",
      "deadline": "YYYY-MM-DD" or null,
      "tags": ["tag1", "tag2", "tag3"]
    }
  ],
  "confidence": 0.0-1.0
}

For a SINGLE task/idea:
{
  "type": "task" | "idea",
  "content": "cleaned and clear description",
  "priority": "high" | "medium" | "low",
  "category": "category name",
  "deadline": "YYYY-MM-DD" or null,
  "tags": ["tag1", "tag2", "tag3"],
  "confidence": 0.0-1.0
}

For queries:
{
  "type": "query",
  "confidence": 0.0-1.0
}

For casual messages that are neither tasks, ideas, nor queries:
{
  "type": "none",
  "confidence": 0.0-1.0
}

Confidence should reflect how certain you are about the classification."#;

/// What one message turned out to be
#[derive(Debug, Clone)]
pub enum Intent {
    /// One task or idea
    Single(ClassifiedItem),
    /// Two or more independent items found in one message
    Multi(Vec<ClassifiedItem>),
    /// A retrieval question
    Query,
    /// Nothing actionable
    None,
}

/// Classification outcome with its certainty
#[derive(Debug, Clone)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f32,
    /// Fragments the fallback decomposer could not classify. Surfaced so
    /// nothing is dropped silently.
    pub skipped_fragments: usize,
}

impl IntentResult {
    fn new(intent: Intent, confidence: f32) -> Self {
        Self {
            intent,
            confidence,
            skipped_fragments: 0,
        }
    }

    /// Below the hard actionability gate
    pub fn is_actionable(&self) -> bool {
        self.confidence >= MIN_ACTIONABLE_CONFIDENCE
    }
}

/// Wire shapes the classification service may return. Decoded as a tagged
/// family of schemas, not by sniffing property presence.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireIntent {
    Envelope {
        items: Vec<ClassifiedItem>,
        #[serde(default)]
        confidence: Option<f32>,
    },
    Marker {
        #[serde(rename = "type")]
        marker: MarkerKind,
        #[serde(default)]
        confidence: Option<f32>,
    },
    Single {
        #[serde(flatten)]
        item: ClassifiedItem,
        #[serde(default)]
        confidence: Option<f32>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MarkerKind {
    Query,
    None,
}

/// Confidence used when the service omits the field
const DEFAULT_SERVICE_CONFIDENCE: f32 = 0.5;

/// Intent classifier: one AI call, then the deterministic keyword chain
pub struct IntentClassifier<'a> {
    llm: &'a dyn LlmService,
}

impl<'a> IntentClassifier<'a> {
    pub fn new(llm: &'a dyn LlmService) -> Self {
        Self { llm }
    }

    /// Classify one message. Never fails: any service error, timeout or
    /// malformed response drops to the fallback chain.
    pub fn classify(&self, message: &InboundMessage) -> IntentResult {
        let today = message.timestamp.date_naive();

        self.classify_with_service(message)
            .unwrap_or_else(|_| fallback_classify(&message.text, today))
    }

    fn classify_with_service(&self, message: &InboundMessage) -> Result<IntentResult> {
        let user = format!(
            "Message: \"{}\"\n\nContext: {}, sent at {}",
            message.text,
            message.owner,
            message.timestamp.to_rfc3339(),
        );

        let request = CompletionRequest::structured(CLASSIFY_PROMPT, user);
        let response = self.llm.complete(&request)?;

        let wire: WireIntent =
            serde_json::from_str(&response).context("Unparseable classification response")?;

        normalize_wire_intent(wire)
    }
}

/// Collapse the wire shapes into an `IntentResult`, enforcing the
/// multi-intent invariant: fewer than two items is single intent.
fn normalize_wire_intent(wire: WireIntent) -> Result<IntentResult> {
    match wire {
        WireIntent::Envelope { items, confidence } => {
            let confidence = confidence.unwrap_or(DEFAULT_SERVICE_CONFIDENCE);
            let mut items: Vec<ClassifiedItem> =
                items.into_iter().filter_map(sanitize_item).collect();

            match items.len() {
                0 => anyhow::bail!("Multi-intent envelope contained no usable items"),
                1 => Ok(IntentResult::new(
                    Intent::Single(items.remove(0)),
                    confidence,
                )),
                _ => Ok(IntentResult::new(Intent::Multi(items), confidence)),
            }
        }
        WireIntent::Marker { marker, confidence } => {
            let confidence = confidence.unwrap_or(DEFAULT_SERVICE_CONFIDENCE);
            let intent = match marker {
                MarkerKind::Query => Intent::Query,
                MarkerKind::None => Intent::None,
            };
            Ok(IntentResult::new(intent, confidence))
        }
        WireIntent::Single { item, confidence } => {
            let confidence = confidence.unwrap_or(DEFAULT_SERVICE_CONFIDENCE);
            let item = sanitize_item(item)
                .context("Classification response had empty item content")?;
            Ok(IntentResult::new(Intent::Single(item), confidence))
        }
    }
}

/// Trim content and tags; an item with no content after trimming is unusable
fn sanitize_item(mut item: ClassifiedItem) -> Option<ClassifiedItem> {
    item.content = item.content.trim().to_string();
    if item.content.is_empty() {
        return None;
    }

    item.tags = item
        .tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    Some(item)
}

/// Deterministic classification chain: query check first (it short-circuits
/// fragment splitting), then multi-intent decomposition, then the whole
/// message as one fragment.
fn fallback_classify(text: &str, today: NaiveDate) -> IntentResult {
    if is_query(text) {
        return IntentResult::new(Intent::Query, 0.5);
    }

    let fragments = split_fragments(text);
    if fragments.len() > 1 {
        let mut items = Vec::new();
        let mut skipped = 0usize;
        for fragment in &fragments {
            match classify_fragment(fragment, today) {
                Some(item) => items.push(item),
                None => skipped += 1,
            }
        }

        if items.len() >= 2 {
            return IntentResult {
                intent: Intent::Multi(items),
                confidence: 0.5,
                skipped_fragments: skipped,
            };
        }
    }

    match classify_fragment(text, today) {
        Some(item) => IntentResult::new(Intent::Single(item), 0.6),
        None => IntentResult::new(Intent::None, 0.7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemKind, Priority};
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
            bail!("timed out after 30s")
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
    fn test_service_single_item() {
        let llm = Scripted(
            r#"{
                "type": "task",
                "content": "Finish the quarterly report",
                "priority": "high",
                "category": "identity labs",
                "deadline": "2024-11-15",
                "tags": ["report", "quarterly"],
                "confidence": 0.92
            }"#,
        );

        let result = IntentClassifier::new(&llm).classify(&message("finish the report by friday"));
        assert!((result.confidence - 0.92).abs() < 1e-6);
        match result.intent {
            Intent::Single(item) => {
                assert_eq!(item.kind, ItemKind::Task);
                assert_eq!(item.priority, Some(Priority::High));
                assert_eq!(item.deadline.unwrap().to_string(), "2024-11-15");
            }
            other => panic!("expected single intent, got {other:?}"),
        }
    }

    #[test]
    fn test_service_multi_item_envelope() {
        let llm = Scripted(
            r#"{
                "items": [
                    {"type": "task", "content": "Buy groceries", "priority": "medium",
                     "category": "personal", "deadline": null, "tags": ["groceries"]},
                    {"type": "idea", "content": "Plan a vacation", "priority": "low",
                     "category": "personal", "deadline": null, "tags": ["vacation", "travel"]}
                ],
                "confidence": 0.85
            }"#,
        );

        let result = IntentClassifier::new(&llm).classify(&message("buy groceries and plan vacation"));
        match result.intent {
            Intent::Multi(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].kind, ItemKind::Idea);
            }
            other => panic!("expected multi intent, got {other:?}"),
        }
    }

    #[test]
    fn test_single_item_envelope_collapses() {
        let llm = Scripted(
            r#"{
                "items": [
                    {"type": "task", "content": "Buy groceries", "tags": []}
                ],
                "confidence": 0.8
            }"#,
        );

        let result = IntentClassifier::new(&llm).classify(&message("buy groceries"));
        assert!(matches!(result.intent, Intent::Single(_)));
    }

    #[test]
    fn test_service_query_and_none_markers() {
        let llm = Scripted(r#"{"type": "query", "confidence": 0.95}"#);
        let result = IntentClassifier::new(&llm).classify(&message("show my tasks"));
        assert!(matches!(result.intent, Intent::Query));

        let llm = Scripted(r#"{"type": "none", "confidence": 0.7}"#);
        let result = IntentClassifier::new(&llm).classify(&message("lol ok"));
        assert!(matches!(result.intent, Intent::None));
    }

    #[test]
    fn test_malformed_response_uses_fallback() {
        let llm = Scripted("I could not classify this, sorry!");
        let result = IntentClassifier::new(&llm).classify(&message("call mom tomorrow"));

        assert!((result.confidence - 0.6).abs() < 1e-6);
        match result.intent {
            Intent::Single(item) => {
                assert_eq!(item.kind, ItemKind::Task);
                assert_eq!(item.deadline.unwrap().to_string(), "2024-11-11");
            }
            other => panic!("expected single intent, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_item_kind_uses_fallback() {
        let llm = Scripted(r#"{"type": "note", "content": "hmm", "confidence": 0.9}"#);
        let result = IntentClassifier::new(&llm).classify(&message("call mom"));

        // "note" is out of vocabulary, so the whole response is malformed
        assert!((result.confidence - 0.6).abs() < 1e-6);
        assert!(matches!(result.intent, Intent::Single(_)));
    }

    #[test]
    fn test_empty_envelope_uses_fallback() {
        let llm = Scripted(r#"{"items": [], "confidence": 0.9}"#);
        let result = IntentClassifier::new(&llm).classify(&message("show my pending tasks"));

        // Fallback sees query keywords
        assert!(matches!(result.intent, Intent::Query));
        assert!((result.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_fallback_query_short_circuits_splitting() {
        let result =
            IntentClassifier::new(&Failing).classify(&message("show my pending tasks and ideas"));

        assert!(matches!(result.intent, Intent::Query));
        assert!((result.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_fallback_multi_intent_decomposition() {
        let result = IntentClassifier::new(&Failing)
            .classify(&message("Read Atomic Habits, call mom tomorrow"));

        assert!((result.confidence - 0.5).abs() < 1e-6);
        assert_eq!(result.skipped_fragments, 0);
        match result.intent {
            Intent::Multi(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].content, "Read Atomic Habits");
                assert!(items[0].deadline.is_none());
                assert_eq!(items[1].content, "call mom tomorrow");
                assert_eq!(items[1].deadline.unwrap().to_string(), "2024-11-11");
            }
            other => panic!("expected multi intent, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_fragment_count_matches_split() {
        let text = "Buy milk, call mom, and think about vacation";
        let result = IntentClassifier::new(&Failing).classify(&message(text));

        match result.intent {
            Intent::Multi(items) => {
                assert_eq!(items.len(), split_fragments(text).len());
                assert_eq!(items[2].kind, ItemKind::Idea); // "think about" is idea vocabulary
            }
            other => panic!("expected multi intent, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_empty_message_is_none() {
        let result = IntentClassifier::new(&Failing).classify(&message("   "));
        assert!(matches!(result.intent, Intent::None));
        assert!((result.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_actionability_gate() {
        let low = IntentResult::new(Intent::Query, 0.2);
        assert!(!low.is_actionable());

        let ok = IntentResult::new(Intent::Query, 0.3);
        assert!(ok.is_actionable());
    }
}
