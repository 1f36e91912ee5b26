//! AI-backed query analysis with a deterministic fallback

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{QueryAnalysis, QueryFilters, SearchType, DEFAULT_QUERY_LIMIT};
use crate::ai::{CompletionRequest, LlmService};
use crate::heuristics::analyze_query_fallback;

const ANALYSIS_PROMPT: &str = r#"You are a query analyzer that extracts structured filters and keywords from natural language queries.

Your job is to analyze a user query and extract:
1. Structural filters (priority, status, category, date ranges)
2. Search keywords/concepts for semantic matching
3. Query intent

Examples:

Query: "show high priority tasks due this week"
{
  "filters": {
    "priority": "high",
    "status": "pending",
    "deadlineFrom": "2024-11-04",
    "deadlineTo": "2024-11-10",
    "type": "task"
  },
  "keywords": [],
  "searchType": "structural",
  "limit": 50
}

Query: "which books I wanted to read"
{
  "filters": {
    "status": "pending"
  },
  "keywords": ["books", "reading", "read"],
  "searchType": "conceptual",
  "limit": 50
}

Query: "ideas about fitness"
{
  "filters": {
    "type": "idea",
    "status": "pending"
  },
  "keywords": ["fitness", "workout", "exercise", "gym", "health"],
  "searchType": "conceptual",
  "limit": 50
}

Rules:
- searchType: "structural" if the query has clear filters (dates, priority, status, category)
- searchType: "conceptual" if the query is about topics/concepts/things
- searchType: "hybrid" if it has both
- keywords: extract main concepts and related terms (3-10 keywords)
- Date ranges: convert relative dates to ISO format (today's date context will be provided)
- Default status to "pending" unless specified
- limit: default 50, but can be higher for "all" or "everything" queries

Return ONLY valid JSON."#;

/// Wire shape of the analysis response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalysis {
    #[serde(default)]
    filters: QueryFilters,
    #[serde(default)]
    keywords: Vec<String>,
    search_type: SearchType,
    #[serde(default)]
    limit: Option<usize>,
}

/// Query analyzer: one AI call, then the substring fallback
pub struct QueryAnalyzer<'a> {
    llm: &'a dyn LlmService,
}

impl<'a> QueryAnalyzer<'a> {
    pub fn new(llm: &'a dyn LlmService) -> Self {
        Self { llm }
    }

    /// Analyze a question. Never fails: any service or decode error drops
    /// to `analyze_query_fallback`.
    pub fn analyze(&self, query: &str, today: NaiveDate) -> QueryAnalysis {
        let mut analysis = self
            .analyze_with_service(query, today)
            .unwrap_or_else(|_| analyze_query_fallback(query, today));

        // Ambiguous kind vocabulary leaves the query unfiltered by type
        let lower = query.to_lowercase();
        if lower.contains("task") && lower.contains("idea") {
            analysis.filters.kind = None;
        }

        analysis.normalize();
        analysis
    }

    fn analyze_with_service(&self, query: &str, today: NaiveDate) -> Result<QueryAnalysis> {
        let user = format!(
            "Query: \"{query}\"\n\n\
             Today's date: {today}\n\
             Context: User has tasks and ideas saved in a personal database.\n\n\
             Analyze this query and return structured filters and keywords."
        );

        let mut request = CompletionRequest::structured(ANALYSIS_PROMPT, user);
        request.temperature = 0.2;
        request.max_tokens = 300;

        let response = self.llm.complete(&request)?;
        let wire: WireAnalysis =
            serde_json::from_str(&response).context("Unparseable query analysis response")?;

        Ok(QueryAnalysis {
            filters: wire.filters,
            keywords: wire.keywords,
            search_type: wire.search_type,
            limit: wire.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_QUERY_LIMIT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemKind, Priority, Status};
    use anyhow::bail;

    struct Scripted(&'static str);

    impl LlmService for Scripted {
        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl LlmService for Failing {
        fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            bail!("service unavailable")
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_analyze_decodes_service_response() {
        let llm = Scripted(
            r#"{
                "filters": {"type": "task", "priority": "high", "status": "pending"},
                "keywords": [],
                "searchType": "structural",
                "limit": 50
            }"#,
        );

        let analysis = QueryAnalyzer::new(&llm).analyze("show high priority tasks", date("2024-11-10"));
        assert_eq!(analysis.search_type, SearchType::Structural);
        assert_eq!(analysis.filters.priority, Some(Priority::High));
        assert_eq!(analysis.limit, 50);
    }

    #[test]
    fn test_analyze_falls_back_on_service_error() {
        let analysis =
            QueryAnalyzer::new(&Failing).analyze("show ideas about gardening", date("2024-11-10"));

        assert_eq!(analysis.search_type, SearchType::Conceptual);
        assert_eq!(analysis.filters.kind, Some(ItemKind::Idea));
        assert!(analysis.keywords.contains(&"gardening".to_string()));
    }

    #[test]
    fn test_analyze_falls_back_on_malformed_response() {
        let llm = Scripted("not json at all");
        let analysis = QueryAnalyzer::new(&llm).analyze("list completed tasks", date("2024-11-10"));

        assert_eq!(analysis.filters.status, Some(Status::Completed));
    }

    #[test]
    fn test_analyze_rejects_unknown_search_type() {
        // An out-of-vocabulary searchType is a malformed response, so the
        // fallback analysis wins.
        let llm = Scripted(r#"{"filters": {}, "keywords": ["books"], "searchType": "semantic"}"#);
        let analysis = QueryAnalyzer::new(&llm).analyze("which books did I save", date("2024-11-10"));

        assert_eq!(analysis.search_type, SearchType::Conceptual);
        assert!(analysis.keywords.contains(&"books".to_string()));
    }

    #[test]
    fn test_ambiguous_kind_vocabulary_clears_type_filter() {
        let llm = Scripted(
            r#"{
                "filters": {"type": "task", "status": "pending"},
                "keywords": ["vacation"],
                "searchType": "conceptual",
                "limit": 50
            }"#,
        );

        let analysis = QueryAnalyzer::new(&llm)
            .analyze("show tasks and ideas about vacation", date("2024-11-10"));
        assert!(analysis.filters.kind.is_none());
    }

    #[test]
    fn test_missing_limit_defaults() {
        let llm = Scripted(r#"{"filters": {"priority": "low"}, "keywords": [], "searchType": "structural"}"#);
        let analysis = QueryAnalyzer::new(&llm).analyze("low priority stuff", date("2024-11-10"));

        assert_eq!(analysis.limit, DEFAULT_QUERY_LIMIT);
        assert_eq!(analysis.filters.status, Some(Status::Pending));
    }
}
