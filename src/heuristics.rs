//! Deterministic fallback classifiers
//!
//! Pure text-pattern logic used whenever the AI service is unavailable or
//! returns something unusable. Every function is synchronous, does no I/O,
//! and is deterministic given the input text and a reference `today` date.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::items::{ClassifiedItem, ItemKind, Priority, Status};
use crate::lexicon::{
    contains_any, IDEA_KEYWORDS, QUERY_KEYWORDS, QUERY_STOPWORDS, TAG_STOPWORDS, TASK_KEYWORDS,
};
use crate::query::{QueryAnalysis, QueryFilters, SearchType, DEFAULT_QUERY_LIMIT};

/// Maximum number of tags derived from a fragment
const MAX_FRAGMENT_TAGS: usize = 5;

/// Fragments at or below this length are discarded when splitting
const MIN_FRAGMENT_LEN: usize = 5;

/// Compiled separator regex for fragment splitting.
///
/// Splits on commas (optionally followed by "and") and on whitespace-bounded
/// "and" / "also" / "then", case-insensitively.
fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i),\s*(?:and\s+)?|\s+and\s+|\s+also\s+|\s+then\s+")
            .expect("Invalid fragment separator regex")
    })
}

/// Parse a relative deadline phrase into a calendar date.
///
/// Recognizes "today", "tomorrow" and "next week" as case-insensitive
/// substrings. Nothing else - this is an intentional minimal fallback, not
/// a date parser.
pub fn parse_deadline(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();

    if lower.contains("today") {
        return Some(today);
    }
    if lower.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if lower.contains("next week") {
        return Some(today + Duration::days(7));
    }

    None
}

/// Split a message into intent fragments.
///
/// When the text contains no separator at all, the result is exactly one
/// element: the trimmed input. Otherwise fragments are trimmed and anything
/// of five characters or fewer is discarded.
pub fn split_fragments(text: &str) -> Vec<String> {
    let re = separator_regex();

    if !re.is_match(text) {
        return vec![text.trim().to_string()];
    }

    re.split(text)
        .map(str::trim)
        .filter(|f| f.len() > MIN_FRAGMENT_LEN)
        .map(str::to_string)
        .collect()
}

/// True if the message reads like a retrieval question.
///
/// Runs before fragment splitting on the fallback path and short-circuits
/// it: "show tasks and ideas" is one query, not two intents.
pub fn is_query(text: &str) -> bool {
    contains_any(&text.to_lowercase(), QUERY_KEYWORDS)
}

/// Classify one fragment as a task or an idea.
///
/// Idea keywords take precedence over task keywords. Anything else
/// non-empty defaults to a task - the bias is toward capturing action
/// items. Returns `None` only for empty or whitespace input.
pub fn classify_fragment(text: &str, today: NaiveDate) -> Option<ClassifiedItem> {
    let content = text.trim();
    if content.is_empty() {
        return None;
    }

    let lower = content.to_lowercase();
    let tags = fragment_tags(&lower);

    if contains_any(&lower, IDEA_KEYWORDS) {
        return Some(ClassifiedItem {
            kind: ItemKind::Idea,
            content: content.to_string(),
            priority: Some(Priority::Medium),
            category: Some("personal".to_string()),
            deadline: None,
            tags,
        });
    }

    Some(ClassifiedItem {
        kind: ItemKind::Task,
        content: content.to_string(),
        priority: Some(Priority::Medium),
        category: Some("personal".to_string()),
        deadline: parse_deadline(content, today),
        tags,
    })
}

/// Derive tags from a lowercased fragment: up to five words longer than
/// three characters, stopwords excluded. Verbatim - no dedup, no
/// lemmatization.
fn fragment_tags(lower: &str) -> Vec<String> {
    lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.len() > 3 && !TAG_STOPWORDS.contains(w))
        .take(MAX_FRAGMENT_TAGS)
        .map(str::to_string)
        .collect()
}

/// Analyze a query without the AI service: substring filter detection plus
/// keyword extraction.
pub fn analyze_query_fallback(query: &str, today: NaiveDate) -> QueryAnalysis {
    let lower = query.to_lowercase();
    let mut filters = QueryFilters::default();

    let mentions_task = lower.contains("task");
    let mentions_idea = lower.contains("idea");
    if mentions_task && !mentions_idea {
        filters.kind = Some(ItemKind::Task);
    } else if mentions_idea && !mentions_task {
        filters.kind = Some(ItemKind::Idea);
    }

    if lower.contains("high priority") || lower.contains("urgent") {
        filters.priority = Some(Priority::High);
    } else if lower.contains("medium priority") {
        filters.priority = Some(Priority::Medium);
    } else if lower.contains("low priority") {
        filters.priority = Some(Priority::Low);
    }

    if lower.contains("completed") || lower.contains("done") {
        filters.status = Some(Status::Completed);
    } else if lower.contains("cancelled") {
        filters.status = Some(Status::Cancelled);
    } else {
        filters.status = Some(Status::Pending);
    }

    if lower.contains("today") {
        filters.deadline_from = Some(today);
        filters.deadline_to = Some(today);
    } else if lower.contains("this week") {
        let (from, to) = week_window(today);
        filters.deadline_from = Some(from);
        filters.deadline_to = Some(to);
    }

    let keywords: Vec<String> = lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.len() > 3 && !QUERY_STOPWORDS.contains(w))
        .take(crate::query::MAX_QUERY_KEYWORDS)
        .map(str::to_string)
        .collect();

    // Kind and status alone don't make a query structural; priority, date
    // ranges and category do.
    let has_structural_filter = filters.priority.is_some()
        || filters.deadline_from.is_some()
        || filters.category.is_some();

    let search_type = if keywords.is_empty() {
        SearchType::Structural
    } else if !has_structural_filter {
        SearchType::Conceptual
    } else {
        SearchType::Hybrid
    };

    QueryAnalysis {
        filters,
        keywords,
        search_type,
        limit: DEFAULT_QUERY_LIMIT,
    }
}

/// The Sunday-anchored 7-day window containing `today`.
fn week_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
    (start, start + Duration::days(6))
}
