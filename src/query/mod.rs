//! Query-side analysis
//!
//! Turns a free-text question into a structured `QueryAnalysis` the search
//! executor can run: filters, keywords, a strategy tag and a result limit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::items::{ItemKind, Priority, Status};

mod analyzer;

pub use analyzer::QueryAnalyzer;

/// Default result limit for a query
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// Cap on extracted search keywords
pub const MAX_QUERY_KEYWORDS: usize = 10;

/// Retrieval strategy for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Resolvable purely via equality/range filters on stored fields
    Structural,
    /// Resolvable only via tag/content matching
    Conceptual,
    /// Requires both filter and keyword matching
    Hybrid,
}

/// Structured filters extracted from a query
///
/// Field names follow the AI service's wire format (`type`, `deadlineFrom`,
/// `deadlineTo`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryFilters {
    #[serde(rename = "type")]
    pub kind: Option<ItemKind>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub category: Option<String>,
    pub deadline_from: Option<NaiveDate>,
    pub deadline_to: Option<NaiveDate>,
}

impl QueryFilters {
    /// True when any constraint beyond the default `status = pending` is
    /// set. Decides whether conceptual results get a post-hoc filter pass.
    pub fn has_constraints_beyond_default(&self) -> bool {
        self.kind.is_some()
            || self.priority.is_some()
            || self.category.is_some()
            || self.deadline_from.is_some()
            || self.deadline_to.is_some()
            || matches!(self.status, Some(s) if s != Status::Pending)
    }
}

/// Structured analysis of one free-text question
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnalysis {
    pub filters: QueryFilters,
    pub keywords: Vec<String>,
    pub search_type: SearchType,
    pub limit: usize,
}

impl QueryAnalysis {
    /// Repair invariants after decoding, in the same direction the
    /// fallback analyzer decides:
    /// - keywords are lowercased and capped;
    /// - status defaults to pending;
    /// - a keywordless conceptual/hybrid analysis demotes to structural;
    /// - a filterless analysis with keywords promotes to conceptual.
    pub fn normalize(&mut self) {
        for keyword in &mut self.keywords {
            *keyword = keyword.to_lowercase();
        }
        self.keywords.truncate(MAX_QUERY_KEYWORDS);

        if self.limit == 0 {
            self.limit = DEFAULT_QUERY_LIMIT;
        }

        if self.filters.status.is_none() {
            self.filters.status = Some(Status::Pending);
        }

        if self.keywords.is_empty() {
            self.search_type = SearchType::Structural;
        } else if !self.filters.has_constraints_beyond_default() {
            self.search_type = SearchType::Conceptual;
        }
    }
}
