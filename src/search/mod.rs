//! Search execution strategies
//!
//! Runs a `QueryAnalysis` against the item store using one of three
//! strategies. The conceptual path escalates from exact tag matches to
//! full-text search; the hybrid path intersects structural and keyword
//! matches by id but never lets an empty overlap hide legitimate
//! structural results. Store errors propagate - recovery happens in the
//! caller's outer fallback.

use std::collections::HashSet;

use anyhow::Result;

use crate::items::StoredItem;
use crate::query::{QueryAnalysis, QueryFilters, SearchType};
use crate::store::ItemStore;

/// Minimum structural-keyword overlap for a hybrid intersection to win.
/// Below this the structural results stand alone. Tunable, not a
/// load-bearing invariant.
pub const HYBRID_OVERLAP_MIN: usize = 10;

/// Cap on exact tag-membership matches
const TAG_SEARCH_CAP: usize = 100;

/// Cap on full-text matches after tag escalation
const FULL_TEXT_CAP: usize = 50;

/// Structural pool size for hybrid intersection
const HYBRID_POOL_CAP: usize = 100;

/// Executes query analyses against the store, scoped to one owner per call
pub struct SearchExecutor<'a> {
    store: &'a ItemStore,
}

impl<'a> SearchExecutor<'a> {
    pub fn new(store: &'a ItemStore) -> Self {
        Self { store }
    }

    /// Run the analysis for `owner`. Every store call is owner-scoped;
    /// results are deduplicated by id.
    pub fn execute(&self, analysis: &QueryAnalysis, owner: &str) -> Result<Vec<StoredItem>> {
        let items = match analysis.search_type {
            SearchType::Structural => self.structural(analysis, owner)?,
            SearchType::Conceptual => self.conceptual(analysis, owner)?,
            SearchType::Hybrid => self.hybrid(analysis, owner)?,
        };

        Ok(dedup_by_id(items))
    }

    fn structural(&self, analysis: &QueryAnalysis, owner: &str) -> Result<Vec<StoredItem>> {
        self.store.query(owner, &analysis.filters, analysis.limit)
    }

    /// Tag membership first; zero tag matches escalate to full-text before
    /// giving up. Extra filters beyond the default status are applied as a
    /// post-hoc equality pass - no re-query.
    fn conceptual(&self, analysis: &QueryAnalysis, owner: &str) -> Result<Vec<StoredItem>> {
        let mut results = self
            .store
            .search_by_tags(owner, &analysis.keywords, TAG_SEARCH_CAP)?;

        if results.is_empty() && !analysis.keywords.is_empty() {
            let match_expr = analysis.keywords.join(" OR ");
            results = self
                .store
                .search_full_text(owner, &match_expr, FULL_TEXT_CAP)?;
        }

        if !results.is_empty() && analysis.filters.has_constraints_beyond_default() {
            results.retain(|item| matches_filters(item, &analysis.filters));
        }

        Ok(results)
    }

    /// Structural pool intersected with keyword matches by id. A thin
    /// overlap falls back to the first `limit` structural rows.
    fn hybrid(&self, analysis: &QueryAnalysis, owner: &str) -> Result<Vec<StoredItem>> {
        let structural = self
            .store
            .query(owner, &analysis.filters, HYBRID_POOL_CAP)?;

        if analysis.keywords.is_empty() {
            return Ok(structural.into_iter().take(analysis.limit).collect());
        }

        let keyword_hits = self
            .store
            .search_by_tags(owner, &analysis.keywords, TAG_SEARCH_CAP)?;
        let keyword_ids: HashSet<i64> = keyword_hits.iter().map(|item| item.id).collect();

        let both: Vec<StoredItem> = structural
            .iter()
            .filter(|item| keyword_ids.contains(&item.id))
            .cloned()
            .collect();

        if both.len() < HYBRID_OVERLAP_MIN {
            Ok(structural.into_iter().take(analysis.limit).collect())
        } else {
            Ok(both)
        }
    }
}

/// Equality-only filter pass used on conceptual results
fn matches_filters(item: &StoredItem, filters: &QueryFilters) -> bool {
    if let Some(status) = filters.status {
        if item.status != status {
            return false;
        }
    }
    if let Some(kind) = filters.kind {
        if item.kind != kind {
            return false;
        }
    }
    if let Some(priority) = filters.priority {
        if item.priority != Some(priority) {
            return false;
        }
    }
    if let Some(category) = &filters.category {
        if item.category.as_deref() != Some(category.as_str()) {
            return false;
        }
    }
    true
}

fn dedup_by_id(items: Vec<StoredItem>) -> Vec<StoredItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id))
        .collect()
}
