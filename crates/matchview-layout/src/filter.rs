//! Reducing the aggregated candidate set to what the current view shows.
//!
//! Every filter is a pure membership predicate, so they compose by
//! conjunction and the result does not depend on application order.

use std::collections::{BTreeSet, HashSet};

use matchview_model::{AggregatedCandidate, CandidateStatus};
use serde::{Deserialize, Serialize};

/// Which source rows the view is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSelector {
    /// Every active source column, subject to pagination.
    #[default]
    All,
    /// A single source column; pagination does not apply.
    Column(String),
}

/// A zero-based page over the active source column list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageWindow {
    pub size: usize,
    pub index: usize,
}

impl PageWindow {
    pub fn new(size: usize, index: usize) -> Self {
        Self { size, index }
    }

    /// Slice of `columns` covered by this page. A zero size covers everything.
    pub fn slice<'a>(&self, columns: &'a [String]) -> &'a [String] {
        if self.size == 0 {
            return columns;
        }
        let start = self.size.saturating_mul(self.index).min(columns.len());
        let end = start.saturating_add(self.size).min(columns.len());
        &columns[start..end]
    }

    /// Number of pages needed for `total` columns.
    pub fn page_count(&self, total: usize) -> usize {
        if self.size == 0 {
            1
        } else {
            total.div_ceil(self.size)
        }
    }
}

/// Externally selected columns, already resolved to leaf column names.
///
/// `None` on a side means that side is unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeSelection {
    pub source: Option<BTreeSet<String>>,
    pub target: Option<BTreeSet<String>>,
}

/// View filter options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewFilter {
    /// Candidates need `score >= threshold`.
    pub threshold: f64,
    /// Allowed statuses; `None` allows every status.
    pub statuses: Option<BTreeSet<CandidateStatus>>,
    pub source: SourceSelector,
    pub page: Option<PageWindow>,
    pub selection: NodeSelection,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            statuses: None,
            source: SourceSelector::All,
            page: None,
            selection: NodeSelection::default(),
        }
    }
}

/// A single membership test over aggregated candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    MinScore(f64),
    Status(BTreeSet<CandidateStatus>),
    SourceIn(HashSet<String>),
    TargetIn(HashSet<String>),
}

impl Predicate {
    pub fn matches(&self, candidate: &AggregatedCandidate) -> bool {
        match self {
            Self::MinScore(threshold) => candidate.score >= *threshold,
            Self::Status(allowed) => allowed.contains(&candidate.status),
            Self::SourceIn(columns) => columns.contains(&candidate.source_column),
            Self::TargetIn(columns) => columns.contains(&candidate.target_column),
        }
    }
}

impl ViewFilter {
    /// Breaks the filter into independent predicates.
    ///
    /// `active_sources` is the ordered source column list that pagination
    /// slices when [`SourceSelector::All`] is active.
    pub fn predicates(&self, active_sources: &[String]) -> Vec<Predicate> {
        let threshold = if self.threshold.is_finite() {
            self.threshold
        } else {
            0.0
        };
        let mut predicates = vec![Predicate::MinScore(threshold)];

        if let Some(statuses) = &self.statuses {
            predicates.push(Predicate::Status(statuses.clone()));
        }

        match (&self.source, self.page) {
            (SourceSelector::Column(column), _) => {
                predicates.push(Predicate::SourceIn(HashSet::from([column.clone()])));
            }
            (SourceSelector::All, Some(page)) => {
                let visible = page.slice(active_sources).iter().cloned().collect();
                predicates.push(Predicate::SourceIn(visible));
            }
            (SourceSelector::All, None) => {}
        }

        if let Some(columns) = &self.selection.source {
            predicates.push(Predicate::SourceIn(columns.iter().cloned().collect()));
        }
        if let Some(columns) = &self.selection.target {
            predicates.push(Predicate::TargetIn(columns.iter().cloned().collect()));
        }
        predicates
    }
}

/// Keeps candidates matching every predicate, in their original order.
pub fn apply_predicates(
    candidates: &[AggregatedCandidate],
    predicates: &[Predicate],
) -> Vec<AggregatedCandidate> {
    candidates
        .iter()
        .filter(|candidate| predicates.iter().all(|p| p.matches(candidate)))
        .cloned()
        .collect()
}

/// Applies the view filter to the aggregated list.
pub fn filter_view(
    aggregated: &[AggregatedCandidate],
    filter: &ViewFilter,
    active_sources: &[String],
) -> Vec<AggregatedCandidate> {
    let predicates = filter.predicates(active_sources);
    let visible = apply_predicates(aggregated, &predicates);
    tracing::trace!(
        input = aggregated.len(),
        visible = visible.len(),
        predicates = predicates.len(),
        "Filtered candidate view"
    );
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregated(source: &str, target: &str, score: f64, status: CandidateStatus) -> AggregatedCandidate {
        AggregatedCandidate {
            source_column: source.to_string(),
            target_column: target.to_string(),
            score,
            matchers: vec!["A".to_string()],
            status,
        }
    }

    fn sample() -> Vec<AggregatedCandidate> {
        vec![
            aggregated("a", "x", 0.9, CandidateStatus::Accepted),
            aggregated("b", "y", 0.7, CandidateStatus::Idle),
            aggregated("c", "x", 0.4, CandidateStatus::Rejected),
            aggregated("d", "z", 0.2, CandidateStatus::Idle),
        ]
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    fn sources(result: &[AggregatedCandidate]) -> Vec<&str> {
        result.iter().map(|c| c.source_column.as_str()).collect()
    }

    #[test]
    fn threshold_is_inclusive() {
        let filter = ViewFilter {
            threshold: 0.4,
            ..ViewFilter::default()
        };
        let result = filter_view(&sample(), &filter, &[]);
        assert_eq!(sources(&result), vec!["a", "b", "c"]);
    }

    #[test]
    fn status_allow_set() {
        let filter = ViewFilter {
            statuses: Some(BTreeSet::from([CandidateStatus::Idle])),
            ..ViewFilter::default()
        };
        let result = filter_view(&sample(), &filter, &[]);
        assert_eq!(sources(&result), vec!["b", "d"]);
    }

    #[test]
    fn pagination_slices_columns_not_candidates() {
        let active = columns(&["a", "b", "c", "d"]);
        let filter = ViewFilter {
            page: Some(PageWindow::new(2, 1)),
            ..ViewFilter::default()
        };
        let result = filter_view(&sample(), &filter, &active);
        assert_eq!(sources(&result), vec!["c", "d"]);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let active = columns(&["a", "b"]);
        let filter = ViewFilter {
            page: Some(PageWindow::new(2, 5)),
            ..ViewFilter::default()
        };
        assert!(filter_view(&sample(), &filter, &active).is_empty());
        assert_eq!(PageWindow::new(2, 0).page_count(5), 3);
    }

    #[test]
    fn single_column_selector_ignores_page() {
        let active = columns(&["a", "b", "c", "d"]);
        let filter = ViewFilter {
            source: SourceSelector::Column("d".to_string()),
            page: Some(PageWindow::new(2, 0)),
            ..ViewFilter::default()
        };
        let result = filter_view(&sample(), &filter, &active);
        assert_eq!(sources(&result), vec!["d"]);
    }

    #[test]
    fn selections_restrict_each_side() {
        let filter = ViewFilter {
            selection: NodeSelection {
                source: None,
                target: Some(BTreeSet::from(["x".to_string()])),
            },
            ..ViewFilter::default()
        };
        let result = filter_view(&sample(), &filter, &[]);
        assert_eq!(sources(&result), vec!["a", "c"]);
    }

    #[test]
    fn predicate_order_does_not_matter() {
        let active = columns(&["a", "b", "c", "d"]);
        let filter = ViewFilter {
            threshold: 0.3,
            statuses: Some(BTreeSet::from([CandidateStatus::Idle, CandidateStatus::Rejected])),
            page: Some(PageWindow::new(3, 0)),
            selection: NodeSelection {
                source: Some(BTreeSet::from(["b".to_string(), "c".to_string()])),
                target: None,
            },
            ..ViewFilter::default()
        };
        let mut predicates = filter.predicates(&active);
        let forward = apply_predicates(&sample(), &predicates);
        predicates.reverse();
        let backward = apply_predicates(&sample(), &predicates);
        assert_eq!(forward, backward);
        assert_eq!(sources(&forward), vec!["b", "c"]);
    }
}
