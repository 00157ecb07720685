//! Merging per-matcher scores into one weighted candidate per pair.
//!
//! Candidates are grouped by their exact `(source_column, target_column)`
//! pair. Each group's score is the weighted sum of its members' scores,
//! clamped to `[0, 1]`, and its status follows the precedence
//! `accepted > rejected > discarded (all members) > idle`.

use std::collections::{HashMap, HashSet};

use matchview_model::{AggregatedCandidate, CandidateStatus, MatcherWeight, ScoredCandidate};

/// Weight applied to matchers that are missing from the table.
pub const DEFAULT_MATCHER_WEIGHT: f64 = 1.0;

/// Normalized lookup over a [`MatcherWeight`] table.
///
/// Duplicate rows keep the first occurrence. Negative or non-finite weights
/// are treated as zero.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    weights: HashMap<String, f64>,
    disabled: HashSet<String>,
}

impl WeightTable {
    pub fn new(weights: &[MatcherWeight]) -> Self {
        let mut table = Self::default();
        for entry in weights {
            if table.weights.contains_key(&entry.name) {
                continue;
            }
            table
                .weights
                .insert(entry.name.clone(), normalize_weight(entry.weight));
            if !entry.enabled {
                table.disabled.insert(entry.name.clone());
            }
        }
        table
    }

    /// Weight for a matcher, falling back to [`DEFAULT_MATCHER_WEIGHT`].
    pub fn weight(&self, matcher: &str) -> f64 {
        self.weights
            .get(matcher)
            .copied()
            .unwrap_or(DEFAULT_MATCHER_WEIGHT)
    }

    /// Unknown matchers are enabled.
    pub fn is_enabled(&self, matcher: &str) -> bool {
        !self.disabled.contains(matcher)
    }
}

fn normalize_weight(weight: f64) -> f64 {
    if weight.is_finite() { weight.max(0.0) } else { 0.0 }
}

fn normalize_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Running state for one (source, target) group.
struct Group {
    source_column: String,
    target_column: String,
    weighted_sum: f64,
    matchers: Vec<String>,
    any_accepted: bool,
    any_rejected: bool,
    all_discarded: bool,
}

impl Group {
    fn new(candidate: &ScoredCandidate) -> Self {
        Self {
            source_column: candidate.source_column.clone(),
            target_column: candidate.target_column.clone(),
            weighted_sum: 0.0,
            matchers: Vec::new(),
            any_accepted: false,
            any_rejected: false,
            all_discarded: true,
        }
    }

    fn add(&mut self, candidate: &ScoredCandidate, weights: &WeightTable) {
        // A matcher scores a pair once; repeated rows only feed the status.
        if !self.matchers.iter().any(|m| m == &candidate.matcher) {
            self.weighted_sum += normalize_score(candidate.score) * weights.weight(&candidate.matcher);
            self.matchers.push(candidate.matcher.clone());
        }
        match candidate.status {
            CandidateStatus::Accepted => self.any_accepted = true,
            CandidateStatus::Rejected => self.any_rejected = true,
            CandidateStatus::Discarded | CandidateStatus::Idle => {}
        }
        if candidate.status != CandidateStatus::Discarded {
            self.all_discarded = false;
        }
    }

    fn status(&self) -> CandidateStatus {
        if self.any_accepted {
            CandidateStatus::Accepted
        } else if self.any_rejected {
            CandidateStatus::Rejected
        } else if self.all_discarded {
            CandidateStatus::Discarded
        } else {
            CandidateStatus::Idle
        }
    }

    fn finish(self) -> AggregatedCandidate {
        let status = self.status();
        AggregatedCandidate {
            source_column: self.source_column,
            target_column: self.target_column,
            score: self.weighted_sum.clamp(0.0, 1.0),
            matchers: self.matchers,
            status,
        }
    }
}

/// Merges scored candidates into one weighted record per (source, target) pair.
///
/// The result is sorted by descending score; ties keep the order in which
/// their pair was first seen. Candidates from disabled matchers are ignored.
pub fn aggregate(
    candidates: &[ScoredCandidate],
    matcher_weights: &[MatcherWeight],
) -> Vec<AggregatedCandidate> {
    let weights = WeightTable::new(matcher_weights);
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    let mut skipped = 0usize;

    for candidate in candidates {
        if !weights.is_enabled(&candidate.matcher) {
            skipped += 1;
            continue;
        }
        let key = (
            candidate.source_column.as_str(),
            candidate.target_column.as_str(),
        );
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Group::new(candidate));
            groups.len() - 1
        });
        groups[slot].add(candidate, &weights);
    }

    let mut aggregated: Vec<AggregatedCandidate> = groups.into_iter().map(Group::finish).collect();
    aggregated.sort_by(|a, b| b.score.total_cmp(&a.score));

    tracing::debug!(
        candidates = candidates.len(),
        groups = aggregated.len(),
        skipped_disabled = skipped,
        "Aggregated match candidates"
    );
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(
        source: &str,
        target: &str,
        score: f64,
        matcher: &str,
        status: CandidateStatus,
    ) -> ScoredCandidate {
        ScoredCandidate::new(source, target, score, matcher).with_status(status)
    }

    #[test]
    fn accepted_member_wins_and_scores_are_weighted() {
        let candidates = vec![
            candidate("Gender", "gender", 1.0, "A", CandidateStatus::Accepted),
            candidate("Gender", "gender", 1.0, "B", CandidateStatus::Idle),
        ];
        let weights = vec![MatcherWeight::new("A", 0.5), MatcherWeight::new("B", 0.5)];

        let result = aggregate(&candidates, &weights);

        assert_eq!(
            result,
            vec![AggregatedCandidate {
                source_column: "Gender".to_string(),
                target_column: "gender".to_string(),
                score: 1.0,
                matchers: vec!["A".to_string(), "B".to_string()],
                status: CandidateStatus::Accepted,
            }]
        );
    }

    #[test]
    fn unknown_matcher_defaults_to_weight_one() {
        let candidates = vec![candidate("a", "x", 0.4, "mystery", CandidateStatus::Idle)];
        let result = aggregate(&candidates, &[]);
        assert_eq!(result[0].score, 0.4);
    }

    #[test]
    fn score_is_clamped_to_unit_interval() {
        let candidates = vec![
            candidate("a", "x", 0.9, "A", CandidateStatus::Idle),
            candidate("a", "x", 0.9, "B", CandidateStatus::Idle),
            candidate("b", "y", -3.0, "A", CandidateStatus::Idle),
            candidate("c", "z", f64::NAN, "A", CandidateStatus::Idle),
        ];
        let result = aggregate(&candidates, &[]);
        assert_eq!(result[0].score, 1.0);
        assert!(result.iter().all(|c| (0.0..=1.0).contains(&c.score)));
    }

    #[test]
    fn status_precedence() {
        let rejected = aggregate(
            &[
                candidate("a", "x", 0.5, "A", CandidateStatus::Discarded),
                candidate("a", "x", 0.5, "B", CandidateStatus::Rejected),
            ],
            &[],
        );
        assert_eq!(rejected[0].status, CandidateStatus::Rejected);

        let discarded = aggregate(
            &[
                candidate("a", "x", 0.5, "A", CandidateStatus::Discarded),
                candidate("a", "x", 0.5, "B", CandidateStatus::Discarded),
            ],
            &[],
        );
        assert_eq!(discarded[0].status, CandidateStatus::Discarded);

        let idle = aggregate(
            &[
                candidate("a", "x", 0.5, "A", CandidateStatus::Discarded),
                candidate("a", "x", 0.5, "B", CandidateStatus::Idle),
            ],
            &[],
        );
        assert_eq!(idle[0].status, CandidateStatus::Idle);
    }

    #[test]
    fn ties_keep_discovery_order() {
        let candidates = vec![
            candidate("b", "y", 0.5, "A", CandidateStatus::Idle),
            candidate("a", "x", 0.5, "A", CandidateStatus::Idle),
            candidate("c", "z", 0.9, "A", CandidateStatus::Idle),
        ];
        let result = aggregate(&candidates, &[]);
        let order: Vec<&str> = result.iter().map(|c| c.source_column.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn disabled_matchers_are_ignored() {
        let candidates = vec![
            candidate("a", "x", 0.5, "A", CandidateStatus::Idle),
            candidate("a", "x", 0.5, "B", CandidateStatus::Idle),
            candidate("b", "y", 0.5, "B", CandidateStatus::Idle),
        ];
        let weights = vec![MatcherWeight::new("B", 1.0).disabled()];
        let result = aggregate(&candidates, &weights);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].matchers, vec!["A".to_string()]);
    }

    #[test]
    fn duplicate_weight_rows_keep_first_and_negative_weights_clamp() {
        let table = WeightTable::new(&[
            MatcherWeight::new("A", 0.25),
            MatcherWeight::new("A", 0.75),
            MatcherWeight::new("B", -2.0),
        ]);
        assert_eq!(table.weight("A"), 0.25);
        assert_eq!(table.weight("B"), 0.0);
        assert_eq!(table.weight("C"), DEFAULT_MATCHER_WEIGHT);
    }

    #[test]
    fn repeated_matcher_rows_count_once() {
        let candidates = vec![
            candidate("a", "x", 0.3, "A", CandidateStatus::Idle),
            candidate("a", "x", 0.3, "A", CandidateStatus::Accepted),
        ];
        let result = aggregate(&candidates, &[]);
        assert_eq!(result[0].score, 0.3);
        assert_eq!(result[0].matchers, vec!["A".to_string()]);
        assert_eq!(result[0].status, CandidateStatus::Accepted);
    }
}
