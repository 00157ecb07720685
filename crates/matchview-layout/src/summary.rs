//! Summary statistics over aggregated candidates.

use std::collections::BTreeMap;

use matchview_model::{AggregatedCandidate, CandidateStatus};
use serde::Serialize;

/// Score band used to group aggregated candidates for review.
///
/// - `High`: near-certain matches
/// - `Medium`: plausible matches worth a look
/// - `Low`: weak matches that need manual confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Low,
    Medium,
    High,
}

impl ScoreBand {
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::High => "high score - likely correct",
            Self::Medium => "medium score - should review",
            Self::Low => "low score - needs verification",
        }
    }
}

/// Boundaries between score bands.
///
/// Scores below `low` fall outside every band.
#[derive(Debug, Clone, Copy)]
pub struct ScoreThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            high: 0.8,
            medium: 0.5,
            low: 0.2,
        }
    }
}

impl ScoreThresholds {
    /// Returns `None` if the score is below the low threshold.
    #[must_use]
    pub fn categorize(&self, score: f64) -> Option<ScoreBand> {
        if score >= self.high {
            Some(ScoreBand::High)
        } else if score >= self.medium {
            Some(ScoreBand::Medium)
        } else if score >= self.low {
            Some(ScoreBand::Low)
        } else {
            None
        }
    }
}

/// Counts and score statistics for a set of aggregated candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub total: usize,
    pub by_status: BTreeMap<CandidateStatus, usize>,
    pub by_band: BTreeMap<ScoreBand, usize>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub mean_score: Option<f64>,
    /// Distinct contributing matchers, in first-seen order.
    pub matchers: Vec<String>,
}

impl CandidateSummary {
    pub fn from_candidates(candidates: &[AggregatedCandidate]) -> Self {
        Self::from_candidates_with(candidates, &ScoreThresholds::default())
    }

    pub fn from_candidates_with(
        candidates: &[AggregatedCandidate],
        thresholds: &ScoreThresholds,
    ) -> Self {
        let mut by_status = BTreeMap::new();
        let mut by_band = BTreeMap::new();
        let mut matchers: Vec<String> = Vec::new();
        for candidate in candidates {
            *by_status.entry(candidate.status).or_insert(0) += 1;
            if let Some(band) = thresholds.categorize(candidate.score) {
                *by_band.entry(band).or_insert(0) += 1;
            }
            for matcher in &candidate.matchers {
                if !matchers.contains(matcher) {
                    matchers.push(matcher.clone());
                }
            }
        }

        let scores = candidates.iter().map(|c| c.score);
        let min_score = scores.clone().min_by(f64::total_cmp);
        let max_score = scores.clone().max_by(f64::total_cmp);
        let mean_score = if candidates.is_empty() {
            None
        } else {
            Some(scores.sum::<f64>() / candidates.len() as f64)
        };

        Self {
            total: candidates.len(),
            by_status,
            by_band,
            min_score,
            max_score,
            mean_score,
            matchers,
        }
    }

    pub fn status_count(&self, status: CandidateStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
