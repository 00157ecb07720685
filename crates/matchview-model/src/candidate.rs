//! Scored match candidates and matcher weights.
//!
//! A [`ScoredCandidate`] is one (source, target) pairing proposed by a single
//! matcher. The layout engine merges candidates sharing the same pair into an
//! [`AggregatedCandidate`] using the [`MatcherWeight`] table.

use serde::{Deserialize, Serialize};

/// Review status of a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    /// Not yet reviewed.
    #[default]
    Idle,
    /// Accepted by the reviewer.
    Accepted,
    /// Rejected by the reviewer.
    Rejected,
    /// Discarded (hidden from review).
    Discarded,
}

impl CandidateStatus {
    /// All statuses, in declaration order.
    pub const ALL: [CandidateStatus; 4] = [
        CandidateStatus::Idle,
        CandidateStatus::Accepted,
        CandidateStatus::Rejected,
        CandidateStatus::Discarded,
    ];

    /// Lowercase name used in snapshots and CLI arguments.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Discarded => "discarded",
        }
    }

    /// Parses a status name, ignoring ASCII case.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (source, target) pairing scored by a single matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Column name in the source dataset.
    pub source_column: String,
    /// Attribute name in the target ontology.
    pub target_column: String,
    /// Matcher score, expected in `[0, 1]`.
    pub score: f64,
    /// Name of the matcher that produced this score.
    pub matcher: String,
    #[serde(default)]
    pub status: CandidateStatus,
}

impl ScoredCandidate {
    pub fn new(
        source_column: impl Into<String>,
        target_column: impl Into<String>,
        score: f64,
        matcher: impl Into<String>,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            target_column: target_column.into(),
            score,
            matcher: matcher.into(),
            status: CandidateStatus::Idle,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: CandidateStatus) -> Self {
        self.status = status;
        self
    }
}

/// Weight applied to every score produced by one matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherWeight {
    /// Matcher name as it appears on candidates.
    pub name: String,
    /// Multiplier applied to this matcher's scores (expected `>= 0`).
    pub weight: f64,
    /// Disabled matchers do not contribute to aggregation.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl MatcherWeight {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            enabled: true,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Weighted combination of all matchers' candidates for one (source, target) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedCandidate {
    pub source_column: String,
    pub target_column: String,
    /// Weighted score clamped to `[0, 1]`.
    pub score: f64,
    /// Contributing matchers, in first-seen order.
    pub matchers: Vec<String>,
    pub status: CandidateStatus,
}
