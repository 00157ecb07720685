//! Input snapshot handed over by the matching and ontology services.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::candidate::{MatcherWeight, ScoredCandidate};
use crate::error::Result;
use crate::ontology::{OntologyEntry, Side};

/// Everything the layout engine needs from the outside world.
///
/// When `source_columns` / `target_columns` are empty, the active columns are
/// derived from the candidates in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSnapshot {
    pub candidates: Vec<ScoredCandidate>,
    pub matchers: Vec<MatcherWeight>,
    pub source_ontology: Vec<OntologyEntry>,
    pub target_ontology: Vec<OntologyEntry>,
    pub source_columns: Vec<String>,
    pub target_columns: Vec<String>,
}

impl MatchSnapshot {
    /// Reads a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Ontology entries for one side.
    pub fn ontology(&self, side: Side) -> &[OntologyEntry] {
        match side {
            Side::Source => &self.source_ontology,
            Side::Target => &self.target_ontology,
        }
    }

    /// Active column list for one side, without duplicates.
    pub fn active_columns(&self, side: Side) -> Vec<String> {
        let explicit = match side {
            Side::Source => &self.source_columns,
            Side::Target => &self.target_columns,
        };
        let names: Vec<&String> = if explicit.is_empty() {
            self.candidates
                .iter()
                .map(|c| match side {
                    Side::Source => &c.source_column,
                    Side::Target => &c.target_column,
                })
                .collect()
        } else {
            explicit.iter().collect()
        };

        let mut seen = HashSet::new();
        names
            .into_iter()
            .filter(|name| seen.insert(*name))
            .cloned()
            .collect()
    }
}
