//! Ontology ancestry facts and axis sides.

use serde::{Deserialize, Serialize};

/// Which side of the match matrix a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Source dataset columns (matrix rows).
    Source,
    /// Target ontology attributes (matrix columns).
    Target,
}

impl Side {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A three-level ancestry fact about one column or attribute name.
///
/// `parent` is the category and `grandparent` the super-category. Entries are
/// unordered and may name columns that are not part of the active dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OntologyEntry {
    pub name: String,
    pub parent: String,
    pub grandparent: String,
}

impl OntologyEntry {
    pub fn new(
        name: impl Into<String>,
        parent: impl Into<String>,
        grandparent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            grandparent: grandparent.into(),
        }
    }
}
