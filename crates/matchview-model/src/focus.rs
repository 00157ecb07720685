//! The single focused (source, target) cell.

use serde::{Deserialize, Serialize};

use crate::ontology::Side;

/// A focused (source, target) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FocusedCell {
    pub source_column: String,
    pub target_column: String,
}

/// At most one focused pair at a time.
///
/// Focus drives which row and column expand in the grid and which ontology
/// branch is distinguished in each tree. It is the only core state that
/// survives recomputation, and it changes only through the methods below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FocusState {
    cell: Option<FocusedCell>,
}

impl FocusState {
    /// No focus.
    pub fn none() -> Self {
        Self::default()
    }

    /// Focus on one pair.
    pub fn on(source_column: impl Into<String>, target_column: impl Into<String>) -> Self {
        Self {
            cell: Some(FocusedCell {
                source_column: source_column.into(),
                target_column: target_column.into(),
            }),
        }
    }

    /// Returns the state focused on the given pair, replacing any previous focus.
    #[must_use]
    pub fn focus(self, source_column: &str, target_column: &str) -> Self {
        Self::on(source_column, target_column)
    }

    /// Focuses the pair, or clears focus if that pair is already focused.
    #[must_use]
    pub fn toggle(self, source_column: &str, target_column: &str) -> Self {
        match &self.cell {
            Some(cell)
                if cell.source_column == source_column && cell.target_column == target_column =>
            {
                Self::none()
            }
            _ => Self::on(source_column, target_column),
        }
    }

    pub fn cell(&self) -> Option<&FocusedCell> {
        self.cell.as_ref()
    }

    pub fn is_focused(&self) -> bool {
        self.cell.is_some()
    }

    /// The focused column on one side, if any.
    pub fn column(&self, side: Side) -> Option<&str> {
        self.cell.as_ref().map(|cell| match side {
            Side::Source => cell.source_column.as_str(),
            Side::Target => cell.target_column.as_str(),
        })
    }
}
