//! Adaptive band scale for one axis of the match grid.
//!
//! Every column gets an equal band until one column is focused. The focused
//! band then grows and the remaining bands shrink uniformly so that the band
//! sizes always add up to the axis length.
//!
//! The scale is an immutable value: build a new one whenever the columns,
//! the focus or the axis length change.

use std::collections::HashMap;

use matchview_model::Side;
use serde::{Deserialize, Serialize};

/// Group divisor for the source (row) axis.
pub const SOURCE_GROUP_DIVISOR: f64 = 4.0;
/// Group divisor for the target (column) axis.
pub const TARGET_GROUP_DIVISOR: f64 = 3.0;

/// A contiguous interval on an axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub start: f64,
    pub size: f64,
}

impl Band {
    pub fn new(start: f64, size: f64) -> Self {
        Self { start, size }
    }

    pub fn end(&self) -> f64 {
        self.start + self.size
    }

    pub fn midpoint(&self) -> f64 {
        self.start + self.size / 2.0
    }

    /// Closed interval test: both edges belong to the band.
    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.start && offset <= self.end()
    }

    /// Smallest band covering both.
    #[must_use]
    pub fn union(&self, other: &Band) -> Band {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Band::new(start, end - start)
    }
}

/// Tuning constants for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleConstants {
    /// Larger divisors make the focused band grow less on long axes.
    pub group_divisor: f64,
}

impl ScaleConstants {
    pub fn new(group_divisor: f64) -> Self {
        Self { group_divisor }
    }

    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Source => Self::new(SOURCE_GROUP_DIVISOR),
            Side::Target => Self::new(TARGET_GROUP_DIVISOR),
        }
    }

    fn divisor(&self) -> f64 {
        if self.group_divisor.is_finite() && self.group_divisor > 0.0 {
            self.group_divisor
        } else {
            1.0
        }
    }
}

/// Column bands along one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisScale {
    columns: Vec<String>,
    bands: Vec<Band>,
    focused: Option<usize>,
    length: f64,
    base_size: f64,
    expanded_size: f64,
    shrunk_size: f64,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Builds the band scale for `columns` along an axis of `axis_length` pixels.
///
/// Duplicate column names keep their first position. A focused column that
/// is not part of `columns` leaves the scale unfocused. Non-positive or
/// non-finite lengths produce zero-sized bands.
pub fn build_scale(
    columns: &[String],
    focused: Option<&str>,
    axis_length: f64,
    constants: ScaleConstants,
) -> AxisScale {
    let mut index = HashMap::new();
    let mut domain = Vec::with_capacity(columns.len());
    for column in columns {
        if !index.contains_key(column) {
            index.insert(column.clone(), domain.len());
            domain.push(column.clone());
        }
    }

    let length = if axis_length.is_finite() && axis_length > 0.0 {
        axis_length
    } else {
        0.0
    };
    let n = domain.len();
    let focused = focused.and_then(|name| index.get(name).copied());

    let (base_size, expanded_size, shrunk_size) = if n == 0 {
        (0.0, 0.0, 0.0)
    } else {
        let base = length / n as f64;
        match focused {
            Some(_) => {
                let growth = (n as f64 / constants.divisor()).max(1.0);
                let expanded = (base * 2.0 * growth).min(length);
                let shrunk = if n > 1 {
                    ((length - expanded) / (n - 1) as f64).max(0.0)
                } else {
                    0.0
                };
                (base, expanded, shrunk)
            }
            None => (base, base, base),
        }
    };

    let mut bands = Vec::with_capacity(n);
    let mut cursor = 0.0;
    for position in 0..n {
        let size = match focused {
            Some(idx) if idx == position => expanded_size,
            Some(_) => shrunk_size,
            None => base_size,
        };
        bands.push(Band::new(cursor, size));
        cursor += size;
    }

    AxisScale {
        columns: domain,
        bands,
        focused,
        length,
        base_size,
        expanded_size,
        shrunk_size,
        index,
    }
}

impl AxisScale {
    /// Ordered column domain.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Bands in column order.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Columns paired with their bands, in axis order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Band)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.bands.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Axis length the bands fill.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn base_size(&self) -> f64 {
        self.base_size
    }

    pub fn expanded_size(&self) -> f64 {
        self.expanded_size
    }

    pub fn shrunk_size(&self) -> f64 {
        self.shrunk_size
    }

    pub fn focused_column(&self) -> Option<&str> {
        self.focused.map(|idx| self.columns[idx].as_str())
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn band(&self, column: &str) -> Option<Band> {
        self.index_of(column).map(|idx| self.bands[idx])
    }

    pub fn position_of(&self, column: &str) -> Option<f64> {
        self.band(column).map(|band| band.start)
    }

    pub fn size_of(&self, column: &str) -> Option<f64> {
        self.band(column).map(|band| band.size)
    }

    /// Column whose band contains `offset`, scanning in axis order.
    pub fn reverse_lookup(&self, offset: f64) -> Option<&str> {
        self.iter()
            .find(|(_, band)| band.contains(offset))
            .map(|(column, _)| column)
    }

    /// Sum of all band sizes.
    pub fn total_size(&self) -> f64 {
        self.bands.iter().map(|band| band.size).sum()
    }
}
