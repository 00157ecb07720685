//! Space-filling allocation of category and super-category bands.
//!
//! Two modes are supported:
//!
//! - **Post-layout**: columns already have bands on an [`AxisScale`]; a
//!   segment covers the union of its columns' bands.
//! - **Pre-layout**: columns are not positioned yet; segments share the axis
//!   in proportion to their column counts, with small segments pinned to a
//!   minimum size. Nested allocation pins a super-category to the room its
//!   categories need at the minimum size.
//!
//! # Spacing convention
//!
//! Spacing between consecutive segments is reserved before proportional
//! division: `available = length - spacing * (n - 1)`. Extents therefore
//! satisfy `sum(extent) + (n - 1) * spacing == length`. When the spacing
//! alone would not fit, it is dropped to zero.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scale::{AxisScale, Band};

/// Tolerance used when comparing shares against the minimum size.
const EPSILON: f64 = 1e-9;

/// A group of columns that will own one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentGroup {
    pub id: String,
    pub label: String,
    /// Child references (column names, or category ids for super-categories).
    pub children: Vec<String>,
    /// Leaf columns covered by this group; drives weights and ordering.
    pub columns: Vec<String>,
}

impl SegmentGroup {
    /// A group whose children are its columns.
    pub fn of_columns(id: impl Into<String>, label: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            children: columns.clone(),
            columns,
        }
    }
}

/// A super-category with its category groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperCategoryGroup {
    pub id: String,
    pub label: String,
    pub categories: Vec<SegmentGroup>,
}

impl SuperCategoryGroup {
    /// The super-category seen as a single segment group.
    pub fn as_group(&self) -> SegmentGroup {
        SegmentGroup {
            id: self.id.clone(),
            label: self.label.clone(),
            children: self.categories.iter().map(|c| c.id.clone()).collect(),
            columns: self
                .categories
                .iter()
                .flat_map(|c| c.columns.iter().cloned())
                .collect(),
        }
    }
}

/// One positioned segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentBand {
    pub id: String,
    pub label: String,
    pub start: f64,
    pub extent: f64,
    pub child_refs: Vec<String>,
    /// True when the extent was pinned to its floor: the minimum size, or
    /// for a super-category the room its categories need at that size.
    pub pinned: bool,
}

impl SegmentBand {
    pub fn band(&self) -> Band {
        Band::new(self.start, self.extent)
    }

    pub fn end(&self) -> f64 {
        self.start + self.extent
    }
}

/// Size constraints for pre-layout allocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    pub min_size: f64,
    pub spacing: f64,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            min_size: 20.0,
            spacing: 4.0,
        }
    }
}

/// How segment extents are derived.
#[derive(Debug, Clone, Copy)]
pub enum AllocationMode<'a> {
    /// Columns are positioned on this scale.
    PostLayout(&'a AxisScale),
    /// Columns are not positioned yet. When `column_order` is given, segments
    /// are ordered by the earliest of their columns in it; otherwise by
    /// declaration order.
    PreLayout { column_order: Option<&'a [String]> },
}

/// Positions `groups` along an axis of `axis_length` starting at zero.
pub fn allocate_segments(
    groups: &[SegmentGroup],
    axis_length: f64,
    params: SegmentParams,
    mode: AllocationMode<'_>,
) -> Vec<SegmentBand> {
    match mode {
        AllocationMode::PostLayout(scale) => post_layout(groups, scale),
        AllocationMode::PreLayout { column_order } => {
            let parent = Band::new(0.0, normalize_length(axis_length));
            pre_layout(groups, parent, params, column_order)
        }
    }
}

/// Spacing actually used between `count` segments on `length` pixels.
pub fn effective_spacing(count: usize, length: f64, spacing: f64) -> f64 {
    let length = normalize_length(length);
    let spacing = normalize_length(spacing);
    if count < 2 {
        return spacing;
    }
    if spacing * (count - 1) as f64 > length {
        0.0
    } else {
        spacing
    }
}

fn normalize_length(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn post_layout(groups: &[SegmentGroup], scale: &AxisScale) -> Vec<SegmentBand> {
    let mut bands: Vec<SegmentBand> = groups
        .iter()
        .filter_map(|group| {
            let band = group
                .columns
                .iter()
                .filter_map(|column| scale.band(column))
                .reduce(|acc, band| acc.union(&band));
            if band.is_none() {
                tracing::trace!(segment = group.id.as_str(), "Segment has no positioned columns");
            }
            band.map(|band| SegmentBand {
                id: group.id.clone(),
                label: group.label.clone(),
                start: band.start,
                extent: band.size,
                child_refs: group.children.clone(),
                pinned: false,
            })
        })
        .collect();
    bands.sort_by(|a, b| a.start.total_cmp(&b.start));
    bands
}

/// Order of `groups` by their first column.
fn segment_order(groups: &[SegmentGroup], column_order: Option<&[String]>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..groups.len()).collect();
    if let Some(columns) = column_order {
        let rank: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| (column.as_str(), idx))
            .rev()
            .collect();
        let first = |group: &SegmentGroup| {
            group
                .columns
                .iter()
                .filter_map(|column| rank.get(column.as_str()).copied())
                .min()
                .unwrap_or(usize::MAX)
        };
        order.sort_by_key(|&idx| first(&groups[idx]));
    }
    order
}

fn pre_layout(
    groups: &[SegmentGroup],
    parent: Band,
    params: SegmentParams,
    column_order: Option<&[String]>,
) -> Vec<SegmentBand> {
    let floors = vec![normalize_length(params.min_size); groups.len()];
    place_segments(groups, parent, params.spacing, &floors, column_order)
}

/// Places `groups` inside `parent`, each segment at least its own floor.
fn place_segments(
    groups: &[SegmentGroup],
    parent: Band,
    spacing: f64,
    floors: &[f64],
    column_order: Option<&[String]>,
) -> Vec<SegmentBand> {
    let count = groups.len();
    if count == 0 {
        return Vec::new();
    }

    let length = normalize_length(parent.size);
    let spacing = effective_spacing(count, length, spacing);
    let available = length - spacing * (count - 1) as f64;
    let floors = fit_floors(floors, available);

    let total_columns: usize = groups.iter().map(|g| g.columns.len()).sum();
    let weights: Vec<f64> = groups
        .iter()
        .map(|group| {
            if total_columns == 0 {
                1.0 / count as f64
            } else {
                group.columns.len() as f64 / total_columns as f64
            }
        })
        .collect();

    let extents = proportional_extents(&weights, available, &floors);
    let order = segment_order(groups, column_order);

    let mut cursor = parent.start;
    let mut bands = Vec::with_capacity(count);
    for idx in order {
        let (extent, pinned) = extents[idx];
        let group = &groups[idx];
        bands.push(SegmentBand {
            id: group.id.clone(),
            label: group.label.clone(),
            start: cursor,
            extent,
            child_refs: group.children.clone(),
            pinned,
        });
        cursor += extent + spacing;
    }

    tracing::trace!(
        segments = count,
        pinned = bands.iter().filter(|b| b.pinned).count(),
        available,
        "Allocated pre-layout segments"
    );
    bands
}

/// Scales the floors down uniformly when together they exceed `available`.
fn fit_floors(floors: &[f64], available: f64) -> Vec<f64> {
    let total: f64 = floors.iter().sum();
    if total <= available + EPSILON {
        return floors.to_vec();
    }
    tracing::debug!(
        floor_total = total,
        available,
        segments = floors.len(),
        "Minimum segment sizes lowered to fit the axis"
    );
    let ratio = if total > 0.0 { available / total } else { 0.0 };
    floors.iter().map(|floor| floor * ratio).collect()
}

/// Splits `available` by weight, keeping each segment at or above its floor.
///
/// Segments whose weight share falls below their floor are pinned to it; the
/// remaining length is divided among the others with weights renormalized
/// over the unpinned segments only. Pinning repeats until no unpinned share
/// falls below its floor.
fn proportional_extents(weights: &[f64], available: f64, floors: &[f64]) -> Vec<(f64, bool)> {
    let count = weights.len();
    let mut pinned: Vec<bool> = weights
        .iter()
        .zip(floors)
        .map(|(weight, floor)| weight * available < floor - EPSILON)
        .collect();

    loop {
        let pinned_total: f64 = floors
            .iter()
            .zip(&pinned)
            .filter(|(_, p)| **p)
            .map(|(floor, _)| *floor)
            .sum();
        let elastic_count = pinned.iter().filter(|p| !**p).count();
        let leftover = available - pinned_total;
        if elastic_count == 0 {
            // every segment sits on its floor; rounding slack is shared evenly
            let slack = leftover / count as f64;
            return floors.iter().map(|floor| (floor + slack, true)).collect();
        }

        let elastic_weight: f64 = weights
            .iter()
            .zip(&pinned)
            .filter(|(_, p)| !**p)
            .map(|(weight, _)| *weight)
            .sum();

        let shares: Vec<f64> = weights
            .iter()
            .zip(floors)
            .zip(&pinned)
            .map(|((weight, floor), p)| {
                if *p {
                    *floor
                } else if elastic_weight > 0.0 {
                    leftover * weight / elastic_weight
                } else {
                    leftover / elastic_count as f64
                }
            })
            .collect();

        let mut changed = false;
        for (idx, share) in shares.iter().enumerate() {
            if !pinned[idx] && *share < floors[idx] - EPSILON {
                pinned[idx] = true;
                changed = true;
            }
        }
        if !changed {
            return shares.into_iter().zip(pinned).collect();
        }
    }
}

/// Super-category and category bands for one axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HierarchyBands {
    pub super_categories: Vec<SegmentBand>,
    pub categories: Vec<SegmentBand>,
}

/// Pre-layout allocation for a two-level grouping.
///
/// Super-categories share the whole axis; each super-category's categories
/// then share that super-category's band. A super-category with `k`
/// categories is never narrower than `k * min_size + (k - 1) * spacing`
/// unless the axis cannot hold every such floor, so its categories keep the
/// minimum size whenever the axis allows it.
pub fn allocate_hierarchy(
    groups: &[SuperCategoryGroup],
    axis_length: f64,
    params: SegmentParams,
    column_order: Option<&[String]>,
) -> HierarchyBands {
    let super_groups: Vec<SegmentGroup> = groups.iter().map(SuperCategoryGroup::as_group).collect();
    let min_size = normalize_length(params.min_size);
    let spacing = normalize_length(params.spacing);
    let floors: Vec<f64> = groups
        .iter()
        .map(|group| match group.categories.len() {
            0 => min_size,
            k => k as f64 * min_size + (k - 1) as f64 * spacing,
        })
        .collect();
    let parent = Band::new(0.0, normalize_length(axis_length));
    let super_categories =
        place_segments(&super_groups, parent, params.spacing, &floors, column_order);

    let by_id: HashMap<&str, &SuperCategoryGroup> =
        groups.iter().map(|g| (g.id.as_str(), g)).collect();
    let mut categories = Vec::new();
    for band in &super_categories {
        if let Some(group) = by_id.get(band.id.as_str()) {
            categories.extend(pre_layout(&group.categories, band.band(), params, column_order));
        }
    }

    HierarchyBands {
        super_categories,
        categories,
    }
}

/// One band per column, taken directly from the scale.
pub fn column_bands(scale: &AxisScale) -> Vec<SegmentBand> {
    scale
        .iter()
        .map(|(column, band)| SegmentBand {
            id: column.to_string(),
            label: column.to_string(),
            start: band.start,
            extent: band.size,
            child_refs: Vec::new(),
            pinned: false,
        })
        .collect()
}
