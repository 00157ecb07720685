//! Matrix layout assembly.
//!
//! [`build_matrix_layout`] runs the whole pipeline for one review snapshot:
//! aggregation, view filtering, both axis scales, both ontology trees,
//! post-layout segment bands and the bundled connectors between layers.

use std::collections::{BTreeSet, HashSet};

use matchview_model::{AggregatedCandidate, CandidateStatus, FocusState, MatchSnapshot, Side};
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::bundle::{EdgePath, Orientation, bundle_paths};
use crate::config::LayoutConfig;
use crate::filter::{NodeSelection, ViewFilter, filter_view};
use crate::hierarchy::{
    ExpandedIds, NodeLevel, OntologyTree, build_ontology_tree, group_columns, select_columns,
};
use crate::scale::{AxisScale, Band, build_scale};
use crate::segments::{
    AllocationMode, HierarchyBands, SegmentBand, allocate_hierarchy, allocate_segments,
    column_bands,
};
use crate::summary::CandidateSummary;

/// How a grid cell is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellShape {
    /// Fills the whole cell.
    #[default]
    Rect,
    /// Centered circle whose area grows with the score.
    Circle,
}

impl CellShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Circle => "circle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rect" => Some(Self::Rect),
            "circle" => Some(Self::Circle),
            _ => None,
        }
    }

    /// Geometry for a cell spanning `column` on x and `row` on y.
    pub fn geometry(&self, column: Band, row: Band, score: f64) -> CellGeometry {
        match self {
            Self::Rect => CellGeometry::Rect {
                x: column.start,
                y: row.start,
                width: column.size,
                height: row.size,
            },
            Self::Circle => {
                let score = if score.is_finite() {
                    score.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                CellGeometry::Circle {
                    cx: column.midpoint(),
                    cy: row.midpoint(),
                    r: column.size.min(row.size) / 2.0 * score.sqrt(),
                }
            }
        }
    }
}

impl std::fmt::Display for CellShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum CellGeometry {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
}

/// One visible candidate placed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCell {
    pub source_column: String,
    pub target_column: String,
    pub score: f64,
    pub status: CandidateStatus,
    pub matchers: Vec<String>,
    pub geometry: CellGeometry,
}

/// Everything drawn along one axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLayout {
    pub side: Side,
    pub orientation: Orientation,
    pub scale: AxisScale,
    pub tree: OntologyTree,
    pub columns: Vec<SegmentBand>,
    pub categories: Vec<SegmentBand>,
    pub super_categories: Vec<SegmentBand>,
    /// Column-to-category connectors followed by category-to-super-category
    /// connectors.
    pub paths: Vec<EdgePath>,
    /// Segments sized from the grouping alone, before columns are placed.
    pub overview: HierarchyBands,
}

/// Inputs that change while a snapshot is being reviewed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub focus: FocusState,
    pub expanded: ExpandedIds,
    /// Node selections may name super-categories, categories or columns;
    /// they are resolved to columns before filtering.
    pub filter: ViewFilter,
}

/// The computed match grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixLayout {
    /// Statistics over every aggregated candidate, before filtering.
    pub summary: CandidateSummary,
    pub cells: Vec<MatrixCell>,
    pub source: AxisLayout,
    pub target: AxisLayout,
    pub focus: FocusState,
}

impl MatrixLayout {
    pub fn axis(&self, side: Side) -> &AxisLayout {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    /// Source and target columns under a grid point.
    pub fn columns_at(&self, x: f64, y: f64) -> Option<(&str, &str)> {
        let target = self.target.scale.reverse_lookup(x)?;
        let source = self.source.scale.reverse_lookup(y)?;
        Some((source, target))
    }

    /// Visible cell under a grid point.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<&MatrixCell> {
        let (source, target) = self.columns_at(x, y)?;
        self.cells
            .iter()
            .find(|cell| cell.source_column == source && cell.target_column == target)
    }
}

/// Builds the matrix layout for `snapshot` under `state`.
pub fn build_matrix_layout(
    snapshot: &MatchSnapshot,
    state: &ViewState,
    config: &LayoutConfig,
) -> MatrixLayout {
    let aggregated = aggregate(&snapshot.candidates, &snapshot.matchers);
    let summary = CandidateSummary::from_candidates(&aggregated);

    let active_sources = snapshot.active_columns(Side::Source);
    let active_targets = snapshot.active_columns(Side::Target);

    let filter = ViewFilter {
        selection: resolve_selection(snapshot, &state.filter.selection),
        ..state.filter.clone()
    };
    let visible = filter_view(&aggregated, &filter, &active_sources);

    let source_domain = axis_domain(&active_sources, &visible, Side::Source);
    let target_domain = axis_domain(&active_targets, &visible, Side::Target);

    let source = axis_layout(Side::Source, snapshot, &source_domain, state, config);
    let target = axis_layout(Side::Target, snapshot, &target_domain, state, config);

    let shape = config.view.cell_shape;
    let cells: Vec<MatrixCell> = visible
        .into_iter()
        .filter_map(|candidate| {
            let column = target.scale.band(&candidate.target_column)?;
            let row = source.scale.band(&candidate.source_column)?;
            Some(MatrixCell {
                geometry: shape.geometry(column, row, candidate.score),
                source_column: candidate.source_column,
                target_column: candidate.target_column,
                score: candidate.score,
                status: candidate.status,
                matchers: candidate.matchers,
            })
        })
        .collect();

    tracing::debug!(
        aggregated = summary.total,
        cells = cells.len(),
        sources = source.scale.len(),
        targets = target.scale.len(),
        focused = state.focus.is_focused(),
        "Built matrix layout"
    );

    MatrixLayout {
        summary,
        cells,
        source,
        target,
        focus: state.focus.clone(),
    }
}

fn resolve_selection(snapshot: &MatchSnapshot, selection: &NodeSelection) -> NodeSelection {
    let resolve = |side: Side, keys: &Option<BTreeSet<String>>| {
        keys.as_ref()
            .map(|keys| select_columns(snapshot.ontology(side), keys))
    };
    NodeSelection {
        source: resolve(Side::Source, &selection.source),
        target: resolve(Side::Target, &selection.target),
    }
}

/// Columns of `side` that still have a visible candidate. Active columns
/// keep their order; columns only named by candidates follow in first-seen
/// order.
fn axis_domain(active: &[String], visible: &[AggregatedCandidate], side: Side) -> Vec<String> {
    let present: HashSet<&str> = visible.iter().map(|c| side_column(c, side)).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut domain = Vec::new();
    let ordered = active
        .iter()
        .map(String::as_str)
        .chain(visible.iter().map(|c| side_column(c, side)));
    for column in ordered {
        if present.contains(column) && seen.insert(column) {
            domain.push(column.to_string());
        }
    }
    domain
}

fn side_column(candidate: &AggregatedCandidate, side: Side) -> &str {
    match side {
        Side::Source => &candidate.source_column,
        Side::Target => &candidate.target_column,
    }
}

fn axis_layout(
    side: Side,
    snapshot: &MatchSnapshot,
    domain: &[String],
    state: &ViewState,
    config: &LayoutConfig,
) -> AxisLayout {
    let length = config.axis_length(side);
    let focus = state.focus.column(side);
    let scale = build_scale(domain, focus, length, config.scale_constants(side));
    let entries = snapshot.ontology(side);
    let tree = build_ontology_tree(side, entries, domain, &scale, focus, &state.expanded);

    let params = config.segment_params();
    let columns = column_bands(&scale);
    let categories = allocate_segments(
        &tree.segment_groups(NodeLevel::Category),
        length,
        params,
        AllocationMode::PostLayout(&scale),
    );
    let super_categories = allocate_segments(
        &tree.segment_groups(NodeLevel::SuperCategory),
        length,
        params,
        AllocationMode::PostLayout(&scale),
    );

    // Target hierarchy sits above the grid, source hierarchy to its left.
    let orientation = match side {
        Side::Source => Orientation::Vertical,
        Side::Target => Orientation::Horizontal,
    };
    let gap = config.segments.layer_gap;
    let mut paths = bundle_paths(
        &columns,
        &categories,
        &config.bundle_params(orientation, 0.0, -gap),
    );
    paths.extend(bundle_paths(
        &categories,
        &super_categories,
        &config.bundle_params(orientation, -gap, -2.0 * gap),
    ));

    let overview = allocate_hierarchy(
        &group_columns(side, entries, domain),
        length,
        params,
        Some(domain),
    );

    AxisLayout {
        side,
        orientation,
        scale,
        tree,
        columns,
        categories,
        super_categories,
        paths,
        overview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_shape_names() {
        assert_eq!(CellShape::from_name(" Circle "), Some(CellShape::Circle));
        assert_eq!(CellShape::from_name("rect"), Some(CellShape::Rect));
        assert_eq!(CellShape::from_name("hexagon"), None);
        assert_eq!(CellShape::Circle.to_string(), "circle");
    }

    #[test]
    fn rect_fills_the_cell() {
        let geometry = CellShape::Rect.geometry(Band::new(10.0, 20.0), Band::new(0.0, 40.0), 0.5);
        assert_eq!(
            geometry,
            CellGeometry::Rect {
                x: 10.0,
                y: 0.0,
                width: 20.0,
                height: 40.0
            }
        );
    }

    #[test]
    fn circle_area_follows_score() {
        let full = CellShape::Circle.geometry(Band::new(0.0, 40.0), Band::new(0.0, 20.0), 1.0);
        assert_eq!(
            full,
            CellGeometry::Circle {
                cx: 20.0,
                cy: 10.0,
                r: 10.0
            }
        );
        let quarter = CellShape::Circle.geometry(Band::new(0.0, 40.0), Band::new(0.0, 20.0), 0.25);
        assert!(matches!(quarter, CellGeometry::Circle { r, .. } if (r - 5.0).abs() < 1e-12));
        let nan = CellShape::Circle.geometry(Band::new(0.0, 40.0), Band::new(0.0, 20.0), f64::NAN);
        assert!(matches!(nan, CellGeometry::Circle { r, .. } if r == 0.0));
    }

    #[test]
    fn domain_keeps_active_order_then_extras() {
        let active = vec!["b".to_string(), "a".to_string(), "idle".to_string()];
        let visible = vec![
            AggregatedCandidate {
                source_column: "a".to_string(),
                target_column: "x".to_string(),
                score: 0.9,
                matchers: vec![],
                status: CandidateStatus::Idle,
            },
            AggregatedCandidate {
                source_column: "extra".to_string(),
                target_column: "x".to_string(),
                score: 0.8,
                matchers: vec![],
                status: CandidateStatus::Idle,
            },
            AggregatedCandidate {
                source_column: "b".to_string(),
                target_column: "y".to_string(),
                score: 0.7,
                matchers: vec![],
                status: CandidateStatus::Idle,
            },
        ];
        assert_eq!(
            axis_domain(&active, &visible, Side::Source),
            vec!["b".to_string(), "a".to_string(), "extra".to_string()]
        );
        assert_eq!(
            axis_domain(&[], &visible, Side::Target),
            vec!["x".to_string(), "y".to_string()]
        );
    }
}
