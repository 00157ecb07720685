//! Curved connectors between child bands and the segments that own them.
//!
//! Each edge is a cubic Bezier from the midpoint of the child band on the
//! child layer to the midpoint of the parent band on the parent layer. The
//! control points sit at `near_fraction` and `far_fraction` of the distance
//! between the two layers, which gives every connector the same S shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::segments::SegmentBand;

/// How columns and hierarchy layers are arranged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Bands run along x; layers stack along y (hierarchy above the columns).
    #[default]
    Horizontal,
    /// Bands run along y; layers stack along x (hierarchy beside the rows).
    Vertical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point with the coordinates swapped.
    #[must_use]
    pub fn transposed(self) -> Self {
        Self::new(self.y, self.x)
    }
}

impl Orientation {
    /// Maps an (along-band, across-layers) pair to screen coordinates.
    pub fn point(&self, along: f64, across: f64) -> Point {
        match self {
            Self::Horizontal => Point::new(along, across),
            Self::Vertical => Point::new(across, along),
        }
    }
}

/// Geometry of one child-to-parent layer pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BundleParams {
    pub orientation: Orientation,
    /// Cross-axis coordinate of the child layer edge the edges leave from.
    pub child_layer: f64,
    /// Cross-axis coordinate of the parent layer edge the edges arrive at.
    pub parent_layer: f64,
    pub near_fraction: f64,
    pub far_fraction: f64,
}

impl BundleParams {
    pub fn new(orientation: Orientation, child_layer: f64, parent_layer: f64) -> Self {
        Self {
            orientation,
            child_layer,
            parent_layer,
            near_fraction: 0.3,
            far_fraction: 0.7,
        }
    }

    #[must_use]
    pub fn with_fractions(mut self, near_fraction: f64, far_fraction: f64) -> Self {
        self.near_fraction = near_fraction;
        self.far_fraction = far_fraction;
        self
    }
}

/// A connector from a child band to its owning segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePath {
    pub child: String,
    pub parent: String,
    /// Start, first control, second control, end.
    pub points: [Point; 4],
    /// SVG path data.
    pub d: String,
}

impl EdgePath {
    /// Point on the curve at `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point {
        let [p0, p1, p2, p3] = self.points;
        let t = t.clamp(0.0, 1.0);
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * p0.x + b * p1.x + c * p2.x + d * p3.x,
            a * p0.y + b * p1.y + c * p2.y + d * p3.y,
        )
    }
}

/// Builds one connector per (parent, child reference) pair.
///
/// Child references that do not match a band in `child_bands` are skipped.
/// Output follows parent order, then each parent's child order.
pub fn bundle_paths(
    child_bands: &[SegmentBand],
    parent_bands: &[SegmentBand],
    params: &BundleParams,
) -> Vec<EdgePath> {
    let children: HashMap<&str, &SegmentBand> = child_bands
        .iter()
        .rev()
        .map(|band| (band.id.as_str(), band))
        .collect();

    let mut paths = Vec::new();
    for parent in parent_bands {
        for child_ref in &parent.child_refs {
            let Some(child) = children.get(child_ref.as_str()) else {
                continue;
            };
            paths.push(edge(child, parent, params));
        }
    }
    paths
}

fn edge(child: &SegmentBand, parent: &SegmentBand, params: &BundleParams) -> EdgePath {
    let distance = params.parent_layer - params.child_layer;
    let child_mid = child.band().midpoint();
    let parent_mid = parent.band().midpoint();
    let orientation = params.orientation;

    let points = [
        orientation.point(child_mid, params.child_layer),
        orientation.point(child_mid, params.child_layer + distance * params.near_fraction),
        orientation.point(parent_mid, params.child_layer + distance * params.far_fraction),
        orientation.point(parent_mid, params.parent_layer),
    ];
    EdgePath {
        child: child.id.clone(),
        parent: parent.id.clone(),
        d: path_data(&points),
        points,
    }
}

fn path_data(points: &[Point; 4]) -> String {
    let [p0, p1, p2, p3] = points;
    format!(
        "M{},{} C{},{} {},{} {},{}",
        fmt_coord(p0.x),
        fmt_coord(p0.y),
        fmt_coord(p1.x),
        fmt_coord(p1.y),
        fmt_coord(p2.x),
        fmt_coord(p2.y),
        fmt_coord(p3.x),
        fmt_coord(p3.y),
    )
}

/// Two decimals at most, without trailing zeros.
fn fmt_coord(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(id: &str, start: f64, extent: f64, children: &[&str]) -> SegmentBand {
        SegmentBand {
            id: id.to_string(),
            label: id.to_string(),
            start,
            extent,
            child_refs: children.iter().map(|c| (*c).to_string()).collect(),
            pinned: false,
        }
    }

    fn sample() -> (Vec<SegmentBand>, Vec<SegmentBand>) {
        let columns = vec![band("a", 0.0, 100.0, &[]), band("b", 100.0, 100.0, &[])];
        let categories = vec![band("cat", 0.0, 200.0, &["a", "b", "missing"])];
        (columns, categories)
    }

    #[test]
    fn horizontal_edges_run_between_midpoints() {
        let (columns, categories) = sample();
        let params = BundleParams::new(Orientation::Horizontal, 100.0, 0.0);
        let paths = bundle_paths(&columns, &categories, &params);
        assert_eq!(paths.len(), 2);
        let first = &paths[0];
        assert_eq!(first.child, "a");
        assert_eq!(first.points[0], Point::new(50.0, 100.0));
        assert_eq!(first.points[1], Point::new(50.0, 70.0));
        assert_eq!(first.points[2], Point::new(100.0, 30.0));
        assert_eq!(first.points[3], Point::new(100.0, 0.0));
        insta::assert_snapshot!(first.d.as_str(), @"M50,100 C50,70 100,30 100,0");
    }

    #[test]
    fn vertical_orientation_is_the_transpose() {
        let (columns, categories) = sample();
        let horizontal = bundle_paths(
            &columns,
            &categories,
            &BundleParams::new(Orientation::Horizontal, 100.0, 0.0),
        );
        let vertical = bundle_paths(
            &columns,
            &categories,
            &BundleParams::new(Orientation::Vertical, 100.0, 0.0),
        );
        for (h, v) in horizontal.iter().zip(&vertical) {
            let transposed: Vec<Point> = h.points.iter().copied().map(Point::transposed).collect();
            assert_eq!(transposed, v.points.to_vec());
        }
        insta::assert_snapshot!(vertical[1].d.as_str(), @"M100,150 C70,150 30,100 0,100");
    }

    #[test]
    fn curve_passes_through_layer_midline() {
        let (columns, categories) = sample();
        let paths = bundle_paths(
            &columns,
            &categories,
            &BundleParams::new(Orientation::Horizontal, 100.0, 0.0),
        );
        let mid = paths[0].point_at(0.5);
        assert!((mid.y - 50.0).abs() < 1e-9);
        assert!((mid.x - 75.0).abs() < 1e-9);
        assert_eq!(paths[0].point_at(0.0), paths[0].points[0]);
    }

    #[test]
    fn coordinates_are_trimmed() {
        assert_eq!(fmt_coord(33.333_333), "33.33");
        assert_eq!(fmt_coord(12.5), "12.5");
        assert_eq!(fmt_coord(-0.001), "0");
        assert_eq!(fmt_coord(f64::NAN), "0");
        assert_eq!(fmt_coord(-7.0), "-7");
    }
}
