#![deny(unsafe_code)]

//! Aggregation and layout engine behind the match review grid.
//!
//! Leaves first: [`aggregate`] merges per-matcher scores, [`filter`] reduces
//! them to the current view, [`scale`] turns columns into pixel bands,
//! [`hierarchy`] builds the ontology trees, [`segments`] sizes category
//! bands and [`bundle`] draws connectors between layers. [`view`] runs the
//! whole pipeline and [`session`] memoizes it.

pub mod aggregate;
pub mod bundle;
pub mod config;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod scale;
pub mod segments;
pub mod session;
pub mod summary;
pub mod view;

pub use crate::aggregate::{DEFAULT_MATCHER_WEIGHT, WeightTable, aggregate};
pub use crate::bundle::{BundleParams, EdgePath, Orientation, Point, bundle_paths};
pub use crate::config::{LayoutConfig, load_config, save_config};
pub use crate::error::ConfigError;
pub use crate::filter::{
    NodeSelection, PageWindow, Predicate, SourceSelector, ViewFilter, apply_predicates,
    filter_view,
};
pub use crate::hierarchy::{
    ExpandedIds, NodeIndex, NodeLevel, OntologyTree, TreeNode, build_ontology_tree,
    group_columns, select_columns, toggle_node,
};
pub use crate::scale::{AxisScale, Band, ScaleConstants, build_scale};
pub use crate::segments::{
    AllocationMode, HierarchyBands, SegmentBand, SegmentGroup, SegmentParams,
    SuperCategoryGroup, allocate_hierarchy, allocate_segments, column_bands, effective_spacing,
};
pub use crate::session::{CacheStats, ReviewSession};
pub use crate::summary::{CandidateSummary, ScoreBand, ScoreThresholds};
pub use crate::view::{
    AxisLayout, CellGeometry, CellShape, MatrixCell, MatrixLayout, ViewState,
    build_matrix_layout,
};
