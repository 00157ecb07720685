//! Layout configuration, persisted as TOML.
//!
//! Every section falls back to its defaults when omitted, so a partial file
//! such as
//!
//! ```toml
//! [grid]
//! width = 1200.0
//! ```
//!
//! is a valid configuration.

use std::fs;
use std::path::Path;

use matchview_model::Side;
use serde::{Deserialize, Serialize};

use crate::bundle::{BundleParams, Orientation};
use crate::error::ConfigError;
use crate::scale::{SOURCE_GROUP_DIVISOR, ScaleConstants, TARGET_GROUP_DIVISOR};
use crate::segments::SegmentParams;
use crate::view::CellShape;

/// Complete layout configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub grid: GridSettings,
    pub segments: SegmentSettings,
    pub bundling: BundlingSettings,
    pub view: ViewSettings,
}

// ============================================================================
// Grid
// ============================================================================

/// Size of the match grid and how strongly a focused band grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Length of the target (x) axis in pixels.
    pub width: f64,
    /// Length of the source (y) axis in pixels.
    pub height: f64,
    pub source_group_divisor: f64,
    pub target_group_divisor: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 600.0,
            source_group_divisor: SOURCE_GROUP_DIVISOR,
            target_group_divisor: TARGET_GROUP_DIVISOR,
        }
    }
}

// ============================================================================
// Segments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentSettings {
    /// Minimum extent of a category or super-category band.
    pub min_size: f64,
    /// Gap between sibling bands.
    pub spacing: f64,
    /// Distance between stacked hierarchy layers.
    pub layer_gap: f64,
}

impl Default for SegmentSettings {
    fn default() -> Self {
        let params = SegmentParams::default();
        Self {
            min_size: params.min_size,
            spacing: params.spacing,
            layer_gap: 40.0,
        }
    }
}

// ============================================================================
// Bundling
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlingSettings {
    pub near_fraction: f64,
    pub far_fraction: f64,
}

impl Default for BundlingSettings {
    fn default() -> Self {
        Self {
            near_fraction: 0.3,
            far_fraction: 0.7,
        }
    }
}

// ============================================================================
// View
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Default score threshold.
    pub threshold: f64,
    /// Source columns per page when all sources are shown.
    pub page_size: usize,
    pub cell_shape: CellShape,
    /// Number of computed layouts kept by a review session.
    pub cache_capacity: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            page_size: 10,
            cell_shape: CellShape::default(),
            cache_capacity: 16,
        }
    }
}

impl LayoutConfig {
    /// Axis length for one side.
    pub fn axis_length(&self, side: Side) -> f64 {
        match side {
            Side::Source => self.grid.height,
            Side::Target => self.grid.width,
        }
    }

    pub fn scale_constants(&self, side: Side) -> ScaleConstants {
        match side {
            Side::Source => ScaleConstants::new(self.grid.source_group_divisor),
            Side::Target => ScaleConstants::new(self.grid.target_group_divisor),
        }
    }

    pub fn segment_params(&self) -> SegmentParams {
        SegmentParams {
            min_size: self.segments.min_size,
            spacing: self.segments.spacing,
        }
    }

    /// Bundling geometry between two layers.
    pub fn bundle_params(
        &self,
        orientation: Orientation,
        child_layer: f64,
        parent_layer: f64,
    ) -> BundleParams {
        BundleParams::new(orientation, child_layer, parent_layer)
            .with_fractions(self.bundling.near_fraction, self.bundling.far_fraction)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Reads a layout configuration file.
pub fn load_config(path: &Path) -> Result<LayoutConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = LayoutConfig::from_toml(&content)?;
    tracing::info!("Loaded layout config from {:?}", path);
    Ok(config)
}

/// Writes a layout configuration file, creating parent directories.
pub fn save_config(config: &LayoutConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config.to_toml()?)?;
    tracing::info!("Saved layout config to {:?}", path);
    Ok(())
}
