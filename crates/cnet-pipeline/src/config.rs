use crate::suppression::SuppressionOptions;
use cnet_core::{RansacOptions, Real};
use serde::{Deserialize, Serialize};

/// SRID stamped on emitted point geometries.
pub const DEFAULT_SRID: u32 = 949900;

/// Callback identifier carried by every job output message.
pub const DEFAULT_CALLBACK: &str = "create_network_callback";

/// How many points to request from suppression for a given overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetCountOptions {
    /// Ground area per requested point, in squared ground units.
    pub area_per_point: Real,
    pub min: usize,
    pub max: usize,
}

impl Default for TargetCountOptions {
    fn default() -> Self {
        Self {
            area_per_point: 0.005,
            min: 3,
            max: 25,
        }
    }
}

impl TargetCountOptions {
    /// Target point count for an overlap of the given area.
    ///
    /// Always at least 1. `min` wins over an inverted `max`.
    pub fn target_for_area(&self, area: Real) -> usize {
        let raw = area / self.area_per_point;
        let raw = if raw.is_finite() { raw.round().max(0.0) } else { 0.0 };
        let lo = self.min.max(1);
        let hi = self.max.max(lo);
        (raw as usize).clamp(lo, hi)
    }
}

/// Per-edge fundamental matrix estimation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationOptions {
    pub ransac: RansacOptions,
    /// Drop correspondences outside the RANSAC consensus before ranking.
    pub discard_outliers: bool,
}

/// Full densification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensifyConfig {
    pub suppression: SuppressionOptions,
    pub target: TargetCountOptions,
    pub estimation: EstimationOptions,
    pub srid: u32,
    pub callback: String,
}

impl Default for DensifyConfig {
    fn default() -> Self {
        Self {
            suppression: SuppressionOptions::default(),
            target: TargetCountOptions::default(),
            estimation: EstimationOptions::default(),
            srid: DEFAULT_SRID,
            callback: DEFAULT_CALLBACK.to_string(),
        }
    }
}
