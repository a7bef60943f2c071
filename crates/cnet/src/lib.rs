//! High-level entry crate for control-network densification.
//!
//! A job describes one overlap: a ground polygon, the images whose
//! footprints share it, and the correspondences found between them. The
//! pipeline ranks every correspondence by its epipolar reprojection error,
//! keeps a spatially well-distributed subset inside the polygon and
//! transfers each kept match into every other image of the overlap.
//!
//! ## Running a job
//!
//! ```no_run
//! use cnet::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let job = cnet::pipeline::io::load_job(Path::new("job.json"))?;
//! let config = DensifyConfig::default();
//! let output = densify(&job, &JsonKeypointStore::with_root("keypoints"), &config);
//! println!("success: {}, observations: {}", output.success, output.points.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the building blocks
//!
//! ```
//! use cnet::core::{GroundBounds, Pt2};
//! use cnet::pipeline::{spatial_suppression, Ranked, SuppressionOptions};
//!
//! #[derive(Clone)]
//! struct Tie(Pt2, f64);
//!
//! impl Ranked for Tie {
//!     fn position(&self) -> Pt2 {
//!         self.0
//!     }
//!     fn rank(&self) -> f64 {
//!         self.1
//!     }
//! }
//!
//! let ties = vec![
//!     Tie(Pt2::new(0.1, 0.1), 0.5),
//!     Tie(Pt2::new(0.12, 0.1), 0.2),
//!     Tie(Pt2::new(0.9, 0.9), 0.3),
//! ];
//! let bounds = GroundBounds::from_corners(Pt2::new(0.0, 0.0), Pt2::new(1.0, 1.0));
//! let kept = spatial_suppression(&ties, &bounds, 2, &SuppressionOptions::default());
//! assert_eq!(kept.selected.len(), 2);
//! assert_eq!(kept.selected[0].1, 0.2);
//! ```
//!
//! ## Module Organization
//!
//! - **[`core`]**: math aliases, ground geometry, RANSAC engine
//! - **[`linear`]**: fundamental matrix estimation and epipolar transfer
//! - **[`pipeline`]**: suppression, point records, orchestration, job messages
//! - **[`prelude`]**: convenient re-exports for common use cases

/// Math aliases, ground geometry and the generic RANSAC engine.
pub mod core {
    pub use cnet_core::*;
}

/// Fundamental matrix estimation, epipolar lines and point transfer.
pub mod linear {
    pub use cnet_linear::*;
}

/// Suppression, transfer, orchestration and job messages.
pub mod pipeline {
    pub use cnet_pipeline::*;
}

/// Convenient re-exports for common use cases.
///
/// Import with `use cnet::prelude::*;` to get started quickly.
pub mod prelude {
    // Geometry
    pub use crate::core::{GroundBounds, GroundPolygon, Mat3, Pt2, RansacOptions, Real, Vec3};

    // Epipolar algebra
    pub use crate::linear::{fundamental_ransac, reprojection_error, transfer_point};

    // Pipeline
    pub use crate::pipeline::{
        densify, process_overlap, run_job, spatial_suppression, transfer_points, DensifyConfig,
        Edge, FundamentalTable, ImageId, JobInput, JobOutput, JsonKeypointStore, KeypointStore,
        Observation, Ranked, SuppressionOptions, SuppressionOutcome,
    };
}
