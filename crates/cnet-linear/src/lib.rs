//! Closed-form epipolar geometry for control-network densification.
//!
//! - [`fundamental`]: normalized 8-point solver, RANSAC estimation and the
//!   per-correspondence epipolar distance used to rank matches.
//! - [`transfer`]: epipolar lines and the two-view point transfer into a
//!   third image.
//! - [`math`]: Hartley normalization and SVD helpers.
//!
//! All functions take **pixel coordinates**. A fundamental matrix `F` for
//! the ordered pair `(a, b)` satisfies `x_b^T F x_a = 0`, so `F x_a` is the
//! epipolar line of `x_a` in image `b`.

pub mod fundamental;
pub mod math;
pub mod transfer;

pub use fundamental::{
    epipolar_distance, fundamental_8point, fundamental_ransac, reprojection_error, EpipolarError,
    FundamentalEstimate,
};
pub use transfer::{epipolar_line, intersect_lines, transfer_point};

pub mod prelude {
    pub use crate::fundamental::{fundamental_8point, fundamental_ransac, reprojection_error};
    pub use crate::transfer::{epipolar_line, intersect_lines, transfer_point};
}
