//! Mathematical utilities and type definitions.
//!
//! This module provides the fundamental types used throughout the workspace
//! and the homogeneous-coordinate helpers shared by the epipolar solvers and
//! the transfer engine.

use nalgebra::{Matrix3, Point2, Vector2, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;

/// Relative threshold under which a homogeneous scale is treated as zero.
pub const HOMOGENEOUS_EPS: Real = 1e-12;

/// Convert a 2D point in Euclidean coordinates into homogeneous coordinates.
///
/// Given a point `p = (x, y)`, returns the homogeneous vector `(x, y, 1)`.
pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 1.0)
}

/// Convert a batch of points into homogeneous form.
pub fn to_homogeneous_all(points: &[Pt2]) -> Vec<Vec3> {
    points.iter().map(to_homogeneous).collect()
}

/// Convert a 3D homogeneous vector back to a 2D point.
///
/// The input is interpreted as `(x, y, w)` and the result is `(x / w, y / w)`.
/// Returns `None` for points at infinity (`|w|` negligible relative to the
/// vector norm) and for non-finite input.
pub fn from_homogeneous(v: &Vec3) -> Option<Pt2> {
    let norm = v.norm();
    if !norm.is_finite() || norm == 0.0 {
        return None;
    }
    if v.z.abs() <= HOMOGENEOUS_EPS * norm {
        return None;
    }
    let p = Pt2::new(v.x / v.z, v.y / v.z);
    (p.x.is_finite() && p.y.is_finite()).then_some(p)
}

/// Skew-symmetric cross-product matrix `[v]_x` such that `[v]_x w = v × w`.
pub fn skew(v: &Vec3) -> Mat3 {
    Mat3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}
