//! Numerical helpers shared by the linear solvers.
//!
//! Hartley normalization centers a point set at the origin and scales it so
//! the mean distance to the origin is `√2`; DLT-style solvers are badly
//! conditioned on raw pixel coordinates without it.

use cnet_core::{Mat3, Pt2, Real};
use nalgebra::DMatrix;

/// Hartley normalization for 2D points.
///
/// Returns the normalized points and the transform `T` with
/// `p_norm = T * p_homogeneous`, or `None` for an empty or fully
/// coincident point set.
///
/// # References
///
/// Hartley & Zisserman, "Multiple View Geometry in Computer Vision", 2nd ed.,
/// Algorithm 4.2 (Normalized DLT)
pub fn normalize_points_2d(points: &[Pt2]) -> Option<(Vec<Pt2>, Mat3)> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as Real;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<Real>()
        / n;
    if !mean_dist.is_finite() || mean_dist <= Real::EPSILON {
        return None;
    }

    let scale = std::f64::consts::SQRT_2 / mean_dist;
    let t = Mat3::new(
        scale,
        0.0,
        -scale * cx,
        0.0,
        scale,
        -scale * cy,
        0.0,
        0.0,
        1.0,
    );
    let normalized = points
        .iter()
        .map(|p| Pt2::new((p.x - cx) * scale, (p.y - cy) * scale))
        .collect();

    Some((normalized, t))
}

/// Right null vector of `a` (singular vector of the smallest singular value).
///
/// Under-determined systems are zero-padded to square so the SVD exposes a
/// full `V^T`.
pub fn null_vector(a: &DMatrix<Real>) -> Option<Vec<Real>> {
    let cols = a.ncols();
    let work = if a.nrows() < cols {
        let mut padded = DMatrix::<Real>::zeros(cols, cols);
        padded.view_mut((0, 0), (a.nrows(), cols)).copy_from(a);
        padded
    } else {
        a.clone()
    };
    let svd = work.svd(false, true);
    let v_t = svd.v_t?;
    let (min_idx, _) = svd.singular_values.argmin();
    Some(v_t.row(min_idx).iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalized_points_are_centered_with_sqrt2_spread() {
        let pts = vec![
            Pt2::new(100.0, 200.0),
            Pt2::new(150.0, 250.0),
            Pt2::new(120.0, 220.0),
            Pt2::new(90.0, 260.0),
        ];
        let (norm, t) = normalize_points_2d(&pts).unwrap();
        let n = norm.len() as Real;
        let cx: Real = norm.iter().map(|p| p.x).sum::<Real>() / n;
        let cy: Real = norm.iter().map(|p| p.y).sum::<Real>() / n;
        assert_abs_diff_eq!(cx, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cy, 0.0, epsilon = 1e-12);
        let mean: Real = norm.iter().map(|p| p.coords.norm()).sum::<Real>() / n;
        assert_abs_diff_eq!(mean, std::f64::consts::SQRT_2, epsilon = 1e-12);

        let mapped = t * cnet_core::to_homogeneous(&pts[1]);
        assert_abs_diff_eq!(mapped.x, norm[1].x, epsilon = 1e-12);
    }

    #[test]
    fn coincident_points_cannot_be_normalized() {
        assert!(normalize_points_2d(&[Pt2::new(1.0, 1.0); 4]).is_none());
        assert!(normalize_points_2d(&[]).is_none());
    }
}
