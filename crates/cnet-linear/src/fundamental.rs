//! Fundamental matrix estimation and scoring.
//!
//! Implements the normalized 8-point algorithm, RANSAC-based robust
//! estimation on top of [`cnet_core::ransac_fit`], and the first-order
//! geometric epipolar distance used both as the RANSAC residual and as the
//! per-correspondence `strength` score (lower is better).

use crate::math::{normalize_points_2d, null_vector};
use cnet_core::{ransac_fit, Estimator, Mat3, Pt2, RansacOptions, Real, Vec3};
use log::debug;
use nalgebra::DMatrix;
use thiserror::Error;

/// Errors that can occur during fundamental matrix estimation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EpipolarError {
    /// Not enough point correspondences were provided.
    #[error("need at least 8 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    /// The two point sets have different lengths.
    #[error("point count mismatch: {left} vs {right}")]
    CountMismatch { left: usize, right: usize },
    /// All points coincide, so the problem cannot be conditioned.
    #[error("degenerate point configuration")]
    Degenerate,
    /// Linear solve (SVD) failed.
    #[error("svd failed in epipolar estimation")]
    SvdFailed,
    /// RANSAC failed to find a consensus model.
    #[error("ransac failed to find a consensus epipolar model ({0} correspondences)")]
    RansacFailed(usize),
}

/// Robustly estimated fundamental matrix with its inlier mask.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalEstimate {
    /// Rank-2 matrix with unit Frobenius norm, `x2^T F x1 = 0`.
    pub matrix: Mat3,
    /// `true` for correspondences within the RANSAC threshold.
    pub inlier_mask: Vec<bool>,
}

impl FundamentalEstimate {
    pub fn num_inliers(&self) -> usize {
        self.inlier_mask.iter().filter(|&&m| m).count()
    }
}

fn check_counts(pts1: &[Pt2], pts2: &[Pt2]) -> Result<(), EpipolarError> {
    if pts1.len() != pts2.len() {
        return Err(EpipolarError::CountMismatch {
            left: pts1.len(),
            right: pts2.len(),
        });
    }
    if pts1.len() < 8 {
        return Err(EpipolarError::NotEnoughPoints(pts1.len()));
    }
    Ok(())
}

/// Normalized 8-point algorithm for the fundamental matrix.
///
/// `pts1` and `pts2` are corresponding pixel points in two images. The
/// returned matrix is forced to rank 2, scaled to unit norm, and satisfies
/// `x2^T F x1 = 0` up to numerical error.
pub fn fundamental_8point(pts1: &[Pt2], pts2: &[Pt2]) -> Result<Mat3, EpipolarError> {
    check_counts(pts1, pts2)?;

    let (n1, t1) = normalize_points_2d(pts1).ok_or(EpipolarError::Degenerate)?;
    let (n2, t2) = normalize_points_2d(pts2).ok_or(EpipolarError::Degenerate)?;

    let mut a = DMatrix::<Real>::zeros(n1.len(), 9);
    for (i, (p1, p2)) in n1.iter().zip(n2.iter()).enumerate() {
        let (x, y, xp, yp) = (p1.x, p1.y, p2.x, p2.y);
        a[(i, 0)] = xp * x;
        a[(i, 1)] = xp * y;
        a[(i, 2)] = xp;
        a[(i, 3)] = yp * x;
        a[(i, 4)] = yp * y;
        a[(i, 5)] = yp;
        a[(i, 6)] = x;
        a[(i, 7)] = y;
        a[(i, 8)] = 1.0;
    }

    let f_vec = null_vector(&a).ok_or(EpipolarError::SvdFailed)?;
    let f = Mat3::from_row_slice(&f_vec);

    // Enforce the rank-2 constraint.
    let svd = f.svd(true, true);
    let u = svd.u.ok_or(EpipolarError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(EpipolarError::SvdFailed)?;
    let mut s = svd.singular_values;
    let (min_idx, _) = s.argmin();
    s[min_idx] = 0.0;
    let f = u * Mat3::from_diagonal(&s) * v_t;

    let f = t2.transpose() * f * t1;
    let norm = f.norm();
    if !norm.is_finite() || norm <= Real::EPSILON {
        return Err(EpipolarError::Degenerate);
    }
    Ok(f / norm)
}

/// First-order geometric (Sampson) epipolar distance of one correspondence.
///
/// Zero for a perfect match; grows roughly linearly with the pixel offset
/// of either point from its epipolar line.
pub fn epipolar_distance(f: &Mat3, x1: &Pt2, x2: &Pt2) -> Real {
    let a = Vec3::new(x1.x, x1.y, 1.0);
    let b = Vec3::new(x2.x, x2.y, 1.0);
    let fa = f * a;
    let ftb = f.transpose() * b;
    let denom = (fa.x * fa.x + fa.y * fa.y + ftb.x * ftb.x + ftb.y * ftb.y).max(1e-12);
    let val = b.dot(&fa);
    (val * val / denom).sqrt()
}

/// Per-correspondence epipolar distance under `f` (lower is better).
///
/// Extra points in the longer slice are ignored.
pub fn reprojection_error(f: &Mat3, pts1: &[Pt2], pts2: &[Pt2]) -> Vec<Real> {
    pts1.iter()
        .zip(pts2)
        .map(|(a, b)| epipolar_distance(f, a, b))
        .collect()
}

#[derive(Clone)]
struct Pair {
    x1: Pt2,
    x2: Pt2,
}

struct FundamentalEst;

impl FundamentalEst {
    fn solve(data: &[Pair], indices: &[usize]) -> Option<Mat3> {
        let (p1, p2): (Vec<Pt2>, Vec<Pt2>) =
            indices.iter().map(|&i| (data[i].x1, data[i].x2)).unzip();
        fundamental_8point(&p1, &p2).ok()
    }
}

impl Estimator for FundamentalEst {
    type Datum = Pair;
    type Model = Mat3;

    const MIN_SAMPLES: usize = 8;

    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model> {
        Self::solve(data, sample_indices)
    }

    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64 {
        epipolar_distance(model, &datum.x1, &datum.x2)
    }

    fn refit(data: &[Self::Datum], inliers: &[usize]) -> Option<Self::Model> {
        if inliers.len() < Self::MIN_SAMPLES {
            return None;
        }
        Self::solve(data, inliers)
    }
}

/// Robust fundamental matrix estimation: 8-point inside RANSAC.
///
/// `opts.thresh` is an epipolar distance in pixels.
pub fn fundamental_ransac(
    pts1: &[Pt2],
    pts2: &[Pt2],
    opts: &RansacOptions,
) -> Result<FundamentalEstimate, EpipolarError> {
    check_counts(pts1, pts2)?;

    let data: Vec<Pair> = pts1
        .iter()
        .zip(pts2)
        .map(|(&x1, &x2)| Pair { x1, x2 })
        .collect();

    let res = ransac_fit::<FundamentalEst>(&data, opts);
    let matrix = match res.model {
        Some(m) if res.success => m,
        _ => return Err(EpipolarError::RansacFailed(data.len())),
    };
    debug!(
        "fundamental ransac: {}/{} inliers, rms {:.3} px, best at iter {}",
        res.inliers.len(),
        data.len(),
        res.inlier_rms,
        res.iters
    );

    Ok(FundamentalEstimate {
        matrix,
        inlier_mask: res.inlier_mask(data.len()),
    })
}
