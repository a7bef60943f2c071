//! Estimation and scoring seams used by the orchestrator.

use cnet_core::{Mat3, Pt2, RansacOptions, Real};
use cnet_linear::{fundamental_ransac, reprojection_error, EpipolarError, FundamentalEstimate};

/// Estimates the fundamental matrix of one edge, `x2^T F x1 = 0`.
pub trait FundamentalEstimator {
    fn estimate(&self, pts1: &[Pt2], pts2: &[Pt2]) -> Result<FundamentalEstimate, EpipolarError>;
}

/// Scores each correspondence under a fundamental matrix; lower is better.
pub trait ReprojectionScorer {
    fn score(&self, f: &Mat3, pts1: &[Pt2], pts2: &[Pt2]) -> Vec<Real>;
}

impl<E: FundamentalEstimator + ?Sized> FundamentalEstimator for &E {
    fn estimate(&self, pts1: &[Pt2], pts2: &[Pt2]) -> Result<FundamentalEstimate, EpipolarError> {
        (**self).estimate(pts1, pts2)
    }
}

impl<S: ReprojectionScorer + ?Sized> ReprojectionScorer for &S {
    fn score(&self, f: &Mat3, pts1: &[Pt2], pts2: &[Pt2]) -> Vec<Real> {
        (**self).score(f, pts1, pts2)
    }
}

/// Normalized 8-point inside RANSAC.
#[derive(Debug, Clone, Default)]
pub struct RansacFundamentalEstimator {
    pub opts: RansacOptions,
}

impl RansacFundamentalEstimator {
    pub fn new(opts: RansacOptions) -> Self {
        Self { opts }
    }
}

impl FundamentalEstimator for RansacFundamentalEstimator {
    fn estimate(&self, pts1: &[Pt2], pts2: &[Pt2]) -> Result<FundamentalEstimate, EpipolarError> {
        fundamental_ransac(pts1, pts2, &self.opts)
    }
}

/// First-order geometric epipolar distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpipolarDistanceScorer;

impl ReprojectionScorer for EpipolarDistanceScorer {
    fn score(&self, f: &Mat3, pts1: &[Pt2], pts2: &[Pt2]) -> Vec<Real> {
        reprojection_error(f, pts1, pts2)
    }
}
