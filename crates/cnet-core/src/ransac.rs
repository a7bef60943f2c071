//! Generic, model-agnostic RANSAC engine.
//!
//! Implement [`Estimator`] for a model and call [`ransac_fit`] with the data
//! and some [`RansacOptions`]. The engine never panics on failure: when no
//! consensus is found the returned [`RansacResult`] has `success == false`
//! and `model == None`.
//!
//! Sampling is driven by a seeded [`StdRng`], so a given input and seed
//! always produce the same model.

use rand::prelude::IndexedRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration parameters for the RANSAC engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacOptions {
    /// Maximum number of iterations.
    pub max_iters: usize,
    /// Inlier residual threshold, in the units of [`Estimator::residual`].
    pub thresh: f64,
    /// Minimum number of inliers required to accept a model.
    pub min_inliers: usize,
    /// Desired probability in `[0, 1]` of drawing at least one clean sample.
    pub confidence: f64,
    /// Random-number generator seed.
    pub seed: u64,
    /// Refit the model on all inliers before scoring.
    pub refit_on_inliers: bool,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            thresh: 20.0,
            min_inliers: 8,
            confidence: 0.99,
            seed: 1_234_567,
            refit_on_inliers: true,
        }
    }
}

/// Output of a RANSAC run.
///
/// Check `success` before using the model.
#[derive(Debug, Clone)]
pub struct RansacResult<M> {
    /// Whether a consensus set satisfying the options was found.
    pub success: bool,
    /// Best model found (if any).
    pub model: Option<M>,
    /// Indices of inlier data points, ascending.
    pub inliers: Vec<usize>,
    /// Root-mean-square residual over inliers.
    pub inlier_rms: f64,
    /// Iteration at which the best model was found.
    pub iters: usize,
}

impl<M> Default for RansacResult<M> {
    fn default() -> Self {
        Self {
            success: false,
            model: None,
            inliers: Vec::new(),
            inlier_rms: f64::INFINITY,
            iters: 0,
        }
    }
}

impl<M> RansacResult<M> {
    /// Dense boolean inlier mask over `n` data points.
    pub fn inlier_mask(&self, n: usize) -> Vec<bool> {
        let mut mask = vec![false; n];
        for &i in &self.inliers {
            if let Some(slot) = mask.get_mut(i) {
                *slot = true;
            }
        }
        mask
    }
}

/// Model estimator plugged into [`ransac_fit`].
pub trait Estimator {
    type Datum;
    type Model;

    /// Minimal number of samples needed to estimate a model.
    const MIN_SAMPLES: usize;

    /// Fit a model from a subset of data indices.
    ///
    /// Return `None` if the subset is degenerate or fitting fails.
    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model>;

    /// Non-negative residual of one datum, in the same units as `opts.thresh`.
    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64;

    /// Optional degeneracy check on the sample subset.
    fn is_degenerate(_data: &[Self::Datum], _sample_indices: &[usize]) -> bool {
        false
    }

    /// Optional refit on the full inlier set.
    fn refit(_data: &[Self::Datum], _inliers: &[usize]) -> Option<Self::Model> {
        None
    }
}

fn rms(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::INFINITY;
    }
    let ss: f64 = vals.iter().map(|&v| v * v).sum();
    (ss / (vals.len() as f64)).sqrt()
}

/// Adaptive iteration bound from the current inlier ratio.
fn adaptive_iterations(
    confidence: f64,
    inlier_ratio: f64,
    min_samples: usize,
    iters_so_far: usize,
    max_iters: usize,
) -> usize {
    if confidence <= 0.0 || inlier_ratio <= 0.0 {
        return max_iters;
    }

    let denom = (1.0 - inlier_ratio.powf(min_samples as f64)).max(1e-12).ln();
    if denom >= 0.0 {
        return max_iters;
    }

    let n_iter = ((1.0 - confidence).ln() / denom).ceil() as usize;
    n_iter.clamp(iters_so_far, max_iters)
}

fn collect_inliers<E: Estimator>(
    model: &E::Model,
    data: &[E::Datum],
    thresh: f64,
    inliers: &mut Vec<usize>,
    residuals: &mut Vec<f64>,
) {
    inliers.clear();
    residuals.clear();
    for (i, datum) in data.iter().enumerate() {
        let r = E::residual(model, datum);
        if r <= thresh {
            inliers.push(i);
            residuals.push(r);
        }
    }
}

/// Run the RANSAC loop for a given [`Estimator`] implementation.
///
/// Returns an unsuccessful [`RansacResult`] when there is not enough data
/// or no model reaches `opts.min_inliers` within the iteration budget.
pub fn ransac_fit<E: Estimator>(data: &[E::Datum], opts: &RansacOptions) -> RansacResult<E::Model> {
    let mut best: RansacResult<E::Model> = RansacResult::default();

    if data.len() < E::MIN_SAMPLES {
        return best;
    }

    let all_indices: Vec<usize> = (0..data.len()).collect();
    let mut sample = vec![0usize; E::MIN_SAMPLES];
    let mut rng = StdRng::seed_from_u64(opts.seed);

    let mut budget = opts.max_iters;
    let mut inliers = Vec::with_capacity(data.len());
    let mut residuals = Vec::with_capacity(data.len());
    let mut refit_inliers = Vec::with_capacity(data.len());
    let mut refit_residuals = Vec::with_capacity(data.len());

    let mut iter = 0;
    while iter < budget {
        iter += 1;
        for (slot, &idx) in sample
            .iter_mut()
            .zip(all_indices.as_slice().choose_multiple(&mut rng, E::MIN_SAMPLES))
        {
            *slot = idx;
        }

        if E::is_degenerate(data, &sample) {
            continue;
        }
        let Some(model) = E::fit(data, &sample) else {
            continue;
        };

        collect_inliers::<E>(&model, data, opts.thresh, &mut inliers, &mut residuals);
        if inliers.len() < opts.min_inliers {
            continue;
        }

        let mut candidate = model;
        let mut use_refit = false;
        if opts.refit_on_inliers {
            if let Some(refit) = E::refit(data, &inliers) {
                collect_inliers::<E>(
                    &refit,
                    data,
                    opts.thresh,
                    &mut refit_inliers,
                    &mut refit_residuals,
                );
                // A refit that loses support is discarded.
                if refit_inliers.len() >= inliers.len() {
                    candidate = refit;
                    use_refit = true;
                }
            }
        }
        let (final_inliers, final_residuals) = if use_refit {
            (&refit_inliers, &refit_residuals)
        } else {
            (&inliers, &residuals)
        };

        let final_rms = rms(final_residuals);
        let better = !best.success
            || final_inliers.len() > best.inliers.len()
            || (final_inliers.len() == best.inliers.len() && final_rms < best.inlier_rms);
        if better {
            best.success = true;
            best.model = Some(candidate);
            best.inliers = final_inliers.clone();
            best.inlier_rms = final_rms;
            best.iters = iter;
        }

        let ratio = final_inliers.len() as f64 / data.len() as f64;
        budget = adaptive_iterations(opts.confidence, ratio, E::MIN_SAMPLES, iter, opts.max_iters);
    }

    best
}
