//! Adaptive grid-based spatial suppression.
//!
//! Selects a spatially well-distributed subset of ranked points whose size
//! lands within `target ± tolerance · target`. Points are visited best rank
//! first and each grid cell keeps only the first point that falls into it.
//! There is no closed form linking cell size to the number of surviving
//! points, so the cell size is found by binary search over `steps` candidate
//! radii linearly spaced between `min(width, height) / 20` and
//! `max(width, height)`. A candidate radius `r` grids the domain with cells
//! of side `r / √2`.

use crate::types::Ranked;
use cnet_core::{GroundBounds, Pt2, Real};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Parameters of the binary search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionOptions {
    /// Accepted relative deviation from the target count.
    pub tolerance: Real,
    /// Number of candidate radii.
    pub steps: usize,
}

impl Default for SuppressionOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.05,
            steps: 250,
        }
    }
}

/// How the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionOutcome {
    /// The selected count is within tolerance of the target.
    Converged,
    /// Nothing to select; the search did not run.
    EmptyInput,
    /// Fewer candidates than the target allows; the search did not run and
    /// the finest grid's selection is returned.
    InsufficientCandidates,
    /// There are enough candidates, but even the finest grid merges too many
    /// of them into shared cells.
    TargetUnreachable,
    /// The search converged on adjacent radii without landing in tolerance.
    Unresolved,
}

impl SuppressionOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }

    /// Outcomes that return a selection but log a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::InsufficientCandidates | Self::TargetUnreachable | Self::Unresolved
        )
    }
}

/// Result of [`spatial_suppression`].
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionResult<T> {
    /// Selected points, best rank first.
    pub selected: Vec<T>,
    pub outcome: SuppressionOutcome,
    /// Cell side of the last evaluated grid (0 when no grid was built).
    pub cell_size: Real,
    /// Grid of the last evaluation.
    pub grid: Option<OccupancyGrid>,
    /// Number of grids evaluated.
    pub iterations: usize,
}

/// Upper bound on the number of cells of one grid.
pub const MAX_GRID_CELLS: usize = 1 << 22;

/// Cell lattice over a ground rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    bounds: GroundBounds,
    cell_size: Real,
    nx: usize,
    ny: usize,
}

impl OccupancyGrid {
    /// Grid with cells of side `cell_size`, at least one cell per axis.
    ///
    /// Grids that would exceed [`MAX_GRID_CELLS`] double their cell side
    /// until they fit.
    pub fn new(bounds: GroundBounds, cell_size: Real) -> Self {
        let mut cell_size = cell_size;
        loop {
            let nx = cells_along(bounds.width(), cell_size);
            let ny = cells_along(bounds.height(), cell_size);
            match nx.checked_mul(ny) {
                Some(cells) if cells <= MAX_GRID_CELLS => {
                    return Self {
                        bounds,
                        cell_size,
                        nx,
                        ny,
                    }
                }
                _ => cell_size *= 2.0,
            }
        }
    }

    /// Cell side actually used, possibly coarsened to respect the cell cap.
    pub fn cell_size(&self) -> Real {
        self.cell_size
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// `(column, row)` of the cell containing `p`; outside points are
    /// clamped to the border cells.
    pub fn cell_of(&self, p: &Pt2) -> (usize, usize) {
        (
            bin(p.x, self.bounds.min_x, self.bounds.width(), self.nx),
            bin(p.y, self.bounds.min_y, self.bounds.height(), self.ny),
        )
    }

    /// Indices (into `points`) of the first point per cell, visiting in `order`.
    pub fn first_per_cell<T: Ranked>(&self, points: &[T], order: &[usize]) -> Vec<usize> {
        let mut occupied = vec![false; self.nx * self.ny];
        let mut accepted = Vec::new();
        for &i in order {
            let (cx, cy) = self.cell_of(&points[i].position());
            let slot = &mut occupied[cy * self.nx + cx];
            if !*slot {
                *slot = true;
                accepted.push(i);
            }
        }
        accepted
    }
}

fn cells_along(extent: Real, cell_size: Real) -> usize {
    if extent > 0.0 && cell_size > 0.0 {
        let n = (extent / cell_size).round();
        if n.is_finite() && n >= 1.0 {
            return n as usize;
        }
    }
    1
}

fn bin(v: Real, min: Real, extent: Real, n: usize) -> usize {
    if extent <= 0.0 || n <= 1 {
        return 0;
    }
    let t = ((v - min) / extent * n as Real).floor().max(0.0);
    (t as usize).min(n - 1)
}

/// Candidate radius `i` of `steps` evenly spaced values in `[lo, hi]`.
fn linspace_at(lo: Real, hi: Real, steps: usize, i: usize) -> Real {
    if steps <= 1 {
        return lo;
    }
    lo + (hi - lo) * i as Real / (steps - 1) as Real
}

/// Select a spatially distributed subset of `points` of about `target` size.
///
/// `bounds` is the region being gridded and need not match the extent of
/// the points. Ties in rank keep input order. Soft failures are reported
/// through [`SuppressionResult::outcome`] and a warning; the best available
/// subset is still returned.
pub fn spatial_suppression<T: Ranked + Clone>(
    points: &[T],
    bounds: &GroundBounds,
    target: usize,
    opts: &SuppressionOptions,
) -> SuppressionResult<T> {
    if points.is_empty() {
        debug!("spatial suppression: no candidates");
        return SuppressionResult {
            selected: Vec::new(),
            outcome: SuppressionOutcome::EmptyInput,
            cell_size: 0.0,
            grid: None,
            iterations: 0,
        };
    }

    let target = target.max(1) as Real;
    let lower = target - target * opts.tolerance;
    let upper = target + target * opts.tolerance;

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| points[a].rank().total_cmp(&points[b].rank()));

    let (w, h) = (bounds.width(), bounds.height());
    let min_radius = w.min(h) / 20.0;
    let max_radius = w.max(h);
    let steps = opts.steps.max(1);
    let grid_at = |i: usize| {
        let radius = linspace_at(min_radius, max_radius, steps, i);
        OccupancyGrid::new(*bounds, radius / std::f64::consts::SQRT_2)
    };

    if (points.len() as Real) < lower {
        let grid = grid_at(0);
        let accepted = grid.first_per_cell(points, &order);
        warn!(
            "only {} candidates for a target of {target} points, kept {} on the finest grid",
            points.len(),
            accepted.len()
        );
        return SuppressionResult {
            selected: accepted.into_iter().map(|i| points[i].clone()).collect(),
            outcome: SuppressionOutcome::InsufficientCandidates,
            cell_size: grid.cell_size(),
            grid: Some(grid),
            iterations: 1,
        };
    }

    let mut lo = 0usize;
    let mut hi = steps - 1;
    let mut iterations = 0usize;

    let (accepted, grid, outcome) = loop {
        iterations += 1;
        let mid = (lo + hi) / 2;
        let stalled = lo == mid || mid == hi;

        let grid = grid_at(mid);
        let accepted = grid.first_per_cell(points, &order);
        let count = accepted.len() as Real;
        debug!(
            "suppression step {iterations}: radius idx {mid} in [{lo}, {hi}], grid {:?}, kept {}",
            grid.dims(),
            accepted.len()
        );

        let outcome = if count >= lower && count <= upper {
            Some(SuppressionOutcome::Converged)
        } else if count < lower {
            // Too few survivors: cells are too large.
            hi = mid;
            if hi == 0 {
                Some(SuppressionOutcome::TargetUnreachable)
            } else {
                stalled.then_some(SuppressionOutcome::Unresolved)
            }
        } else {
            lo = mid;
            stalled.then_some(SuppressionOutcome::Unresolved)
        };

        if let Some(outcome) = outcome {
            break (accepted, grid, outcome);
        }
    };

    match outcome {
        SuppressionOutcome::TargetUnreachable => warn!(
            "unable to retrieve {target} points from {} candidates (kept {}), request fewer",
            points.len(),
            accepted.len()
        ),
        SuppressionOutcome::Unresolved => warn!(
            "unable to optimally solve suppression: kept {} points for target {target}",
            accepted.len()
        ),
        _ => {}
    }

    SuppressionResult {
        selected: accepted.into_iter().map(|i| points[i].clone()).collect(),
        outcome,
        cell_size: grid.cell_size(),
        grid: Some(grid),
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct P {
        at: Pt2,
        rank: Real,
        tag: usize,
    }

    impl Ranked for P {
        fn position(&self) -> Pt2 {
            self.at
        }
        fn rank(&self) -> Real {
            self.rank
        }
    }

    fn unit_bounds() -> GroundBounds {
        GroundBounds::from_corners(Pt2::new(0.0, 0.0), Pt2::new(1.0, 1.0))
    }

    /// Regular `n × n` lattice with ranks decreasing along the scan.
    fn lattice(n: usize) -> Vec<P> {
        let mut out = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let tag = out.len();
                out.push(P {
                    at: Pt2::new((i as Real + 0.5) / n as Real, (j as Real + 0.5) / n as Real),
                    rank: ((tag * 37) % 101) as Real,
                    tag,
                });
            }
        }
        out
    }

    fn check_best_per_cell(points: &[P], res: &SuppressionResult<P>) {
        let grid = res.grid.as_ref().unwrap();
        for s in &res.selected {
            let cell = grid.cell_of(&s.at);
            let best = points
                .iter()
                .filter(|p| grid.cell_of(&p.at) == cell)
                .map(|p| p.rank)
                .fold(Real::INFINITY, Real::min);
            assert_eq!(s.rank, best, "cell {cell:?} kept a worse point");
        }
    }

    #[test]
    fn empty_input_skips_search() {
        let res = spatial_suppression::<P>(&[], &unit_bounds(), 10, &SuppressionOptions::default());
        assert!(res.selected.is_empty());
        assert_eq!(res.outcome, SuppressionOutcome::EmptyInput);
        assert_eq!(res.iterations, 0);
        assert!(res.grid.is_none());
    }

    #[test]
    fn hits_target_within_tolerance() {
        // Every cell of an n × n grid holds a lattice point for n <= 20, so
        // square targets are exactly reachable.
        let pts = lattice(20);
        let opts = SuppressionOptions::default();
        for target in [4usize, 9, 25, 49] {
            let res = spatial_suppression(&pts, &unit_bounds(), target, &opts);
            assert_eq!(res.outcome, SuppressionOutcome::Converged, "target {target}");
            let tol = 0.05 * target as Real;
            let n = res.selected.len() as Real;
            assert!(n >= target as Real - tol && n <= target as Real + tol);
            check_best_per_cell(&pts, &res);
        }
    }

    #[test]
    fn unreachable_counts_end_with_a_warning() {
        let pts = lattice(20);
        let res = spatial_suppression(&pts, &unit_bounds(), 12, &SuppressionOptions::default());
        assert_eq!(res.outcome, SuppressionOutcome::Unresolved);
        assert!(res.outcome.is_warning());
        assert!(!res.selected.is_empty());
        check_best_per_cell(&pts, &res);
    }

    #[test]
    fn keeps_the_best_point_of_each_cell() {
        // Two points per location: the better one must win regardless of order.
        let mut pts = Vec::new();
        for (k, (x, y)) in [(0.2, 0.2), (0.8, 0.2), (0.5, 0.5), (0.2, 0.8), (0.8, 0.8)]
            .into_iter()
            .enumerate()
        {
            pts.push(P { at: Pt2::new(x, y), rank: 10.0 + k as Real, tag: 2 * k });
            pts.push(P { at: Pt2::new(x, y), rank: 1.0 + k as Real, tag: 2 * k + 1 });
        }
        let res = spatial_suppression(&pts, &unit_bounds(), 5, &SuppressionOptions::default());
        assert_eq!(res.outcome, SuppressionOutcome::Converged);
        assert_eq!(res.selected.len(), 5);
        assert!(res.selected.iter().all(|p| p.tag % 2 == 1));
        assert_eq!(
            res.selected.iter().map(|p| p.rank).collect::<Vec<_>>(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn rank_ties_keep_input_order() {
        let pts = vec![
            P { at: Pt2::new(0.5, 0.5), rank: 1.0, tag: 0 },
            P { at: Pt2::new(0.5, 0.5), rank: 1.0, tag: 1 },
        ];
        let res = spatial_suppression(&pts, &unit_bounds(), 1, &SuppressionOptions::default());
        assert_eq!(res.selected.len(), 1);
        assert_eq!(res.selected[0].tag, 0);
    }

    #[test]
    fn larger_targets_need_finer_grids() {
        let pts = lattice(30);
        let opts = SuppressionOptions::default();
        let coarse = spatial_suppression(&pts, &unit_bounds(), 5, &opts);
        let fine = spatial_suppression(&pts, &unit_bounds(), 40, &opts);
        assert!(fine.cell_size <= coarse.cell_size);
        assert!(fine.selected.len() > coarse.selected.len());
    }

    #[test]
    fn too_few_candidates_is_reported() {
        let pts: Vec<P> = (0..3)
            .map(|i| P { at: Pt2::new(0.1 + 0.3 * i as Real, 0.5), rank: i as Real, tag: i })
            .collect();
        let res = spatial_suppression(&pts, &unit_bounds(), 20, &SuppressionOptions::default());
        assert_eq!(res.outcome, SuppressionOutcome::InsufficientCandidates);
        assert!(res.outcome.is_warning());
        assert_eq!(res.iterations, 1);
        assert_eq!(res.selected.len(), 3);
    }

    #[test]
    fn coincident_candidates_are_unreachable() {
        let pts: Vec<P> = (0..30)
            .map(|i| P { at: Pt2::new(0.37, 0.61), rank: (30 - i) as Real, tag: i })
            .collect();
        let res = spatial_suppression(&pts, &unit_bounds(), 5, &SuppressionOptions::default());
        assert_eq!(res.outcome, SuppressionOutcome::TargetUnreachable);
        assert_eq!(res.selected.len(), 1);
        assert_eq!(res.selected[0].tag, 29);
    }

    #[test]
    fn degenerate_bounds_use_a_single_cell() {
        let pts = lattice(4);
        let flat = GroundBounds::from_corners(Pt2::new(0.5, 0.5), Pt2::new(0.5, 0.5));
        let res = spatial_suppression(&pts, &flat, 3, &SuppressionOptions::default());
        assert_eq!(res.grid.as_ref().unwrap().dims(), (1, 1));
        assert_eq!(res.selected.len(), 1);
        assert_eq!(res.outcome, SuppressionOutcome::TargetUnreachable);
    }

    #[test]
    fn elongated_bounds_cap_the_grid() {
        let strip = GroundBounds::from_corners(Pt2::new(0.0, 0.0), Pt2::new(1e9, 1.0));
        let grid = OccupancyGrid::new(strip, 1e-3);
        let (nx, ny) = grid.dims();
        assert!(nx * ny <= MAX_GRID_CELLS);
        assert!(grid.cell_size() > 1e-3);

        let pts: Vec<P> = (0..10)
            .map(|i| P { at: Pt2::new(1e8 * i as Real + 5.0, 0.5), rank: i as Real, tag: i })
            .collect();
        let res = spatial_suppression(&pts, &strip, 10, &SuppressionOptions::default());
        let (nx, ny) = res.grid.as_ref().unwrap().dims();
        assert!(nx * ny <= MAX_GRID_CELLS);
        assert!(!res.selected.is_empty());
        check_best_per_cell(&pts, &res);
    }

    #[test]
    fn grid_binning_clamps_to_border_cells() {
        let grid = OccupancyGrid::new(unit_bounds(), 0.25);
        assert_eq!(grid.dims(), (4, 4));
        assert_eq!(grid.cell_of(&Pt2::new(0.0, 0.0)), (0, 0));
        assert_eq!(grid.cell_of(&Pt2::new(1.0, 1.0)), (3, 3));
        assert_eq!(grid.cell_of(&Pt2::new(-5.0, 0.3)), (0, 1));
        assert_eq!(grid.cell_of(&Pt2::new(0.6, 7.0)), (2, 3));
    }
}
