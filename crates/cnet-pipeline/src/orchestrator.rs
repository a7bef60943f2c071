//! Overlap densification: estimate, rank, restrict, suppress, transfer.

use crate::config::DensifyConfig;
use crate::error::DensifyError;
use crate::estimate::{
    EpipolarDistanceScorer, FundamentalEstimator, RansacFundamentalEstimator, ReprojectionScorer,
};
use crate::job::{JobInput, JobOutput};
use crate::store::KeypointStore;
use crate::suppression::{spatial_suppression, SuppressionOutcome};
use crate::transfer::transfer_points;
use crate::types::{
    Correspondence, Edge, FundamentalTable, ImageId, Observation, ScoredCorrespondence,
};
use cnet_core::{GroundPolygon, Pt2};
use cnet_linear::EpipolarError;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashSet};

/// Edge excluded from an overlap because its fundamental matrix could not be
/// estimated.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEdge {
    pub edge: Edge,
    pub error: EpipolarError,
}

/// Everything [`process_overlap`] produced for one overlap.
#[derive(Debug, Clone)]
pub struct OverlapReport {
    pub observations: Vec<Observation>,
    pub fundamentals: FundamentalTable,
    /// Ranked correspondences inside the overlap polygon.
    pub candidates: usize,
    /// Correspondences kept by suppression.
    pub selected: usize,
    pub target: usize,
    pub outcome: SuppressionOutcome,
    pub skipped_edges: Vec<SkippedEdge>,
}

/// Merge tables per canonical edge and orient every correspondence
/// `lo -> hi`. Correspondences that do not belong to their table's edge are
/// dropped.
fn canonical_tables(job: &JobInput) -> BTreeMap<Edge, Vec<Correspondence>> {
    let mut tables: BTreeMap<Edge, Vec<Correspondence>> = BTreeMap::new();
    for table in &job.matches {
        if table.edge.is_loop() {
            warn!("ignoring self-matched image {}", table.edge.lo());
            continue;
        }
        let entry = tables.entry(table.edge).or_default();
        for c in &table.correspondences {
            if c.edge() != table.edge {
                warn!(
                    "match {} joins {} but is listed under edge {}",
                    c.id,
                    c.edge(),
                    table.edge
                );
                continue;
            }
            entry.push(c.clone().into_canonical());
        }
    }
    tables.retain(|edge, corrs| {
        if corrs.is_empty() {
            debug!("edge {edge}: no correspondences");
        }
        !corrs.is_empty()
    });
    tables
}

fn fetch_keypoints<S: KeypointStore + ?Sized>(
    job: &JobInput,
    store: &S,
    edge: Edge,
    image: ImageId,
    indices: &[usize],
) -> Result<Vec<Pt2>, DensifyError> {
    let path = job
        .files
        .get(&image)
        .ok_or(DensifyError::MissingImage(image))?;
    let points = store
        .fetch(path, indices)
        .map_err(|source| DensifyError::Keypoints { image, source })?;
    if points.len() != indices.len() {
        return Err(DensifyError::KeypointCount {
            edge,
            expected: indices.len(),
            got: points.len(),
        });
    }
    Ok(points)
}

/// Densify one overlap.
///
/// Fundamental matrices are estimated per edge from keypoint store
/// coordinates and every correspondence is ranked by its reprojection
/// score. An edge whose estimation fails is excluded and listed in
/// [`OverlapReport::skipped_edges`]. Invalid polygons and keypoint lookup
/// failures abort the overlap.
pub fn process_overlap<S, E, R>(
    job: &JobInput,
    store: &S,
    estimator: &E,
    scorer: &R,
    config: &DensifyConfig,
) -> Result<OverlapReport, DensifyError>
where
    S: KeypointStore + ?Sized,
    E: FundamentalEstimator + ?Sized,
    R: ReprojectionScorer + ?Sized,
{
    let polygon = GroundPolygon::from_wkt(&job.poly)?;
    let bounds = polygon.bounds().ok_or(DensifyError::EmptyPolygon)?;

    let mut fundamentals = FundamentalTable::new();
    let mut ranked: Vec<ScoredCorrespondence> = Vec::new();
    let mut skipped_edges = Vec::new();

    for (edge, corrs) in canonical_tables(job) {
        let src_idx: Vec<usize> = corrs.iter().map(|c| c.source_idx).collect();
        let dst_idx: Vec<usize> = corrs.iter().map(|c| c.destination_idx).collect();
        let pts1 = fetch_keypoints(job, store, edge, edge.lo(), &src_idx)?;
        let pts2 = fetch_keypoints(job, store, edge, edge.hi(), &dst_idx)?;

        let estimate = match estimator.estimate(&pts1, &pts2) {
            Ok(est) => est,
            Err(error) => {
                warn!("edge {edge}: fundamental estimation failed, excluding it: {error}");
                skipped_edges.push(SkippedEdge { edge, error });
                continue;
            }
        };

        let scores = scorer.score(&estimate.matrix, &pts1, &pts2);
        if scores.len() != corrs.len() {
            return Err(DensifyError::ScoreCount {
                edge,
                expected: corrs.len(),
                got: scores.len(),
            });
        }
        debug!(
            "edge {edge}: {}/{} inliers",
            estimate.num_inliers(),
            corrs.len()
        );

        let discard = config.estimation.discard_outliers;
        for (i, (correspondence, strength)) in corrs.into_iter().zip(scores).enumerate() {
            let inlier = estimate.inlier_mask.get(i).copied().unwrap_or(true);
            if discard && !inlier {
                continue;
            }
            ranked.push(ScoredCorrespondence {
                correspondence,
                strength,
            });
        }
        fundamentals.insert(edge, estimate.matrix);
    }

    let candidates: Vec<ScoredCorrespondence> = ranked
        .into_iter()
        .filter(|s| polygon.contains(&s.correspondence.ground()))
        .collect();

    let target = config.target.target_for_area(polygon.area());
    let suppression = spatial_suppression(&candidates, &bounds, target, &config.suppression);
    let observations = transfer_points(
        &suppression.selected,
        &fundamentals,
        &job.overlaps,
        job.oid,
        config.srid,
    );

    let points: HashSet<&str> = observations.iter().map(|o| o.point_id.as_str()).collect();
    info!(
        "overlap {}: {} candidates, target {target}, kept {} ({:?}), {} points / {} observations",
        job.oid,
        candidates.len(),
        suppression.selected.len(),
        suppression.outcome,
        points.len(),
        observations.len()
    );

    Ok(OverlapReport {
        candidates: candidates.len(),
        selected: suppression.selected.len(),
        target,
        outcome: suppression.outcome,
        observations,
        fundamentals,
        skipped_edges,
    })
}

/// Job boundary: always yields exactly one output message.
pub fn run_job<S, E, R>(
    job: &JobInput,
    store: &S,
    estimator: &E,
    scorer: &R,
    config: &DensifyConfig,
) -> JobOutput
where
    S: KeypointStore + ?Sized,
    E: FundamentalEstimator + ?Sized,
    R: ReprojectionScorer + ?Sized,
{
    match process_overlap(job, store, estimator, scorer, config) {
        Ok(report) => JobOutput::success(report.observations, config.callback.as_str()),
        Err(err) => {
            error!("overlap {} failed: {err}", job.oid);
            JobOutput::failure(config.callback.as_str())
        }
    }
}

/// [`run_job`] with RANSAC estimation and epipolar distance scoring
/// configured from `config`.
pub fn densify<S: KeypointStore + ?Sized>(
    job: &JobInput,
    store: &S,
    config: &DensifyConfig,
) -> JobOutput {
    let estimator = RansacFundamentalEstimator::new(config.estimation.ransac.clone());
    run_job(job, store, &estimator, &EpipolarDistanceScorer, config)
}
