//! Multi-view point records via epipolar transfer.

use crate::types::{
    point_geometry, Edge, FundamentalTable, ImageId, Observation, PointId, ScoredCorrespondence,
};
use cnet_core::Pt2;
use cnet_linear::transfer_point;
use log::debug;
use std::collections::BTreeMap;

/// Location of `(x_w, x_v)` in image `e`, or `None` when a fundamental
/// matrix is missing or the epipolar lines do not intersect.
pub fn transfer_to(
    fundamentals: &FundamentalTable,
    w: ImageId,
    v: ImageId,
    e: ImageId,
    x_w: &Pt2,
    x_v: &Pt2,
) -> Option<Pt2> {
    let f_we = fundamentals.directed(w, e)?;
    let f_ve = fundamentals.directed(v, e)?;
    transfer_point(&f_we, &f_ve, x_w, x_v)
}

/// Build point records for the selected correspondences.
///
/// Every correspondence yields two direct observations (source and
/// destination) plus one transferred observation per other image of the
/// overlap. Transfers that cannot be computed are dropped individually.
/// Records are grouped by edge in edge order; within an edge the input
/// order is kept and numbered from zero.
pub fn transfer_points(
    selected: &[ScoredCorrespondence],
    fundamentals: &FundamentalTable,
    overlap_images: &[ImageId],
    overlap_id: u64,
    srid: u32,
) -> Vec<Observation> {
    let mut groups: BTreeMap<Edge, Vec<&ScoredCorrespondence>> = BTreeMap::new();
    for s in selected {
        groups.entry(s.correspondence.edge()).or_default().push(s);
    }

    let mut out = Vec::new();
    let mut dropped = 0usize;
    for (edge, group) in groups {
        let mut others: Vec<ImageId> = Vec::new();
        for &id in overlap_images {
            if !edge.contains(id) && !others.contains(&id) {
                others.push(id);
            }
        }

        for (seq, s) in group.into_iter().enumerate() {
            let c = &s.correspondence;
            let point_id = PointId {
                overlap: overlap_id,
                edge,
                seq,
            }
            .to_string();
            let geom = point_geometry(&c.ground(), srid);
            let (x_w, x_v) = (c.source_point(), c.destination_point());

            out.push(Observation {
                point_id: point_id.clone(),
                image_id: c.source,
                keypoint_id: Some(c.source_idx),
                x: x_w.x,
                y: x_w.y,
                geom: geom.clone(),
                match_id: Some(c.id),
            });
            out.push(Observation {
                point_id: point_id.clone(),
                image_id: c.destination,
                keypoint_id: Some(c.destination_idx),
                x: x_v.x,
                y: x_v.y,
                geom: geom.clone(),
                match_id: Some(c.id),
            });

            for &e in &others {
                match transfer_to(fundamentals, c.source, c.destination, e, &x_w, &x_v) {
                    Some(p) => out.push(Observation {
                        point_id: point_id.clone(),
                        image_id: e,
                        keypoint_id: None,
                        x: p.x,
                        y: p.y,
                        geom: geom.clone(),
                        match_id: None,
                    }),
                    None => {
                        dropped += 1;
                        debug!("point {point_id}: no transfer into image {e}");
                    }
                }
            }
        }
    }

    if dropped > 0 {
        debug!("dropped {dropped} transferred observations");
    }
    out
}
