//! Shared data model: edges, correspondences, fundamental tables and point
//! records.

use cnet_core::{Mat3, Pt2, Real};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Image identifier.
pub type ImageId = u64;

/// Unordered image pair, stored canonically as `(lo, hi)` with `lo <= hi`.
///
/// Serialized as a two-element array `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[ImageId; 2]", into = "[ImageId; 2]")]
pub struct Edge {
    lo: ImageId,
    hi: ImageId,
}

impl Edge {
    pub fn new(a: ImageId, b: ImageId) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    /// Lower image id; fundamental matrices are estimated from this image.
    pub fn lo(&self) -> ImageId {
        self.lo
    }

    pub fn hi(&self) -> ImageId {
        self.hi
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.lo == id || self.hi == id
    }

    pub fn is_loop(&self) -> bool {
        self.lo == self.hi
    }
}

impl From<[ImageId; 2]> for Edge {
    fn from(v: [ImageId; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<Edge> for [ImageId; 2] {
    fn from(e: Edge) -> Self {
        [e.lo, e.hi]
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lo, self.hi)
    }
}

/// One matched feature pair between two images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Match id assigned by the matcher.
    pub id: u64,
    pub source: ImageId,
    pub destination: ImageId,
    pub source_idx: usize,
    pub destination_idx: usize,
    pub source_x: Real,
    pub source_y: Real,
    pub destination_x: Real,
    pub destination_y: Real,
    /// Ground position of the match.
    pub lon: Real,
    pub lat: Real,
}

impl Correspondence {
    pub fn edge(&self) -> Edge {
        Edge::new(self.source, self.destination)
    }

    pub fn source_point(&self) -> Pt2 {
        Pt2::new(self.source_x, self.source_y)
    }

    pub fn destination_point(&self) -> Pt2 {
        Pt2::new(self.destination_x, self.destination_y)
    }

    pub fn ground(&self) -> Pt2 {
        Pt2::new(self.lon, self.lat)
    }

    /// Orient the pair so that `source < destination`.
    pub fn into_canonical(self) -> Self {
        if self.source <= self.destination {
            return self;
        }
        Self {
            source: self.destination,
            destination: self.source,
            source_idx: self.destination_idx,
            destination_idx: self.source_idx,
            source_x: self.destination_x,
            source_y: self.destination_y,
            destination_x: self.source_x,
            destination_y: self.source_y,
            ..self
        }
    }
}

/// Correspondence with its quality score (lower is better).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCorrespondence {
    #[serde(flatten)]
    pub correspondence: Correspondence,
    pub strength: Real,
}

/// Ground position and rank consumed by spatial suppression.
pub trait Ranked {
    fn position(&self) -> Pt2;
    /// Lower is better.
    fn rank(&self) -> Real;
}

impl Ranked for ScoredCorrespondence {
    fn position(&self) -> Pt2 {
        self.correspondence.ground()
    }

    fn rank(&self) -> Real {
        self.strength
    }
}

/// Fundamental matrix per edge, estimated in the `lo -> hi` direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundamentalTable {
    entries: BTreeMap<Edge, Mat3>,
}

impl FundamentalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `f` with `x_hi^T F x_lo = 0`. Returns the previous matrix, if any.
    pub fn insert(&mut self, edge: Edge, f: Mat3) -> Option<Mat3> {
        self.entries.insert(edge, f)
    }

    pub fn get(&self, edge: &Edge) -> Option<&Mat3> {
        self.entries.get(edge)
    }

    /// Matrix mapping points of `from` to epipolar lines in `to`.
    ///
    /// The stored matrix is used as-is for `from < to` and transposed for
    /// the reverse direction.
    pub fn directed(&self, from: ImageId, to: ImageId) -> Option<Mat3> {
        if from == to {
            return None;
        }
        let f = self.entries.get(&Edge::new(from, to))?;
        Some(if from < to { *f } else { f.transpose() })
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identifier shared by all observations of one densified point.
///
/// Embeds the overlap and the edge, so ids from different overlaps or
/// edges cannot collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId {
    pub overlap: u64,
    pub edge: Edge,
    pub seq: usize,
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.overlap,
            self.edge.lo(),
            self.edge.hi(),
            self.seq
        )
    }
}

/// One image observation of a densified point.
///
/// Transferred observations have neither a keypoint nor a match id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub point_id: String,
    pub image_id: ImageId,
    pub keypoint_id: Option<usize>,
    pub x: Real,
    pub y: Real,
    /// EWKT ground geometry shared by all observations of the point.
    pub geom: String,
    pub match_id: Option<u64>,
}

impl Observation {
    pub fn is_transferred(&self) -> bool {
        self.keypoint_id.is_none()
    }

    pub fn image_point(&self) -> Pt2 {
        Pt2::new(self.x, self.y)
    }
}

/// EWKT point geometry with a zero elevation placeholder.
pub fn point_geometry(ground: &Pt2, srid: u32) -> String {
    format!("SRID={srid};POINTZ({} {} 0)", ground.x, ground.y)
}
