use crate::types::{Edge, ImageId};
use cnet_core::GeometryError;
use thiserror::Error;

/// Structural failures that abort a whole overlap job.
#[derive(Debug, Error)]
pub enum DensifyError {
    #[error("invalid overlap polygon: {0}")]
    Polygon(#[from] GeometryError),
    #[error("overlap polygon has no extent")]
    EmptyPolygon,
    #[error("no keypoint source for image {0}")]
    MissingImage(ImageId),
    #[error("keypoint lookup failed for image {image}: {source}")]
    Keypoints {
        image: ImageId,
        #[source]
        source: StoreError,
    },
    #[error("edge {edge}: requested {expected} keypoints, store returned {got}")]
    KeypointCount {
        edge: Edge,
        expected: usize,
        got: usize,
    },
    #[error("edge {edge}: scorer returned {got} scores for {expected} correspondences")]
    ScoreCount {
        edge: Edge,
        expected: usize,
        got: usize,
    },
}

/// Keypoint store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read keypoints from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse keypoints in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown keypoint source {0}")]
    UnknownSource(String),
    #[error("keypoint index {index} out of range for {path} ({len} keypoints)")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}
