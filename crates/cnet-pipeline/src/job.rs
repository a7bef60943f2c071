//! Job input and output messages.

use crate::config::DEFAULT_CALLBACK;
use crate::types::{Correspondence, Edge, ImageId, Observation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Correspondence table of one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMatches {
    pub edge: Edge,
    pub correspondences: Vec<Correspondence>,
}

/// One overlap densification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    /// Overlap polygon as (E)WKT.
    pub poly: String,
    /// Keypoint source per image.
    pub files: BTreeMap<ImageId, String>,
    pub matches: Vec<EdgeMatches>,
    /// All images whose footprints share the overlap.
    pub overlaps: Vec<ImageId>,
    pub oid: u64,
}

/// Terminal message of a job; exactly one is produced per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    pub points: Vec<Observation>,
    pub success: bool,
    pub callback: String,
}

impl JobOutput {
    pub fn success(points: Vec<Observation>, callback: impl Into<String>) -> Self {
        Self {
            points,
            success: true,
            callback: callback.into(),
        }
    }

    /// Failed job: no points.
    pub fn failure(callback: impl Into<String>) -> Self {
        Self {
            points: Vec::new(),
            success: false,
            callback: callback.into(),
        }
    }
}

impl Default for JobOutput {
    fn default() -> Self {
        Self::failure(DEFAULT_CALLBACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_input_parses_string_image_keys() {
        let json = r#"{
            "poly": "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))",
            "files": { "3": "kp/3.json", "8": "kp/8.json" },
            "matches": [{
                "edge": [8, 3],
                "correspondences": [{
                    "id": 11, "source": 8, "destination": 3,
                    "source_idx": 4, "destination_idx": 9,
                    "source_x": 1.0, "source_y": 2.0,
                    "destination_x": 3.0, "destination_y": 4.0,
                    "lon": 0.5, "lat": 0.5
                }]
            }],
            "overlaps": [3, 8, 12],
            "oid": 77
        }"#;
        let job: JobInput = serde_json::from_str(json).unwrap();
        assert_eq!(job.files[&3], "kp/3.json");
        assert_eq!(job.matches[0].edge, Edge::new(3, 8));
        assert_eq!(job.matches[0].correspondences[0].source, 8);
        assert_eq!(job.overlaps, vec![3, 8, 12]);
        assert_eq!(job.oid, 77);
    }

    #[test]
    fn failure_message_is_empty() {
        let out = JobOutput::failure("cb");
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["callback"], "cb");
        assert_eq!(v["points"].as_array().unwrap().len(), 0);
        assert_eq!(JobOutput::default().callback, DEFAULT_CALLBACK);
    }
}
