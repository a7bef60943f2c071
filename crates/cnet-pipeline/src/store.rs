//! Keypoint sources.
//!
//! The orchestrator only needs image coordinates for the keypoint indices
//! referenced by correspondences; descriptors never enter the pipeline.

use crate::error::StoreError;
use cnet_core::{Pt2, Real};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of keypoint image coordinates.
pub trait KeypointStore {
    /// Coordinates of `indices` in the keypoint set at `path`, in request order.
    fn fetch(&self, path: &str, indices: &[usize]) -> Result<Vec<Pt2>, StoreError>;
}

impl<S: KeypointStore + ?Sized> KeypointStore for &S {
    fn fetch(&self, path: &str, indices: &[usize]) -> Result<Vec<Pt2>, StoreError> {
        (**self).fetch(path, indices)
    }
}

fn select(path: &str, all: &[Pt2], indices: &[usize]) -> Result<Vec<Pt2>, StoreError> {
    indices
        .iter()
        .map(|&index| {
            all.get(index).copied().ok_or(StoreError::IndexOutOfRange {
                path: path.to_string(),
                index,
                len: all.len(),
            })
        })
        .collect()
}

/// Keypoints held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeypointStore {
    keypoints: HashMap<String, Vec<Pt2>>,
}

impl InMemoryKeypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, keypoints: Vec<Pt2>) {
        self.keypoints.insert(path.into(), keypoints);
    }

    pub fn with(mut self, path: impl Into<String>, keypoints: Vec<Pt2>) -> Self {
        self.insert(path, keypoints);
        self
    }
}

impl KeypointStore for InMemoryKeypointStore {
    fn fetch(&self, path: &str, indices: &[usize]) -> Result<Vec<Pt2>, StoreError> {
        let all = self
            .keypoints
            .get(path)
            .ok_or_else(|| StoreError::UnknownSource(path.to_string()))?;
        select(path, all, indices)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeypointRecord {
    Object { x: Real, y: Real },
    Pair([Real; 2]),
}

impl From<KeypointRecord> for Pt2 {
    fn from(r: KeypointRecord) -> Self {
        match r {
            KeypointRecord::Object { x, y } => Pt2::new(x, y),
            KeypointRecord::Pair([x, y]) => Pt2::new(x, y),
        }
    }
}

/// One JSON file of keypoints per image.
///
/// Each file is an array of `{"x": .., "y": ..}` objects or `[x, y]` pairs.
/// Relative paths are resolved against the optional root directory. Files
/// are re-read on every call.
#[derive(Debug, Clone, Default)]
pub struct JsonKeypointStore {
    root: Option<PathBuf>,
}

impl JsonKeypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) if Path::new(path).is_relative() => root.join(path),
            _ => PathBuf::from(path),
        }
    }

    /// All keypoints in the file at `path`.
    pub fn load(&self, path: &str) -> Result<Vec<Pt2>, StoreError> {
        let full = self.resolve(path);
        let text = fs::read_to_string(&full).map_err(|source| StoreError::Io {
            path: full.display().to_string(),
            source,
        })?;
        let records: Vec<KeypointRecord> =
            serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: full.display().to_string(),
                source,
            })?;
        Ok(records.into_iter().map(Pt2::from).collect())
    }
}

impl KeypointStore for JsonKeypointStore {
    fn fetch(&self, path: &str, indices: &[usize]) -> Result<Vec<Pt2>, StoreError> {
        let all = self.load(path)?;
        select(path, &all, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn in_memory_store_selects_in_request_order() {
        let store = InMemoryKeypointStore::new().with(
            "a.jpg",
            vec![Pt2::new(0.0, 0.0), Pt2::new(1.0, 2.0), Pt2::new(3.0, 4.0)],
        );
        let got = store.fetch("a.jpg", &[2, 0, 2]).unwrap();
        assert_eq!(got, vec![Pt2::new(3.0, 4.0), Pt2::new(0.0, 0.0), Pt2::new(3.0, 4.0)]);
        assert!(matches!(
            store.fetch("a.jpg", &[3]),
            Err(StoreError::IndexOutOfRange { index: 3, len: 3, .. })
        ));
        assert!(matches!(
            store.fetch("b.jpg", &[0]),
            Err(StoreError::UnknownSource(_))
        ));
    }

    #[test]
    fn json_store_reads_both_record_shapes() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"x": 1.5, "y": 2.5}}, [10, 20], {{"y": 0, "x": -1}}]"#).unwrap();
        let store = JsonKeypointStore::new();
        let path = file.path().to_str().unwrap();
        let got = store.fetch(path, &[1, 2]).unwrap();
        assert_eq!(got, vec![Pt2::new(10.0, 20.0), Pt2::new(-1.0, 0.0)]);
        assert_eq!(store.load(path).unwrap()[0], Pt2::new(1.5, 2.5));
    }

    #[test]
    fn json_store_resolves_relative_paths_against_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("img_7.json"), "[[4, 5]]").unwrap();
        let store = JsonKeypointStore::with_root(dir.path());
        assert_eq!(store.fetch("img_7.json", &[0]).unwrap(), vec![Pt2::new(4.0, 5.0)]);
        assert!(matches!(
            store.fetch("missing.json", &[0]),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn json_store_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"x": 1}}]"#).unwrap();
        let err = JsonKeypointStore::new()
            .fetch(file.path().to_str().unwrap(), &[0])
            .unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
