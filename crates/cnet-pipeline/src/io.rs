use crate::config::DensifyConfig;
use crate::job::{JobInput, JobOutput};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and deserialize a JSON file.
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn load_job(path: &Path) -> Result<JobInput> {
    load_json_file(path).context("loading job message")
}

/// Configuration from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<DensifyConfig> {
    match path {
        Some(p) => load_json_file(p).context("loading densify config"),
        None => Ok(DensifyConfig::default()),
    }
}

pub fn write_output(output: &JobOutput, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(output)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
