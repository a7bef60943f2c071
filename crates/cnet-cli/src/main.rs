use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use cnet_pipeline::{densify, io, JobInput, JobOutput, JsonKeypointStore};
use log::{error, info};

/// Densify the control network of one overlap.
#[derive(Debug, Parser)]
#[command(author, version, about = "Control-network densification for one overlap job")]
struct Args {
    /// Path to the JSON job message.
    #[arg(long)]
    job: PathBuf,

    /// Optional path to a JSON DensifyConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory relative keypoint paths are resolved against. Defaults to
    /// the directory of the job file.
    #[arg(long)]
    keypoint_root: Option<PathBuf>,

    /// Write the output message here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn keypoint_store(job_path: &Path, root: Option<&Path>) -> JsonKeypointStore {
    match root.or_else(|| job_path.parent()) {
        Some(dir) if !dir.as_os_str().is_empty() => JsonKeypointStore::with_root(dir),
        _ => JsonKeypointStore::new(),
    }
}

/// Run a loaded job. Configuration problems fail the job, not the process.
fn run_loaded_job(job: &JobInput, args: &Args) -> JobOutput {
    let config = match io::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{err:#}");
            return JobOutput::default();
        }
    };
    let store = keypoint_store(&args.job, args.keypoint_root.as_deref());
    densify(job, &store, &config)
}

fn run_from_files(args: &Args) -> Result<JobOutput> {
    let job = io::load_job(&args.job)?;
    info!(
        "job {}: {} images, {} edge tables",
        job.oid,
        job.overlaps.len(),
        job.matches.len()
    );
    Ok(run_loaded_job(&job, args))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let output = run_from_files(&args)?;
    match &args.output {
        Some(path) => io::write_output(&output, path)?,
        None => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnet_core::synthetic::{ground_points, ring_of_views};
    use cnet_core::Pt2;
    use cnet_pipeline::{Correspondence, Edge, EdgeMatches};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn args(dir: &Path, config: Option<PathBuf>) -> Args {
        Args {
            job: dir.join("job.json"),
            config,
            keypoint_root: None,
            output: Some(dir.join("out.json")),
        }
    }

    /// Three views, matches on every pair, keypoints as JSON files next to
    /// the job.
    fn write_job(dir: &Path) {
        let views = ring_of_views(3, 1000.0, Pt2::new(0.0, 0.0), 30.0, 400.0);
        let world = ground_points(30, Pt2::new(-40.0, -40.0), Pt2::new(40.0, 40.0), 20.0, 8);
        let keypoints: Vec<Vec<Pt2>> = views
            .iter()
            .map(|v| world.iter().map(|w| v.project(w).unwrap()).collect())
            .collect();

        let mut files = BTreeMap::new();
        for (i, kps) in keypoints.iter().enumerate() {
            let records: Vec<[f64; 2]> = kps.iter().map(|p| [p.x, p.y]).collect();
            let name = format!("{i}.json");
            fs::write(dir.join(&name), serde_json::to_string(&records).unwrap()).unwrap();
            files.insert(i as u64, name);
        }

        let mut matches = Vec::new();
        for (a, b) in [(0usize, 1usize), (0, 2), (1, 2)] {
            let correspondences = world
                .iter()
                .enumerate()
                .map(|(j, w)| Correspondence {
                    id: (a * 100 + b * 10 + j) as u64,
                    source: a as u64,
                    destination: b as u64,
                    source_idx: j,
                    destination_idx: j,
                    source_x: keypoints[a][j].x,
                    source_y: keypoints[a][j].y,
                    destination_x: keypoints[b][j].x,
                    destination_y: keypoints[b][j].y,
                    lon: (w.x + 40.0) / 80.0,
                    lat: (w.y + 40.0) / 80.0,
                })
                .collect();
            matches.push(EdgeMatches {
                edge: Edge::new(a as u64, b as u64),
                correspondences,
            });
        }

        let job = JobInput {
            poly: "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))".to_string(),
            files,
            matches,
            overlaps: vec![0, 1, 2],
            oid: 5,
        };
        fs::write(dir.join("job.json"), serde_json::to_string(&job).unwrap()).unwrap();
    }

    #[test]
    fn job_files_produce_an_output_message() {
        let dir = tempdir().unwrap();
        write_job(dir.path());
        let config = dir.path().join("config.json");
        fs::write(&config, r#"{ "target": { "area_per_point": 0.1 } }"#).unwrap();

        let args = args(dir.path(), Some(config));
        let output = run_from_files(&args).unwrap();
        assert!(output.success);
        assert_eq!(output.callback, "create_network_callback");
        assert!(!output.points.is_empty());
        // Every point is seen directly in two images and transferred into the third.
        assert_eq!(output.points.len() % 3, 0);
        let transferred = output.points.iter().filter(|o| o.is_transferred()).count();
        assert_eq!(transferred * 3, output.points.len());
    }

    #[test]
    fn unreadable_job_is_a_process_error() {
        let dir = tempdir().unwrap();
        assert!(run_from_files(&args(dir.path(), None)).is_err());
    }

    #[test]
    fn bad_config_fails_the_job_only() {
        let dir = tempdir().unwrap();
        write_job(dir.path());
        let config = dir.path().join("config.json");
        fs::write(&config, "[1, 2").unwrap();
        let output = run_from_files(&args(dir.path(), Some(config))).unwrap();
        assert!(!output.success);
        assert!(output.points.is_empty());
    }
}
