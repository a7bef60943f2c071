//! Control-network densification for one image overlap.
//!
//! Correspondences of every image pair are ranked by their epipolar
//! reprojection score, restricted to the overlap polygon, thinned by
//! adaptive grid suppression and finally transferred into every other image
//! of the overlap by intersecting epipolar lines.
//!
//! ```no_run
//! use cnet_pipeline::{densify, io, JsonKeypointStore};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let job = io::load_job(Path::new("job.json"))?;
//! let config = io::load_config(None)?;
//! let output = densify(&job, &JsonKeypointStore::new(), &config);
//! println!("{} observations", output.points.len());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod estimate;
pub mod io;
mod job;
mod orchestrator;
mod store;
mod suppression;
mod transfer;
mod types;

pub use config::*;
pub use error::*;
pub use estimate::*;
pub use job::*;
pub use orchestrator::*;
pub use store::*;
pub use suppression::*;
pub use transfer::*;
pub use types::*;
