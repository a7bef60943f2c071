//! Core math and geometry primitives for the `cnet` densification toolbox.
//!
//! This crate provides the foundational building blocks used by all other
//! crates in the workspace:
//!
//! - linear algebra type aliases (`Real`, `Pt2`, `Mat3`, and friends) and
//!   homogeneous-coordinate helpers,
//! - ground geometry: overlap polygons parsed from WKT, containment, area and
//!   bounding rectangles,
//! - a deterministic, model-agnostic RANSAC engine.
//!
//! # Example
//!
//! ```
//! use cnet_core::{GroundPolygon, Pt2};
//!
//! let poly = GroundPolygon::from_wkt("POLYGON((0 0, 2 0, 2 1, 0 1, 0 0))").unwrap();
//! assert!(poly.contains(&Pt2::new(1.0, 0.5)));
//! assert_eq!(poly.area(), 2.0);
//! ```

/// Ground polygons and bounding rectangles.
mod geometry;
/// Linear algebra type aliases and helpers.
mod math;
/// Generic RANSAC engine and traits.
mod ransac;
/// Deterministic synthetic multi-view scenes.
///
/// Public so workspace tests and benchmarks can share scene builders; not
/// intended for production use.
pub mod synthetic;

pub use geometry::*;
pub use math::*;
pub use ransac::*;
