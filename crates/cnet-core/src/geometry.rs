//! Ground-space geometry: bounding rectangles and overlap polygons.
//!
//! Ground coordinates are planar `(lon, lat)` pairs stored as [`Pt2`]
//! (`x = lon`, `y = lat`). WKT parsing is delegated to `wkt` and polygon
//! predicates to `geo`.

use crate::{Pt2, Real};
use geo::{
    Area, BoundingRect, Contains, Coord, Geometry, LineString, MultiPolygon, Point, Polygon,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wkt::TryFromWkt;

/// Errors produced while building ground geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    /// Only `POLYGON` and `MULTIPOLYGON` geometries describe an overlap.
    #[error("unsupported WKT geometry type: {0}")]
    UnsupportedType(String),
    /// The text is not valid WKT.
    #[error("malformed WKT: {0}")]
    Malformed(String),
    /// A ring has fewer than three distinct vertices.
    #[error("ring {ring} has {vertices} vertices, need at least 3")]
    DegenerateRing { ring: usize, vertices: usize },
}

/// Axis-aligned ground rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundBounds {
    pub min_x: Real,
    pub min_y: Real,
    pub max_x: Real,
    pub max_y: Real,
}

impl GroundBounds {
    /// Build bounds from two arbitrary opposite corners.
    pub fn from_corners(a: Pt2, b: Pt2) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Tight bounds around a point set; `None` when empty.
    pub fn enclosing(points: impl IntoIterator<Item = Pt2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_corners(first, first), |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> Real {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> Real {
        (self.max_y - self.min_y).max(0.0)
    }

    /// Closed containment test (edges included).
    pub fn contains(&self, p: &Pt2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Ground region of one overlap, possibly made of several parts.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPolygon {
    parts: MultiPolygon<Real>,
}

impl GroundPolygon {
    pub fn new(parts: impl Into<MultiPolygon<Real>>) -> Self {
        Self {
            parts: parts.into(),
        }
    }

    /// Simple polygon from an exterior ring; the ring is closed automatically.
    pub fn from_exterior(points: &[Pt2]) -> Result<Self, GeometryError> {
        let ring = LineString::new(points.iter().map(|p| Coord { x: p.x, y: p.y }).collect());
        Self::validated(Polygon::new(ring, Vec::new()).into())
    }

    /// Parse a WKT `POLYGON` or `MULTIPOLYGON`, optionally prefixed with an
    /// EWKT `SRID=n;` tag.
    pub fn from_wkt(text: &str) -> Result<Self, GeometryError> {
        let text = strip_srid(text)?;
        let geometry = Geometry::<Real>::try_from_wkt_str(text)
            .map_err(|e| GeometryError::Malformed(e.to_string()))?;
        let parts = match geometry {
            Geometry::Polygon(p) => p.into(),
            Geometry::MultiPolygon(mp) => mp,
            other => return Err(GeometryError::UnsupportedType(kind(&other).to_string())),
        };
        Self::validated(parts)
    }

    fn validated(parts: MultiPolygon<Real>) -> Result<Self, GeometryError> {
        let rings = parts
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()));
        for (ring, line) in rings.enumerate() {
            if line.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(GeometryError::Malformed(format!("ring {ring}: non-finite coordinate")));
            }
            let vertices = distinct_vertices(line);
            if vertices < 3 {
                return Err(GeometryError::DegenerateRing { ring, vertices });
            }
        }
        Ok(Self { parts })
    }

    /// Strict interior test: points on the boundary are outside.
    pub fn contains(&self, p: &Pt2) -> bool {
        self.parts.contains(&Point::new(p.x, p.y))
    }

    /// Unsigned planar area in squared ground units, summed over parts.
    pub fn area(&self) -> Real {
        self.parts.unsigned_area()
    }

    /// Bounding rectangle of all parts; `None` for an empty geometry.
    pub fn bounds(&self) -> Option<GroundBounds> {
        self.parts.bounding_rect().map(|r| {
            GroundBounds::from_corners(
                Pt2::new(r.min().x, r.min().y),
                Pt2::new(r.max().x, r.max().y),
            )
        })
    }

    pub fn num_parts(&self) -> usize {
        self.parts.0.len()
    }

    pub fn as_geo(&self) -> &MultiPolygon<Real> {
        &self.parts
    }
}

fn strip_srid(text: &str) -> Result<&str, GeometryError> {
    let text = text.trim();
    if text.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("SRID=")) {
        let (_, rest) = text
            .split_once(';')
            .ok_or_else(|| GeometryError::Malformed("SRID prefix without `;`".into()))?;
        return Ok(rest.trim());
    }
    Ok(text)
}

fn kind(geometry: &Geometry<Real>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::LineString(_) | Geometry::Line(_) => "LINESTRING",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        _ => "GEOMETRY",
    }
}

/// Vertices of a ring without the closing repeat.
fn distinct_vertices(ring: &LineString<Real>) -> usize {
    let coords = &ring.0;
    match (coords.first(), coords.last()) {
        (Some(a), Some(b)) if coords.len() > 1 && a == b => coords.len() - 1,
        _ => coords.len(),
    }
}
