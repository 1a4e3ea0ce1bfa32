//! ROI geometry
//!
//! A core carries its region of interest as a JSON document of polygon
//! segments in tile-local pixel coordinates:
//!
//! ```json
//! {"segments": [{"point": {"x": 10, "y": 20}}, ...]}
//! ```
//!
//! The deep-zoom image service reports the pixel offset of a slide's
//! non-empty content region; translating a ROI adds that offset to every
//! point, producing whole-slide coordinates.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// Pixel offset of a slide's non-empty content region.
///
/// Wire values may be fractional; integer offsets are obtained by
/// flooring, never rounding.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SlideBounds {
    pub bounds_x: f64,
    pub bounds_y: f64,
}

impl SlideBounds {
    /// Zero offset: tile-local coordinates pass through unchanged.
    pub const ZERO: SlideBounds = SlideBounds {
        bounds_x: 0.0,
        bounds_y: 0.0,
    };

    pub fn x_offset(&self) -> i64 {
        self.bounds_x.floor() as i64
    }

    pub fn y_offset(&self) -> i64 {
        self.bounds_y.floor() as i64
    }
}

/// A polygon vertex in tile-local pixel coordinates
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Deserialize)]
struct Segment {
    point: Point,
}

#[derive(Debug, Deserialize)]
struct Shape {
    segments: Vec<Segment>,
}

/// A core's region of interest, parsed from its serialized form.
#[derive(Debug, Clone)]
pub struct Roi {
    points: Vec<Point>,
}

impl Roi {
    /// Parse the serialized polygon carried in a core row.
    ///
    /// An undecodable document, non-integer coordinates, or an empty
    /// segment list are all invalid.
    pub fn parse(raw: &str) -> Result<Roi> {
        let shape: Shape = serde_json::from_str(raw)
            .map_err(|e| Error::InvalidRoi(format!("unparseable ROI document: {}", e)))?;
        if shape.segments.is_empty() {
            return Err(Error::InvalidRoi("ROI has no segment points".to_string()));
        }
        Ok(Roi {
            points: shape.segments.into_iter().map(|s| s.point).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Translate every point into whole-slide coordinates, preserving the
    /// segment order of the source document.
    pub fn translate(&self, bounds: &SlideBounds) -> Vec<(i64, i64)> {
        let (dx, dy) = (bounds.x_offset(), bounds.y_offset());
        self.points.iter().map(|p| (p.x + dx, p.y + dy)).collect()
    }
}

/// Minimal axis-aligned rectangle containing a point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl BoundingBox {
    /// `None` only for an empty point list; single-point, two-point and
    /// collinear inputs yield a well-defined (possibly zero-area) box.
    pub fn of(points: &[(i64, i64)]) -> Option<BoundingBox> {
        let (&(x, y), rest) = points.split_first()?;
        let mut bbox = BoundingBox {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        };
        for &(x, y) in rest {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        Some(bbox)
    }
}

impl fmt::Display for BoundingBox {
    /// Rendered as the corner list `[(min_x, min_y), (max_x, max_y)]`,
    /// the form written into the summary CSV.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({}, {}), ({}, {})]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
