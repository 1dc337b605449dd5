//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::osgb::wgs84_to_british_national_grid;

/// An axis-aligned bounding box in the coordinate units of its source
/// geometry (degrees for WGS84 footprints, metres for projected clips).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounds of a WKT geometry (`POLYGON`, `MULTIPOLYGON`, `LINESTRING`,
    /// `POINT`, ...), optionally prefixed with an EWKT `SRID=n;`.
    ///
    /// Only the first two ordinates of each vertex are used.
    pub fn from_wkt(wkt: &str) -> Result<Self, BboxParseError> {
        let body = wkt.split_once(';').map_or(wkt, |(_, rest)| rest);
        if !body.contains('(') {
            return Err(BboxParseError::InvalidFormat(wkt.to_string()));
        }

        let mut bounds: Option<BoundingBox> = None;

        for vertex in body.replace(['(', ')'], " ").split(',') {
            let ordinates: Vec<&str> = vertex
                .split_whitespace()
                .filter(|token| !token.chars().all(|c| c.is_ascii_alphabetic()))
                .collect();
            if ordinates.is_empty() {
                continue;
            }
            if ordinates.len() < 2 {
                return Err(BboxParseError::InvalidFormat(wkt.to_string()));
            }

            let x: f64 = ordinates[0]
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(ordinates[0].to_string()))?;
            let y: f64 = ordinates[1]
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(ordinates[1].to_string()))?;

            bounds = Some(match bounds {
                None => BoundingBox::new(x, y, x, y),
                Some(b) => BoundingBox::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
            });
        }

        bounds.ok_or_else(|| BboxParseError::Empty(wkt.to_string()))
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Lower-left corner as a space separated `"x y"` pair, the form WPS
    /// bounding-box inputs take.
    pub fn lower_left(&self) -> String {
        format!("{} {}", self.min_x, self.min_y)
    }

    /// Upper-right corner as a space separated `"x y"` pair.
    pub fn upper_right(&self) -> String {
        format!("{} {}", self.max_x, self.max_y)
    }

    /// Reproject a WGS84 (lon/lat) box to British National Grid.
    ///
    /// Only the two corners are projected, so the result is the grid
    /// position of the lower-left and upper-right corners rather than the
    /// envelope of the projected outline.
    pub fn to_british_national_grid(&self) -> BoundingBox {
        let (min_x, min_y) = wgs84_to_british_national_grid(self.min_x, self.min_y);
        let (max_x, max_y) = wgs84_to_british_national_grid(self.max_x, self.max_y);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid WKT geometry: {0}")]
    InvalidFormat(String),

    #[error("Invalid number in WKT geometry: {0}")]
    InvalidNumber(String),

    #[error("WKT geometry has no coordinates: {0}")]
    Empty(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_bounds() {
        let bbox = BoundingBox::from_wkt(
            "POLYGON((-2.4 51.9, -2.4 51.6, -1.9 51.6, -1.9 51.9, -2.4 51.9))",
        )
        .unwrap();
        assert_eq!(bbox, BoundingBox::new(-2.4, 51.6, -1.9, 51.9));
    }

    #[test]
    fn test_corner_strings() {
        let bbox = BoundingBox::new(455556.0, 106403.0, 467913.0, 114292.0);
        assert_eq!(bbox.lower_left(), "455556 106403");
        assert_eq!(bbox.upper_right(), "467913 114292");
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
