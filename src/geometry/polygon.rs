//! Polygon Types
//!
//! Drawing-order point rings and their persisted text form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One `[dimension-1, dimension-2]` pair in drawing order.
pub type Coordinate = [f64; 2];

// == Polygon ==
/// An ordered ring of points in drawing order, not necessarily closed.
///
/// Construction does not validate; [`crate::geometry::encode`] enforces the
/// ring invariants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Coordinate>,
}

impl Polygon {
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }
}

impl From<Vec<Coordinate>> for Polygon {
    fn from(points: Vec<Coordinate>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Coordinate> for Polygon {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// == Wire Polygon ==
/// Closed ring in wire order wrapped as `POLYGON((...))`.
///
/// Values built by the encoder always satisfy the ring invariants. Values
/// wrapping text received from the remote side are unchecked until decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WirePolygon(String);

impl WirePolygon {
    pub(crate) fn from_encoded(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for WirePolygon {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for WirePolygon {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl AsRef<str> for WirePolygon {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WirePolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
