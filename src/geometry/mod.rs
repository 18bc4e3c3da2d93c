//! Geometry Module
//!
//! Converts polygons drawn on the map (drawing order, `[lat, lng]`) to and from
//! the WKT ring persisted by the remote database (wire order, `lng lat`).

mod codec;
mod polygon;


// Re-export public types
pub use codec::{decode, encode, CodecOptions, Decoded, PolygonCodec, UnclosedRingPolicy};
pub use polygon::{Coordinate, Polygon, WirePolygon};

// == Public Constants ==
/// Opening envelope of an encoded polygon with one outer ring
pub const ENVELOPE_OPEN: &str = "POLYGON((";

/// Closing envelope of an encoded polygon
pub const ENVELOPE_CLOSE: &str = "))";

/// Minimum number of distinct points in a ring
pub const MIN_RING_POINTS: usize = 3;

/// Default per-component tolerance when checking ring closure
pub const DEFAULT_CLOSURE_TOLERANCE: f64 = 1e-9;
