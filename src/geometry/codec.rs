//! Polygon Codec
//!
//! Lossless conversion between drawing-order rings and WKT polygons.
//!
//! Coordinates are written with Rust's shortest round-trip `f64` formatting,
//! which never uses exponents or locale separators, so every token parses
//! back to the identical value.

use std::str::FromStr;

use crate::error::{GeometryError, GeometryWarning, Result};
use crate::geometry::{
    Coordinate, Polygon, WirePolygon, DEFAULT_CLOSURE_TOLERANCE, ENVELOPE_CLOSE, ENVELOPE_OPEN,
    MIN_RING_POINTS,
};

const KEYWORD: &str = "POLYGON";

// == Options ==
/// What the decoder does with a ring whose last point is not its first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnclosedRingPolicy {
    /// Keep every point and report [`GeometryWarning::unclosed_ring`]
    #[default]
    Accept,
    /// Fail with `GeometryErrorKind::UnclosedRing`
    Reject,
}

impl FromStr for UnclosedRingPolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accept" | "warn" => Ok(Self::Accept),
            "reject" | "error" => Ok(Self::Reject),
            other => Err(format!("unknown unclosed ring policy '{}'", other)),
        }
    }
}

/// Decoder settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecOptions {
    pub unclosed_ring: UnclosedRingPolicy,
    /// Per-component tolerance used to decide whether a ring is closed
    pub closure_tolerance: f64,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            unclosed_ring: UnclosedRingPolicy::default(),
            closure_tolerance: DEFAULT_CLOSURE_TOLERANCE,
        }
    }
}

// == Decoded ==
/// A decoded polygon plus any non-fatal findings.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub polygon: Polygon,
    pub warnings: Vec<GeometryWarning>,
}

impl Decoded {
    /// Returns true if decoding produced no warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_polygon(self) -> Polygon {
        self.polygon
    }
}

// == Codec ==
/// Stateless codec carrying decode options. Cheap to copy and share.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolygonCodec {
    options: CodecOptions,
}

impl PolygonCodec {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CodecOptions {
        self.options
    }

    // == Encode ==
    /// Encodes a drawing-order ring as a closed wire-order WKT polygon.
    ///
    /// # Errors
    /// - `InsufficientPoints` if the ring has fewer than 3 distinct points
    /// - `NonFinite` if any component is NaN or infinite
    pub fn encode(&self, polygon: &Polygon) -> Result<WirePolygon> {
        let points = polygon.points();
        if points.len() < MIN_RING_POINTS {
            return Err(GeometryError::insufficient_points(points.len()));
        }
        if let Some(index) = points
            .iter()
            .position(|[d1, d2]| !d1.is_finite() || !d2.is_finite())
        {
            return Err(GeometryError::non_finite(index));
        }
        self.check_distinct(points)?;

        let mut ring: Vec<String> = points
            .iter()
            .map(|[d1, d2]| format!("{} {}", d2, d1))
            .collect();
        let closing = ring[0].clone();
        ring.push(closing);

        Ok(WirePolygon::from_encoded(format!(
            "{}{}{}",
            ENVELOPE_OPEN,
            ring.join(", "),
            ENVELOPE_CLOSE
        )))
    }

    // == Decode ==
    /// Decodes a WKT polygon back into a drawing-order ring.
    ///
    /// The closing point is dropped when it matches the first point within
    /// `closure_tolerance`. Unclosed rings follow the configured policy.
    ///
    /// # Errors
    /// - `MalformedEnvelope` if the `POLYGON((...))` wrapper is missing
    /// - `MalformedPoint` if a token is not exactly two finite numbers
    /// - `UnclosedRing` under [`UnclosedRingPolicy::Reject`]
    /// - `InsufficientPoints` if fewer than 3 distinct points remain
    pub fn decode(&self, wire: &str) -> Result<Decoded> {
        let body = strip_envelope(wire)?;

        let mut points = body
            .split(',')
            .enumerate()
            .map(|(index, token)| parse_point(index, token))
            .collect::<Result<Vec<Coordinate>>>()?;

        let mut warnings = Vec::new();
        let closed = match (points.first(), points.last()) {
            (Some(first), Some(last)) if points.len() > 1 => {
                self.same_point(first, last)
            }
            _ => false,
        };

        if closed {
            points.pop();
        } else {
            match self.options.unclosed_ring {
                UnclosedRingPolicy::Accept => warnings.push(GeometryWarning::unclosed_ring()),
                UnclosedRingPolicy::Reject => return Err(GeometryError::unclosed_ring()),
            }
        }

        if points.len() < MIN_RING_POINTS {
            return Err(GeometryError::insufficient_points(points.len()));
        }
        self.check_distinct(&points)?;

        Ok(Decoded {
            polygon: Polygon::new(points),
            warnings,
        })
    }

    fn same_point(&self, a: &Coordinate, b: &Coordinate) -> bool {
        let tolerance = self.options.closure_tolerance;
        (a[0] - b[0]).abs() <= tolerance && (a[1] - b[1]).abs() <= tolerance
    }

    /// Points equal within `closure_tolerance` count once.
    fn check_distinct(&self, points: &[Coordinate]) -> Result<()> {
        let mut distinct: Vec<&Coordinate> = Vec::with_capacity(MIN_RING_POINTS);
        for point in points {
            if !distinct.iter().any(|seen| self.same_point(seen, point)) {
                distinct.push(point);
                if distinct.len() == MIN_RING_POINTS {
                    return Ok(());
                }
            }
        }
        Err(GeometryError::too_few_distinct_points(distinct.len()))
    }
}

/// Encodes with default options.
pub fn encode(polygon: &Polygon) -> Result<WirePolygon> {
    PolygonCodec::default().encode(polygon)
}

/// Decodes with default options (unclosed rings accepted with a warning).
pub fn decode(wire: &str) -> Result<Decoded> {
    PolygonCodec::default().decode(wire)
}

// == Parsing Helpers ==
/// Returns the text between `POLYGON((` and `))`.
///
/// Accepts surrounding whitespace, any keyword case, a space before the
/// parentheses and a leading EWKT `SRID=n;` prefix.
fn strip_envelope(wire: &str) -> Result<&str> {
    let mut text = wire.trim();

    if let Some((prefix, rest)) = text.split_once(';') {
        let is_srid = prefix
            .trim()
            .get(..5)
            .map_or(false, |head| head.eq_ignore_ascii_case("SRID="));
        if !is_srid {
            return Err(GeometryError::malformed_envelope(wire));
        }
        text = rest.trim_start();
    }

    let has_keyword = text
        .get(..KEYWORD.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(KEYWORD));
    if !has_keyword {
        return Err(GeometryError::malformed_envelope(wire));
    }

    text[KEYWORD.len()..]
        .trim_start()
        .strip_prefix("((")
        .and_then(|rest| rest.strip_suffix("))"))
        .ok_or_else(|| GeometryError::malformed_envelope(wire))
}

/// Parses one `x y` wire token into a drawing-order coordinate.
fn parse_point(index: usize, token: &str) -> Result<Coordinate> {
    let mut parts = token.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GeometryError::malformed_point(index, token));
    };

    match (x.parse::<f64>(), y.parse::<f64>()) {
        (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => Ok([y, x]),
        _ => Err(GeometryError::malformed_point(index, token)),
    }
}
