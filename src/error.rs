//! Error types for fieldstore
//!
//! Provides the error taxonomy shared by the geometry codec, the local cache
//! and the auto-recovery layer, using thiserror.

use std::fmt;

use thiserror::Error;

// == Geometry Errors ==
/// Reason a polygon could not be encoded or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryErrorKind {
    /// Fewer than three distinct points in the ring
    InsufficientPoints,
    /// A coordinate component is NaN or infinite
    NonFinite,
    /// The `POLYGON((...))` wrapper is missing or damaged
    MalformedEnvelope,
    /// A ring token is not exactly two finite numbers
    MalformedPoint,
    /// The ring is not closed and the codec is configured to reject that
    UnclosedRing,
}

impl fmt::Display for GeometryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryErrorKind::InsufficientPoints => "insufficient points",
            GeometryErrorKind::NonFinite => "non-finite coordinate",
            GeometryErrorKind::MalformedEnvelope => "malformed envelope",
            GeometryErrorKind::MalformedPoint => "malformed point",
            GeometryErrorKind::UnclosedRing => "unclosed ring",
        };
        f.write_str(name)
    }
}

/// Codec failure. Always surfaced to the caller, never corrected silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct GeometryError {
    pub kind: GeometryErrorKind,
    pub detail: String,
}

impl GeometryError {
    pub fn new(kind: GeometryErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn insufficient_points(found: usize) -> Self {
        Self::new(
            GeometryErrorKind::InsufficientPoints,
            format!("a ring needs at least 3 points, found {}", found),
        )
    }

    pub fn too_few_distinct_points(found: usize) -> Self {
        Self::new(
            GeometryErrorKind::InsufficientPoints,
            format!("a ring needs at least 3 distinct points, found {}", found),
        )
    }

    pub fn non_finite(index: usize) -> Self {
        Self::new(
            GeometryErrorKind::NonFinite,
            format!("point {} has a NaN or infinite component", index),
        )
    }

    pub fn malformed_envelope(wire: &str) -> Self {
        let mut preview: String = wire.chars().take(40).collect();
        if preview.len() < wire.len() {
            preview.push_str("...");
        }
        Self::new(
            GeometryErrorKind::MalformedEnvelope,
            format!("expected POLYGON((...)), got {:?}", preview),
        )
    }

    pub fn malformed_point(index: usize, token: &str) -> Self {
        Self::new(
            GeometryErrorKind::MalformedPoint,
            format!("token {} ({:?}) is not two finite numbers", index, token.trim()),
        )
    }

    pub fn unclosed_ring() -> Self {
        Self::new(
            GeometryErrorKind::UnclosedRing,
            "last point does not repeat the first",
        )
    }
}

// == Geometry Warnings ==
/// Non-fatal decode findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryWarningKind {
    /// The wire ring did not repeat its first point; all points were kept
    UnclosedRing,
}

/// A decode finding the caller may want to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryWarning {
    pub kind: GeometryWarningKind,
}

impl GeometryWarning {
    pub fn unclosed_ring() -> Self {
        Self {
            kind: GeometryWarningKind::UnclosedRing,
        }
    }
}

impl fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            GeometryWarningKind::UnclosedRing => {
                f.write_str("ring was not closed; points taken as-is")
            }
        }
    }
}

// == Remote Errors ==
/// Failure reported by a remote collaborator (database RPC, reference feed).
///
/// The shape is opaque to this crate: an optional machine code plus free text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Provider error code, e.g. a SQLSTATE such as `23503`
    pub code: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

// == Cache Errors ==
/// Why a cache entry could not be read. Absorbed by the store, never returned
/// from its public read paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheReadError {
    /// No payload stored under the key
    #[error("no entry stored")]
    Missing,

    /// Payload exists but does not parse as an entry of the requested type
    #[error("corrupt payload: {0}")]
    Corrupt(String),
}

/// Failure writing to the local durable medium.
#[derive(Error, Debug)]
pub enum MediumError {
    #[error("local storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("local storage serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

// == Recovery Errors ==
/// Terminal outcome of an operation run under auto-recovery.
#[derive(Error, Debug)]
pub enum RecoveryError<E>
where
    E: std::error::Error + 'static,
{
    /// The first failure was not an identifier mismatch; no retry happened
    #[error("{operation} failed: {source}")]
    NotRetryable { operation: String, source: E },

    /// The cache was cleared and the single retry failed too
    #[error("{operation} failed after auto-recovery: {retry}")]
    Exhausted {
        operation: String,
        original: E,
        #[source]
        retry: E,
    },
}

impl<E> RecoveryError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns true if a retry was attempted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RecoveryError::Exhausted { .. })
    }

    /// The most recent underlying failure.
    pub fn last_error(&self) -> &E {
        match self {
            RecoveryError::NotRetryable { source, .. } => source,
            RecoveryError::Exhausted { retry, .. } => retry,
        }
    }

    /// Consumes the error, returning the most recent underlying failure.
    pub fn into_last_error(self) -> E {
        match self {
            RecoveryError::NotRetryable { source, .. } => source,
            RecoveryError::Exhausted { retry, .. } => retry,
        }
    }
}

// == Reference Data Errors ==
/// Failure serving a named reference set.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("fetching reference set '{key}' failed: {source}")]
    Fetch { key: String, source: RemoteError },

    #[error("reference set '{key}' does not match the requested type: {source}")]
    Decode {
        key: String,
        source: serde_json::Error,
    },
}

// == Service Errors ==
/// Failure in the bloc record service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Remote(#[from] RecoveryError<RemoteError>),

    #[error("bloc {0} has no stored geometry")]
    MissingGeometry(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == Result Type Alias ==
/// Convenience Result type for codec operations.
pub type Result<T> = std::result::Result<T, GeometryError>;
