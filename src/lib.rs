//! fieldstore - Geometry codec and reference-data cache for farm mapping
//!
//! Converts drawn polygons to and from WKT, keeps remote reference sets in a
//! local TTL cache, and retries remote calls once after clearing stale
//! cached identifiers.

pub mod cache;
pub mod config;
pub mod error;
pub mod geometry;
pub mod models;
pub mod recovery;
pub mod reference;
pub mod service;
pub mod tasks;
pub mod telemetry;

pub use cache::{CacheOptions, CacheStore};
pub use config::Config;
pub use error::{GeometryError, RecoveryError, ReferenceError, RemoteError, ServiceError};
pub use geometry::{decode, encode, Polygon, PolygonCodec, WirePolygon};
pub use recovery::{with_auto_recovery, AutoRecovery, ErrorClass, ErrorClassifier};
pub use reference::{ReferenceCatalog, ReferenceSource};
pub use service::{BlocService, SpatialRepository};
pub use tasks::spawn_refresh_task;
