//! Service Module
//!
//! Glue between drawn areas, the geometry codec, the remote database and the
//! auto-recovery protocol.

mod bloc;
mod repository;

pub use bloc::{BatchOutcome, BlocService};
pub use repository::SpatialRepository;
