//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the client.
//!
//! # Tasks
//! - Reference Refresh: Reloads reference data once it goes stale

mod refresh;

pub use refresh::spawn_refresh_task;
