//! Cache Module
//!
//! Provides a durable local cache of named value sets with TTL expiration,
//! corruption tolerance and optional single-flight fetching.

mod clock;
mod entry;
mod freshness;
mod medium;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use freshness::{Freshness, FreshnessReport};
pub use medium::{FileMedium, LocalMedium, MemoryMedium};
pub use stats::CacheStats;
pub use store::{CacheOptions, CacheStore};

// == Public Constants ==
/// Default lifetime of a cached value set (24 hours)
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Age after which reference data is proactively refreshed (1 hour)
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60 * 60);
