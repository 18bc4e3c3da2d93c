//! Configuration Module
//!
//! Handles loading cache and codec settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheOptions;
use crate::geometry::{CodecOptions, UnclosedRingPolicy, DEFAULT_CLOSURE_TOLERANCE};

/// Client-side persistence configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Lifetime of cached reference sets in seconds
    pub default_ttl: u64,
    /// Age in seconds after which reference sets are proactively refreshed
    pub stale_after: u64,
    /// Background refresh check interval in seconds
    pub refresh_interval: u64,
    /// Share one fetch among concurrent callers of the same key
    pub single_flight: bool,
    /// Durable cache file; `None` keeps the cache in memory
    pub cache_file: Option<PathBuf>,
    /// Decoder handling of rings whose last point is not the first
    pub unclosed_ring: UnclosedRingPolicy,
    /// Per-component tolerance for ring closure
    pub closure_tolerance: f64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL` - Cache TTL in seconds (default: 86400)
    /// - `CACHE_STALE_AFTER` - Proactive refresh age in seconds (default: 3600)
    /// - `CACHE_REFRESH_INTERVAL` - Refresh check interval in seconds (default: 300)
    /// - `CACHE_SINGLE_FLIGHT` - `true`/`false` (default: true)
    /// - `CACHE_FILE` - Path of the durable cache file (default: unset)
    /// - `GEOMETRY_UNCLOSED_RING` - `accept` or `reject` (default: accept)
    /// - `GEOMETRY_CLOSURE_TOLERANCE` - Closure tolerance (default: 1e-9)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: parse_var("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            stale_after: parse_var("CACHE_STALE_AFTER").unwrap_or(defaults.stale_after),
            refresh_interval: parse_var("CACHE_REFRESH_INTERVAL")
                .unwrap_or(defaults.refresh_interval),
            single_flight: env::var("CACHE_SINGLE_FLIGHT")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.single_flight),
            cache_file: env::var_os("CACHE_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            unclosed_ring: parse_var("GEOMETRY_UNCLOSED_RING").unwrap_or(defaults.unclosed_ring),
            closure_tolerance: parse_var::<f64>("GEOMETRY_CLOSURE_TOLERANCE")
                .filter(|t| t.is_finite() && *t >= 0.0)
                .unwrap_or(defaults.closure_tolerance),
        }
    }

    /// Options for a [`crate::cache::CacheStore`].
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            default_ttl: Duration::from_secs(self.default_ttl),
            single_flight: self.single_flight,
            known_keys: Vec::new(),
        }
    }

    /// Options for a [`crate::geometry::PolygonCodec`].
    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            unclosed_ring: self.unclosed_ring,
            closure_tolerance: self.closure_tolerance,
        }
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 24 * 60 * 60,
            stale_after: 60 * 60,
            refresh_interval: 300,
            single_flight: true,
            cache_file: None,
            unclosed_ring: UnclosedRingPolicy::Accept,
            closure_tolerance: DEFAULT_CLOSURE_TOLERANCE,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
