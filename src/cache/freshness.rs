//! Freshness Report Module
//!
//! Side-effect-free diagnostic snapshot of every known cache key.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheEntry;

/// Freshness of every known key, ordered by key.
pub type FreshnessReport = BTreeMap<String, Freshness>;

// == Freshness ==
/// State of one cache key at the moment of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Freshness {
    /// A parsable entry is stored under the key
    pub present: bool,
    /// Whole seconds since the entry was stored
    pub age_seconds: Option<i64>,
    /// The entry is within its TTL
    pub valid: bool,
    /// Number of items when the stored value is a list
    pub item_count: Option<usize>,
}

impl Freshness {
    /// Freshness of a key with no (parsable) entry.
    pub fn absent() -> Self {
        Self {
            present: false,
            age_seconds: None,
            valid: false,
            item_count: None,
        }
    }

    /// Freshness of a stored entry as seen at `now`.
    pub fn of(entry: &CacheEntry<Value>, now: DateTime<Utc>) -> Self {
        Self {
            present: true,
            age_seconds: Some(entry.age_at(now).num_seconds()),
            valid: entry.is_valid_at(now),
            item_count: entry.value.as_array().map(Vec::len),
        }
    }

    /// Returns true if the key should be refetched given a maximum tolerated age.
    pub fn needs_refresh(&self, max_age_seconds: i64) -> bool {
        !self.present
            || !self.valid
            || self.age_seconds.map_or(true, |age| age > max_age_seconds)
    }
}
