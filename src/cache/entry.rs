//! Cache Entry Module
//!
//! Defines the persisted envelope of one cached value set with TTL metadata.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached value stamped with its store time and time-to-live.
///
/// Entries are never mutated in place; a refresh replaces the whole entry.
/// Serialized as `{"data": .., "timestamp": <unix ms>, "ttl": <ms>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored value
    #[serde(rename = "data")]
    pub value: T,
    /// When the value was fetched
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
    /// How long the value stays valid after `stored_at`
    #[serde(with = "ttl_millis")]
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry stored at `stored_at`.
    pub fn new(value: T, stored_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    // == Age ==
    /// Time elapsed since the entry was stored. Negative if the clock moved back.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.stored_at
    }

    // == Is Valid ==
    /// Checks if the entry is still within its TTL.
    ///
    /// Boundary condition: valid while `now - stored_at < ttl`. Once the full
    /// TTL has elapsed the entry is stale. A TTL too large for chrono to
    /// represent never expires.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => self.age_at(now) < ttl,
            Err(_) => true,
        }
    }

    // == Time To Live ==
    /// Returns the remaining validity, or zero if the entry is stale.
    pub fn ttl_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => (ttl - self.age_at(now)).to_std().unwrap_or(Duration::ZERO),
            Err(_) => self.ttl,
        }
    }
}

/// TTL as whole milliseconds on the wire.
mod ttl_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_entry_valid_within_ttl() {
        let entry = CacheEntry::new("value", at(1_000), Duration::from_millis(1_000));

        assert!(entry.is_valid_at(at(1_000)));
        assert!(entry.is_valid_at(at(1_999)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("value", at(1_000), Duration::from_millis(1_000));

        // Stale once the TTL has fully elapsed
        assert!(!entry.is_valid_at(at(2_000)));
        assert!(!entry.is_valid_at(at(2_001)));
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let entry = CacheEntry::new("value", at(5_000), Duration::ZERO);
        assert!(!entry.is_valid_at(at(5_000)));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("value", at(0), Duration::from_secs(10));

        assert_eq!(entry.ttl_remaining_at(at(4_000)), Duration::from_secs(6));
        assert_eq!(entry.ttl_remaining_at(at(60_000)), Duration::ZERO);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let entry = CacheEntry::new("value", at(0), Duration::MAX);
        assert!(entry.is_valid_at(at(i64::from(i32::MAX) * 1_000)));
    }

    #[test]
    fn test_entry_wire_layout() {
        let entry = CacheEntry::new(vec![1, 2, 3], at(1_700_000_000_000), Duration::from_secs(60));
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["ttl"], 60_000);

        let back: CacheEntry<Vec<i32>> = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_entry_reads_browser_layout() {
        let raw = r#"{"data":["a","b"],"timestamp":1700000000000,"ttl":86400000}"#;
        let entry: CacheEntry<Vec<String>> = serde_json::from_str(raw).unwrap();

        assert_eq!(entry.value, vec!["a", "b"]);
        assert_eq!(entry.ttl, Duration::from_secs(86_400));
        assert_eq!(entry.stored_at, at(1_700_000_000_000));
    }
}
