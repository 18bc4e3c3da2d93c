//! Reference Catalog
//!
//! Read-through access to remote reference sets, cached per key.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::{ReferenceError, RemoteError};

/// Remote provider of reference sets. Returns the full set for a key.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Value, RemoteError>;
}

/// Typed, cached access to a fixed list of reference sets.
#[derive(Debug)]
pub struct ReferenceCatalog<S> {
    cache: Arc<CacheStore>,
    source: Arc<S>,
    keys: Vec<String>,
    ttl: Duration,
}

impl<S: ReferenceSource> ReferenceCatalog<S> {
    /// Creates a catalog over `keys`, registering each with the store so a
    /// full invalidation clears them.
    pub fn new<K>(cache: Arc<CacheStore>, source: Arc<S>, keys: K) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        for key in &keys {
            cache.register_key(key.as_str());
        }
        let ttl = cache.default_ttl();
        Self {
            cache,
            source,
            keys,
            ttl,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    // == Read ==
    /// Returns the set under `key`, fetching it if the cached copy is absent
    /// or expired.
    ///
    /// # Errors
    /// - `ReferenceError::Fetch` if the remote source fails
    /// - `ReferenceError::Decode` if the set does not deserialize as `T`
    pub async fn get_set<T: DeserializeOwned>(&self, key: &str) -> Result<T, ReferenceError> {
        let value = self.fetch_value(key).await?;
        serde_json::from_value(value).map_err(|source| ReferenceError::Decode {
            key: key.to_string(),
            source,
        })
    }

    /// Untyped form of [`get_set`](Self::get_set).
    pub async fn fetch_value(&self, key: &str) -> Result<Value, ReferenceError> {
        let source = &self.source;
        self.cache
            .get_or_fetch(key, self.ttl, move || source.fetch(key))
            .await
            .map_err(|source| ReferenceError::Fetch {
                key: key.to_string(),
                source,
            })
    }

    // == Refresh ==
    /// Clears the cache and fetches every registered set again.
    ///
    /// Keeps going after a failed key and returns the first failure, if any.
    /// On success returns the number of sets refreshed.
    pub async fn refresh_all(&self) -> Result<usize, ReferenceError> {
        info!(keys = self.keys.len(), "Refreshing all reference data");
        self.cache.invalidate_all();

        let mut refreshed = 0;
        let mut first_error = None;
        for key in &self.keys {
            match self.fetch_value(key).await {
                Ok(_) => refreshed += 1,
                Err(err) => {
                    warn!(key = key.as_str(), error = %err, "Reference refresh failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!(refreshed, "Reference data refreshed");
                Ok(refreshed)
            }
        }
    }

    /// Refreshes everything if any set is absent, expired or older than
    /// `max_age`. Returns whether a refresh ran.
    pub async fn auto_refresh_if_stale(&self, max_age: Duration) -> Result<bool, ReferenceError> {
        if !self.cache.needs_refresh(max_age) {
            debug!("Reference data is fresh");
            return Ok(false);
        }
        info!("Reference data is stale, refreshing");
        self.refresh_all().await?;
        Ok(true)
    }
}
