//! Reference Refresh Task
//!
//! Background task that periodically refreshes stale reference data.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::reference::{ReferenceCatalog, ReferenceSource};

/// Spawns a background task that runs
/// [`ReferenceCatalog::auto_refresh_if_stale`] every `interval`.
///
/// The first check happens immediately. Refresh failures are logged and the
/// task carries on; abort the returned handle to stop it.
///
/// # Example
/// ```ignore
/// let catalog = Arc::new(ReferenceCatalog::new(cache, source, ["varieties"]));
/// let refresh_handle = spawn_refresh_task(catalog.clone(), config.refresh_interval(), config.stale_after());
/// // Later, during shutdown:
/// refresh_handle.abort();
/// ```
pub fn spawn_refresh_task<S>(
    catalog: Arc<ReferenceCatalog<S>>,
    interval: Duration,
    max_age: Duration,
) -> JoinHandle<()>
where
    S: ReferenceSource + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            max_age_secs = max_age.as_secs(),
            "Starting reference refresh task"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match catalog.auto_refresh_if_stale(max_age).await {
                Ok(true) => info!("Reference refresh: stale data reloaded"),
                Ok(false) => debug!("Reference refresh: data still fresh"),
                Err(err) => warn!(error = %err, "Reference refresh failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::error::RemoteError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ReferenceSource for CountingSource {
        async fn fetch(&self, _key: &str) -> Result<Value, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RemoteError::new("offline"));
            }
            Ok(json!(["R570", "M1176/77"]))
        }
    }

    fn catalog(source: Arc<CountingSource>) -> Arc<ReferenceCatalog<CountingSource>> {
        Arc::new(ReferenceCatalog::new(
            Arc::new(CacheStore::in_memory()),
            source,
            ["varieties"],
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_loads_missing_data() {
        let source = Arc::new(CountingSource::default());
        let catalog = catalog(Arc::clone(&source));

        let handle = spawn_refresh_task(
            Arc::clone(&catalog),
            Duration::from_secs(60),
            Duration::from_secs(3600),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(catalog.cache().get::<Vec<String>>("varieties").is_some());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_skips_fresh_data() {
        let source = Arc::new(CountingSource::default());
        let catalog = catalog(Arc::clone(&source));

        let handle = spawn_refresh_task(
            Arc::clone(&catalog),
            Duration::from_secs(60),
            Duration::from_secs(3600),
        );
        // three ticks, only the first finds the cache empty
        tokio::time::sleep(Duration::from_secs(150)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_survives_failures() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..CountingSource::default()
        });
        let catalog = catalog(Arc::clone(&source));

        let handle = spawn_refresh_task(catalog, Duration::from_secs(60), Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_secs(150)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_refresh_task_can_be_aborted() {
        let catalog = catalog(Arc::new(CountingSource::default()));

        let handle = spawn_refresh_task(catalog, Duration::from_secs(1), Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
