//! Auto-Recovery Retry
//!
//! Runs a remote operation that depends on cached identifiers. A failure
//! classified as a consistency error clears the cache and triggers exactly one
//! retry; any other failure, or a second failure, is returned.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::error::RecoveryError;
use crate::recovery::{ErrorClass, ErrorClassifier, IdentifierMismatchClassifier};

/// Something whose cached identifiers can be thrown away wholesale.
pub trait Invalidate: Send + Sync {
    /// Drops every cached entry. Returns how many were cleared.
    fn invalidate_all(&self) -> usize;
}

impl Invalidate for CacheStore {
    fn invalidate_all(&self) -> usize {
        CacheStore::invalidate_all(self)
    }
}

impl<T: Invalidate + ?Sized> Invalidate for Arc<T> {
    fn invalidate_all(&self) -> usize {
        (**self).invalidate_all()
    }
}

// == With Auto Recovery ==
/// Runs `operation`, retrying once after clearing `cache` if the first
/// failure classifies as [`ErrorClass::Consistency`].
///
/// `operation` is invoked at most twice.
///
/// # Errors
/// - `RecoveryError::NotRetryable` for a first failure classified `Other`
/// - `RecoveryError::Exhausted` when the retry fails as well
pub async fn with_auto_recovery<T, E, F, Fut, C, I>(
    cache: &I,
    operation_name: &str,
    mut operation: F,
    classifier: &C,
) -> Result<T, RecoveryError<E>>
where
    I: Invalidate + ?Sized,
    C: ErrorClassifier<E> + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    debug!(operation = operation_name, "Starting operation");

    let original = match operation().await {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    if classifier.classify(&original) == ErrorClass::Other {
        warn!(
            operation = operation_name,
            error = %original,
            "Operation failed with a non-retryable error"
        );
        return Err(RecoveryError::NotRetryable {
            operation: operation_name.to_string(),
            source: original,
        });
    }

    warn!(
        operation = operation_name,
        error = %original,
        "Identifier mismatch detected, clearing cache and retrying"
    );
    let cleared = cache.invalidate_all();
    debug!(operation = operation_name, cleared, "Cache cleared before retry");

    match operation().await {
        Ok(value) => {
            info!(operation = operation_name, "Operation succeeded after auto-recovery");
            Ok(value)
        }
        Err(retry) => {
            error!(
                operation = operation_name,
                original = %original,
                retry = %retry,
                "Operation failed even after auto-recovery"
            );
            Err(RecoveryError::Exhausted {
                operation: operation_name.to_string(),
                original,
                retry,
            })
        }
    }
}

// == Auto Recovery ==
/// A cache handle paired with a classifier, for services that wrap many
/// remote calls.
#[derive(Debug, Clone)]
pub struct AutoRecovery<C = IdentifierMismatchClassifier> {
    cache: Arc<CacheStore>,
    classifier: C,
}

impl AutoRecovery {
    /// Uses the default identifier-mismatch rules.
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self::with_classifier(cache, IdentifierMismatchClassifier::default())
    }
}

impl<C> AutoRecovery<C> {
    pub fn with_classifier(cache: Arc<CacheStore>, classifier: C) -> Self {
        Self { cache, classifier }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Runs `operation` under [`with_auto_recovery`].
    pub async fn run<T, E, F, Fut>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> Result<T, RecoveryError<E>>
    where
        C: ErrorClassifier<E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + 'static,
    {
        with_auto_recovery(
            self.cache.as_ref(),
            operation_name,
            operation,
            &self.classifier,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    /// Counts full invalidations.
    #[derive(Default)]
    struct CountingCache {
        flushes: AtomicUsize,
    }

    impl Invalidate for CountingCache {
        fn invalidate_all(&self) -> usize {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    fn fk_violation() -> RemoteError {
        RemoteError::with_code("23503", "violates foreign key constraint \"fk_variety\"")
    }

    /// Replays a scripted sequence of outcomes, one per invocation.
    fn scripted(
        outcomes: Vec<Result<u32, RemoteError>>,
    ) -> (Arc<AtomicUsize>, impl FnMut() -> std::future::Ready<Result<u32, RemoteError>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let outcomes = Mutex::new(outcomes.into_iter());
        let operation = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let next = outcomes
                .lock()
                .unwrap()
                .next()
                .unwrap_or_else(|| Err(RemoteError::new("called too many times")));
            std::future::ready(next)
        };
        (calls, operation)
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let cache = CountingCache::default();
        let (calls, operation) = scripted(vec![Ok(7)]);

        let value = with_auto_recovery(
            &cache,
            "load",
            operation,
            &IdentifierMismatchClassifier::default(),
        )
        .await;

        assert_eq!(assert_ok!(value), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.flushes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recovers_after_consistency_error() {
        let cache = CountingCache::default();
        let (calls, operation) = scripted(vec![Err(fk_violation()), Ok(9)]);

        let value = with_auto_recovery(
            &cache,
            "save bloc",
            operation,
            &IdentifierMismatchClassifier::default(),
        )
        .await;

        assert_eq!(assert_ok!(value), 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.flushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_exactly_once() {
        let cache = CountingCache::default();
        let (calls, operation) = scripted(vec![
            Err(fk_violation()),
            Err(RemoteError::with_code("PGRST116", "no rows returned")),
            Ok(1),
        ]);

        let err = assert_err!(
            with_auto_recovery(
                &cache,
                "save bloc",
                operation,
                &IdentifierMismatchClassifier::default(),
            )
            .await
        );

        match err {
            RecoveryError::Exhausted {
                original, retry, ..
            } => {
                assert_eq!(original.code.as_deref(), Some("23503"));
                assert_eq!(retry.code.as_deref(), Some("PGRST116"));
            }
            other => panic!("expected exhausted recovery, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.flushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_failure_of_any_kind_is_exhausted() {
        let cache = CountingCache::default();
        let (calls, operation) = scripted(vec![
            Err(fk_violation()),
            Err(RemoteError::new("network unreachable")),
        ]);

        let err = with_auto_recovery(
            &cache,
            "save bloc",
            operation,
            &IdentifierMismatchClassifier::default(),
        )
        .await
        .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(err.last_error().message, "network unreachable");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_passthrough() {
        let cache = CountingCache::default();
        let (calls, operation) = scripted(vec![Err(RemoteError::new("permission denied")), Ok(1)]);

        let err = with_auto_recovery(
            &cache,
            "delete bloc",
            operation,
            &IdentifierMismatchClassifier::default(),
        )
        .await
        .unwrap_err();

        assert!(!err.is_exhausted());
        assert_eq!(err.into_last_error().message, "permission denied");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.flushes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_classifier_controls_retry() {
        let cache = CountingCache::default();
        let (calls, operation) = scripted(vec![Err(RemoteError::new("stale")), Ok(3)]);
        let everything_is_stale = |_: &RemoteError| ErrorClass::Consistency;

        let value = with_auto_recovery(&cache, "load", operation, &everything_is_stale).await;

        assert_eq!(value.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auto_recovery_clears_real_store() {
        let store = Arc::new(CacheStore::in_memory());
        store
            .put("varieties", &vec!["R570"], Duration::from_secs(60))
            .unwrap();
        let recovery = AutoRecovery::new(Arc::clone(&store));
        let (_, operation) = scripted(vec![Err(fk_violation()), Ok(5)]);

        let value = recovery.run("save crop cycle", operation).await.unwrap();

        assert_eq!(value, 5);
        assert!(store.get::<Vec<String>>("varieties").is_none());
        assert_eq!(store.stats().flushes, 1);
    }
}
