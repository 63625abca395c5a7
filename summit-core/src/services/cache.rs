//! Last-value cache shared by the list services.

use crate::http::ApiError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Outcome of a [`Cached::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A value was fetched and published.
    Fetched,
    /// A value was already cached and no reload was forced.
    Cached,
    /// Another load was in flight.
    InFlight,
}

/// A single cached value published on a watch channel, with at most one
/// load in flight.
pub struct Cached<T> {
    name: &'static str,
    tx: watch::Sender<Option<T>>,
    loading: AtomicBool,
}

/// Clears the in-flight flag even if the load future is dropped.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Clone> Cached<T> {
    pub fn new(name: &'static str) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            name,
            tx,
            loading: AtomicBool::new(false),
        }
    }

    /// Receiver that sees every published value.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }

    /// Snapshot of the cached value.
    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Publish a value directly.
    pub fn set(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Fetch and publish unless a value is cached (and `force` is false) or
    /// a load is already running. A failed fetch leaves the cache untouched.
    pub async fn load<F, Fut>(&self, force: bool, fetch: F) -> Result<LoadOutcome, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if !force && self.tx.borrow().is_some() {
            return Ok(LoadOutcome::Cached);
        }
        if self.loading.swap(true, Ordering::AcqRel) {
            debug!(cache = self.name, "Load already in flight");
            return Ok(LoadOutcome::InFlight);
        }
        let _guard = LoadingGuard(&self.loading);

        match fetch().await {
            Ok(value) => {
                self.tx.send_replace(Some(value));
                debug!(cache = self.name, "Cache updated");
                Ok(LoadOutcome::Fetched)
            }
            Err(e) => {
                warn!(cache = self.name, error = %e, "Failed to load");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_load_skips_when_cached() {
        let cache = Cached::<Vec<i32>>::new("test");
        let calls = AtomicUsize::new(0);

        let first = cache
            .load(false, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1])
            })
            .await
            .unwrap();
        let second = cache
            .load(false, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![2])
            })
            .await
            .unwrap();

        assert_eq!(first, LoadOutcome::Fetched);
        assert_eq!(second, LoadOutcome::Cached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(), Some(vec![1]));
    }

    #[tokio::test]
    async fn test_forced_load_replaces_value() {
        let cache = Cached::<Vec<i32>>::new("test");
        cache.set(vec![1]);

        let outcome = cache.load(true, || async { Ok(vec![9]) }).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Fetched);
        assert_eq!(cache.get(), Some(vec![9]));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_value() {
        let cache = Cached::<Vec<i32>>::new("test");
        cache.set(vec![1]);

        let err = cache
            .load(true, || async { Err(ApiError::NotAuthenticated) })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
        assert_eq!(cache.get(), Some(vec![1]));
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_concurrent_load_is_skipped() {
        let cache = Arc::new(Cached::<i32>::new("test"));
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let background = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .load(false, || async {
                        let _ = release_rx.await;
                        Ok(1)
                    })
                    .await
            })
        };

        while !cache.is_loading() {
            tokio::task::yield_now().await;
        }
        let outcome = cache.load(true, || async { Ok(2) }).await.unwrap();
        assert_eq!(outcome, LoadOutcome::InFlight);

        release_tx.send(()).unwrap();
        assert_eq!(background.await.unwrap().unwrap(), LoadOutcome::Fetched);
        assert_eq!(cache.get(), Some(1));
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let cache = Cached::<i32>::new("test");
        let mut rx = cache.subscribe();
        assert_eq!(*rx.borrow(), None);

        cache.set(5);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(5));
    }
}
