//! Keyed cache for server resources with request coalescing and
//! explicit invalidation.
//!
//! One [`ResourceCell`] holds every cached entry for a single resource
//! family (tender list pages, tender details, ...), keyed by that
//! resource's parameters. Staleness is explicit and deterministic:
//! an entry refreshes only when it is first requested, when a poll
//! refreshes it, or after an `invalidate` call — there is no TTL
//! eviction. Distinct parameter combinations are distinct keys and
//! never evict each other.
//!
//! Failed fetches are cached in the same uniform shape as successes so
//! the UI can render the error, but they are stored pre-staled: the
//! next request retries instead of replaying the failure.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::domain::error::{ApiError, ApiResult};

/// What a cache read resolves to: shared data or a cloneable error.
pub type CachedResult<T> = Result<Arc<T>, ApiError>;

struct ReadyEntry<T> {
    result: CachedResult<T>,
    stale: bool,
}

enum Slot<T> {
    Ready(ReadyEntry<T>),
    /// A fetch is in flight; followers wait on the channel.
    InFlight(watch::Receiver<Option<CachedResult<T>>>),
}

/// Cache for one resource family, keyed by its parameters.
pub struct ResourceCell<K, T> {
    name: &'static str,
    entries: Mutex<HashMap<K, Slot<T>>>,
    /// Bumped on every invalidation so an in-flight fetch that raced a
    /// mutation lands already stale instead of masking the new state.
    epoch: AtomicU64,
}

impl<K, T> ResourceCell<K, T>
where
    K: Eq + Hash + Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Read the entry for `key`, fetching if it is absent or stale.
    ///
    /// Concurrent callers for the same key coalesce into one in-flight
    /// request: the first becomes the leader and runs `fetch`, the rest
    /// wait for its result. If a leader is cancelled mid-fetch, a
    /// waiting follower takes over with its own `fetch`.
    pub async fn get_with<F, Fut>(&self, key: K, fetch: F) -> CachedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut fetch = Some(fetch);

        loop {
            enum Role<T> {
                Hit(CachedResult<T>),
                Follower(watch::Receiver<Option<CachedResult<T>>>),
                Leader(watch::Sender<Option<CachedResult<T>>>),
            }

            let role = {
                let mut entries = self.entries.lock().await;
                match entries.get(&key) {
                    Some(Slot::Ready(entry)) if !entry.stale => {
                        debug!(resource = self.name, "cache hit");
                        Role::Hit(entry.result.clone())
                    }
                    Some(Slot::InFlight(rx)) => Role::Follower(rx.clone()),
                    _ => {
                        let (tx, rx) = watch::channel(None);
                        entries.insert(key.clone(), Slot::InFlight(rx));
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Hit(result) => return result,
                Role::Follower(mut rx) => {
                    debug!(resource = self.name, "joining in-flight request");
                    loop {
                        {
                            let current = rx.borrow_and_update();
                            if let Some(result) = current.as_ref() {
                                return result.clone();
                            }
                        }
                        if rx.changed().await.is_err() {
                            // Leader abandoned without publishing. Clear
                            // the dead slot and go around again; this
                            // caller may become the new leader.
                            let mut entries = self.entries.lock().await;
                            if matches!(entries.get(&key), Some(Slot::InFlight(_))) {
                                entries.remove(&key);
                            }
                            break;
                        }
                    }
                }
                Role::Leader(tx) => {
                    let Some(fetch) = fetch.take() else {
                        // A follower that already spent its fetch closure
                        // cannot lead twice; report the abandonment.
                        return Err(ApiError::Transport(
                            "in-flight request abandoned".to_string(),
                        ));
                    };
                    debug!(resource = self.name, "cache miss, fetching");
                    let epoch_at_start = self.epoch.load(Ordering::Acquire);
                    let result = fetch().await.map(Arc::new);

                    let invalidated_mid_flight =
                        self.epoch.load(Ordering::Acquire) != epoch_at_start;
                    {
                        let mut entries = self.entries.lock().await;
                        entries.insert(
                            key,
                            Slot::Ready(ReadyEntry {
                                result: result.clone(),
                                stale: result.is_err() || invalidated_mid_flight,
                            }),
                        );
                    }
                    let _ = tx.send(Some(result.clone()));
                    return result;
                }
            }
        }
    }

    /// Mark `key` stale then fetch it again. Used by the pollers for
    /// cadence-driven refresh; joins any request already in flight.
    pub async fn refresh_with<F, Fut>(&self, key: K, fetch: F) -> CachedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        self.invalidate(&key).await;
        self.get_with(key, fetch).await
    }

    /// Mark one entry stale. The entry stays readable via [`peek`]
    /// until the next request replaces it.
    ///
    /// [`peek`]: ResourceCell::peek
    pub async fn invalidate(&self, key: &K) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let mut entries = self.entries.lock().await;
        if let Some(Slot::Ready(entry)) = entries.get_mut(key) {
            debug!(resource = self.name, "invalidated");
            entry.stale = true;
        }
    }

    /// Mark every entry of this resource stale (e.g. all cached list
    /// pages after a mutation that may have changed any of them).
    pub async fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let mut entries = self.entries.lock().await;
        let mut count = 0usize;
        for slot in entries.values_mut() {
            if let Slot::Ready(entry) = slot {
                entry.stale = true;
                count += 1;
            }
        }
        debug!(resource = self.name, count, "invalidated all entries");
    }

    /// Read the cached entry without triggering a fetch.
    pub async fn peek(&self, key: &K) -> Option<CachedResult<T>> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(Slot::Ready(entry)) => Some(entry.result.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use tokio::sync::Notify;

    fn cell() -> ResourceCell<u32, String> {
        ResourceCell::new("test")
    }

    #[tokio::test]
    async fn second_get_is_a_hit() {
        let cell = cell();
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let value = cell
                .get_with(1, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("data".to_string())
                })
                .await
                .unwrap();
            assert_eq!(*value, "data");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_fetch_separately() {
        let cell = cell();
        let calls = Arc::new(AtomicU32::new(0));

        for key in [1, 2, 1, 2] {
            let calls = Arc::clone(&calls);
            cell.get_with(key, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(format!("page {key}"))
            })
            .await
            .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_gets_coalesce() {
        let cell = Arc::new(ResourceCell::<u32, String>::new("test"));
        let calls = Arc::new(AtomicU32::new(0));
        let gate = Arc::new(Notify::new());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cell = Arc::clone(&cell);
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                cell.get_with(7, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    Ok("shared".to_string())
                })
                .await
            }));
        }

        // Let every task reach the cell before releasing the fetch.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        gate.notify_waiters();

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(*result, "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cell = cell();
        let calls = AtomicU32::new(0);

        let fetch = || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("v{n}"))
        };

        assert_eq!(*cell.get_with(1, fetch).await.unwrap(), "v0");
        cell.invalidate(&1).await;
        // still readable while stale
        assert_eq!(*cell.peek(&1).await.unwrap().unwrap(), "v0");
        assert_eq!(*cell.get_with(1, fetch).await.unwrap(), "v1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_all_marks_every_key() {
        let cell = cell();
        let calls = AtomicU32::new(0);
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("x".to_string())
        };

        cell.get_with(1, fetch).await.unwrap();
        cell.get_with(2, fetch).await.unwrap();
        cell.invalidate_all().await;
        cell.get_with(1, fetch).await.unwrap();
        cell.get_with(2, fetch).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn errors_are_cached_but_not_sticky() {
        let cell = cell();
        let calls = AtomicU32::new(0);

        let err = cell
            .get_with(1, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(ApiError::Timeout)
            })
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Timeout);

        // the failure is readable in the uniform shape
        assert!(cell.peek(&1).await.unwrap().is_err());

        // but the next request retries
        let value = cell
            .get_with(1, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("recovered".to_string())
            })
            .await
            .unwrap();
        assert_eq!(*value, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_during_flight_stales_the_result() {
        let cell = Arc::new(ResourceCell::<u32, String>::new("test"));
        let gate = Arc::new(Notify::new());

        let leader = {
            let cell = Arc::clone(&cell);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                cell.get_with(1, move || async move {
                    gate.notified().await;
                    Ok("pre-mutation".to_string())
                })
                .await
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        cell.invalidate(&1).await;
        gate.notify_waiters();
        leader.await.unwrap().unwrap();

        // the raced result must not be served as current
        let calls = AtomicU32::new(0);
        let value = cell
            .get_with(1, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("post-mutation".to_string())
            })
            .await
            .unwrap();
        assert_eq!(*value, "post-mutation");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn abandoned_leader_lets_follower_take_over() {
        let cell = Arc::new(ResourceCell::<u32, String>::new("test"));
        let gate = Arc::new(Notify::new());

        let leader = {
            let cell = Arc::clone(&cell);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                cell.get_with(1, move || async move {
                    gate.notified().await;
                    Ok("never".to_string())
                })
                .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let follower = {
            let cell = Arc::clone(&cell);
            tokio::spawn(async move {
                cell.get_with(1, || async { Ok("takeover".to_string()) })
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        leader.abort();
        let result = follower.await.unwrap().unwrap();
        assert_eq!(*result, "takeover");
    }
}
