mod entry;
mod key;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use entry::{CacheEntry, CacheError, FetchError};
pub use key::QueryKey;

type LoadFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>;

/// Type-erased fetcher registered for a key. Values travel through the cache
/// as JSON and are decoded at the read boundary.
#[derive(Clone)]
pub struct Fetcher(Arc<dyn Fn() -> LoadFuture + Send + Sync>);

impl Fetcher {
    pub fn new<T, F, Fut>(load: F) -> Self
    where
        T: Serialize + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self(Arc::new(move || -> LoadFuture {
            let pending = load();
            Box::pin(async move {
                let loaded = pending.await?;
                serde_json::to_value(loaded).context("failed to encode fetched value")
            })
        }))
    }

    fn load(&self) -> LoadFuture {
        (self.0)()
    }
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fetcher")
    }
}

struct Slot {
    /// Distinguishes this slot from one re-created under the same key after
    /// a `clear`.
    generation: u64,
    value: Option<Value>,
    updated_at: Option<Instant>,
    error: Option<FetchError>,
    stale: bool,
    loading: bool,
    invalidated_in_flight: bool,
    fetch_id: u64,
    observers: usize,
    fetcher: Option<Fetcher>,
    settled: watch::Sender<u64>,
}

impl Slot {
    fn new(generation: u64) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            generation,
            value: None,
            updated_at: None,
            error: None,
            stale: false,
            loading: false,
            invalidated_in_flight: false,
            fetch_id: 0,
            observers: 0,
            fetcher: None,
            settled,
        }
    }

    fn expired(&self, stale_after: Option<Duration>) -> bool {
        match (stale_after, self.updated_at) {
            (Some(window), Some(at)) => at.elapsed() >= window,
            _ => false,
        }
    }

    fn is_fresh(&self, stale_after: Option<Duration>) -> bool {
        self.value.is_some() && self.error.is_none() && !self.stale && !self.expired(stale_after)
    }

    /// Plain reads never retry a failed fetch; only invalidation does.
    fn needs_fetch_on_read(&self, stale_after: Option<Duration>) -> bool {
        !self.loading
            && (self.stale
                || (self.error.is_none() && (self.value.is_none() || self.expired(stale_after))))
    }

    /// Mounting an observer retries failures as well.
    fn needs_fetch_on_mount(&self, stale_after: Option<Duration>) -> bool {
        !self.loading && !self.is_fresh(stale_after)
    }

    fn snapshot<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<CacheEntry<T>, CacheError> {
        let value = match &self.value {
            Some(raw) => Some(decode(key, raw)?),
            None => None,
        };

        Ok(CacheEntry {
            value,
            is_loading: self.loading,
            is_stale: self.stale,
            error: self.error.clone(),
            updated_at: self.updated_at,
        })
    }
}

struct Inner {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    next_fetch_id: AtomicU64,
    next_generation: AtomicU64,
    stale_after: Option<Duration>,
}

/// Process-wide keyed store of fetched entities.
///
/// At most one fetch per key is in flight; concurrent readers attach to it.
/// Fetches run on spawned tasks, so a reader that goes away mid-flight never
/// leaves its entry stuck in the loading state. Must be used from within a
/// tokio runtime.
#[derive(Clone)]
pub struct EntityCache {
    inner: Arc<Inner>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Treat values older than `window` as stale on the next read.
    pub fn with_stale_after(window: Duration) -> Self {
        Self::build(Some(window).filter(|window| !window.is_zero()))
    }

    fn build(stale_after: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(1),
                next_generation: AtomicU64::new(1),
                stale_after,
            }),
        }
    }

    /// Current state of `key` without triggering anything.
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<CacheEntry<T>, CacheError> {
        match self.slots().get(key) {
            Some(slot) => slot.snapshot(key),
            None => Ok(CacheEntry::empty()),
        }
    }

    /// Current state of `key`, kicking off a background fetch when the entry
    /// is absent or stale and nothing is in flight yet.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        fetcher: Fetcher,
    ) -> Result<CacheEntry<T>, CacheError> {
        let stale_after = self.inner.stale_after;
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(|| self.new_slot());
        slot.fetcher.get_or_insert(fetcher);

        if slot.needs_fetch_on_read(stale_after) {
            self.start_fetch(key, slot);
        } else if slot.loading {
            debug!(cache_key = %key, "read attached to in-flight fetch");
        }

        slot.snapshot(key)
    }

    /// Resolve `key` to a settled value, fetching when it is not fresh and
    /// attaching to the in-flight fetch when one exists.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        fetcher: Fetcher,
    ) -> Result<T, CacheError> {
        let stale_after = self.inner.stale_after;
        let mut settled = {
            let mut slots = self.slots();
            let slot = slots.entry(key.clone()).or_insert_with(|| self.new_slot());
            slot.fetcher.get_or_insert(fetcher);

            if slot.is_fresh(stale_after) && !slot.loading {
                if let Some(raw) = &slot.value {
                    return decode(key, raw);
                }
            }
            // A recorded failure is only retried by mount, invalidate or refetch.
            if !slot.needs_fetch_on_read(stale_after) && !slot.loading {
                if let Some(error) = &slot.error {
                    return Err(CacheError::Fetch(error.clone()));
                }
            }

            if slot.loading {
                debug!(cache_key = %key, "fetch attached to in-flight request");
            } else {
                self.start_fetch(key, slot);
            }

            slot.settled.subscribe()
        };

        self.wait_settled(key, &mut settled).await
    }

    /// Register an active observer. Mounting fetches when the entry is not
    /// fresh, including after a failure; invalidation refetches immediately
    /// while at least one observer is alive.
    pub fn subscribe(&self, key: &QueryKey, fetcher: Fetcher) -> Subscription {
        let stale_after = self.inner.stale_after;
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(|| self.new_slot());
        slot.observers += 1;
        slot.fetcher = Some(fetcher);

        if slot.needs_fetch_on_mount(stale_after) {
            self.start_fetch(key, slot);
        }

        Subscription {
            cache: self.clone(),
            key: key.clone(),
            generation: slot.generation,
            settled: slot.settled.subscribe(),
        }
    }

    /// Mark `key` stale. Observed entries refetch right away; unobserved
    /// ones fetch on their next read.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(key) else {
            debug!(cache_key = %key, "invalidate on absent entry");
            return;
        };

        if slot.loading {
            slot.invalidated_in_flight = true;
            debug!(cache_key = %key, "invalidated while fetch in flight");
            return;
        }

        slot.stale = true;
        if slot.observers > 0 {
            self.start_fetch(key, slot);
        }
        debug!(cache_key = %key, observers = slot.observers, "cache entry invalidated");
    }

    /// Manual retry. Returns false when a fetch is already in flight or no
    /// fetcher was ever registered for `key`.
    pub fn refetch(&self, key: &QueryKey) -> bool {
        let mut slots = self.slots();
        match slots.get_mut(key) {
            Some(slot) if !slot.loading => self.start_fetch(key, slot),
            _ => false,
        }
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.slots().get(key).is_some_and(|slot| slot.loading)
    }

    /// Drop every entry. Fetches still in flight settle into nothing.
    pub fn clear(&self) {
        let mut slots = self.slots();
        let dropped = slots.len();
        slots.clear();
        info!(dropped, "entity cache cleared");
    }

    /// Wait for the fetch `settled` was subscribed to, following any refetch
    /// chained after it.
    async fn wait_settled<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        settled: &mut watch::Receiver<u64>,
    ) -> Result<T, CacheError> {
        let evicted = || CacheError::Evicted {
            key: key.to_string(),
        };

        loop {
            settled.changed().await.map_err(|_| evicted())?;

            // The slot lock must be released before the next await.
            let outcome = {
                let mut slots = self.slots();
                let slot = slots.get_mut(key).ok_or_else(evicted)?;
                if slot.loading {
                    None
                } else if slot.stale {
                    if !self.start_fetch(key, slot) {
                        return Err(CacheError::NoFetcher {
                            key: key.to_string(),
                        });
                    }
                    None
                } else {
                    Some(match (&slot.error, &slot.value) {
                        (Some(error), _) => Err(CacheError::Fetch(error.clone())),
                        (None, Some(raw)) => decode(key, raw),
                        (None, None) => Err(evicted()),
                    })
                }
            };

            if let Some(outcome) = outcome {
                return outcome;
            }
        }
    }

    fn start_fetch(&self, key: &QueryKey, slot: &mut Slot) -> bool {
        let Some(fetcher) = slot.fetcher.clone() else {
            return false;
        };

        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        slot.loading = true;
        slot.fetch_id = fetch_id;
        debug!(cache_key = %key, fetch_id, "cache fetch started");

        let cache = self.clone();
        let key = key.clone();
        tokio::spawn(async move {
            let outcome = match tokio::spawn(fetcher.load()).await {
                Ok(outcome) => outcome,
                Err(e) => Err(anyhow::anyhow!("fetch task for `{key}` aborted: {e}")),
            };
            cache.settle(&key, fetch_id, outcome);
        });

        true
    }

    fn settle(&self, key: &QueryKey, fetch_id: u64, outcome: anyhow::Result<Value>) {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(key) else {
            debug!(cache_key = %key, fetch_id, "discarding result for evicted entry");
            return;
        };
        if !slot.loading || slot.fetch_id != fetch_id {
            debug!(cache_key = %key, fetch_id, "discarding superseded fetch result");
            return;
        }

        slot.loading = false;
        slot.stale = false;
        match outcome {
            Ok(value) => {
                slot.value = Some(value);
                slot.updated_at = Some(Instant::now());
                slot.error = None;
                debug!(cache_key = %key, fetch_id, "cache fetch succeeded");
            }
            Err(e) => {
                warn!(
                    ?e,
                    cache_key = %key,
                    retained_value = slot.value.is_some(),
                    "cache fetch failed"
                );
                slot.error = Some(FetchError::new(e));
            }
        }

        if std::mem::take(&mut slot.invalidated_in_flight) {
            slot.stale = true;
            if slot.observers > 0 {
                self.start_fetch(key, slot);
            }
        }

        slot.settled.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    fn release(&self, key: &QueryKey, generation: u64) {
        match self.slots().get_mut(key) {
            Some(slot) if slot.generation == generation => {
                slot.observers = slot.observers.saturating_sub(1);
            }
            _ => debug!(cache_key = %key, "observer outlived its cache entry"),
        }
    }

    fn new_slot(&self) -> Slot {
        Slot::new(self.inner.next_generation.fetch_add(1, Ordering::Relaxed))
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("entries", &self.slots().len())
            .field("stale_after", &self.inner.stale_after)
            .finish()
    }
}

/// Active observer of one key. Dropping it unregisters the observer.
pub struct Subscription {
    cache: EntityCache,
    key: QueryKey,
    generation: u64,
    settled: watch::Receiver<u64>,
}

impl Subscription {
    pub fn current<T: DeserializeOwned>(&self) -> Result<CacheEntry<T>, CacheError> {
        self.cache.peek(&self.key)
    }

    /// Wait for the next fetch on this key to settle. Returns false once the
    /// entry has been evicted.
    pub async fn changed(&mut self) -> bool {
        self.settled.changed().await.is_ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.release(&self.key, self.generation);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

fn decode<T: DeserializeOwned>(key: &QueryKey, raw: &Value) -> Result<T, CacheError> {
    T::deserialize(raw).map_err(|source| CacheError::Decode {
        key: key.to_string(),
        source,
    })
}
