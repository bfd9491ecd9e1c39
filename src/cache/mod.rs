//! An in-memory cache of Finance Service query results.
//!
//! The cache guarantees that:
//! - at most one fetch per [QueryKey] is in flight at any time, and every
//!   caller asking for that key while it is in flight shares its result. A
//!   fetch started after an invalidation waits for the one it replaced,
//! - a successful mutation invalidates every entry of the resources it names
//!   before it returns, so the next query for them fetches again,
//! - a failed mutation leaves the cache as it was,
//! - a response that arrives after its entry was invalidated (or removed) is
//!   handed to the callers that were waiting for it but never stored, so it
//!   cannot overwrite newer data.
//!
//! Queries only run for an authenticated [Session]. Otherwise they stay
//! [QueryState::Idle] and nothing is fetched.

mod key;
mod state;

use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::{Duration, Instant},
};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use time::OffsetDateTime;

use crate::{Error, Session};

pub use key::{QueryKey, Resource};
pub use state::{QueryState, QueryStatus};

type Payload = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<Payload, Error>>>;

/// How long query results stay fresh and how long unused entries are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// A successful result younger than this is served without fetching again.
    pub stale_time: Duration,
    /// An entry with no subscribers for this long is removed by
    /// [QueryCache::collect_garbage].
    pub gc_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            gc_time: Duration::from_secs(5 * 60),
        }
    }
}

/// The query cache. Cloning gives another handle to the same cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
    config: CacheConfig,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<QueryKey, Entry>,
    /// Fetches that were in flight when their entry was invalidated or
    /// removed, with the generation they started with. The next fetch for
    /// the key waits for them.
    detached: HashMap<QueryKey, (u64, SharedFetch)>,
    /// Shared by all entries so a generation is never reused, even after an
    /// entry is removed and created again.
    last_generation: u64,
}

impl CacheInner {
    fn entry(&mut self, key: &QueryKey) -> &mut Entry {
        let last_generation = &mut self.last_generation;

        self.entries.entry(key.clone()).or_insert_with(|| {
            *last_generation += 1;
            Entry::new(*last_generation)
        })
    }
}

enum Outcome {
    Pending,
    Success {
        payload: Payload,
        fetched_at: OffsetDateTime,
        settled_at: Instant,
    },
    Failure(Error),
}

struct Entry {
    outcome: Outcome,
    generation: u64,
    invalidated: bool,
    in_flight: Option<SharedFetch>,
    subscribers: usize,
    unsubscribed_at: Option<Instant>,
}

impl Entry {
    fn new(generation: u64) -> Self {
        Self {
            outcome: Outcome::Pending,
            generation,
            invalidated: false,
            in_flight: None,
            subscribers: 0,
            unsubscribed_at: Some(Instant::now()),
        }
    }

    fn fresh_payload(&self, stale_time: Duration) -> Option<Payload> {
        match &self.outcome {
            Outcome::Success {
                payload,
                settled_at,
                ..
            } if !self.invalidated && settled_at.elapsed() < stale_time => Some(payload.clone()),
            _ => None,
        }
    }

    fn settle(&mut self, result: &Result<Payload, Error>) {
        self.in_flight = None;
        self.invalidated = false;
        self.outcome = match result {
            Ok(payload) => Outcome::Success {
                payload: payload.clone(),
                fetched_at: OffsetDateTime::now_utc(),
                settled_at: Instant::now(),
            },
            Err(error) => Outcome::Failure(error.clone()),
        };
    }

    fn state<T: Clone + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        match &self.outcome {
            Outcome::Pending if self.in_flight.is_some() => QueryState::Loading,
            Outcome::Pending => QueryState::Idle,
            Outcome::Success { payload, .. } => downcast(key, payload),
            Outcome::Failure(error) => QueryState::Error(error.clone()),
        }
    }

    fn is_collectable(&self, gc_time: Duration) -> bool {
        self.subscribers == 0
            && self.in_flight.is_none()
            && self
                .unsubscribed_at
                .is_some_and(|unsubscribed_at| unsubscribed_at.elapsed() >= gc_time)
    }
}

impl QueryCache {
    /// Create an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            config,
        }
    }

    /// The timings the cache was created with.
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Run the query for `key`, or reuse its cached or in-flight result.
    ///
    /// `fetcher` is only called if there is no fresh result and no fetch in
    /// flight. It is called while the cache is locked, so it must only build
    /// the future and not touch the cache itself.
    ///
    /// Returns [QueryState::Idle] without fetching if `session` is not
    /// authenticated. Otherwise returns [QueryState::Success] or [QueryState::Error].
    /// Errors are returned as they are, including [Error::Unauthorized].
    pub async fn query<T, F, Fut>(&self, session: &Session, key: QueryKey, fetcher: F) -> QueryState<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        if !session.is_authenticated() {
            tracing::debug!("skipping query {key}: not logged in");
            return QueryState::Idle;
        }

        let fetch = {
            let mut inner = self.lock();
            let entry = inner.entry(&key);

            if let Some(payload) = entry.fresh_payload(self.config.stale_time) {
                tracing::debug!("cache hit for {key}");
                return downcast(&key, &payload);
            }

            match entry.in_flight.clone() {
                Some(fetch) => {
                    tracing::debug!("joining in-flight fetch for {key}");
                    fetch
                }
                None => {
                    let generation = entry.generation;
                    let previous = inner.detached.remove(&key).map(|(_, fetch)| fetch);
                    let fetch = self.start_fetch(key.clone(), generation, previous, fetcher());
                    inner.entry(&key).in_flight = Some(fetch.clone());
                    fetch
                }
            }
        };

        match fetch.await {
            Ok(payload) => downcast(&key, &payload),
            Err(error) => QueryState::Error(error),
        }
    }

    /// Build the shared fetch for `key`. If `previous` is given, the request
    /// is only sent once it has finished.
    fn start_fetch<T, Fut>(
        &self,
        key: QueryKey,
        generation: u64,
        previous: Option<SharedFetch>,
        future: Fut,
    ) -> SharedFetch
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        tracing::debug!("fetching {key}");
        let cache = Arc::downgrade(&self.inner);

        async move {
            if let Some(previous) = previous {
                tracing::debug!("waiting for the invalidated fetch of {key} to finish");
                let _ = previous.await;
            }

            let result = future.await.map(|data| Arc::new(data) as Payload);
            record_result(&cache, &key, generation, &result);
            result
        }
        .boxed()
        .shared()
    }

    /// The current state of `key` without fetching.
    ///
    /// While a refetch is in flight the previous outcome is reported;
    /// [QueryState::Loading] is only reported before the first result arrives.
    pub fn snapshot<T: Clone + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        self.lock()
            .entries
            .get(key)
            .map_or(QueryState::Idle, |entry| entry.state(key))
    }

    /// When the data for `key` was last fetched successfully.
    pub fn fetched_at(&self, key: &QueryKey) -> Option<OffsetDateTime> {
        match self.lock().entries.get(key).map(|entry| &entry.outcome) {
            Some(Outcome::Success { fetched_at, .. }) => Some(*fetched_at),
            _ => None,
        }
    }

    /// Whether the next query for `key` would be served from the cache.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.fresh_payload(self.config.stale_time).is_some())
    }

    /// Run `mutation`. If it succeeds, invalidate every entry for `invalidates`
    /// before returning. If it fails, leave the cache untouched and return the error.
    ///
    /// Mutations are never retried.
    pub async fn mutate<T, Fut>(&self, invalidates: &[Resource], mutation: Fut) -> Result<T, Error>
    where
        Fut: Future<Output = Result<T, Error>>,
    {
        let result = mutation.await;

        match &result {
            Ok(_) => self.invalidate(invalidates),
            Err(error) => tracing::debug!("mutation failed, cache left unchanged: {error}"),
        }

        result
    }

    /// Mark every entry for `resources` as stale and detach its in-flight fetch.
    ///
    /// A detached fetch still finishes for its callers but is not stored, and
    /// the next fetch for its key is not sent until it has finished.
    pub fn invalidate(&self, resources: &[Resource]) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        for (key, entry) in inner.entries.iter_mut() {
            if !resources.contains(&key.resource()) {
                continue;
            }

            if let Some(fetch) = entry.in_flight.take() {
                inner.detached.insert(key.clone(), (entry.generation, fetch));
            }

            inner.last_generation += 1;
            entry.generation = inner.last_generation;
            entry.invalidated = true;
            tracing::debug!("invalidated {key}");
        }
    }

    /// Remove every entry, e.g. when the user logs out.
    ///
    /// Fetches still in flight are detached as in [QueryCache::invalidate].
    pub fn clear(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        tracing::debug!("clearing {} cached queries", inner.entries.len());

        for (key, entry) in inner.entries.drain() {
            if let Some(fetch) = entry.in_flight {
                inner.detached.insert(key, (entry.generation, fetch));
            }
        }
    }

    /// Register interest in `key`. The entry is kept until the returned
    /// [Subscription] is dropped and [CacheConfig::gc_time] has passed.
    pub fn subscribe(&self, key: QueryKey) -> Subscription {
        let mut inner = self.lock();
        let entry = inner.entry(&key);
        entry.subscribers += 1;
        entry.unsubscribed_at = None;

        Subscription {
            cache: Arc::downgrade(&self.inner),
            key,
        }
    }

    /// Remove entries nobody has subscribed to for at least [CacheConfig::gc_time].
    ///
    /// Returns the number of entries removed.
    pub fn collect_garbage(&self) -> usize {
        let gc_time = self.config.gc_time;
        let mut inner = self.lock();
        let before = inner.entries.len();

        inner
            .entries
            .retain(|_, entry| !entry.is_collectable(gc_time));

        let removed = before - inner.entries.len();
        if removed > 0 {
            tracing::debug!("garbage collected {removed} cached queries");
        }

        removed
    }

    /// The number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Store the result of a fetch, unless its entry was invalidated or removed
/// since the fetch started.
fn record_result(
    cache: &Weak<Mutex<CacheInner>>,
    key: &QueryKey,
    generation: u64,
    result: &Result<Payload, Error>,
) {
    let Some(cache) = cache.upgrade() else {
        return;
    };
    let mut inner = cache.lock().unwrap_or_else(PoisonError::into_inner);

    if inner
        .detached
        .get(key)
        .is_some_and(|(detached_generation, _)| *detached_generation == generation)
    {
        inner.detached.remove(key);
    }

    match inner.entries.get_mut(key) {
        Some(entry) if entry.generation == generation => entry.settle(result),
        _ => tracing::debug!("discarding stale response for {key}"),
    }
}

fn downcast<T: Clone + 'static>(key: &QueryKey, payload: &Payload) -> QueryState<T> {
    match payload.downcast_ref::<T>() {
        Some(data) => QueryState::Success(data.clone()),
        None => QueryState::Error(Error::PayloadTypeMismatch(key.to_string())),
    }
}

/// Keeps a cache entry alive. Dropping the last subscription for a key makes
/// the entry eligible for garbage collection.
#[derive(Debug)]
pub struct Subscription {
    cache: Weak<Mutex<CacheInner>>,
    key: QueryKey,
}

impl Subscription {
    /// The key this subscription keeps alive.
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(cache) = self.cache.upgrade() else {
            return;
        };
        let mut inner = cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = inner.entries.get_mut(&self.key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);

            if entry.subscribers == 0 {
                entry.unsubscribed_at = Some(Instant::now());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use tokio::sync::oneshot;

    use crate::{
        CacheConfig, Error, QueryCache, QueryKey, QueryState, QueryStatus, Resource, Session,
        test_utils::test_credentials,
    };

    fn logged_in() -> Session {
        Session::with_credentials(test_credentials("token"))
    }

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<String, Error>> + Send + use<> {
        let calls = calls.clone();
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(value.to_owned())
            })
        }
    }

    #[tokio::test]
    async fn concurrent_queries_share_one_fetch() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(Resource::Transactions);

        let (first, second) = tokio::join!(
            cache.query(&session, key.clone(), counting_fetch(&calls, "data")),
            cache.query(&session, key.clone(), counting_fetch(&calls, "data")),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, QueryState::Success("data".to_owned()));
        assert_eq!(second, QueryState::Success("data".to_owned()));
    }

    #[tokio::test]
    async fn different_keys_fetch_independently() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let calls = Arc::new(AtomicUsize::new(0));

        let (budgets, analysis) = tokio::join!(
            cache.query(&session, QueryKey::new(Resource::Budgets), counting_fetch(&calls, "b")),
            cache.query(&session, QueryKey::new(Resource::Analysis), counting_fetch(&calls, "a")),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(budgets, QueryState::Success("b".to_owned()));
        assert_eq!(analysis, QueryState::Success("a".to_owned()));
    }

    #[tokio::test]
    async fn fresh_result_is_served_from_cache() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(Resource::Budgets);

        cache.query(&session, key.clone(), counting_fetch(&calls, "b")).await;
        let second = cache.query(&session, key.clone(), counting_fetch(&calls, "b")).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(second, QueryState::Success("b".to_owned()));
        assert!(cache.is_fresh(&key));
        assert!(cache.fetched_at(&key).is_some());
    }

    #[tokio::test]
    async fn zero_stale_time_refetches_every_query() {
        let cache = QueryCache::new(CacheConfig {
            stale_time: Duration::ZERO,
            ..CacheConfig::default()
        });
        let session = logged_in();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(Resource::Budgets);

        cache.query(&session, key.clone(), counting_fetch(&calls, "b")).await;
        cache.query(&session, key.clone(), counting_fetch(&calls, "b")).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn queries_are_idle_without_a_session() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(Resource::Transactions);

        let state = cache
            .query(&Session::anonymous(), key.clone(), counting_fetch(&calls, "data"))
            .await;

        assert_eq!(state, QueryState::Idle);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.snapshot::<String>(&key), QueryState::Idle);
    }

    #[tokio::test]
    async fn successful_mutation_invalidates_matching_resources() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let calls = Arc::new(AtomicUsize::new(0));
        let transactions = QueryKey::new(Resource::Transactions);
        let budgets = QueryKey::new(Resource::Budgets);

        cache.query(&session, transactions.clone(), counting_fetch(&calls, "t")).await;
        cache.query(&session, budgets.clone(), counting_fetch(&calls, "b")).await;

        let created = cache
            .mutate(&[Resource::Transactions], async { Ok::<_, Error>(42) })
            .await;

        assert_eq!(created, Ok(42));
        assert!(!cache.is_fresh(&transactions));
        assert!(cache.is_fresh(&budgets));

        cache.query(&session, transactions.clone(), counting_fetch(&calls, "t2")).await;
        cache.query(&session, budgets.clone(), counting_fetch(&calls, "b2")).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.snapshot::<String>(&transactions), QueryState::Success("t2".to_owned()));
        assert_eq!(cache.snapshot::<String>(&budgets), QueryState::Success("b".to_owned()));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_unchanged() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(Resource::Transactions);

        cache.query(&session, key.clone(), counting_fetch(&calls, "t")).await;

        let result = cache
            .mutate(&[Resource::Transactions], async {
                Err::<(), _>(Error::Server {
                    status: 400,
                    message: "bad".to_owned(),
                })
            })
            .await;

        assert!(matches!(result, Err(Error::Server { status: 400, .. })));
        assert!(cache.is_fresh(&key));

        cache.query(&session, key.clone(), counting_fetch(&calls, "t")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_query_is_recorded_and_not_retried() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new(Resource::Analysis);

        let counter = calls.clone();
        let state = cache
            .query(&session, key.clone(), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(Error::Unauthorized)
            })
            .await;

        assert_eq!(state, QueryState::Error(Error::Unauthorized));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.snapshot::<String>(&key).status(), QueryStatus::Error);
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_data() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let key = QueryKey::new(Resource::Transactions);
        let (release, released) = oneshot::channel::<()>();

        let slow_query = tokio::spawn({
            let cache = cache.clone();
            let session = session.clone();
            let key = key.clone();
            async move {
                cache
                    .query(&session, key, move || async move {
                        let _ = released.await;
                        Ok::<_, Error>("old".to_owned())
                    })
                    .await
            }
        });

        while cache.snapshot::<String>(&key).status() != QueryStatus::Loading {
            tokio::task::yield_now().await;
        }

        cache.invalidate(&[Resource::Transactions]);
        release.send(()).unwrap();
        let old = slow_query.await.unwrap();

        // The caller that asked before the invalidation still gets its answer...
        assert_eq!(old, QueryState::Success("old".to_owned()));
        // ...but the cache does not keep it.
        assert_ne!(cache.snapshot::<String>(&key), QueryState::Success("old".to_owned()));

        let fresh = cache
            .query(&session, key.clone(), || async { Ok::<_, Error>("new".to_owned()) })
            .await;
        assert_eq!(fresh, QueryState::Success("new".to_owned()));
        assert_eq!(cache.snapshot::<String>(&key), QueryState::Success("new".to_owned()));
    }

    #[tokio::test]
    async fn refetch_after_invalidation_waits_for_detached_fetch() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let key = QueryKey::new(Resource::Transactions);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let held_fetch = |value: &'static str, released: oneshot::Receiver<()>| {
            let active = active.clone();
            let peak = peak.clone();
            move || async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                let _ = released.await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, Error>(value.to_owned())
            }
        };

        let (release_old, old_released) = oneshot::channel::<()>();
        let (release_new, new_released) = oneshot::channel::<()>();

        let old_query = tokio::spawn({
            let cache = cache.clone();
            let session = session.clone();
            let key = key.clone();
            let fetcher = held_fetch("old", old_released);
            async move { cache.query(&session, key, fetcher).await }
        });

        while cache.snapshot::<String>(&key).status() != QueryStatus::Loading {
            tokio::task::yield_now().await;
        }

        cache
            .mutate(&[Resource::Transactions], async { Ok::<_, Error>(()) })
            .await
            .unwrap();

        let new_query = tokio::spawn({
            let cache = cache.clone();
            let session = session.clone();
            let key = key.clone();
            let fetcher = held_fetch("new", new_released);
            async move { cache.query(&session, key, fetcher).await }
        });

        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        assert_eq!(active.load(Ordering::SeqCst), 1);

        release_old.send(()).unwrap();
        release_new.send(()).unwrap();

        assert_eq!(old_query.await.unwrap(), QueryState::Success("old".to_owned()));
        assert_eq!(new_query.await.unwrap(), QueryState::Success("new".to_owned()));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(cache.snapshot::<String>(&key), QueryState::Success("new".to_owned()));
    }

    #[tokio::test]
    async fn response_after_clear_is_discarded() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let key = QueryKey::new(Resource::Budgets);
        let (release, released) = oneshot::channel::<()>();

        let slow_query = tokio::spawn({
            let cache = cache.clone();
            let session = session.clone();
            let key = key.clone();
            async move {
                cache
                    .query(&session, key, move || async move {
                        let _ = released.await;
                        Ok::<_, Error>("previous user".to_owned())
                    })
                    .await
            }
        });

        while cache.snapshot::<String>(&key).status() != QueryStatus::Loading {
            tokio::task::yield_now().await;
        }

        cache.clear();
        // A new entry for the same key is created after the clear.
        let _subscription = cache.subscribe(key.clone());

        release.send(()).unwrap();
        slow_query.await.unwrap();

        assert_eq!(cache.snapshot::<String>(&key), QueryState::Idle);
    }

    #[tokio::test]
    async fn mismatched_payload_type_is_an_error() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();
        let key = QueryKey::new(Resource::Budgets);

        cache
            .query(&session, key.clone(), || async { Ok::<_, Error>(1_u32) })
            .await;
        let state: QueryState<String> = cache
            .query(&session, key.clone(), || async { Ok::<_, Error>("x".to_owned()) })
            .await;

        assert_eq!(state, QueryState::Error(Error::PayloadTypeMismatch("budgets".to_owned())));
    }

    #[tokio::test]
    async fn garbage_collection_keeps_subscribed_entries() {
        let cache = QueryCache::new(CacheConfig {
            gc_time: Duration::ZERO,
            ..CacheConfig::default()
        });
        let session = logged_in();
        let key = QueryKey::new(Resource::Budgets);

        let subscription = cache.subscribe(key.clone());
        cache
            .query(&session, key.clone(), || async { Ok::<_, Error>(1_u32) })
            .await;

        assert_eq!(cache.collect_garbage(), 0);
        assert_eq!(cache.len(), 1);

        drop(subscription);

        assert_eq!(cache.collect_garbage(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn entries_without_subscribers_survive_until_gc_time() {
        let cache = QueryCache::new(CacheConfig::default());
        let session = logged_in();

        cache
            .query(&session, QueryKey::new(Resource::Budgets), || async {
                Ok::<_, Error>(1_u32)
            })
            .await;

        assert_eq!(cache.collect_garbage(), 0);
        assert_eq!(cache.len(), 1);
    }
}
