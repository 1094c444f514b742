//! Cache-aside orchestration over the per-location row stores.
//!
//! Every provider integration funnels through the same protocol: select the
//! cached batch for a location, age the batch by its first row, evict it
//! wholesale once it crosses the staleness window, and on a miss fetch
//! upstream, persist the mapped rows, and serve them.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::application::mapping::MappingError;
use crate::application::providers::ProviderError;
use crate::application::repos::{RepoError, RowStore};
use crate::domain::entities::{MovieRecord, RestaurantRecord, WeatherRecord};

/// Cached batches older than this are evicted and refetched.
pub const STALE_AFTER_MINUTES: i64 = 30;

/// A record kind that participates in the cache-aside protocol. The set is
/// closed: one implementation per cached table.
pub trait Cacheable: Send + Sync + Sized {
    /// Table the rows of this kind are cached in.
    const TABLE: &'static str;

    fn location_id(&self) -> Uuid;

    fn created_at(&self) -> OffsetDateTime;
}

impl Cacheable for WeatherRecord {
    const TABLE: &'static str = "weathers";

    fn location_id(&self) -> Uuid {
        self.location_id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Cacheable for RestaurantRecord {
    const TABLE: &'static str = "restaurants";

    fn location_id(&self) -> Uuid {
        self.location_id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

impl Cacheable for MovieRecord {
    const TABLE: &'static str = "movies";

    fn location_id(&self) -> Uuid {
        self.location_id
    }

    fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

/// Outcome of a cache lookup, decided before any provider is contacted. A
/// stale batch has already been evicted by the time the caller sees `Miss`.
#[derive(Debug)]
pub enum CacheLookup<T> {
    Hit(Vec<T>),
    Miss,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

type FlightKey = (&'static str, Uuid);

/// The cache-aside controller. Shared across all cached tables; holds only
/// the in-flight gates that serialize concurrent misses for one key.
#[derive(Default)]
pub struct CacheController {
    in_flight: DashMap<FlightKey, Arc<Mutex<()>>>,
}

impl CacheController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the cached batch for a key and decide hit or miss.
    ///
    /// The first row's `created_at` stands for the whole batch: rows are
    /// inserted together and deleted together, so a batch past the staleness
    /// window is deleted here in bulk and reported as a plain `Miss`.
    pub async fn lookup<T, S>(
        &self,
        store: &S,
        location_id: Uuid,
    ) -> Result<CacheLookup<T>, CacheError>
    where
        T: Cacheable,
        S: RowStore<T> + ?Sized,
    {
        let rows = store.select_rows(location_id).await?;
        let Some(first) = rows.first() else {
            return Ok(CacheLookup::Miss);
        };

        let age_minutes = (OffsetDateTime::now_utc() - first.created_at()).whole_minutes();
        if age_minutes > STALE_AFTER_MINUTES {
            let evicted = store.delete_rows(location_id).await?;
            counter!("cityscout_cache_evict_stale_total", "table" => T::TABLE).increment(1);
            debug!(
                target = "cityscout::cache",
                table = T::TABLE,
                location_id = %location_id,
                age_minutes,
                evicted,
                "evicted stale batch"
            );
            return Ok(CacheLookup::Miss);
        }

        counter!("cityscout_cache_hit_total", "table" => T::TABLE).increment(1);
        Ok(CacheLookup::Hit(rows))
    }

    /// Serve the cached batch for a key, or run `fetch` (provider call plus
    /// mapping, supplied by the caller), persist every returned row, and
    /// serve the fresh batch.
    ///
    /// Concurrent misses for the same (table, key) are serialized through an
    /// in-flight gate; late arrivals re-run the lookup after the gate opens
    /// and are served whatever the first caller persisted. Fetches are never
    /// retried here, and a failure mid-batch leaves earlier inserts in place.
    pub async fn lookup_or_fetch<T, S, F, Fut>(
        &self,
        store: &S,
        location_id: Uuid,
        fetch: F,
    ) -> Result<Vec<T>, CacheError>
    where
        T: Cacheable,
        S: RowStore<T> + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, CacheError>>,
    {
        if let CacheLookup::Hit(rows) = self.lookup(store, location_id).await? {
            return Ok(rows);
        }

        let key: FlightKey = (T::TABLE, location_id);
        let gate = self.in_flight.entry(key).or_default().clone();
        let result = {
            let _held = gate.lock().await;
            match self.lookup(store, location_id).await? {
                CacheLookup::Hit(rows) => Ok(rows),
                CacheLookup::Miss => {
                    counter!("cityscout_cache_miss_total", "table" => T::TABLE).increment(1);
                    let fetched = fetch().await?;
                    for row in &fetched {
                        store.insert_row(row).await?;
                    }
                    debug!(
                        target = "cityscout::cache",
                        table = T::TABLE,
                        location_id = %location_id,
                        rows = fetched.len(),
                        "persisted fresh batch"
                    );
                    Ok(fetched)
                }
            }
        };

        drop(gate);
        // Last one out removes the gate; the map copy is the only remaining
        // strong reference at that point.
        self.in_flight
            .remove_if(&key, |_, gate| Arc::strong_count(gate) == 1);

        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use time::Duration;

    use super::*;

    struct MemRows {
        rows: Mutex<Vec<WeatherRecord>>,
    }

    impl MemRows {
        fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
            }
        }

        async fn seeded(rows: Vec<WeatherRecord>) -> Self {
            let store = Self::new();
            *store.rows.lock().await = rows;
            store
        }
    }

    #[async_trait]
    impl RowStore<WeatherRecord> for MemRows {
        async fn select_rows(&self, location_id: Uuid) -> Result<Vec<WeatherRecord>, RepoError> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|row| row.location_id == location_id)
                .cloned()
                .collect())
        }

        async fn insert_row(&self, row: &WeatherRecord) -> Result<(), RepoError> {
            self.rows.lock().await.push(row.clone());
            Ok(())
        }

        async fn delete_rows(&self, location_id: Uuid) -> Result<u64, RepoError> {
            let mut rows = self.rows.lock().await;
            let before = rows.len();
            rows.retain(|row| row.location_id != location_id);
            Ok((before - rows.len()) as u64)
        }
    }

    fn record(location_id: Uuid, forecast: &str, age: Duration) -> WeatherRecord {
        WeatherRecord {
            id: Uuid::new_v4(),
            location_id,
            forecast: forecast.to_owned(),
            forecast_time: "Sat Jan 01 2022".to_owned(),
            created_at: OffsetDateTime::now_utc() - age,
        }
    }

    #[tokio::test]
    async fn empty_store_is_a_miss() {
        let store = MemRows::new();
        let controller = CacheController::new();
        let outcome = controller
            .lookup::<WeatherRecord, _>(&store, Uuid::new_v4())
            .await
            .unwrap();
        assert!(matches!(outcome, CacheLookup::Miss));
    }

    #[tokio::test]
    async fn miss_path_fetches_once_and_persists_before_returning() {
        let location_id = Uuid::new_v4();
        let store = MemRows::new();
        let controller = CacheController::new();
        let calls = AtomicUsize::new(0);

        let fetched = controller
            .lookup_or_fetch(&store, location_id, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![
                    record(location_id, "cloudy", Duration::ZERO),
                    record(location_id, "rain", Duration::ZERO),
                ])
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetched.len(), 2);
        assert_eq!(store.select_rows(location_id).await.unwrap(), fetched);
    }

    #[tokio::test]
    async fn fresh_batch_is_served_without_fetch_or_deletion() {
        let location_id = Uuid::new_v4();
        let cached = vec![record(location_id, "clear", Duration::minutes(29))];
        let store = MemRows::seeded(cached.clone()).await;
        let controller = CacheController::new();
        let calls = AtomicUsize::new(0);

        let served = controller
            .lookup_or_fetch(&store, location_id, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(served, cached);
        assert_eq!(store.select_rows(location_id).await.unwrap(), cached);
    }

    #[tokio::test]
    async fn stale_batch_is_evicted_and_refetched() {
        let location_id = Uuid::new_v4();
        let stale = vec![
            record(location_id, "old one", Duration::minutes(31)),
            record(location_id, "old two", Duration::minutes(31)),
        ];
        let store = MemRows::seeded(stale).await;
        let controller = CacheController::new();

        let served = controller
            .lookup_or_fetch(&store, location_id, || async {
                Ok(vec![record(location_id, "fresh", Duration::ZERO)])
            })
            .await
            .unwrap();

        assert_eq!(served.len(), 1);
        assert_eq!(served[0].forecast, "fresh");
        // Only the refetched rows survive.
        assert_eq!(store.select_rows(location_id).await.unwrap(), served);
    }

    #[tokio::test]
    async fn batch_age_is_taken_from_the_first_row() {
        let location_id = Uuid::new_v4();
        let mixed = vec![
            record(location_id, "lead", Duration::minutes(5)),
            record(location_id, "tail", Duration::minutes(45)),
        ];
        let store = MemRows::seeded(mixed.clone()).await;
        let controller = CacheController::new();

        let outcome = controller
            .lookup::<WeatherRecord, _>(&store, location_id)
            .await
            .unwrap();

        match outcome {
            CacheLookup::Hit(rows) => assert_eq!(rows, mixed),
            CacheLookup::Miss => panic!("batch led by a fresh row must hit"),
        }
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cached_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();
        let store =
            MemRows::seeded(vec![record(cached_id, "kept", Duration::minutes(5))]).await;
        let controller = CacheController::new();

        let fetched = controller
            .lookup_or_fetch(&store, other_id, || async {
                Ok(vec![record(other_id, "new", Duration::ZERO)])
            })
            .await
            .unwrap();

        assert_eq!(fetched[0].forecast, "new");
        // The neighbouring key's batch is untouched.
        let kept = store.select_rows(cached_id).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].forecast, "kept");
    }

    #[tokio::test]
    async fn concurrent_misses_for_one_key_fetch_once() {
        let location_id = Uuid::new_v4();
        let store = Arc::new(MemRows::new());
        let controller = Arc::new(CacheController::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let spawn = |tag: &'static str| {
            let store = store.clone();
            let controller = controller.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                controller
                    .lookup_or_fetch(store.as_ref(), location_id, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(vec![record(location_id, tag, Duration::ZERO)])
                    })
                    .await
                    .unwrap()
            })
        };

        let (first, second) = tokio::join!(spawn("a"), spawn("b"));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Both callers are served the one persisted batch.
        assert_eq!(first, second);
        assert_eq!(store.select_rows(location_id).await.unwrap().len(), 1);
        // The gate does not leak once the flight is over.
        assert!(controller.in_flight.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates_without_retry() {
        let location_id = Uuid::new_v4();
        let store = MemRows::new();
        let controller = CacheController::new();
        let calls = AtomicUsize::new(0);

        let result = controller
            .lookup_or_fetch::<WeatherRecord, _, _, _>(&store, location_id, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CacheError::Provider(ProviderError::Status { status: 502 }))
            })
            .await;

        assert!(matches!(
            result,
            Err(CacheError::Provider(ProviderError::Status { status: 502 }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.select_rows(location_id).await.unwrap().is_empty());
    }
}
