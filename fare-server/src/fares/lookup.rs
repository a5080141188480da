//! Fetch-or-cache fare lookup.
//!
//! Every lookup reads the fare cache file first and falls through to the fare
//! API on a miss, persisting the fetched record before returning it.
//!
//! Concurrent misses for the same station pair are coalesced: the first
//! caller does the API call and the append, and every other caller for that
//! pair waits for its result. Nothing is kept in memory once the flight
//! lands, so the file stays the only record of what has been fetched.

use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::{debug, info};

use super::client::FareSource;
use super::error::FareError;
use super::store::FareStore;
use super::types::{FareKey, FareRecord};

/// Fare lookup backed by a fare source and a fare cache file.
pub struct FareLookup<S> {
    source: S,
    store: Arc<FareStore>,
    /// Misses currently being fetched, keyed by station pair.
    in_flight: MokaCache<FareKey, Arc<FareRecord>>,
}

impl<S: FareSource> FareLookup<S> {
    /// Create a new lookup.
    pub fn new(source: S, store: FareStore) -> Self {
        Self {
            source,
            store: Arc::new(store),
            in_flight: MokaCache::builder().build(),
        }
    }

    /// Resolve the fare for a station pair.
    ///
    /// A corrupt cache file is reported rather than bypassed. Source errors
    /// propagate and nothing is cached. If the fetched record cannot be
    /// persisted the write error is returned and the record is dropped.
    pub async fn resolve_fare(&self, key: &FareKey) -> Result<FareRecord, FareError> {
        if let Some(record) = self.cached(key).await? {
            debug!(%key, "found cached fare");
            return Ok(record);
        }

        let result = self
            .in_flight
            .try_get_with_by_ref(key, self.fetch_and_store(key))
            .await;
        self.in_flight.invalidate(key).await;

        result
            .map(|record| FareRecord::clone(&record))
            .map_err(|e| FareError::clone(&e))
    }

    async fn fetch_and_store(&self, key: &FareKey) -> Result<Arc<FareRecord>, FareError> {
        // An earlier flight for this pair may have landed since the first check
        if let Some(record) = self.cached(key).await? {
            debug!(%key, "fare cached by concurrent lookup");
            return Ok(Arc::new(record));
        }

        info!(%key, "no cached fare, fetching from API");
        let record = self.source.resolve(key).await?;
        self.persist(&record).await?;

        info!(%key, fare = %record.fare_amount, "cached fetched fare");
        Ok(Arc::new(record))
    }

    async fn cached(&self, key: &FareKey) -> Result<Option<FareRecord>, FareError> {
        let store = Arc::clone(&self.store);
        let key = key.clone();
        tokio::task::spawn_blocking(move || store.get(&key))
            .await
            .map_err(|e| FareError::CacheRead {
                message: format!("cache read task failed: {}", e),
            })?
    }

    async fn persist(&self, record: &FareRecord) -> Result<(), FareError> {
        let store = Arc::clone(&self.store);
        let record = record.clone();
        tokio::task::spawn_blocking(move || store.put(&record))
            .await
            .map_err(|e| FareError::CacheWrite {
                message: format!("cache write task failed: {}", e),
            })?
    }

    /// Access the underlying fare source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Access the fare cache file.
    pub fn store(&self) -> &FareStore {
        &self.store
    }
}
