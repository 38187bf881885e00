//! Pull-through Value Cache
//!
//! Named entries computed lazily by a loader and kept until invalidated.
//! Each entry owns a `OnceCell`, so concurrent misses on the same key wait
//! for a single loader run instead of racing.

use anyhow::Result;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct ValueCache<V> {
    entries: DashMap<String, Arc<OnceCell<V>>>,
}

impl<V> ValueCache<V>
where
    V: Clone + Send + Sync,
{
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
        })
    }

    /// Returns the cached value for `key`, running `loader` on a miss.
    ///
    /// A failed load leaves the entry empty so the next call retries.
    pub async fn get_or_load<F, Fut>(&self, key: &str, loader: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let value = cell
            .get_or_try_init(|| async move {
                tracing::debug!("Cache miss for '{}', loading", key);
                loader().await
            })
            .await?;

        Ok(value.clone())
    }

    /// Drops `key`; the next read recomputes it. Returns whether it was held.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            tracing::info!("Invalidated cache entry '{}'", key);
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Whether `key` currently holds a computed value.
    pub fn is_cached(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|cell| cell.initialized())
            .unwrap_or(false)
    }
}

impl<V> Default for ValueCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}
