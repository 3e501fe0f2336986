use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Source of the current time for freshness checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
struct CachedEntry {
    payload: Vec<u8>,
    computed_at: DateTime<Utc>,
}

/// Time-windowed cache for serialized analytics payloads
///
/// Each entry holds the JSON bytes of the last computation and the time it
/// was computed. An entry older than the window is treated as missing and is
/// replaced wholesale by the next computation. Concurrent callers may both
/// recompute an expired entry; the last writer wins.
pub struct AnalyticsCache {
    entries: moka::future::Cache<String, CachedEntry>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AnalyticsCache {
    /// Create a cache backed by the system clock
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        Self::with_clock(max_entries, ttl_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: u64, ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        let entries = moka::future::CacheBuilder::new(max_entries).build();

        Self {
            entries,
            ttl: chrono::Duration::seconds(ttl_secs as i64),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Current time according to the cache's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fresh payload for `key`, if any
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.clock.now();

        match self.entries.get(key).await {
            Some(entry) if now - entry.computed_at < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Analytics cache hit: {}", key);
                Some(entry.payload)
            }
            Some(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Analytics cache entry expired: {}", key);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Analytics cache miss: {}", key);
                None
            }
        }
    }

    /// Store a payload stamped with the current time
    pub async fn insert(&self, key: &str, payload: Vec<u8>) {
        let entry = CachedEntry {
            payload,
            computed_at: self.clock.now(),
        };
        self.entries.insert(key.to_string(), entry).await;
        tracing::trace!("Analytics cache set: {}", key);
    }

    /// Return the cached payload or compute, serialize and store a new one
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &str, compute: F) -> Result<Vec<u8>, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(payload) = self.get(key).await {
            return Ok(payload);
        }

        let value = compute().await?;
        let payload = serde_json::to_vec(&value).map_err(CacheError::from)?;
        self.insert(key, payload.clone()).await;

        tracing::debug!("Recomputed analytics aggregate: {}", key);
        Ok(payload)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            entries: self.entries.entry_count(),
            hit_count: hits,
            miss_count: misses,
            hit_rate: if total == 0 { 0.0 } else { hits as f64 / total as f64 },
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub fn dashboard() -> String {
        "analytics:dashboard".to_string()
    }

    pub fn sales(group_by: &str) -> String {
        format!("analytics:sales:{}", group_by)
    }

    pub fn popular_items(limit: usize) -> String {
        format!("analytics:popular-items:{}", limit)
    }

    pub fn order_breakdown(by: &str) -> String {
        format!("analytics:order-breakdown:{}", by)
    }
}
