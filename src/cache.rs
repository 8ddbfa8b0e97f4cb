use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default entry lifetime: 5 minutes
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

/// Small keyed cache with a fixed time-to-live
///
/// Cloning shares the underlying map. Expired entries are dropped lazily on read.
#[derive(Debug, Clone)]
pub struct TtlCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a fresh entry, removing it if expired
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = {
            let entries = self.entries.read().await;
            let entry = entries.get(key)?;
            if entry.stored_at.elapsed() <= self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        };

        match value {
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => {
                    debug!("Cache hit: {}", key);
                    Some(data)
                }
                Err(e) => {
                    warn!("Cached value for {} has unexpected shape: {}", key, e);
                    None
                }
            },
            None => {
                self.evict_expired(key).await;
                None
            }
        }
    }

    /// Remove `key` only if it is still expired once the write lock is held
    async fn evict_expired(&self, key: &str) {
        let mut entries = self.entries.write().await;
        let expired = entries
            .get(key)
            .map(|entry| entry.stored_at.elapsed() > self.ttl)
            .unwrap_or(false);
        if expired {
            entries.remove(key);
            debug!("Cache entry expired: {}", key);
        }
    }

    /// Store a value, resetting its age
    pub async fn set<T: Serialize>(&self, key: &str, data: &T) {
        match serde_json::to_value(data) {
            Ok(value) => {
                self.entries.write().await.insert(
                    key.to_string(),
                    CacheEntry {
                        value,
                        stored_at: Instant::now(),
                    },
                );
            }
            Err(e) => warn!("Could not cache {}: {}", key, e),
        }
    }

    /// Remove every entry whose key starts with `prefix`
    pub async fn clear(&self, prefix: &str) {
        self.entries
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));
    }

    pub async fn clear_all(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
