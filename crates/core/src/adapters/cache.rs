use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{HubResult, StoreError};

/// Key/value cache with per-entry expiry.
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    /// Set a value with expiration
    async fn set(&self, key: &str, value: &str, expires_in: Duration) -> HubResult<()>;

    /// Get a value by key; expired entries read as missing
    async fn get(&self, key: &str) -> HubResult<Option<String>>;

    async fn delete(&self, key: &str) -> HubResult<()>;

    /// Delete every key starting with `prefix`, returning how many went.
    async fn delete_prefix(&self, prefix: &str) -> HubResult<usize>;

    /// Clear all cached values
    async fn clear(&self) -> HubResult<()>;
}

/// In-memory TTL cache
#[derive(Clone, Default)]
pub struct MemoryCacheAdapter {
    data: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl MemoryCacheAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> HubResult<MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.data
            .lock()
            .map_err(|_| StoreError::Connection("cache lock poisoned".to_string()).into())
    }
}

#[async_trait]
impl CacheAdapter for MemoryCacheAdapter {
    async fn set(&self, key: &str, value: &str, expires_in: Duration) -> HubResult<()> {
        let now = Utc::now();
        let mut data = self.data()?;
        data.retain(|_, entry| entry.expires_at > now);
        data.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: now + expires_in,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> HubResult<Option<String>> {
        let data = self.data()?;
        Ok(data
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> HubResult<()> {
        self.data()?.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> HubResult<usize> {
        let mut data = self.data()?;
        let before = data.len();
        data.retain(|key, _| !key.starts_with(prefix));
        Ok(before - data.len())
    }

    async fn clear(&self) -> HubResult<()> {
        self.data()?.clear();
        Ok(())
    }
}
