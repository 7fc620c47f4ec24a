use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

const KEY_PREFIX: &str = "cache:";

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub last_update: DateTime<Utc>,
    /// `None` marks a slot that was touched but never filled. `put` always
    /// fills it; an empty slot only comes from `put_entry`, and reading it
    /// fresh yields `CacheError::Unavailable`.
    pub data: Option<Value>,
}

/// Process-local expiring key/value store shared by the refresher and the handlers.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Unavailable: {name} has no data yet")]
    Unavailable {
        name: String,
    },
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, name: &str, data: Value) {
        self.put_entry(
            name,
            CacheEntry {
                last_update: Utc::now(),
                data: Some(data),
            },
        )
        .await;
    }

    /// Stores a prepared entry as is, keeping its timestamp and data slot.
    pub async fn put_entry(&self, name: &str, entry: CacheEntry) {
        self.entries
            .write()
            .await
            .insert(format!("{KEY_PREFIX}{name}"), entry);
    }

    pub async fn get(&self, name: &str, max_age: Duration) -> Result<Option<Value>, CacheError> {
        self.get_at(name, max_age, Utc::now()).await
    }

    /// Entries older than `max_age` at `now` read as absent.
    pub async fn get_at(
        &self,
        name: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<Value>, CacheError> {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(&format!("{KEY_PREFIX}{name}")) else {
            return Ok(None);
        };

        // an expiry past the representable range never comes
        let expired = entry
            .last_update
            .checked_add_signed(max_age)
            .is_some_and(|expires_at| now >= expires_at);
        if expired {
            return Ok(None);
        }

        match &entry.data {
            Some(data) => Ok(Some(data.clone())),
            None => Err(CacheError::Unavailable {
                name: name.to_string(),
            }),
        }
    }

    pub async fn last_update(&self, name: &str) -> Option<DateTime<Utc>> {
        self.entries
            .read()
            .await
            .get(&format!("{KEY_PREFIX}{name}"))
            .map(|entry| entry.last_update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let cache = CacheStore::new();
        assert_eq!(cache.get("winners", Duration::minutes(60)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn fresh_entry_is_returned_and_overwritten() {
        let cache = CacheStore::new();
        cache.put("znode_count", json!(10)).await;
        cache.put("znode_count", json!(11)).await;

        let value = cache.get("znode_count", Duration::minutes(60)).await.unwrap();
        assert_eq!(value, Some(json!(11)));
        assert!(cache.last_update("znode_count").await.is_some());
    }

    #[tokio::test]
    async fn entry_expires_after_max_age() {
        let cache = CacheStore::new();
        let written = Utc::now();
        cache
            .put_entry(
                "xzc_price",
                CacheEntry {
                    last_update: written,
                    data: Some(json!("7.25")),
                },
            )
            .await;

        let max_age = Duration::minutes(60);
        let just_before = written + Duration::minutes(59);
        let at_expiry = written + max_age;

        assert_eq!(
            cache.get_at("xzc_price", max_age, just_before).await.unwrap(),
            Some(json!("7.25"))
        );
        assert_eq!(cache.get_at("xzc_price", max_age, at_expiry).await.unwrap(), None);
    }

    #[tokio::test]
    async fn huge_max_age_never_expires() {
        let cache = CacheStore::new();
        cache.put("winners", json!({"1": "aPayee"})).await;

        let max_age = Duration::minutes(100_000_000_000_000);
        assert_eq!(
            cache.get("winners", max_age).await.unwrap(),
            Some(json!({"1": "aPayee"}))
        );
    }

    #[tokio::test]
    async fn fresh_entry_without_data_is_unavailable() {
        let cache = CacheStore::new();
        cache
            .put_entry(
                "blocktemplate",
                CacheEntry {
                    last_update: Utc::now(),
                    data: None,
                },
            )
            .await;

        let err = cache.get("blocktemplate", Duration::minutes(60)).await.unwrap_err();
        assert!(matches!(err, CacheError::Unavailable { ref name } if name == "blocktemplate"));
    }
}
