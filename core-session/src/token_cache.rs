//! Ephemeral Token Cache
//!
//! Per-scope access token cache on top of the session-scoped store.
//! Tokens live for the browser session at most; nothing here ever touches
//! durable storage.
//!
//! ## Security Notes
//!
//! - Token values are never logged or exposed in error messages
//! - Corrupted cache entries are removed and treated as a cache miss, so a
//!   bad entry degrades to one extra acquisition instead of an error

use crate::error::{Result, SessionError};
use crate::types::AccessToken;
use bridge_traits::storage::SessionStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "access_token:";

/// Session-scoped storage for access tokens, keyed by scope key.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn SessionStore>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        debug!("Initializing TokenCache");
        Self { store }
    }

    /// Store a token under its scope key, replacing any existing entry.
    pub async fn store(&self, token: &AccessToken) -> Result<()> {
        let key = storage_key(&token.scope_key);

        let json = serde_json::to_vec(token).map_err(|e| {
            warn!(scope_key = %token.scope_key, error = %e, "Failed to serialize token");
            SessionError::Serialization(e.to_string())
        })?;

        self.store.set_item(&key, &json).await.map_err(|e| {
            warn!(scope_key = %token.scope_key, error = %e, "Failed to store token");
            SessionError::StorageUnavailable(e.to_string())
        })?;

        info!(
            scope_key = %token.scope_key,
            expires_at = %token.expires_at,
            "Token cached"
        );

        Ok(())
    }

    /// Retrieve the cached token for a scope key.
    ///
    /// Returns `Ok(None)` on a miss. A corrupted entry is removed and also
    /// reported as a miss.
    pub async fn retrieve(&self, scope_key: &str) -> Result<Option<AccessToken>> {
        let key = storage_key(scope_key);

        let data = self.store.get_item(&key).await.map_err(|e| {
            warn!(scope_key = %scope_key, error = %e, "Failed to read token cache");
            SessionError::StorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(scope_key = %scope_key, "Token cache miss");
            return Ok(None);
        };

        match serde_json::from_slice::<AccessToken>(&data) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!(
                    scope_key = %scope_key,
                    error = %e,
                    "Corrupted token cache entry, removing"
                );

                if let Err(delete_err) = self.store.remove_item(&key).await {
                    warn!(
                        scope_key = %scope_key,
                        error = %delete_err,
                        "Failed to remove corrupted token entry"
                    );
                }

                Ok(None)
            }
        }
    }

    /// Remove the cached token for a scope key. Idempotent.
    pub async fn delete(&self, scope_key: &str) -> Result<()> {
        self.store
            .remove_item(&storage_key(scope_key))
            .await
            .map_err(|e| {
                warn!(scope_key = %scope_key, error = %e, "Failed to delete token");
                SessionError::StorageUnavailable(e.to_string())
            })?;

        info!(scope_key = %scope_key, "Token removed from cache");
        Ok(())
    }

    /// Remove every cached token, leaving unrelated session entries alone.
    pub async fn clear(&self) -> Result<()> {
        let keys = self
            .store
            .keys()
            .await
            .map_err(|e| SessionError::StorageUnavailable(e.to_string()))?;

        let mut removed = 0usize;
        for key in keys.iter().filter(|k| k.starts_with(KEY_PREFIX)) {
            self.store
                .remove_item(key)
                .await
                .map_err(|e| SessionError::StorageUnavailable(e.to_string()))?;
            removed += 1;
        }

        info!(removed, "Token cache cleared");
        Ok(())
    }
}

fn storage_key(scope_key: &str) -> String {
    format!("{}{}", KEY_PREFIX, scope_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// Mock implementation of SessionStore for testing
    #[derive(Clone, Default)]
    struct MockSessionStore {
        items: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    #[async_trait::async_trait]
    impl SessionStore for MockSessionStore {
        async fn set_item(&self, key: &str, value: &[u8]) -> bridge_traits::error::Result<()> {
            self.items
                .lock()
                .await
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_item(&self, key: &str) -> bridge_traits::error::Result<Option<Vec<u8>>> {
            Ok(self.items.lock().await.get(key).cloned())
        }

        async fn remove_item(&self, key: &str) -> bridge_traits::error::Result<()> {
            self.items.lock().await.remove(key);
            Ok(())
        }

        async fn keys(&self) -> bridge_traits::error::Result<Vec<String>> {
            Ok(self.items.lock().await.keys().cloned().collect())
        }

        async fn clear(&self) -> bridge_traits::error::Result<()> {
            self.items.lock().await.clear();
            Ok(())
        }
    }

    fn token(scope_key: &str) -> AccessToken {
        AccessToken::new("token-value", Utc::now() + Duration::hours(1), scope_key)
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let cache = TokenCache::new(Arc::new(MockSessionStore::default()));

        cache.store(&token("scope-a")).await.unwrap();

        let retrieved = cache.retrieve("scope-a").await.unwrap().unwrap();
        assert_eq!(retrieved.value, "token-value");
        assert_eq!(retrieved.scope_key, "scope-a");
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let cache = TokenCache::new(Arc::new(MockSessionStore::default()));
        assert!(cache.retrieve("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tokens_are_isolated_per_scope_key() {
        let cache = TokenCache::new(Arc::new(MockSessionStore::default()));

        cache.store(&token("scope-a")).await.unwrap();
        cache.store(&token("scope-b")).await.unwrap();
        cache.delete("scope-a").await.unwrap();

        assert!(cache.retrieve("scope-a").await.unwrap().is_none());
        assert!(cache.retrieve("scope-b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupted_entry_is_removed_and_misses() {
        let store = Arc::new(MockSessionStore::default());
        store
            .set_item("access_token:scope-a", b"not json")
            .await
            .unwrap();

        let cache = TokenCache::new(store.clone());
        assert!(cache.retrieve("scope-a").await.unwrap().is_none());

        // The bad entry must be gone
        assert!(store
            .get_item("access_token:scope-a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_clear_leaves_unrelated_entries() {
        let store = Arc::new(MockSessionStore::default());
        store.set_item("navigation_intent", b"/sensors").await.unwrap();

        let cache = TokenCache::new(store.clone());
        cache.store(&token("scope-a")).await.unwrap();
        cache.store(&token("scope-b")).await.unwrap();

        cache.clear().await.unwrap();

        assert!(cache.retrieve("scope-a").await.unwrap().is_none());
        assert!(cache.retrieve("scope-b").await.unwrap().is_none());
        assert!(store.get_item("navigation_intent").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let cache = TokenCache::new(Arc::new(MockSessionStore::default()));
        cache.delete("absent").await.unwrap();
    }
}
