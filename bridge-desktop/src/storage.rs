//! In-memory session store
//!
//! Desktop hosts have no browser session storage; tokens and the
//! navigation intent live in process memory and vanish on exit, matching
//! the session-scoped semantics of the web shell.

use async_trait::async_trait;
use bridge_traits::{error::Result, storage::SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// `SessionStore` backed by a process-local map.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    items: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set_item(&self, key: &str, value: &[u8]) -> Result<()> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.read().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.items.write().await.clear();
        Ok(())
    }
}
