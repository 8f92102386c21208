//! Session-Scoped Storage Abstraction
//!
//! Key-value storage that lives for the browser session (or process) and is
//! never persisted to disk. Values are opaque bytes; callers own the
//! serialization format.

use async_trait::async_trait;

use crate::error::Result;

/// Session-scoped key-value store
///
/// Contents must vanish when the session ends; implementations must not
/// write them to durable storage. Tokens and navigation intents live here.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a value under `key`, replacing any existing value
    async fn set_item(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve the value for `key`, or `None` if absent
    async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove the value for `key`. Removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// List all stored keys
    async fn keys(&self) -> Result<Vec<String>>;

    /// Remove all stored values
    async fn clear(&self) -> Result<()>;
}
