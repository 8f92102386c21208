//! Shared Session Context
//!
//! One explicit, shared view of the session: current state, the token
//! cache, the navigation intent and the event bus. Passed around as
//! `Arc<SessionContext>`; there are no globals.

use crate::error::{Result, SessionError};
use crate::token_cache::TokenCache;
use crate::types::SessionState;
use bridge_traits::storage::SessionStore;
use core_runtime::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const INTENT_KEY: &str = "navigation_intent";

/// Shared session context.
///
/// State writes go through `set_state`, which is crate-private: the
/// session controller and the token broker are the only writers. Everyone
/// else observes.
pub struct SessionContext {
    state: RwLock<SessionState>,
    tokens: TokenCache,
    store: Arc<dyn SessionStore>,
    events: EventBus,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>, events: EventBus) -> Self {
        Self {
            state: RwLock::new(SessionState::Unauthenticated),
            tokens: TokenCache::new(store.clone()),
            store,
            events,
        }
    }

    /// Snapshot of the current session state.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub(crate) async fn set_state(&self, next: SessionState) {
        let mut state = self.state.write().await;
        debug!(from = ?*state, to = ?next, "Session state transition");
        *state = next;
    }

    /// The token cache for this session.
    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// The event bus session events are published on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Persist the destination to restore after the next sign-in.
    pub async fn save_intent(&self, path: &str) -> Result<()> {
        self.store
            .set_item(INTENT_KEY, path.as_bytes())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to save navigation intent");
                SessionError::StorageUnavailable(e.to_string())
            })
    }

    /// Take the stored navigation intent, consuming it.
    ///
    /// Storage failures degrade to `None`: losing the intent costs one
    /// extra navigation, never the sign-in.
    pub async fn take_intent(&self) -> Option<String> {
        let data = match self.store.get_item(INTENT_KEY).await {
            Ok(data) => data?,
            Err(e) => {
                warn!(error = %e, "Failed to read navigation intent");
                return None;
            }
        };

        if let Err(e) = self.store.remove_item(INTENT_KEY).await {
            warn!(error = %e, "Failed to consume navigation intent");
        }

        String::from_utf8(data).ok()
    }
}
