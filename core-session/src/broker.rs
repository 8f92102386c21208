//! Token Broker
//!
//! Single entry point for access tokens. Callers ask for scopes; the
//! broker answers from the cache, silently refreshes, or falls back to one
//! interactive attempt. It never panics and never surfaces provider
//! errors: the worst case is a typed [`AcquisitionFailure`].
//!
//! Concurrency: acquisitions for the same scope key are serialised behind
//! a per-key lock, and the cache is re-checked under the lock. Two views
//! racing for the same expired token cost exactly one provider round trip.

use crate::context::SessionContext;
use crate::error::AcquisitionFailure;
use crate::types::{scope_key, AccessToken, AuthProgress, SessionState};
use bridge_traits::identity::{Identity, IdentityProvider, RawToken};
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::events::{CoreEvent, SessionEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Acquires and caches access tokens per scope set.
pub struct TokenBroker {
    provider: Arc<dyn IdentityProvider>,
    context: Arc<SessionContext>,
    refresh_buffer_secs: i64,
    clock: Arc<dyn Clock>,
    /// Per-scope-key locks serialising concurrent acquisitions.
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TokenBroker {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        context: Arc<SessionContext>,
        refresh_buffer_secs: i64,
    ) -> Self {
        Self {
            provider,
            context,
            refresh_buffer_secs,
            clock: Arc::new(SystemClock),
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the time source used for expiry checks. Tests use this to
    /// pin or wind the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns a usable access token for `scopes`, or a typed failure.
    ///
    /// Resolution order:
    /// 1. cached token, unless expired or inside the refresh buffer
    /// 2. silent acquisition through the provider
    /// 3. one interactive attempt
    ///
    /// With no signed-in account the answer is `NoAccount` and the caller
    /// proceeds unauthenticated. This method never panics and never
    /// returns provider internals.
    #[instrument(skip(self, scopes), fields(scope_key = %scope_key(scopes)))]
    pub async fn acquire(&self, scopes: &[String]) -> Result<AccessToken, AcquisitionFailure> {
        let key = scope_key(scopes);

        let lock = {
            let mut locks = self.refresh_locks.lock().await;
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = lock.lock().await;

        // Re-check under the lock: a racing acquisition may have already
        // refreshed this key.
        if let Ok(Some(token)) = self.context.tokens().retrieve(&key).await {
            if !token.is_expired_with_buffer_at(self.clock.now(), self.refresh_buffer_secs) {
                debug!("Serving token from cache");
                return Ok(token);
            }
            debug!("Cached token stale, refreshing");
        }

        let Some(identity) = self.provider.active_identity() else {
            debug!("No active account, proceeding unauthenticated");
            return Err(AcquisitionFailure::NoAccount);
        };

        match self.acquire_silent(scopes, &key, &identity).await {
            Some(token) => Ok(token),
            None => self.acquire_interactive(scopes, &key, &identity).await,
        }
    }

    async fn acquire_silent(
        &self,
        scopes: &[String],
        key: &str,
        identity: &Identity,
    ) -> Option<AccessToken> {
        self.context
            .set_state(SessionState::InProgress(AuthProgress::SilentRefresh))
            .await;

        match self.provider.acquire_token_silent(scopes, identity).await {
            Ok(raw) => Some(self.accept(raw, key, identity).await),
            Err(e) => {
                warn!(error = %e, "Silent acquisition failed, falling back to interactive");
                None
            }
        }
    }

    async fn acquire_interactive(
        &self,
        scopes: &[String],
        key: &str,
        identity: &Identity,
    ) -> Result<AccessToken, AcquisitionFailure> {
        self.context
            .set_state(SessionState::InProgress(AuthProgress::InteractivePopup))
            .await;
        self.emit(SessionEvent::SigningIn {
            flow: "interactive".to_string(),
        });

        match self.provider.acquire_token_interactive(scopes).await {
            Ok(raw) => Ok(self.accept(raw, key, identity).await),
            Err(e) => {
                warn!(error = %e, "Interactive acquisition failed");
                // The account is still signed in; only the token is missing.
                self.context
                    .set_state(SessionState::Authenticated(identity.clone()))
                    .await;
                self.emit(SessionEvent::AuthError {
                    message: "Your session could not be refreshed. Please sign in again."
                        .to_string(),
                    recoverable: true,
                });
                Err(AcquisitionFailure::Unavailable)
            }
        }
    }

    /// Cache the fresh token and restore the authenticated state.
    async fn accept(&self, raw: RawToken, key: &str, identity: &Identity) -> AccessToken {
        let token = AccessToken::new(raw.value, raw.expires_at, key);

        if let Err(e) = self.context.tokens().store(&token).await {
            // Serving an uncached token is fine; the next call refreshes.
            warn!(error = %e, "Failed to cache fresh token");
        }

        self.context
            .set_state(SessionState::Authenticated(identity.clone()))
            .await;
        self.emit(SessionEvent::TokenRefreshed {
            scope_key: key.to_string(),
            expires_at: token.expires_at.timestamp(),
        });

        info!(expires_at = %token.expires_at, "Token acquired");
        token
    }

    fn emit(&self, event: SessionEvent) {
        self.context.events().emit(CoreEvent::Session(event)).ok();
    }
}
