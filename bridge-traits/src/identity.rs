//! Identity Provider Abstraction
//!
//! Wraps the host identity SDK (redirect sign-in, token acquisition,
//! lifecycle callbacks) behind a trait so the session core never touches
//! protocol details. The provider owns accounts and token issuance; the
//! core only reacts to outcomes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;

/// Signed-in account record
///
/// Read-only snapshot owned by the provider. Role claims are plain strings
/// here; the session core maps them to its role model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject identifier for the account
    pub subject: String,
    /// Human-readable display name
    pub display_name: String,
    /// Sign-in name (usually an email address)
    pub username: String,
    /// Raw role claims from the identity token
    pub roles: Vec<String>,
}

/// Raw token material issued by the provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
}

impl fmt::Debug for RawToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Lifecycle notifications emitted by the provider
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// An interactive or redirect sign-in finished successfully
    SignInCompleted { identity: Identity },
    /// A sign-in attempt failed; `reason` is provider-internal and must not
    /// be shown to users verbatim
    SignInFailed { reason: String },
    /// The account was signed out
    SignOutCompleted,
}

/// Observer for provider lifecycle events
#[async_trait]
pub trait LifecycleObserver: Send + Sync {
    async fn on_lifecycle_event(&self, event: LifecycleEvent);
}

/// Handle returned by [`IdentityProvider::add_observer`]
///
/// Must be passed back to [`IdentityProvider::remove_observer`] when the
/// consumer is torn down; observers are never dropped implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity provider trait
///
/// Hosts implement this against their identity SDK. All token acquisition
/// entry points may perform network I/O; callers decide how failures map
/// to session state.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Start a redirect-based sign-in. Control leaves the application; the
    /// outcome arrives later via [`complete_redirect`] and lifecycle events.
    ///
    /// [`complete_redirect`]: IdentityProvider::complete_redirect
    async fn begin_sign_in(&self, scopes: &[String]) -> Result<()>;

    /// Finish a redirect sign-in if the current URL carries a provider
    /// response. Returns `Ok(None)` when no response is pending.
    async fn complete_redirect(&self) -> Result<Option<Identity>>;

    /// The currently signed-in account, if any
    fn active_identity(&self) -> Option<Identity>;

    /// Acquire a token without user interaction (cache or refresh-token
    /// round trip inside the provider)
    async fn acquire_token_silent(
        &self,
        scopes: &[String],
        identity: &Identity,
    ) -> Result<RawToken>;

    /// Acquire a token interactively (popup or equivalent)
    async fn acquire_token_interactive(&self, scopes: &[String]) -> Result<RawToken>;

    /// Sign the active account out, landing on `post_sign_out_path`
    async fn sign_out(&self, post_sign_out_path: &str) -> Result<()>;

    /// Register a lifecycle observer; the returned id deregisters it
    fn add_observer(&self, observer: Arc<dyn LifecycleObserver>) -> SubscriptionId;

    /// Deregister a previously added observer. Unknown ids are ignored.
    fn remove_observer(&self, id: SubscriptionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_ids_are_unique() {
        assert_ne!(SubscriptionId::new(), SubscriptionId::new());
    }

    #[test]
    fn test_raw_token_debug_redacts_value() {
        let token = RawToken {
            value: "very-secret".to_string(),
            expires_at: Utc::now(),
            scopes: vec!["User.Read".to_string()],
        };

        let debug = format!("{:?}", token);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret"));
    }
}
