//! Session Types
//!
//! Core types for the authentication session: the session state machine,
//! cached access tokens, scope keying and role resolution.

use bridge_traits::identity::Identity;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which authentication flow is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProgress {
    /// A redirect round trip is being completed
    RedirectPending,
    /// A token is being refreshed without user interaction
    SilentRefresh,
    /// The user is being prompted interactively
    InteractivePopup,
}

/// The authentication session state machine.
///
/// Only the session controller and the token broker write transitions;
/// everything else (the access guard included) reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No account is signed in
    #[default]
    Unauthenticated,
    /// An authentication flow is running
    InProgress(AuthProgress),
    /// An account is signed in
    Authenticated(Identity),
    /// The last flow failed; `String` is a user-presentable reason
    Failed(String),
}

impl SessionState {
    /// Whether an account is signed in
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Whether an authentication flow is running
    pub fn is_in_progress(&self) -> bool {
        matches!(self, SessionState::InProgress(_))
    }

    /// The signed-in identity, if any
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// A cached access token for one scope set.
///
/// `Debug` never prints the token value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The bearer token value
    pub value: String,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
    /// Scope key this token was issued for (see [`scope_key`])
    pub scope_key: String,
}

impl AccessToken {
    pub fn new(
        value: impl Into<String>,
        expires_at: DateTime<Utc>,
        scope_key: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            expires_at,
            scope_key: scope_key.into(),
        }
    }

    /// Whether the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether the token expires within `buffer_secs` from now.
    ///
    /// A token inside the buffer counts as stale so requests never go out
    /// with a token about to die mid-flight.
    pub fn is_expired_with_buffer(&self, buffer_secs: i64) -> bool {
        self.is_expired_with_buffer_at(Utc::now(), buffer_secs)
    }

    /// [`is_expired_with_buffer`](Self::is_expired_with_buffer) evaluated
    /// against an explicit `now`, for callers that inject a clock.
    pub fn is_expired_with_buffer_at(&self, now: DateTime<Utc>, buffer_secs: i64) -> bool {
        now + Duration::seconds(buffer_secs) >= self.expires_at
    }

    /// Time remaining until expiry, or `None` if already expired
    pub fn time_until_expiry(&self) -> Option<Duration> {
        let remaining = self.expires_at - Utc::now();
        (remaining > Duration::zero()).then_some(remaining)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("scope_key", &self.scope_key)
            .finish()
    }
}

/// Canonical cache key for a scope set.
///
/// Order-insensitive: `["b", "a"]` and `["a", "b"]` key the same token.
pub fn scope_key(scopes: &[String]) -> String {
    let mut sorted: Vec<&str> = scopes.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(" ")
}

/// Application roles, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Viewer,
    Operator,
    Admin,
}

impl Role {
    /// Parse a role claim. Unknown claims are ignored by callers.
    pub fn parse(claim: &str) -> Option<Role> {
        match claim {
            "Admin" => Some(Role::Admin),
            "Operator" => Some(Role::Operator),
            "Viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Operator => "Operator",
            Role::Viewer => "Viewer",
        }
    }
}

/// Whether the identity carries the given role claim.
pub fn has_role(identity: &Identity, role: Role) -> bool {
    identity
        .roles
        .iter()
        .filter_map(|claim| Role::parse(claim))
        .any(|r| r == role)
}

/// The most privileged role the identity carries, if any.
pub fn highest_role(identity: &Identity) -> Option<Role> {
    identity
        .roles
        .iter()
        .filter_map(|claim| Role::parse(claim))
        .max()
}
