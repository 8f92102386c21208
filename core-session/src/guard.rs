//! Access Guard
//!
//! Route gating decisions derived from the session state. The guard is a
//! pure reader: it never writes state, never navigates and never talks to
//! the provider. Callers act on the decision (render a loading view,
//! render the route, or start a sign-in with the returned intent).

use crate::context::SessionContext;
use crate::types::SessionState;
use std::sync::Arc;
use tracing::debug;

/// What to do with a route request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// An authentication flow is running; render a transient loading view
    ShowLoading,
    /// The session is authenticated; render the route
    Allow,
    /// Not authenticated; start sign-in and preserve `intent` as the
    /// destination to restore afterwards
    RedirectToSignIn { intent: String },
}

/// Read-only route gate over the session state.
pub struct AccessGuard {
    context: Arc<SessionContext>,
    sign_in_path: String,
}

impl AccessGuard {
    pub fn new(context: Arc<SessionContext>, sign_in_path: impl Into<String>) -> Self {
        Self {
            context,
            sign_in_path: sign_in_path.into(),
        }
    }

    /// Decide what to do with a request for `current_path`.
    ///
    /// The sign-in page itself is never redirected to sign-in; while a
    /// flow is in flight the decision is `ShowLoading` so an in-progress
    /// redirect is never interrupted by a second one.
    pub async fn decide(&self, current_path: &str) -> RouteDecision {
        let decision = match self.context.state().await {
            SessionState::InProgress(_) => RouteDecision::ShowLoading,
            SessionState::Authenticated(_) => RouteDecision::Allow,
            SessionState::Unauthenticated | SessionState::Failed(_) => {
                if current_path == self.sign_in_path {
                    // Already where sign-in happens; redirecting would loop.
                    RouteDecision::ShowLoading
                } else {
                    RouteDecision::RedirectToSignIn {
                        intent: current_path.to_string(),
                    }
                }
            }
        };

        debug!(path = %current_path, ?decision, "Route decision");
        decision
    }
}
