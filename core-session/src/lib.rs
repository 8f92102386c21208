//! # Tarra Session Core
//!
//! Session lifecycle for the dashboard: redirect sign-in, route gating,
//! token acquisition and the session-scoped token cache.
//!
//! ## Modules
//!
//! - [`controller`]: [`SessionController`] drives sign-in, sign-out and
//!   redirect completion, and reacts to provider lifecycle events
//! - [`guard`]: [`AccessGuard`] turns the session state into a route
//!   decision
//! - [`broker`]: [`TokenBroker`] resolves access tokens silently first,
//!   interactively as a fallback, and never panics
//! - [`token_cache`]: [`TokenCache`] keeps tokens per scope key in the
//!   session-scoped store
//! - [`context`]: [`SessionContext`] is the shared state all of the above
//!   read and write
//!
//! ## Error Handling Strategy
//!
//! Operational faults (storage down, provider refusing a call) surface as
//! [`SessionError`]. "No token available" is not a fault: token
//! acquisition returns [`AcquisitionFailure`] as an ordinary value and
//! callers decide whether to proceed unauthenticated.

pub mod broker;
pub mod context;
pub mod controller;
pub mod error;
pub mod guard;
pub mod token_cache;
pub mod types;

pub use broker::TokenBroker;
pub use context::SessionContext;
pub use controller::{RedirectCompletion, SessionController};
pub use error::{AcquisitionFailure, Result, SessionError};
pub use guard::{AccessGuard, RouteDecision};
pub use token_cache::TokenCache;
pub use types::{
    has_role, highest_role, scope_key, AccessToken, AuthProgress, Role, SessionState,
};
