//! Bridge Traits
//!
//! Host-capability abstractions for the Tarra dashboard core. The core
//! crates depend only on these traits; hosts (native shell, test harness)
//! supply the implementations.
//!
//! | Trait | Capability |
//! |-------|------------|
//! | [`identity::IdentityProvider`] | Identity SDK: sign-in, tokens, lifecycle |
//! | [`navigation::Navigator`] | Browser location and navigation |
//! | [`storage::SessionStore`] | Session-scoped key-value storage |
//! | [`http::HttpClient`] | Single-shot HTTP transport |
//! | [`stream::StreamTransport`] | Message-oriented push channel |
//! | [`time::Clock`], [`time::Sleeper`] | Time source and async delay |
//!
//! # Error strategy
//!
//! Every fallible operation returns [`error::BridgeError`]. Bridges report
//! failures honestly and immediately; recovery policy (retry, degrade,
//! state transitions) lives in the core crates, never in a bridge.

pub mod error;
pub mod http;
pub mod identity;
pub mod navigation;
pub mod storage;
pub mod stream;
pub mod time;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use identity::{
    Identity, IdentityProvider, LifecycleEvent, LifecycleObserver, RawToken, SubscriptionId,
};
pub use navigation::{BrowserLocation, Navigator};
pub use storage::SessionStore;
pub use stream::{StreamConnection, StreamTransport};
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};
