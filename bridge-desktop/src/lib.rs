//! # Tarra Desktop Bridge
//!
//! Desktop implementations of the platform bridge traits: a reqwest-backed
//! HTTP transport and a process-local session store.
//!
//! Identity, navigation and streaming remain host concerns; desktop shells
//! supply their own `IdentityProvider`, `Navigator` and `StreamTransport`
//! implementations wired to whatever webview or SDK they embed.

pub mod http;
pub mod storage;

pub use http::ReqwestHttpClient;
pub use storage::MemorySessionStore;
