//! # Tarra Dashboard Core
//!
//! Platform-agnostic core for the Tarra operations dashboard: session
//! lifecycle, route gating, token acquisition, resilient API access and
//! the live data feed. Host shells (web, desktop) supply the platform
//! bridges; everything above the bridge traits is shared.
//!
//! This crate is a facade re-exporting the workspace members:
//!
//! - [`bridge`]: platform abstraction traits
//! - [`runtime`]: configuration, events, logging
//! - [`session`]: sign-in lifecycle, access guard, token broker
//! - [`client`]: authenticated HTTP with retries
//! - [`feed`]: live feed connection and cache invalidation
//! - [`desktop`]: desktop bridge implementations (feature `desktop`)

pub use bridge_traits as bridge;
pub use core_client as client;
pub use core_feed as feed;
pub use core_runtime as runtime;
pub use core_session as session;

#[cfg(feature = "desktop")]
pub use bridge_desktop as desktop;
