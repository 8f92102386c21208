//! # Tarra Feed Core
//!
//! Live data feed for the dashboard: a single streaming connection with a
//! `Closed → Connecting → Open` state machine, envelope parsing and
//! targeted query-group invalidation over the event bus.

pub mod error;
pub mod manager;

pub use error::{FeedError, Result};
pub use manager::{FeedManager, FeedStatus, ReconnectPolicy};
