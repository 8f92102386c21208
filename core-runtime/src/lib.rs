//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Tarra dashboard core:
//! - Configuration management with fail-fast validation
//! - Event bus system
//! - Logging and tracing setup
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core crates depend
//! on. It establishes the configuration conventions, logging setup, and
//! event broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{DashboardConfig, RequestSettings, RoutePaths};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, FeedEvent, QueryGroup, SessionEvent};
