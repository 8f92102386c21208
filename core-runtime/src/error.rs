//! Fatal error taxonomy for the runtime crate.
//!
//! These are startup-time faults: a deployment that hits one cannot run
//! and must fail loudly with an actionable message. Recoverable failures
//! live with their subsystems (`SessionError`, `RequestFailure`,
//! `FeedError`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration. The message names the setting
    /// and how to fix it.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A runtime facility could not be initialised (for example a tracing
    /// subscriber already installed).
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
