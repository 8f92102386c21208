//! Request failure taxonomy.
//!
//! Every failed request collapses into one [`RequestFailure`] variant with
//! a stable user-presentable message. Raw transport errors and response
//! bodies stay in the logs.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RequestFailure>;

/// Why a request ultimately failed, after any retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// The transport never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The server throttled us (HTTP 429)
    #[error("Rate limited by the server")]
    RateLimited,

    /// A non-retryable caller error (HTTP 4xx other than 429)
    #[error("Request rejected with status {status}")]
    ClientError { status: u16, detail: Option<String> },

    /// The server failed (HTTP 5xx)
    #[error("Server error with status {status}")]
    ServerError { status: u16 },

    /// The response arrived but its body was not what we expected
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RequestFailure {
    /// Whether retrying the same request can plausibly succeed.
    ///
    /// Client errors and decode failures are deterministic; retrying them
    /// only repeats the failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RequestFailure::Network(_)
                | RequestFailure::RateLimited
                | RequestFailure::ServerError { .. }
        )
    }

    /// A message safe to show to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            RequestFailure::Network(_) => {
                "Could not reach the server. Check your connection and try again."
            }
            RequestFailure::RateLimited => "Too many requests. Please wait a moment and try again.",
            RequestFailure::ClientError { status: 400, .. } => {
                "The request was invalid. Please check your input."
            }
            RequestFailure::ClientError { status: 401, .. } => {
                "Authentication is required. Please sign in."
            }
            RequestFailure::ClientError { status: 403, .. } => {
                "You do not have permission to do that."
            }
            RequestFailure::ClientError { status: 404, .. } => {
                "The requested item could not be found."
            }
            RequestFailure::ClientError { .. } => "The request could not be completed.",
            RequestFailure::ServerError { .. } => {
                "The server encountered an error. Please try again later."
            }
            RequestFailure::Decode(_) => "Received an unexpected response from the server.",
        }
    }
}
