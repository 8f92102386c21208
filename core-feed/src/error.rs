//! Feed error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The transport could not establish a connection
    #[error("Failed to connect to the live feed: {0}")]
    ConnectFailed(String),
}
