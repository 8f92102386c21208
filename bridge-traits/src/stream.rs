//! Streaming Transport Abstraction
//!
//! Message-oriented push channel (WebSocket or equivalent). The transport
//! delivers raw text frames; envelope parsing and routing happen in the
//! feed layer.

use async_trait::async_trait;

use crate::error::Result;

/// An established streaming connection.
///
/// Dropping the connection closes it: implementations release the socket
/// in `Drop`, so owners tear down by letting the box go out of scope.
#[async_trait]
pub trait StreamConnection: Send {
    /// Wait for the next message.
    ///
    /// Returns `Ok(None)` on clean close; `Err` on transport failure.
    async fn next_message(&mut self) -> Result<Option<String>>;
}

/// Streaming transport trait
///
/// `connect` resolves once the handshake completes, or fails with a
/// transport error.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn StreamConnection>>;
}
