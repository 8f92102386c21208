//! # Event Bus System
//!
//! Event-driven backbone for the dashboard core using
//! `tokio::sync::broadcast`. Session lifecycle and live feed activity are
//! published here; views and host shells subscribe instead of polling.
//!
//! ## Overview
//!
//! - **Event Types**: strongly-typed enum hierarchies per domain
//! - **EventBus**: central broadcast channel for publishing events
//! - **EventStream**: wrapper for consuming events with filtering
//! - Multiple subscribers listen independently; slow subscribers receive
//!   `RecvError::Lagged` and can continue with new events.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, FeedEvent, QueryGroup};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Feed(FeedEvent::Invalidate {
//!         group: QueryGroup::SensorSummary,
//!     }))
//!     .ok();
//!
//! assert!(matches!(subscriber.recv().await, Ok(CoreEvent::Feed(_))));
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Balances memory usage against bursts (a chatty live feed can invalidate
/// many query groups in quick succession).
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the main event type published and received through the event
/// bus. The serde representation is stable so host shells can mirror events
/// across an FFI or message boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Session lifecycle events
    Session(SessionEvent),
    /// Live feed events
    Feed(FeedEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Feed(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Session(SessionEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::SignedIn { .. }) => EventSeverity::Info,
            CoreEvent::Session(SessionEvent::SignedOut) => EventSeverity::Info,
            CoreEvent::Feed(FeedEvent::Closed { .. }) => EventSeverity::Warning,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Session Events
// ============================================================================

/// Events related to the authentication session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// An authentication flow is in progress.
    SigningIn {
        /// The kind of flow ("redirect", "silent", "interactive").
        flow: String,
    },
    /// The user is signed in.
    SignedIn {
        /// Stable subject identifier of the account.
        subject: String,
        /// Sign-in name (usually an email address).
        username: String,
    },
    /// The user signed out.
    SignedOut,
    /// An access token was refreshed.
    TokenRefreshed {
        /// Scope key of the refreshed token.
        scope_key: String,
        /// Unix epoch seconds when the new token expires.
        expires_at: i64,
    },
    /// An authentication error occurred.
    AuthError {
        /// User-presentable message; provider internals stay in the logs.
        message: String,
        /// Whether the user can recover by signing in again.
        recoverable: bool,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::SigningIn { .. } => "Authentication in progress",
            SessionEvent::SignedIn { .. } => "User signed in successfully",
            SessionEvent::SignedOut => "User signed out",
            SessionEvent::TokenRefreshed { .. } => "Token refreshed successfully",
            SessionEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Feed Events
// ============================================================================

/// Cached query groups views subscribe to.
///
/// Invalidation is targeted: a stream message refreshes only the group it
/// belongs to, never the whole cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueryGroup {
    /// Fleet-wide sensor summary
    SensorSummary,
    /// Per-sensor reading history
    SensorReadings,
    /// Active alerts
    Alerts,
    /// Aggregated analytics
    Analytics,
}

/// Events related to the live feed connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum FeedEvent {
    /// Connection attempt started.
    Connecting,
    /// Connection established.
    Open,
    /// Connection closed.
    Closed {
        /// Transport-reported reason, if any.
        reason: Option<String>,
    },
    /// A recognised stream message arrived; refetch the named group.
    Invalidate {
        /// The query group to refresh.
        group: QueryGroup,
    },
}

impl FeedEvent {
    fn description(&self) -> &str {
        match self {
            FeedEvent::Connecting => "Feed connecting",
            FeedEvent::Open => "Feed connected",
            FeedEvent::Closed { .. } => "Feed closed",
            FeedEvent::Invalidate { .. } => "Cached data invalidated",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// `capacity` is the maximum number of events buffered per subscriber;
    /// a subscriber falling further behind receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are no active subscribers. Emitters treat that as
    /// benign: `bus.emit(event).ok()`.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all
    /// future events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// Views typically filter to the invalidation events for their query group:
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream, FeedEvent};
///
/// let event_bus = EventBus::new(100);
/// let stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Feed(FeedEvent::Invalidate { .. })));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function; only matching events are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, `RecvError::Closed` when all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
