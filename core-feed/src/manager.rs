//! Live Feed Manager
//!
//! Owns the single streaming connection to the dashboard's live endpoint.
//! Inbound messages are `{type, payload}` envelopes; recognised types
//! invalidate only their query group on the event bus, everything else is
//! logged and dropped. A malformed message never takes the connection down.

use crate::error::{FeedError, Result};
use bridge_traits::stream::{StreamConnection, StreamTransport};
use bridge_traits::time::{Sleeper, TokioSleeper};
use core_runtime::config::DashboardConfig;
use core_runtime::events::{CoreEvent, EventBus, FeedEvent, QueryGroup};
use serde::Deserialize;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Connection state of the live feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Closed,
    Connecting,
    Open,
}

/// Optional reconnect behaviour.
///
/// When attached, failed connects (initial or after a drop) are retried up
/// to `max_attempts` times with a fixed delay between attempts. Without a
/// policy the feed stays `Closed` after a drop and the caller decides.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Manages the live feed connection and its read loop.
///
/// At most one connection is live; `start` replaces any existing one.
pub struct FeedManager {
    transport: Arc<dyn StreamTransport>,
    sleeper: Arc<dyn Sleeper>,
    events: EventBus,
    stream_url: String,
    reconnect: Option<ReconnectPolicy>,
    status: Arc<StdMutex<FeedStatus>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FeedManager {
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        events: EventBus,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            events,
            stream_url: config.stream_url.to_string(),
            reconnect: None,
            status: Arc::new(StdMutex::new(FeedStatus::Closed)),
            task: Mutex::new(None),
        }
    }

    /// Attach a reconnect policy.
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    /// Current connection status.
    pub fn status(&self) -> FeedStatus {
        match self.status.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Connect and start consuming messages.
    ///
    /// Any existing connection is torn down first. On success a background
    /// read loop runs until the connection drops or [`stop`](Self::stop) is
    /// called.
    ///
    /// # Errors
    ///
    /// `FeedError::ConnectFailed` when the connection cannot be established
    /// (after exhausting the reconnect policy, if one is attached).
    #[instrument(skip(self), fields(url = %self.stream_url))]
    pub async fn start(&self) -> Result<()> {
        self.stop().await;

        let shared = SharedFeed {
            transport: self.transport.clone(),
            sleeper: self.sleeper.clone(),
            events: self.events.clone(),
            stream_url: self.stream_url.clone(),
            reconnect: self.reconnect,
            status: self.status.clone(),
        };

        let connection = match shared.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                shared.set_status(FeedStatus::Closed);
                shared.emit(FeedEvent::Closed {
                    reason: Some(e.to_string()),
                });
                return Err(e);
            }
        };

        shared.set_status(FeedStatus::Open);
        shared.emit(FeedEvent::Open);
        info!("Live feed connected");

        let task = tokio::spawn(async move { shared.run(connection).await });
        *self.task.lock().await = Some(task);
        Ok(())
    }

    /// Tear down the connection, if any. Idempotent.
    ///
    /// Aborting the read loop drops the connection, which is how the
    /// transport closes it (see [`StreamConnection`]); awaiting the
    /// aborted task means the socket is released before `stop` returns.
    pub async fn stop(&self) {
        let Some(task) = self.task.lock().await.take() else {
            return;
        };

        task.abort();
        task.await.ok();
        match self.status.lock() {
            Ok(mut guard) => *guard = FeedStatus::Closed,
            Err(poisoned) => *poisoned.into_inner() = FeedStatus::Closed,
        }
        self.events
            .emit(CoreEvent::Feed(FeedEvent::Closed { reason: None }))
            .ok();
        info!("Live feed stopped");
    }
}

/// Everything the background read loop needs, detached from the manager.
struct SharedFeed {
    transport: Arc<dyn StreamTransport>,
    sleeper: Arc<dyn Sleeper>,
    events: EventBus,
    stream_url: String,
    reconnect: Option<ReconnectPolicy>,
    status: Arc<StdMutex<FeedStatus>>,
}

impl SharedFeed {
    /// Establish a connection, honouring the reconnect policy.
    async fn connect(&self) -> Result<Box<dyn StreamConnection>> {
        self.set_status(FeedStatus::Connecting);
        self.emit(FeedEvent::Connecting);

        let mut attempt = 0u32;
        loop {
            match self.transport.connect(&self.stream_url).await {
                Ok(connection) => return Ok(connection),
                Err(e) => {
                    let Some(policy) = self.reconnect else {
                        warn!(error = %e, "Feed connection failed");
                        return Err(FeedError::ConnectFailed(e.to_string()));
                    };
                    if attempt >= policy.max_attempts {
                        warn!(error = %e, attempt, "Feed connection failed, retries exhausted");
                        return Err(FeedError::ConnectFailed(e.to_string()));
                    }
                    attempt += 1;
                    warn!(error = %e, attempt, "Feed connection failed, retrying");
                    self.sleeper.sleep(policy.delay).await;
                }
            }
        }
    }

    /// Read loop: consume until the connection drops, then either
    /// reconnect (policy attached) or go `Closed` and stay there.
    async fn run(&self, mut connection: Box<dyn StreamConnection>) {
        loop {
            let reason = loop {
                match connection.next_message().await {
                    Ok(Some(raw)) => handle_message(&self.events, &raw),
                    Ok(None) => break None,
                    Err(e) => break Some(e.to_string()),
                }
            };

            warn!(reason = ?reason, "Live feed disconnected");
            self.set_status(FeedStatus::Closed);
            self.emit(FeedEvent::Closed { reason });

            if self.reconnect.is_none() {
                return;
            }
            match self.connect().await {
                Ok(next) => {
                    connection = next;
                    self.set_status(FeedStatus::Open);
                    self.emit(FeedEvent::Open);
                    info!("Live feed reconnected");
                }
                Err(_) => {
                    self.set_status(FeedStatus::Closed);
                    return;
                }
            }
        }
    }

    fn set_status(&self, status: FeedStatus) {
        match self.status.lock() {
            Ok(mut guard) => *guard = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }

    fn emit(&self, event: FeedEvent) {
        self.events.emit(CoreEvent::Feed(event)).ok();
    }
}

/// Stream message envelope; only the discriminator matters here.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

/// Parse one raw message and publish a targeted invalidation.
///
/// Unparsable or unrecognised messages are dropped; the connection is
/// never affected by bad payloads.
fn handle_message(events: &EventBus, raw: &str) {
    let envelope: Envelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Dropping unparsable stream message");
            return;
        }
    };

    let Some(group) = group_for(&envelope.kind) else {
        debug!(kind = %envelope.kind, "Ignoring unknown stream message type");
        return;
    };

    debug!(kind = %envelope.kind, ?group, "Invalidating query group");
    events
        .emit(CoreEvent::Feed(FeedEvent::Invalidate { group }))
        .ok();
}

fn group_for(kind: &str) -> Option<QueryGroup> {
    match kind {
        "sensor_summary" => Some(QueryGroup::SensorSummary),
        "sensor_reading" => Some(QueryGroup::SensorReadings),
        "alert" => Some(QueryGroup::Alerts),
        "analytics" => Some(QueryGroup::Analytics),
        _ => None,
    }
}
