//! The feed client: connection lifecycle and event pipeline.
//!
//! One logical task owns everything: the transport handle, the reader
//! store, the resolver, and the backoff counter. All message handling is
//! synchronous inside [`FeedClient::run`], so events are emitted in
//! transport delivery order, one at most per inbound message.

use crate::backoff::ReconnectBackoff;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{FeedTransport, TransportEvent, WebSocketTransport};
use tapfeed_core::{
    CardEvent, ExclusiveGroups, ExclusiveResolver, GroupConfig, ReaderMessage, ReaderStateStore,
};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Where the client currently is in its connection lifecycle.
///
/// `Disconnected → Connecting → Open → Disconnected (retry pending) → …`
/// with no terminal state; the client retries until shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; a retry may be pending.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and processing feed messages.
    Open,
}

/// Single registered consumer of emitted events, invoked synchronously.
pub type EventCallback = Box<dyn FnMut(CardEvent) + Send>;

/// Request a running [`FeedClient`] to stop.
#[derive(Debug)]
pub struct ShutdownHandle(watch::Sender<bool>);

impl ShutdownHandle {
    /// Flag the client to stop; `run` returns at its next suspension point.
    pub fn shutdown(&self) {
        let _ = self.0.send(true);
    }
}

/// Create a shutdown flag and the receiver `run` watches.
///
/// Dropping the handle without shutting down lets the client run forever,
/// which is the original fire-and-forget behavior.
pub fn shutdown_pair() -> (ShutdownHandle, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle(tx), rx)
}

/// Resolves once shutdown is requested; pends forever if it never is.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Presence-tracking client for the card reader push feed.
pub struct FeedClient {
    config: ClientConfig,
    transport: Box<dyn FeedTransport>,
    store: ReaderStateStore,
    resolver: ExclusiveResolver,
    backoff: ReconnectBackoff,
    state: ConnectionState,
    callback: EventCallback,
}

impl FeedClient {
    /// Build a client over the production WebSocket transport.
    ///
    /// The only fallible part is construction: an invalid configuration or
    /// a card mapped into two exclusive groups fails here, before any
    /// connection is attempted.
    pub fn new(
        config: ClientConfig,
        groups: Option<GroupConfig>,
        callback: impl FnMut(CardEvent) + Send + 'static,
    ) -> Result<Self, ClientError> {
        Self::with_transport(config, groups, Box::new(WebSocketTransport::new()), callback)
    }

    /// Build a client over a caller-supplied transport.
    pub fn with_transport(
        config: ClientConfig,
        groups: Option<GroupConfig>,
        transport: Box<dyn FeedTransport>,
        callback: impl FnMut(CardEvent) + Send + 'static,
    ) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::InvalidConfig)?;
        let compiled = ExclusiveGroups::compile(groups)?;

        Ok(Self {
            backoff: ReconnectBackoff::new(config.backoff.clone()),
            resolver: ExclusiveResolver::new(compiled),
            store: ReaderStateStore::new(),
            state: ConnectionState::Disconnected,
            callback: Box::new(callback),
            transport,
            config,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Card-per-reader state accumulated so far.
    pub fn readers(&self) -> &ReaderStateStore {
        &self.store
    }

    /// Drive the connection until shutdown is requested.
    ///
    /// Every connection loss, including a failed attempt, schedules a
    /// retry after `growth^min(n, cap) * base` and the loop continues;
    /// a successful open resets the counter. There is no terminal error.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            self.state = ConnectionState::Connecting;
            debug!(endpoint = %self.config.endpoint, "opening feed connection");

            let attempt = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                attempt = self
                    .transport
                    .connect(&self.config.endpoint, self.config.connect_timeout) => attempt,
            };

            match attempt {
                Ok(mut connection) => {
                    self.state = ConnectionState::Open;
                    self.backoff.reset();
                    info!(endpoint = %self.config.endpoint, "feed connection open");

                    loop {
                        let event = tokio::select! {
                            biased;
                            _ = shutdown_requested(&mut shutdown) => {
                                self.state = ConnectionState::Disconnected;
                                return;
                            }
                            event = connection.next_event() => event,
                        };

                        match event {
                            TransportEvent::Message(payload) => self.handle_message(&payload),
                            TransportEvent::Error(reason) => {
                                // Informational only; the close that follows
                                // drives the reconnect.
                                warn!(%reason, "feed transport error");
                            }
                            TransportEvent::Closed => {
                                info!("feed connection closed");
                                break;
                            }
                        }
                    }
                    // `connection` drops here: the superseded socket is torn
                    // down before the next attempt, never abandoned.
                }
                Err(error) => warn!(%error, "feed connection attempt failed"),
            }

            self.state = ConnectionState::Disconnected;
            let delay = self.backoff.record_failure();
            debug!(
                attempts = self.backoff.attempts(),
                delay_ms = delay.as_millis() as u64,
                "scheduling reconnect"
            );

            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = sleep(delay) => {}
            }
        }

        self.state = ConnectionState::Disconnected;
    }

    /// Decode one inbound payload and push it through the pipeline:
    /// store update, exclusive resolution, event assembly, callback.
    ///
    /// An undecodable payload is logged and dropped; the connection stays
    /// open and later messages are unaffected.
    fn handle_message(&mut self, payload: &str) {
        let message: ReaderMessage = match serde_json::from_str(payload) {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, payload, "dropping undecodable feed message");
                return;
            }
        };

        let previous = self.store.update(message.reader.clone(), message.card.clone());
        let resolution = self.resolver.resolve(
            &message.reader,
            previous.as_ref(),
            message.card.as_ref(),
            &self.store,
        );

        let event = CardEvent {
            reader: message.reader,
            id: message.card,
            previous_id: previous,
            readers: self.store.snapshot().clone(),
            not_exclusive: resolution.not_exclusive,
            exclusive_state: resolution.groups,
        };

        debug!(
            reader = %event.reader,
            card = event.id.as_ref().map_or("", |card| card.as_str()),
            not_exclusive = event.not_exclusive,
            "card event"
        );

        (self.callback)(event);
    }
}
