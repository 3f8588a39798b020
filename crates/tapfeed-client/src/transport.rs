//! Receive-only transport abstraction over the push feed.
//!
//! The feed never expects anything from the client, so the contract is
//! deliberately small: open a connection, then pull notifications until it
//! reports closed. `WebSocketTransport` is the production implementation;
//! [`crate::memory::MemoryTransport`] serves tests and simulation.

use crate::error::ClientError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Notification delivered by an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound payload, expected to be a JSON feed message.
    Message(String),
    /// Transport-level error. Informational only; the connection reports
    /// `Closed` separately when it is actually gone.
    Error(String),
    /// The connection is gone. The caller decides whether to reconnect.
    Closed,
}

/// Opens connections to the feed.
#[async_trait]
pub trait FeedTransport: Send {
    /// Open one connection to `endpoint`.
    async fn connect(
        &mut self,
        endpoint: &str,
        connect_timeout: Duration,
    ) -> Result<Box<dyn FeedConnection>, ClientError>;
}

/// One open, receive-only feed connection.
///
/// Dropping the connection tears down the underlying socket; superseded
/// connections are never left dangling across a reconnect.
#[async_trait]
pub trait FeedConnection: Send {
    /// Wait for the next notification.
    async fn next_event(&mut self) -> TransportEvent;
}

/// Production transport speaking WebSocket via tungstenite.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Create a new WebSocket transport.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FeedTransport for WebSocketTransport {
    async fn connect(
        &mut self,
        endpoint: &str,
        connect_timeout: Duration,
    ) -> Result<Box<dyn FeedConnection>, ClientError> {
        let (stream, _response) = timeout(connect_timeout, connect_async(endpoint))
            .await
            .map_err(|_| ClientError::ConnectTimeout {
                endpoint: endpoint.to_string(),
            })?
            .map_err(|e| ClientError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(WebSocketConnection {
            stream,
            failed: false,
        }))
    }
}

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    // After a stream error the socket is unusable; report Closed next.
    failed: bool,
}

#[async_trait]
impl FeedConnection for WebSocketConnection {
    async fn next_event(&mut self) -> TransportEvent {
        if self.failed {
            return TransportEvent::Closed;
        }

        loop {
            match self.stream.next().await {
                None => return TransportEvent::Closed,
                Some(Err(e)) => {
                    self.failed = true;
                    return TransportEvent::Error(e.to_string());
                }
                Some(Ok(message)) => match message {
                    Message::Text(text) => return TransportEvent::Message(text),
                    Message::Binary(data) => match String::from_utf8(data) {
                        Ok(text) => return TransportEvent::Message(text),
                        Err(_) => {
                            return TransportEvent::Error(
                                "non-UTF-8 binary payload".to_string(),
                            )
                        }
                    },
                    Message::Ping(data) => {
                        // tungstenite queues the pong; flush it here since
                        // this client otherwise never writes.
                        let _ = self.stream.send(Message::Pong(data)).await;
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => return TransportEvent::Closed,
                    Message::Frame(_) => {}
                },
            }
        }
    }
}
