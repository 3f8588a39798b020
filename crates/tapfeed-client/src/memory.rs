//! In-memory transport for tests and simulation.
//!
//! Each `connect` serves the next scripted connection; a connection replays
//! its events in order and then pends forever, so scripts end with an
//! explicit [`TransportEvent::Closed`] when the client should reconnect.

use crate::error::ClientError;
use crate::transport::{FeedConnection, FeedTransport, TransportEvent};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted transport: a queue of connection scripts.
#[derive(Debug)]
pub struct MemoryTransport {
    scripts: VecDeque<Vec<TransportEvent>>,
    connects: Arc<AtomicUsize>,
}

impl MemoryTransport {
    /// Create a transport serving the given connection scripts in order.
    pub fn new(scripts: Vec<Vec<TransportEvent>>) -> Self {
        Self {
            scripts: scripts.into(),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of connection attempts, for assertions.
    pub fn connect_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }
}

#[async_trait]
impl FeedTransport for MemoryTransport {
    async fn connect(
        &mut self,
        endpoint: &str,
        _connect_timeout: Duration,
    ) -> Result<Box<dyn FeedConnection>, ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.scripts.pop_front() {
            Some(events) => Ok(Box::new(MemoryConnection {
                events: events.into(),
            })),
            None => Err(ClientError::ConnectFailed {
                endpoint: endpoint.to_string(),
                reason: "no scripted connection left".to_string(),
            }),
        }
    }
}

struct MemoryConnection {
    events: VecDeque<TransportEvent>,
}

#[async_trait]
impl FeedConnection for MemoryConnection {
    async fn next_event(&mut self) -> TransportEvent {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}
