//! Resilient client for the NFC card reader push feed.
//!
//! Wraps the presence logic of `tapfeed-core` in a connection lifecycle:
//! a WebSocket transport, exponential reconnect backoff, and a single
//! long-running loop that decodes feed messages and hands each resulting
//! [`tapfeed_core::CardEvent`] to one registered callback.

pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod transport;

pub use backoff::ReconnectBackoff;
pub use client::{shutdown_pair, ConnectionState, EventCallback, FeedClient, ShutdownHandle};
pub use config::{BackoffConfig, ClientConfig, DEFAULT_ENDPOINT};
pub use error::ClientError;
pub use memory::MemoryTransport;
pub use transport::{FeedConnection, FeedTransport, TransportEvent, WebSocketTransport};
