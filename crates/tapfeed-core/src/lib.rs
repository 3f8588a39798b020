//! Core presence-tracking logic for the tapfeed client.
//!
//! Everything in this crate is synchronous and allocation-light: identifier
//! newtypes, the exclusive-group configuration compiler, the per-reader
//! state store, the exclusive-group resolver, and the wire/event types.
//! The connection lifecycle lives in `tapfeed-client`.

pub mod event;
pub mod groups;
pub mod ids;
pub mod readers;
pub mod resolver;

pub use event::{CardEvent, GroupChange, GroupSnapshot, ReaderMessage};
pub use groups::{ExclusiveGroups, GroupConfig, GroupConfigError, GroupDefinition};
pub use ids::{CardId, GroupId, ReaderId};
pub use readers::ReaderStateStore;
pub use resolver::{ExclusiveResolver, Resolution};
