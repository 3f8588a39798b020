//! Last-known card state per reader.
//!
//! An owned map with a single mutation entry point, instead of the ambient
//! shared dictionary the behavior was first described with. The store grows
//! monotonically: a reader is added the first time it reports and is never
//! removed.

use crate::ids::{CardId, ReaderId};
use std::collections::HashMap;

/// Current card (or absence) for every reader seen so far.
///
/// A missing entry means "never seen"; an entry holding `None` means the
/// reader reported that no card is present.
#[derive(Debug, Clone, Default)]
pub struct ReaderStateStore {
    readers: HashMap<ReaderId, Option<CardId>>,
}

impl ReaderStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The card currently recorded for `reader`, without mutating.
    ///
    /// Named for its role in message handling: called logically before
    /// [`update`](Self::update), it is the card the new report replaces.
    /// `None` covers both a never-seen reader and a reader holding no card.
    pub fn previous(&self, reader: &ReaderId) -> Option<&CardId> {
        self.readers.get(reader).and_then(|card| card.as_ref())
    }

    /// Record a new report and return the value it replaced.
    ///
    /// This is the single mutation point of the whole client per inbound
    /// message.
    pub fn update(&mut self, reader: ReaderId, card: Option<CardId>) -> Option<CardId> {
        self.readers.insert(reader, card).flatten()
    }

    /// Read-only view of the full current state.
    pub fn snapshot(&self) -> &HashMap<ReaderId, Option<CardId>> {
        &self.readers
    }

    /// Number of readers ever seen.
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// True until the first report arrives.
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}
