//! Wire types: the inbound feed message and the outbound card event.
//!
//! The feed speaks a one-object JSON protocol: `{"reader": "...", "card":
//! "..."}` where an omitted or empty `card` means no card is present. The
//! emitted [`CardEvent`] keeps the historical field names (`previousId`,
//! `notExclusive`, `exclusiveState`) so existing consumers keep working.

use crate::ids::{CardId, GroupId, ReaderId};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// One inbound message from the feed: which card (if any) a reader sees.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReaderMessage {
    /// Reader the report comes from.
    pub reader: ReaderId,
    /// Card present at the reader; omitted, `null`, or `""` all mean none.
    #[serde(default, deserialize_with = "card_or_absent")]
    pub card: Option<CardId>,
}

fn card_or_absent<'de, D>(deserializer: D) -> Result<Option<CardId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|card| !card.is_empty()).map(CardId))
}

/// How one exclusive group was affected by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChange {
    /// The group's active card was (re)claimed by this event.
    New,
    /// The group's active card went away and nothing replaced it.
    Removed,
    /// The event did not touch this group.
    Unchanged,
}

// Historical wire encoding: "new" | "removed" | false.
impl Serialize for GroupChange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            GroupChange::New => serializer.serialize_str("new"),
            GroupChange::Removed => serializer.serialize_str("removed"),
            GroupChange::Unchanged => serializer.serialize_bool(false),
        }
    }
}

/// State of one exclusive group after an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    /// Group name, repeated inside the entry for standalone consumers.
    pub name: GroupId,
    /// Reader currently holding the group's active card, if any.
    pub reader: Option<ReaderId>,
    /// That reader's current card, if any.
    pub id: Option<CardId>,
    /// Whether this event claimed or released the group.
    pub changed: GroupChange,
    /// Index of the active card within the group definition.
    pub index: Option<usize>,
    /// Ordinal value of the active card within the group definition.
    pub value: Option<Value>,
}

/// One outbound event, emitted per processed inbound message.
///
/// Transient: the client hands it to the event callback and retains
/// nothing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEvent {
    /// Reader the triggering report came from.
    pub reader: ReaderId,
    /// Card now present at that reader; serialized as `""` when absent.
    #[serde(serialize_with = "card_or_empty")]
    pub id: Option<CardId>,
    /// Card previously recorded for that reader; `""` when the reader was
    /// never seen or held no card.
    #[serde(serialize_with = "card_or_empty")]
    pub previous_id: Option<CardId>,
    /// Full card-per-reader snapshot after this event.
    #[serde(serialize_with = "readers_or_empty")]
    pub readers: HashMap<ReaderId, Option<CardId>>,
    /// True when a card is present but belongs to no exclusive group.
    pub not_exclusive: bool,
    /// Per-group state, in configuration order.
    pub exclusive_state: IndexMap<GroupId, GroupSnapshot>,
}

fn card_or_empty<S>(card: &Option<CardId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(card.as_ref().map(CardId::as_str).unwrap_or(""))
}

fn readers_or_empty<S>(
    readers: &HashMap<ReaderId, Option<CardId>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(readers.len()))?;
    for (reader, card) in readers {
        map.serialize_entry(
            reader.as_str(),
            card.as_ref().map(CardId::as_str).unwrap_or(""),
        )?;
    }
    map.end()
}
