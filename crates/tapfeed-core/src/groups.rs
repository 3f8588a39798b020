//! Exclusive-group configuration and its compiled lookup tables.
//!
//! Configuration arrives in one of two shapes per group: an ordered card
//! sequence, or a card-to-value map whose key order defines the index. Both
//! are normalized once at construction into `ExclusiveGroups`; nothing is
//! re-checked on the hot path.

use crate::ids::{CardId, GroupId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One exclusive group, in either of the supported configuration shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupDefinition {
    /// Ordered card sequence; a card's position is both its index and its
    /// ordinal value.
    Sequence(Vec<CardId>),
    /// Card-to-value map; key order defines the index, the mapped value is
    /// the ordinal value (arbitrary JSON).
    Values(IndexMap<CardId, Value>),
}

/// Full exclusive-group configuration, keyed by group name.
///
/// An `IndexMap` so the configured group order is the stable iteration
/// order of every emitted snapshot.
pub type GroupConfig = IndexMap<GroupId, GroupDefinition>;

/// Exclusive-group configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupConfigError {
    /// A card may belong to at most one exclusive group.
    #[error("duplicate mapping for card {card}: already in group {existing}, cannot also join {conflicting}")]
    DuplicateCard {
        /// The card configured in more than one group
        card: CardId,
        /// The group that already claimed the card
        existing: GroupId,
        /// The group that tried to claim it again
        conflicting: GroupId,
    },
}

/// A card's place within its exclusive group.
#[derive(Debug, Clone)]
struct CardSlot {
    group: GroupId,
    index: usize,
    value: Value,
}

/// Lookup tables compiled once from a [`GroupConfig`].
///
/// Immutable after construction. Compiling an absent configuration yields
/// an empty table, which makes every exclusivity computation inert.
#[derive(Debug, Clone, Default)]
pub struct ExclusiveGroups {
    order: Vec<GroupId>,
    by_card: HashMap<CardId, CardSlot>,
}

impl ExclusiveGroups {
    /// Normalize a group configuration into lookup tables.
    ///
    /// Fails fast if any card appears in two groups; no partial state
    /// survives the error.
    pub fn compile(config: Option<GroupConfig>) -> Result<Self, GroupConfigError> {
        let mut order = Vec::new();
        let mut by_card: HashMap<CardId, CardSlot> = HashMap::new();

        for (group_id, definition) in config.into_iter().flatten() {
            let cards: Vec<(CardId, Value)> = match definition {
                GroupDefinition::Sequence(cards) => cards
                    .into_iter()
                    .enumerate()
                    .map(|(index, card)| (card, Value::from(index)))
                    .collect(),
                GroupDefinition::Values(values) => values.into_iter().collect(),
            };

            for (index, (card, value)) in cards.into_iter().enumerate() {
                if let Some(slot) = by_card.get(&card) {
                    return Err(GroupConfigError::DuplicateCard {
                        card,
                        existing: slot.group.clone(),
                        conflicting: group_id,
                    });
                }
                by_card.insert(
                    card,
                    CardSlot {
                        group: group_id.clone(),
                        index,
                        value,
                    },
                );
            }
            order.push(group_id);
        }

        Ok(Self { order, by_card })
    }

    /// The group a card belongs to, if any.
    pub fn group_of(&self, card: &CardId) -> Option<&GroupId> {
        self.by_card.get(card).map(|slot| &slot.group)
    }

    /// A card's index and ordinal value within its group.
    pub fn ordinal(&self, card: &CardId) -> Option<(usize, &Value)> {
        self.by_card.get(card).map(|slot| (slot.index, &slot.value))
    }

    /// Configured group names, in configuration order.
    pub fn group_ids(&self) -> impl Iterator<Item = &GroupId> {
        self.order.iter()
    }

    /// Number of configured groups.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no exclusivity was configured.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
