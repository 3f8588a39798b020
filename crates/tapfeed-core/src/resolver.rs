//! Exclusive-group resolution for one reader transition at a time.
//!
//! The resolver owns the per-group affiliation state (which reader, if any,
//! currently holds the active card of each group) and mutates it only as a
//! side effect of [`ExclusiveResolver::resolve`].

use crate::event::{GroupChange, GroupSnapshot};
use crate::groups::ExclusiveGroups;
use crate::ids::{CardId, GroupId, ReaderId};
use crate::readers::ReaderStateStore;
use indexmap::IndexMap;

/// Outcome of resolving one reader transition.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// True when a card is present and belongs to no configured group.
    /// A no-card report leaves this false: absence is not a non-exclusive
    /// card.
    pub not_exclusive: bool,
    /// Per-group snapshot, in configuration order.
    pub groups: IndexMap<GroupId, GroupSnapshot>,
}

/// Tracks which reader holds each exclusive group's active card.
#[derive(Debug, Clone)]
pub struct ExclusiveResolver {
    groups: ExclusiveGroups,
    affiliations: IndexMap<GroupId, Option<ReaderId>>,
}

impl ExclusiveResolver {
    /// Build a resolver with every group unaffiliated.
    pub fn new(groups: ExclusiveGroups) -> Self {
        let affiliations = groups
            .group_ids()
            .map(|group| (group.clone(), None))
            .collect();
        Self {
            groups,
            affiliations,
        }
    }

    /// The reader currently affiliated with `group`, if any.
    pub fn affiliation(&self, group: &GroupId) -> Option<&ReaderId> {
        self.affiliations
            .get(group)
            .and_then(|reader| reader.as_ref())
    }

    /// True when no exclusivity was configured; resolve is then inert.
    pub fn is_inert(&self) -> bool {
        self.groups.is_empty()
    }

    /// Apply one (reader, previous card, new card) transition.
    ///
    /// The previous card's group loses its affiliation first; the new
    /// card's group is then claimed for `reader`. When both are the same
    /// group the claim wins and the snapshot tags it `"new"` only.
    /// `store` must already hold the post-transition state, because the
    /// snapshot resolves each affiliated reader's current card through it.
    pub fn resolve(
        &mut self,
        reader: &ReaderId,
        previous: Option<&CardId>,
        current: Option<&CardId>,
        store: &ReaderStateStore,
    ) -> Resolution {
        let mut not_exclusive = current.is_some();
        let mut removed_group: Option<GroupId> = None;
        let mut new_group: Option<GroupId> = None;

        if let Some(group) = previous.and_then(|card| self.groups.group_of(card)) {
            removed_group = Some(group.clone());
        }
        if let Some(group) = removed_group.as_ref() {
            if let Some(slot) = self.affiliations.get_mut(group) {
                *slot = None;
            }
        }

        if let Some(card) = current {
            if let Some(group) = self.groups.group_of(card) {
                not_exclusive = false;
                new_group = Some(group.clone());
            }
            if let Some(group) = new_group.as_ref() {
                if let Some(slot) = self.affiliations.get_mut(group) {
                    *slot = Some(reader.clone());
                }
            }
        }

        let mut groups = IndexMap::with_capacity(self.affiliations.len());
        for (group_id, holder) in &self.affiliations {
            let changed = if new_group.as_ref() == Some(group_id) {
                GroupChange::New
            } else if removed_group.as_ref() == Some(group_id) {
                GroupChange::Removed
            } else {
                GroupChange::Unchanged
            };

            let card = holder
                .as_ref()
                .and_then(|reader| store.previous(reader))
                .cloned();
            let ordinal = card.as_ref().and_then(|card| self.groups.ordinal(card));

            groups.insert(
                group_id.clone(),
                GroupSnapshot {
                    name: group_id.clone(),
                    reader: holder.clone(),
                    id: card,
                    changed,
                    index: ordinal.map(|(index, _)| index),
                    value: ordinal.map(|(_, value)| value.clone()),
                },
            );
        }

        Resolution {
            not_exclusive,
            groups,
        }
    }
}
