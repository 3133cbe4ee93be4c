//! The anchor graph: which entity is attached to which parent slot.
//!
//! Parents are players or unanchored entities, and an entity that holds
//! children cannot itself be anchored. The graph is therefore a forest of
//! depth at most two and can never contain a cycle. A reverse index from
//! parent to children makes cascade detaches cheap.

use std::collections::{BTreeMap, BTreeSet};

use sim_types::{Anchor, AnchorParent, EntityId};
use thiserror::Error;

/// Reasons an anchor request is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("{0} cannot be anchored to itself")]
    SelfAnchor(EntityId),
    #[error("{entity} is already anchored to {parent}; detach it first")]
    AlreadyAnchored {
        entity: EntityId,
        parent: AnchorParent,
    },
    #[error("parent {0} is itself anchored")]
    ParentAnchored(EntityId),
    #[error("{0} has entities anchored to it")]
    HasChildren(EntityId),
}

/// Outcome of a successful anchor request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorChange {
    /// The entity was unanchored and is now attached.
    Attached,
    /// The entity was already in that slot.
    Unchanged,
    /// The entity moved to another slot on the same parent.
    MovedSlot,
}

/// Attachment relationships between entities and their parents.
#[derive(Debug, Default, Clone)]
pub struct AnchorGraph {
    anchors: BTreeMap<EntityId, Anchor>,
    children: BTreeMap<AnchorParent, BTreeSet<EntityId>>,
}

impl AnchorGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor `entity` to `anchor`. Liveness of both sides is the caller's
    /// concern.
    ///
    /// # Errors
    ///
    /// Returns an [`AnchorError`] if the request would break the graph's
    /// shape. The graph is unchanged in that case.
    pub fn anchor(&mut self, entity: EntityId, anchor: Anchor) -> Result<AnchorChange, AnchorError> {
        if anchor.parent == AnchorParent::Entity(entity) {
            return Err(AnchorError::SelfAnchor(entity));
        }
        if let Some(current) = self.anchors.get_mut(&entity) {
            if current.parent != anchor.parent {
                return Err(AnchorError::AlreadyAnchored {
                    entity,
                    parent: current.parent,
                });
            }
            if current.slot == anchor.slot {
                return Ok(AnchorChange::Unchanged);
            }
            current.slot = anchor.slot;
            return Ok(AnchorChange::MovedSlot);
        }
        if let AnchorParent::Entity(parent) = anchor.parent
            && self.anchors.contains_key(&parent)
        {
            return Err(AnchorError::ParentAnchored(parent));
        }
        if self.has_children(AnchorParent::Entity(entity)) {
            return Err(AnchorError::HasChildren(entity));
        }

        self.children.entry(anchor.parent).or_default().insert(entity);
        self.anchors.insert(entity, anchor);
        Ok(AnchorChange::Attached)
    }

    /// Clear `entity`'s anchor. Returns the anchor it had.
    pub fn detach(&mut self, entity: EntityId) -> Option<Anchor> {
        let anchor = self.anchors.remove(&entity)?;
        if let Some(siblings) = self.children.get_mut(&anchor.parent) {
            siblings.remove(&entity);
            if siblings.is_empty() {
                self.children.remove(&anchor.parent);
            }
        }
        Some(anchor)
    }

    /// Detach every child of `parent`. Returns the detached entities in ID
    /// order.
    pub fn detach_all_from(&mut self, parent: AnchorParent) -> Vec<EntityId> {
        let children = self.children.remove(&parent).unwrap_or_default();
        for child in &children {
            self.anchors.remove(child);
        }
        children.into_iter().collect()
    }

    /// The anchor of `entity`, if any.
    #[must_use]
    pub fn anchor_of(&self, entity: EntityId) -> Option<&Anchor> {
        self.anchors.get(&entity)
    }

    /// Returns `true` if anything is anchored to `parent`.
    #[must_use]
    pub fn has_children(&self, parent: AnchorParent) -> bool {
        self.children.get(&parent).is_some_and(|c| !c.is_empty())
    }

    /// Children of `parent` grouped by slot, each slot in ID order.
    #[must_use]
    pub fn slots_of(&self, parent: AnchorParent) -> BTreeMap<String, Vec<EntityId>> {
        let mut slots: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        for child in self.children.get(&parent).into_iter().flatten() {
            if let Some(anchor) = self.anchors.get(child) {
                slots.entry(anchor.slot.clone()).or_default().push(*child);
            }
        }
        slots
    }

    /// Every anchored entity and its anchor, in entity ID order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Anchor)> {
        self.anchors.iter().map(|(id, anchor)| (*id, anchor))
    }

    /// Number of anchored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns `true` if nothing is anchored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Check the forward and reverse indices agree and the depth rule holds.
    ///
    /// # Panics
    ///
    /// Panics on any inconsistency. The graph only changes through the
    /// methods above, so this indicates a bug in the simulation core.
    pub fn assert_consistent(&self) {
        for (child, anchor) in &self.anchors {
            assert!(
                self.children
                    .get(&anchor.parent)
                    .is_some_and(|c| c.contains(child)),
                "anchor graph: {child} missing from children of {}",
                anchor.parent
            );
            if let AnchorParent::Entity(parent) = anchor.parent {
                assert!(
                    !self.anchors.contains_key(&parent),
                    "anchor graph: parent {parent} of {child} is anchored"
                );
                assert!(parent != *child, "anchor graph: {child} anchored to itself");
            }
        }
        for (parent, children) in &self.children {
            assert!(!children.is_empty(), "anchor graph: empty child set for {parent}");
            for child in children {
                assert_eq!(
                    self.anchors.get(child).map(|a| a.parent),
                    Some(*parent),
                    "anchor graph: reverse index of {parent} lists {child}"
                );
            }
        }
    }
}
