//! Attachment relationships.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, PlayerId};

/// Something an entity can be anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnchorParent {
    /// A player's named slot (e.g. `"hand_right_anchor"`).
    Player(PlayerId),
    /// Another, unanchored, entity.
    Entity(EntityId),
}

impl fmt::Display for AnchorParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorParent::Player(id) => id.fmt(f),
            AnchorParent::Entity(id) => id.fmt(f),
        }
    }
}

impl From<PlayerId> for AnchorParent {
    fn from(id: PlayerId) -> Self {
        AnchorParent::Player(id)
    }
}

impl From<EntityId> for AnchorParent {
    fn from(id: EntityId) -> Self {
        AnchorParent::Entity(id)
    }
}

/// An entity's attachment to a parent slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    /// The parent holding the entity.
    pub parent: AnchorParent,
    /// Name of the slot on the parent.
    pub slot: String,
}

impl Anchor {
    /// Create an anchor.
    #[must_use]
    pub fn new(parent: impl Into<AnchorParent>, slot: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            slot: slot.into(),
        }
    }
}
