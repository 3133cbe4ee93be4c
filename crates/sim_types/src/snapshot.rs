//! Read-only views handed to scripts and published to clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sim_math::{Transform3D, Vec3};

use crate::anchor::Anchor;
use crate::ids::{EntityId, PlayerId};
use crate::state::{EntityData, PlayerState};

/// A live entity as seen from outside its own script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity ID.
    pub id: EntityId,
    /// Identity and state. Positions are parent-relative while anchored.
    pub data: EntityData,
    /// Current anchor, if any.
    pub anchor: Option<Anchor>,
    /// Transform resolved through the anchor chain.
    pub world_transform: Transform3D,
}

impl EntitySnapshot {
    /// World-space position of the entity.
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.world_transform.position
    }
}

/// A live player as published in the tick snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player ID.
    pub id: PlayerId,
    /// Current state.
    pub state: PlayerState,
    /// Entities anchored to the player, by slot, in ID order.
    pub attached_entities: BTreeMap<String, Vec<EntityId>>,
}

/// A positional sound requested by a script during the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEvent {
    /// Sound asset name.
    pub sound_id: String,
    /// World-space origin.
    pub position: Vec3,
    /// Linear volume.
    pub volume: f32,
}
