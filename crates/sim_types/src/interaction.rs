//! Interaction events queued against entities.

use serde::{Deserialize, Serialize};
use sim_math::Vec3;

use crate::custom::CustomState;
use crate::ids::{EntityId, PlayerId};

/// Who caused an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Initiator {
    /// A player (e.g. pulling a trigger).
    Player(PlayerId),
    /// Another entity.
    Entity(EntityId),
    /// The world script (e.g. resetting a captured flag).
    World,
}

/// A transient, single-delivery event against a target entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Who caused it.
    pub initiator: Initiator,
    /// Where it happened.
    pub position: Vec3,
    /// Initiator's yaw in radians.
    pub facing_angle: f32,
    /// Initiator's pitch in radians, if known.
    #[serde(default)]
    pub pitch: Option<f32>,
    /// Extra data attached by the initiator.
    #[serde(default)]
    pub custom_state: Option<CustomState>,
}

impl Interaction {
    /// Create an interaction without pitch or custom data.
    #[must_use]
    pub fn new(initiator: Initiator, position: Vec3, facing_angle: f32) -> Self {
        Self {
            initiator,
            position,
            facing_angle,
            pitch: None,
            custom_state: None,
        }
    }

    /// Attach the initiator's pitch.
    #[must_use]
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// Attach custom data.
    #[must_use]
    pub fn with_custom_state(mut self, custom_state: CustomState) -> Self {
        self.custom_state = Some(custom_state);
        self
    }

    /// The initiating player, if a player caused this interaction.
    #[must_use]
    pub fn player(&self) -> Option<PlayerId> {
        match self.initiator {
            Initiator::Player(id) => Some(id),
            _ => None,
        }
    }
}
