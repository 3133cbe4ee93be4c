//! Authoritative state records.
//!
//! The state store owns one record per entity and per player plus a single
//! [`WorldState`]. Scripts only ever see deep copies of these records and
//! hand back complete replacements.

use serde::{Deserialize, Serialize};
use sim_math::{Quat, Transform3D, Vec2, Vec3};

use crate::custom::CustomState;
use crate::entity_type::EntityTypeId;

/// Script-mutable state of an entity.
///
/// The read-only parts of an entity (its anchor and pending interactions)
/// are delivered alongside this record rather than inside it, so a script
/// cannot believe it changed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Position. Relative to the parent while anchored.
    pub position: Vec3,
    /// Velocity in world units per second.
    pub velocity: Vec3,
    /// Rotation as a unit quaternion. Relative to the parent while anchored.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
    /// Script-private data.
    #[serde(default)]
    pub custom_state: CustomState,
}

impl EntityState {
    /// A resting entity at `position`.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// The entity's transform in its own frame of reference.
    #[must_use]
    pub fn local_transform(&self) -> Transform3D {
        Transform3D {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

impl Default for EntityState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            custom_state: CustomState::new(),
        }
    }
}

/// Identity fields of an entity plus its current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    /// Fixed at spawn time.
    pub entity_type: EntityTypeId,
    /// Display name.
    pub name: String,
    /// Model reference for the client.
    pub model_path: String,
    /// Current state.
    pub state: EntityState,
}

/// The closed set of animation labels a player can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnimationState {
    /// Standing still.
    #[default]
    Idle,
    /// Moving along the ground.
    Walking,
    /// Moving upwards through the air.
    Jumping,
    /// Moving downwards through the air.
    Falling,
    /// Waiting to respawn.
    Dead,
}

/// Authoritative state of a player.
///
/// The entities attached to the player are read-only context and live in
/// the anchor graph, not here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    /// Feet position.
    pub position: Vec3,
    /// Velocity in world units per second.
    pub velocity: Vec3,
    /// Facing angle around the vertical axis, in radians.
    pub facing_angle: f32,
    /// Current animation label.
    pub animation_state: AnimationState,
    /// Whether the player ended its last update standing on something.
    pub on_ground: bool,
    /// Script-private data.
    #[serde(default)]
    pub custom_state: CustomState,
}

impl PlayerState {
    /// A resting player at `position`.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// The player's transform: feet position, rotated by its facing angle.
    #[must_use]
    pub fn transform(&self) -> Transform3D {
        Transform3D::from_position_yaw(self.position, self.facing_angle)
    }
}

/// Input state last received from a player's client.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Controls {
    /// Requested planar movement; `x` strafes, `y` moves forwards.
    pub move_direction: Vec2,
    /// Jump button held.
    pub jump: bool,
    /// Fire button held.
    pub fire: bool,
    /// Camera yaw in radians.
    pub camera_yaw: f32,
    /// Camera pitch in radians.
    pub camera_pitch: f32,
}

/// Match-level facts shared by the world script across ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldState(pub CustomState);

impl WorldState {
    /// Borrow the underlying custom state.
    #[must_use]
    pub fn custom(&self) -> &CustomState {
        &self.0
    }

    /// Mutably borrow the underlying custom state.
    pub fn custom_mut(&mut self) -> &mut CustomState {
        &mut self.0
    }
}

/// Where an ID is in its lifecycle.
///
/// `Unspawned → Live → PendingDespawn → Removed`. Players skip
/// `PendingDespawn`: they are removed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// The ID has not been handed out yet.
    Unspawned,
    /// Present and simulated.
    Live,
    /// Despawned this tick; invisible to queries, removed at tick end.
    PendingDespawn,
    /// Gone for good.
    Removed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_state_default_is_at_rest() {
        let state = EntityState::at(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.velocity, Vec3::ZERO);
        assert_eq!(state.rotation, Quat::IDENTITY);
        assert_eq!(state.scale, Vec3::ONE);
        assert!(state.custom_state.is_empty());
    }

    #[test]
    fn test_custom_state_defaults_when_missing() {
        let json = r#"{
            "position": [0.0, 1.0, 0.0],
            "velocity": [0.0, 0.0, 0.0],
            "rotation": [0.0, 0.0, 0.0, 1.0],
            "scale": [1.0, 1.0, 1.0]
        }"#;
        let state: EntityState = serde_json::from_str(json).unwrap();
        assert_eq!(state.position, Vec3::Y);
        assert!(state.custom_state.is_empty());
    }

    #[test]
    fn test_player_state_roundtrip() {
        let mut state = PlayerState::at(Vec3::new(4.0, 1.0, 4.0));
        state.animation_state = AnimationState::Falling;
        state.custom_state.set("health", 3);
        let bytes = rmp_serde::to_vec_named(&state).unwrap();
        let restored: PlayerState = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(state, restored);
    }
}
