//! Static per-type entity information.

use serde::{Deserialize, Serialize};
use sim_math::Vec3;

/// Numeric entity type identifier. Doubles as the script dispatch key.
pub type EntityTypeId = u8;

/// Numeric block type identifier.
pub type BlockId = u8;

/// The block ID of an empty (air) voxel.
pub const EMPTY_BLOCK: BlockId = 0;

/// The block ID reported for cells outside the grid, which are solid.
pub const OUT_OF_BOUNDS_BLOCK: BlockId = BlockId::MAX;

/// Box collider attached to every entity of a type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderShape {
    /// Half size of the box, centred on the entity position.
    pub half_extents: Vec3,
    /// Sensors report intersections instead of contacts.
    #[serde(default)]
    pub sensor: bool,
}

impl ColliderShape {
    /// A solid cube collider.
    #[must_use]
    pub fn cube(half_size: f32) -> Self {
        Self {
            half_extents: Vec3::splat(half_size),
            sensor: false,
        }
    }

    /// A sensor cube collider.
    #[must_use]
    pub fn sensor(half_size: f32) -> Self {
        Self {
            half_extents: Vec3::splat(half_size),
            sensor: true,
        }
    }
}

/// Everything the core knows about an entity type before any script runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    /// Type identifier.
    pub id: EntityTypeId,
    /// Default display name.
    pub name: String,
    /// Default model reference.
    pub default_model_path: String,
    /// Collider, if entities of this type take part in collision queries.
    #[serde(default)]
    pub collider: Option<ColliderShape>,
    /// Dynamic entities fall and bounce off blocks while unanchored.
    #[serde(default)]
    pub dynamic: bool,
}

impl EntityType {
    /// A type without a collider.
    #[must_use]
    pub fn new(id: EntityTypeId, name: impl Into<String>, model_path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            default_model_path: model_path.into(),
            collider: None,
            dynamic: false,
        }
    }

    /// Attach a collider to the type.
    #[must_use]
    pub fn with_collider(mut self, collider: ColliderShape) -> Self {
        self.collider = Some(collider);
        self
    }

    /// Let the simulation move entities of this type under gravity.
    #[must_use]
    pub fn with_dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_static_without_collider() {
        let json = r#"{"id":4,"name":"Ball","default_model_path":"ball.glb"}"#;
        let parsed: EntityType = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, EntityType::new(4, "Ball", "ball.glb"));
        assert!(!parsed.dynamic);

        let ball = parsed.with_collider(ColliderShape::cube(0.25)).with_dynamic();
        assert!(ball.dynamic);
        assert_eq!(ball.collider.map(|c| c.sensor), Some(false));
    }
}
