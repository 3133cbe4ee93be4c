//! Level files: the block grid plus the entities present at match start.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sim_math::{Quat, Vec3};
use sim_physics::BlockGrid;
use sim_types::{CustomState, EntityTypeId};
use thiserror::Error;

/// Errors produced while loading a level.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid level JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An entity to spawn when the match starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpawn {
    pub entity_type: EntityTypeId,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default)]
    pub velocity: Vec3,
    #[serde(default)]
    pub custom_state: Option<CustomState>,
}

impl EntitySpawn {
    /// An entity of `entity_type` at rest at `position`.
    #[must_use]
    pub fn new(entity_type: EntityTypeId, position: Vec3) -> Self {
        Self {
            entity_type,
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            custom_state: None,
        }
    }

    /// Attach initial custom state.
    #[must_use]
    pub fn with_custom_state(mut self, custom_state: CustomState) -> Self {
        self.custom_state = Some(custom_state);
        self
    }
}

/// Static description of a match arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub blocks: BlockGrid,
    #[serde(default)]
    pub entities: Vec<EntitySpawn>,
}

impl Level {
    /// A level with no initial entities.
    #[must_use]
    pub fn new(blocks: BlockGrid) -> Self {
        Self {
            blocks,
            entities: Vec::new(),
        }
    }

    /// Add an initial entity.
    #[must_use]
    pub fn with_entity(mut self, spawn: EntitySpawn) -> Self {
        self.entities.push(spawn);
        self
    }

    /// Parse a level from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Json`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a level file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use sim_math::IVec3;

    use super::*;

    #[test]
    fn test_parse_level() {
        let level = Level::from_json(
            r#"{
                "blocks": { "size": [2, 1, 2], "blocks": [1, 1, 1, 1] },
                "entities": [
                    { "entity_type": 0, "position": [0.5, 1.0, 0.5] },
                    { "entity_type": 3, "position": [1.5, 1.0, 1.5], "custom_state": { "heal": 1 } }
                ]
            }"#,
        )
        .unwrap();
        assert!(level.blocks.is_solid(IVec3::new(1, 0, 1)));
        assert_eq!(level.entities.len(), 2);
        assert_eq!(level.entities[0].rotation, Quat::IDENTITY);
        let custom = level.entities[1].custom_state.as_ref().unwrap();
        assert_eq!(custom.get_f32("heal"), Some(1.0));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Level::load("/definitely/not/here.json"),
            Err(LevelError::Io(_))
        ));
    }
}
