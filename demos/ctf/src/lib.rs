//! Capture-the-flag rules for the match simulation.
//!
//! Two teams, one flag each. Carry the enemy flag to your own flag to
//! score. Players carry a gun that fires bullets, or a shotgun that throws
//! bouncing balls; three hits and you sit out [`player::RESPAWN_TIME`]
//! seconds. Floating pickups restore health.

pub mod arena;
pub mod ball;
pub mod bullet;
pub mod flag;
pub mod gun;
pub mod pickup;
pub mod player;
pub mod shotgun;
pub mod world;

use sim_script::ScriptRegistry;
use sim_types::{ColliderShape, CustomState, EntityType, EntityTypeId};

pub const FLAG: EntityTypeId = 0;
pub const GUN: EntityTypeId = 1;
pub const BULLET: EntityTypeId = 2;
pub const PICKUP: EntityTypeId = 3;
pub const BALL: EntityTypeId = 4;
pub const SHOTGUN: EntityTypeId = 5;

/// Player slot holding the gun.
pub const HAND_SLOT: &str = "hand_right_anchor";
/// Player slot holding a carried flag.
pub const BACK_SLOT: &str = "back_anchor";

/// One of the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    /// Key used in custom state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Blue => "blue",
        }
    }

    /// The other team.
    #[must_use]
    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Read the `"team"` key of a custom state.
    #[must_use]
    pub fn of(custom: &CustomState) -> Option<Team> {
        match custom.get_str("team")? {
            "red" => Some(Team::Red),
            "blue" => Some(Team::Blue),
            _ => None,
        }
    }

    /// World-state key of this team's score.
    #[must_use]
    pub fn score_key(self) -> &'static str {
        match self {
            Team::Red => "redScore",
            Team::Blue => "blueScore",
        }
    }

    /// World-state key of this team's spawn point.
    #[must_use]
    pub fn spawn_key(self) -> &'static str {
        match self {
            Team::Red => "redSpawn",
            Team::Blue => "blueSpawn",
        }
    }
}

/// Every script and entity type of the capture-the-flag mode. Players join
/// holding a gun.
#[must_use]
pub fn registry() -> ScriptRegistry {
    registry_with_weapon(GUN)
}

/// Like [`registry`], but players join holding `weapon`.
#[must_use]
pub fn registry_with_weapon(weapon: EntityTypeId) -> ScriptRegistry {
    ScriptRegistry::new()
        .with_entity_type(
            EntityType::new(FLAG, "Flag", "models/flag.glb")
                .with_collider(ColliderShape::sensor(0.5)),
            flag::Flag,
        )
        .with_entity_type(EntityType::new(GUN, "Gun", "models/gun.glb"), gun::Gun)
        .with_entity_type(
            EntityType::new(BULLET, "Bullet", "models/bullet.glb")
                .with_collider(ColliderShape::cube(0.1)),
            bullet::Bullet,
        )
        .with_entity_type(
            EntityType::new(PICKUP, "Health", "models/health.glb")
                .with_collider(ColliderShape::sensor(0.4)),
            pickup::Pickup,
        )
        .with_entity_type(
            EntityType::new(BALL, "Ball", "models/ball.glb")
                .with_collider(ColliderShape::cube(0.25))
                .with_dynamic(),
            ball::Ball,
        )
        .with_entity_type(
            EntityType::new(SHOTGUN, "Shotgun", "models/shotgun.glb"),
            shotgun::Shotgun,
        )
        .with_player_script(player::Players)
        .with_world_script(world::CaptureTheFlag { weapon })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_roundtrip_through_custom_state() {
        let custom = CustomState::new().with("team", Team::Blue.as_str());
        assert_eq!(Team::of(&custom), Some(Team::Blue));
        assert_eq!(Team::Blue.opponent(), Team::Red);
        assert_eq!(Team::of(&CustomState::new()), None);
    }

    #[test]
    fn test_registry_has_every_type() {
        let registry = registry();
        assert_eq!(registry.type_count(), 6);
        assert!(registry.player_script().is_some());
        assert!(registry.world_script().is_some());
        assert!(registry.entity_type(GUN).unwrap().info.collider.is_none());
        assert!(registry.entity_type(BALL).unwrap().info.dynamic);
        assert!(!registry.entity_type(BULLET).unwrap().info.dynamic);
    }
}
