//! The built-in capture-the-flag arena.

use sim_math::{IVec3, Vec3};
use sim_app::{EntitySpawn, Level};
use sim_physics::{BlockGrid, BlockGridError};
use sim_types::{BlockId, CustomState};

use crate::{FLAG, PICKUP, Team};

pub const ARENA_SIZE: IVec3 = IVec3::new(32, 8, 32);
pub const STONE: BlockId = 1;
pub const CRATE: BlockId = 2;

/// Flag bases, one per team. Flags rest on the floor at `y = 1`.
pub const RED_BASE: Vec3 = Vec3::new(4.5, 1.5, 16.5);
pub const BLUE_BASE: Vec3 = Vec3::new(27.5, 1.5, 16.5);

/// A walled floor with two cover rows, a flag per team and two health
/// pickups on the side lanes. The middle lane between the bases is open.
///
/// # Errors
///
/// Only fails if [`ARENA_SIZE`] is not a valid grid size.
pub fn arena() -> Result<Level, BlockGridError> {
    let mut blocks = BlockGrid::new(ARENA_SIZE)?;
    let max = ARENA_SIZE - IVec3::ONE;

    blocks.fill(IVec3::ZERO, IVec3::new(max.x, 0, max.z), STONE);
    for (min, wall_max) in [
        (IVec3::new(0, 1, 0), IVec3::new(max.x, 3, 0)),
        (IVec3::new(0, 1, max.z), IVec3::new(max.x, 3, max.z)),
        (IVec3::new(0, 1, 0), IVec3::new(0, 3, max.z)),
        (IVec3::new(max.x, 1, 0), IVec3::new(max.x, 3, max.z)),
    ] {
        blocks.fill(min, wall_max, STONE);
    }
    for z in [8, 23] {
        blocks.fill(IVec3::new(10, 1, z), IVec3::new(21, 1, z), CRATE);
    }

    let flag = |team: Team, base: Vec3| {
        EntitySpawn::new(FLAG, base)
            .with_custom_state(CustomState::new().with("team", team.as_str()))
    };

    Ok(Level::new(blocks)
        .with_entity(flag(Team::Red, RED_BASE))
        .with_entity(flag(Team::Blue, BLUE_BASE))
        .with_entity(EntitySpawn::new(PICKUP, Vec3::new(16.5, 1.0, 4.5)))
        .with_entity(EntitySpawn::new(PICKUP, Vec3::new(16.5, 1.0, 27.5))))
}
