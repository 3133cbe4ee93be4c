//! Swept movement correction for player boxes.
//!
//! The desired displacement is applied one axis at a time (Y, then X, then
//! Z). Each axis is clipped at the first solid voxel in its path and the
//! next axis starts from the clipped position. This is a first-contact
//! approximation, not an iterative solver: a fast diagonal move into a
//! corner can stop short on one axis where a full solver would slide.

use sim_math::{Aabb, BVec3, Vec3};
use sim_types::MovementResult;

use crate::blocks::BlockGrid;

/// Full size of a player box (width, height, depth). The box is anchored
/// at the player's feet.
pub const DEFAULT_PLAYER_SIZE: Vec3 = Vec3::new(0.8, 1.52, 0.8);

/// How far below the feet the ground check reaches.
pub const GROUND_CHECK_DISTANCE: f32 = 0.05;

const AXES: [usize; 3] = [1, 0, 2];

/// Sweep a box of `size` standing at `position` along `displacement`.
///
/// Voxels the box already overlaps at the start of an axis sweep are
/// ignored, so a body embedded in a block can still move out of it.
/// Non-finite displacement components are treated as zero.
#[must_use]
pub fn resolve_movement(
    grid: &BlockGrid,
    size: Vec3,
    position: Vec3,
    displacement: Vec3,
) -> MovementResult {
    let mut body = Aabb::from_feet(position, size);
    let mut corrected = Vec3::ZERO;
    let mut blocked = [false; 3];

    for axis in AXES {
        let wanted = displacement[axis];
        if wanted == 0.0 || !wanted.is_finite() {
            continue;
        }
        let allowed = sweep_axis(grid, &body, axis, wanted);
        if allowed != wanted {
            blocked[axis] = true;
        }
        let mut step = Vec3::ZERO;
        step[axis] = allowed;
        body = body.translated(step);
        corrected[axis] = allowed;
    }

    let blocked = BVec3::from(blocked);
    MovementResult {
        corrected_displacement: corrected,
        would_have_collided: blocked.any(),
        is_on_ground: is_on_ground(grid, size, position + corrected),
        blocked,
    }
}

/// Furthest distance (same sign as `wanted`, never longer) the body can
/// travel along `axis` before touching a solid voxel.
fn sweep_axis(grid: &BlockGrid, body: &Aabb, axis: usize, wanted: f32) -> f32 {
    let mut step = Vec3::ZERO;
    step[axis] = wanted;
    let swept = body.union(&body.translated(step));

    let mut allowed = wanted;
    for cell in grid.cells_near(&swept) {
        if !grid.is_solid(cell) {
            continue;
        }
        let voxel = Aabb::voxel(cell);
        if !voxel.overlaps(&swept) || voxel.overlaps(body) {
            continue;
        }
        if wanted > 0.0 {
            let gap = (voxel.min[axis] - body.max[axis]).max(0.0);
            allowed = allowed.min(gap);
        } else {
            let gap = (voxel.max[axis] - body.min[axis]).min(0.0);
            allowed = allowed.max(gap);
        }
    }
    allowed
}

/// Returns `true` if a solid voxel lies within [`GROUND_CHECK_DISTANCE`]
/// below the feet of a box of `size` at `position`.
#[must_use]
pub fn is_on_ground(grid: &BlockGrid, size: Vec3, position: Vec3) -> bool {
    let body = Aabb::from_feet(position, size);
    let mut below = body;
    below.max.y = body.min.y;
    below.min.y = body.min.y - GROUND_CHECK_DISTANCE;
    grid.cells_near(&below).any(|cell| grid.is_solid(cell) && Aabb::voxel(cell).overlaps(&below))
}
