//! Free bodies: gravity and bounces off the block grid.
//!
//! One [`step_body`] call advances a box-shaped body by [`DT`]. Velocity
//! picks up gravity first, then the displacement is swept through
//! [`resolve_movement`]. Every blocked axis reflects its velocity
//! component scaled by [`RESTITUTION`], and slow rebounds settle to zero.

use sim_math::{DT, Vec3};

use crate::blocks::BlockGrid;
use crate::movement::resolve_movement;

/// Downward acceleration of free bodies, in blocks per second squared.
pub const BODY_GRAVITY: f32 = -30.0;

/// Share of the impact speed kept after a bounce.
pub const RESTITUTION: f32 = 0.5;

/// Horizontal velocity kept per tick while resting on the ground.
pub const GROUND_FRICTION: f32 = 0.9;

/// Rebounds slower than this stop dead.
const REST_SPEED: f32 = 0.5;

/// Outcome of one body step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyStep {
    pub position: Vec3,
    pub velocity: Vec3,
    pub on_ground: bool,
}

/// Advance a body centred on `position` with box `half_extents` by one tick.
///
/// A non-finite velocity is dropped and the body starts again from rest.
#[must_use]
pub fn step_body(grid: &BlockGrid, half_extents: Vec3, position: Vec3, velocity: Vec3) -> BodyStep {
    let mut velocity = if velocity.is_finite() {
        velocity
    } else {
        Vec3::ZERO
    };
    velocity.y += BODY_GRAVITY * DT;

    let feet = position - Vec3::Y * half_extents.y;
    let moved = resolve_movement(grid, half_extents * 2.0, feet, velocity * DT);

    let blocked: [bool; 3] = moved.blocked.into();
    for (axis, hit) in blocked.into_iter().enumerate() {
        if hit {
            let rebound = -velocity[axis] * RESTITUTION;
            velocity[axis] = if rebound.abs() < REST_SPEED {
                0.0
            } else {
                rebound
            };
        }
    }
    if moved.is_on_ground {
        velocity.x *= GROUND_FRICTION;
        velocity.z *= GROUND_FRICTION;
    }

    BodyStep {
        position: position + moved.corrected_displacement,
        velocity,
        on_ground: moved.is_on_ground,
    }
}
