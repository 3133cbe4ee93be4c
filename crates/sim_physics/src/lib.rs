//! # sim_physics
//!
//! Collision and movement resolution against the voxel block grid.
//!
//! - [`BlockGrid`]: dense block storage with the single query surface the
//!   simulation needs ([`BlockGrid::block_at`] / [`BlockGrid::is_solid`]).
//! - [`resolve_movement`]: per-axis swept correction of a player box.
//! - [`block_collisions`]: block penetrations of a box, with escape vectors.
//! - [`step_body`]: one tick of gravity and bounces for a free body.
//!
//! Body-vs-body overlaps depend on the state store and live in `sim_app`.

pub mod blocks;
pub mod bodies;
pub mod contacts;
pub mod movement;

pub use blocks::{BlockGrid, BlockGridError, MAX_BLOCKS};
pub use bodies::{BODY_GRAVITY, BodyStep, GROUND_FRICTION, RESTITUTION, step_body};
pub use contacts::{RESOLUTION_SCALE, block_collisions};
pub use movement::{DEFAULT_PLAYER_SIZE, GROUND_CHECK_DISTANCE, is_on_ground, resolve_movement};
