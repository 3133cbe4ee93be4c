//! # sim_math
//!
//! Math types for the match simulation core. Re-exports [`glam`] for linear
//! algebra and defines the spatial types shared by the physics resolver, the
//! state store and the scripts.

pub mod aabb;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{BVec3, EulerRot, IVec3, Quat, Vec2, Vec3, Vec3Swizzles};

pub use aabb::Aabb;
pub use transform::Transform3D;

/// Fixed simulation timestep in seconds. Every gameplay constant is tuned
/// against this value.
pub const DT: f32 = 1.0 / 60.0;

/// Ticks simulated per second.
pub const TICK_RATE: u32 = 60;
