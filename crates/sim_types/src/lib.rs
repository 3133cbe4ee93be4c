//! # sim_types
//!
//! The data model of the match simulation: what an entity, a player and the
//! world aggregate look like, and the values that flow between the core and
//! the behaviour scripts.
//!
//! This crate provides:
//!
//! - [`EntityId`] / [`PlayerId`]: lightweight `u64` identifiers and their
//!   [`IdAllocator`].
//! - [`EntityState`], [`EntityData`], [`PlayerState`], [`WorldState`]: the
//!   authoritative state records.
//! - [`CustomState`]: open, script-owned key/value data.
//! - [`Anchor`], [`Interaction`], [`Collision`], [`MovementResult`]: the
//!   vocabulary of the host operations.
//! - [`EntityType`]: static per-type information resolved at load time.

pub mod anchor;
pub mod collision;
pub mod custom;
pub mod entity_type;
pub mod ids;
pub mod interaction;
pub mod snapshot;
pub mod state;

pub use anchor::{Anchor, AnchorParent};
pub use collision::{Collision, CollisionKind, CollisionTarget, MovementResult};
pub use custom::CustomState;
pub use entity_type::{
    BlockId, ColliderShape, EMPTY_BLOCK, EntityType, EntityTypeId, OUT_OF_BOUNDS_BLOCK,
};
pub use ids::{EntityId, IdAllocator, PlayerId};
pub use interaction::{Initiator, Interaction};
pub use snapshot::{EntitySnapshot, PlayerSnapshot, SoundEvent};
pub use state::{
    AnimationState, Controls, EntityData, EntityState, Lifecycle, PlayerState, WorldState,
};
