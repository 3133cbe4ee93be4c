//! # sim_app: match simulation core
//!
//! The single source of truth for one match. A [`Simulation`] owns the
//! state [`store::Store`], the block grid and the [`sim_script::ScriptRegistry`],
//! and advances everything by one fixed timestep per [`Simulation::tick`]:
//!
//! 1. Snapshot collisions for every player.
//! 2. Run each player's script, in ID order.
//! 3. Run each live entity's script, in ID order, delivering its queued
//!    interactions.
//! 4. Run the world script.
//! 5. Remove entities despawned during the tick and publish a
//!    [`TickSnapshot`].
//!
//! Scripts reach back into the simulation through [`host::HostContext`],
//! whose effects apply immediately.

pub mod anchors;
pub mod config;
pub mod host;
pub mod interactions;
pub mod level;
pub mod queries;
pub mod simulation;
pub mod snapshot;
pub mod store;
pub mod tick;

pub use config::SimConfig;
pub use level::{EntitySpawn, Level, LevelError};
pub use simulation::{Simulation, TickReport};
pub use snapshot::TickSnapshot;
pub use store::{Store, StoreError};
pub use tick::{TickConfig, TickLoop};
