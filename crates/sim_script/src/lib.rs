//! # sim_script
//!
//! The contract between the simulation core and behaviour scripts.
//!
//! Scripts are plain Rust values implementing [`EntityScript`],
//! [`PlayerScript`] or [`WorldScript`]. Every hook receives a deep copy of
//! the relevant state and returns a complete replacement. The only other
//! channel a script has into the simulation is the [`Host`] it is handed,
//! whose operations take effect immediately.
//!
//! Each invocation runs inside [`sandbox::invoke`], which turns errors,
//! panics and budget overruns into a [`ScriptFault`] so a single
//! misbehaving script never takes the match down.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sim_script::{EntityContext, EntityScript, Host, ScriptRegistry};
//! use sim_types::{EntityState, EntityType};
//!
//! struct Spinner;
//!
//! impl EntityScript for Spinner {
//!     fn update(
//!         &self,
//!         _host: &mut dyn Host,
//!         _ctx: &EntityContext,
//!         mut state: EntityState,
//!     ) -> anyhow::Result<EntityState> {
//!         state.rotation *= sim_math::Quat::from_rotation_y(0.1);
//!         Ok(state)
//!     }
//! }
//!
//! let mut registry = ScriptRegistry::new();
//! registry.register_entity_type(EntityType::new(7, "Spinner", "models/spinner.glb"), Spinner);
//! ```

pub mod behaviour;
pub mod host;
pub mod registry;
pub mod sandbox;

pub use behaviour::{EntityContext, EntityScript, PlayerContext, PlayerScript, WorldScript};
pub use host::Host;
pub use registry::{EntityTypeEntry, ScriptRegistry};
pub use sandbox::ScriptFault;
