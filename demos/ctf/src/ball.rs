//! Balls from the shotgun. The simulation bounces them around; the script
//! only decides when they are gone.

use anyhow::Result;
use sim_script::{EntityContext, EntityScript, Host};
use sim_types::EntityState;

use crate::bullet::BOUNDS;

/// Ticks a ball lives.
pub const MAX_LIFETIME: f32 = 300.0;

pub struct Ball;

impl EntityScript for Ball {
    fn update(
        &self,
        host: &mut dyn Host,
        ctx: &EntityContext,
        mut state: EntityState,
    ) -> Result<EntityState> {
        let lifetime = state.custom_state.get_f32("lifetime").unwrap_or(0.0);
        if lifetime >= MAX_LIFETIME || state.position.abs().max_element() > BOUNDS {
            host.despawn_entity(ctx.id);
            return Ok(state);
        }
        state.custom_state.set("lifetime", lifetime + 1.0);
        Ok(state)
    }
}
