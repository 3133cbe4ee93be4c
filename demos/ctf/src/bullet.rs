//! Bullets: fly straight until they hit something or expire.

use anyhow::Result;
use sim_math::{DT, Vec3};
use sim_script::{EntityContext, EntityScript, Host};
use sim_types::{CollisionKind, CollisionTarget, EMPTY_BLOCK, EntityState};

/// Ticks a bullet lives.
pub const MAX_LIFETIME: f32 = 1000.0;
/// Bullets further than this from the origin on any axis are removed.
pub const BOUNDS: f32 = 100.0;

pub struct Bullet;

impl EntityScript for Bullet {
    fn update(
        &self,
        host: &mut dyn Host,
        ctx: &EntityContext,
        mut state: EntityState,
    ) -> Result<EntityState> {
        if state.position.abs().max_element() > BOUNDS {
            host.despawn_entity(ctx.id);
            return Ok(state);
        }

        let lifetime = state.custom_state.get_f32("lifetime").unwrap_or(0.0);
        if lifetime >= MAX_LIFETIME {
            host.despawn_entity(ctx.id);
            return Ok(state);
        }
        state.custom_state.set("lifetime", lifetime + 1.0);
        state.position += state.velocity * DT;

        if hits_block(host, state.position) || hits_entity(host, ctx) {
            host.despawn_entity(ctx.id);
        }
        Ok(state)
    }
}

fn hits_block(host: &dyn Host, position: Vec3) -> bool {
    host.get_block(position.floor().as_ivec3()) != EMPTY_BLOCK
}

/// Solid entities stop bullets; sensors such as flags and pickups do not.
/// Hitting players is the player script's business.
fn hits_entity(host: &dyn Host, ctx: &EntityContext) -> bool {
    host.get_collisions_for_entity(ctx.id).iter().any(|c| {
        c.kind == CollisionKind::Contact && matches!(c.target, CollisionTarget::Entity(_))
    })
}
