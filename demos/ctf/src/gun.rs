//! The gun: fires a bullet whenever its holder pulls the trigger.

use std::f32::consts::FRAC_PI_2;

use anyhow::Result;
use sim_math::{Quat, Vec3};
use sim_script::{EntityContext, EntityScript, Host};
use sim_types::{CustomState, EntityState, Initiator, Interaction};

use crate::{BULLET, Team};

/// Ticks between two shots.
pub const RELOAD_TICKS: f32 = 30.0;
pub const BULLET_SPEED: f32 = 50.0;
/// Bullets appear this far in front of the muzzle.
pub const MUZZLE_OFFSET: f32 = 1.0;

pub struct Gun;

impl EntityScript for Gun {
    fn update(
        &self,
        host: &mut dyn Host,
        ctx: &EntityContext,
        mut state: EntityState,
    ) -> Result<EntityState> {
        let mut reload = state.custom_state.get_f32("reload").unwrap_or(0.0);
        if reload > 0.0 {
            reload -= 1.0;
        }

        if reload <= 0.0
            && let Some(shot) = ctx.interactions.first()
        {
            fire(host, shot);
            reload = RELOAD_TICKS;
        }

        state.custom_state.set("reload", reload);
        Ok(state)
    }
}

/// Bullet velocity for a shooter facing `facing_angle`.
#[must_use]
pub fn bullet_velocity(facing_angle: f32) -> Vec3 {
    let angle = facing_angle - FRAC_PI_2;
    Vec3::new(-angle.cos(), 0.0, angle.sin()) * BULLET_SPEED
}

fn fire(host: &mut dyn Host, shot: &Interaction) {
    let velocity = bullet_velocity(shot.facing_angle);
    let position = shot.position + velocity.normalize() * MUZZLE_OFFSET;
    let custom = owner_state(host, shot);

    host.spawn_entity(BULLET, position, Quat::IDENTITY, velocity, Some(custom));
    host.play_sound("gun_fire", shot.position, 1.0);
}

/// Custom state tagging a projectile with its shooter and their team, so
/// team mates are not hit.
pub(crate) fn owner_state(host: &dyn Host, shot: &Interaction) -> CustomState {
    let mut custom = CustomState::new();
    if let Initiator::Player(shooter) = shot.initiator {
        custom.set("shooter", shooter.id());
        if let Some(team) = host
            .get_player_state(shooter)
            .and_then(|p| Team::of(&p.custom_state))
        {
            custom.set("team", team.as_str());
        }
    }
    custom
}
