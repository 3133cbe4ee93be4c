//! The shotgun: a fan of bouncing balls, slower to reload than the gun.

use anyhow::Result;
use sim_math::{Quat, Vec3};
use sim_script::{EntityContext, EntityScript, Host};
use sim_types::{EntityState, Interaction};

use crate::BALL;
use crate::gun::{RELOAD_TICKS, bullet_velocity, owner_state};

/// Balls per shot.
pub const PELLETS: usize = 3;
/// Angle between neighbouring balls, in radians.
pub const SPREAD: f32 = 0.15;
/// Balls leave slower than bullets and lift a little.
pub const BALL_SPEED_SCALE: f32 = 0.5;
pub const BALL_LIFT: f32 = 4.0;

pub struct Shotgun;

impl EntityScript for Shotgun {
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
            reload = RELOAD_TICKS * 2.0;
        }

        state.custom_state.set("reload", reload);
        Ok(state)
    }
}

/// Launch velocities of one volley, centred on `facing_angle`.
#[must_use]
pub fn volley(facing_angle: f32) -> Vec<Vec3> {
    let middle = (PELLETS - 1) as f32 / 2.0;
    (0..PELLETS)
        .map(|i| {
            let angle = facing_angle + (i as f32 - middle) * SPREAD;
            bullet_velocity(angle) * BALL_SPEED_SCALE + Vec3::Y * BALL_LIFT
        })
        .collect()
}

fn fire(host: &mut dyn Host, shot: &Interaction) {
    let custom = owner_state(host, shot);
    for velocity in volley(shot.facing_angle) {
        let forward = Vec3::new(velocity.x, 0.0, velocity.z).normalize_or_zero();
        host.spawn_entity(
            BALL,
            shot.position + forward,
            Quat::IDENTITY,
            velocity,
            Some(custom.clone()),
        );
    }
    host.play_sound("shotgun_fire", shot.position, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gun::BULLET_SPEED;

    #[test]
    fn test_volley_fans_out_around_the_aim() {
        let shots = volley(0.0);
        assert_eq!(shots.len(), PELLETS);
        // Yaw 0 faces -Z; the middle ball flies straight.
        let middle = shots[1];
        assert!(middle.x.abs() < 1e-4);
        assert!(middle.z < 0.0);
        assert_eq!(middle.y, BALL_LIFT);
        assert!(shots[0].x * shots[2].x < 0.0);

        let flat = Vec3::new(shots[0].x, 0.0, shots[0].z);
        assert!((flat.length() - BULLET_SPEED * BALL_SPEED_SCALE).abs() < 1e-3);
    }
}
