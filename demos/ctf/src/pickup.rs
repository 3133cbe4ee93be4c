//! Health pickups: bob in place, heal whoever touches them, then vanish
//! for a cooldown.

use std::f32::consts::TAU;

use anyhow::Result;
use sim_math::{DT, Quat, Vec3};
use sim_script::{EntityContext, EntityScript, Host};
use sim_types::{EntityData, EntityState};

/// Seconds a used pickup stays hidden.
pub const COOLDOWN: f32 = 10.0;
/// Seconds per full turn.
pub const SPIN_PERIOD: f32 = 3.0;
pub const BOB_HEIGHT: f32 = 0.15;
/// Hover height above the spawn point.
pub const HOVER: f32 = 0.75;

pub struct Pickup;

impl EntityScript for Pickup {
    fn on_spawn(&self, mut data: EntityData) -> Result<EntityData> {
        let custom = &mut data.state.custom_state;
        custom.set("timer", 0.0);
        custom.set("active", true);
        custom.set_vec3("spawnPosition", data.state.position);
        Ok(data)
    }

    fn update(
        &self,
        _host: &mut dyn Host,
        ctx: &EntityContext,
        mut state: EntityState,
    ) -> Result<EntityState> {
        let custom = &mut state.custom_state;
        let active = custom.get_bool("active").unwrap_or(true);

        if !active {
            let cooldown = custom.get_f32("cooldown").unwrap_or(0.0) - DT;
            if cooldown > 0.0 {
                custom.set("cooldown", cooldown);
            } else {
                custom.remove("cooldown");
                custom.set("active", true);
                state.scale = Vec3::ONE;
            }
        } else if !ctx.interactions.is_empty() {
            custom.set("active", false);
            custom.set("cooldown", COOLDOWN);
            state.scale = Vec3::ZERO;
        }

        let timer = (custom.get_f32("timer").unwrap_or(0.0) + DT) % SPIN_PERIOD;
        custom.set("timer", timer);
        let base = custom.get_vec3("spawnPosition").unwrap_or(state.position);

        state.position.y = base.y + (timer * TAU).sin() * BOB_HEIGHT + HOVER;
        state.rotation = Quat::from_rotation_y(timer / SPIN_PERIOD * TAU);
        Ok(state)
    }
}
