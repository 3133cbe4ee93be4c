//! Team flags: sit on their base, ride on a carrier's back, return home
//! when touched by their own team or after a capture.

use anyhow::Result;
use sim_math::{Quat, Vec3};
use sim_script::{EntityContext, EntityScript, Host};
use sim_types::{EntityData, EntityState};
use tracing::debug;

use crate::Team;

/// Offset of a carried flag from the back slot.
pub const CARRY_OFFSET: Vec3 = Vec3::new(0.0, 0.25, -0.25);
/// Backwards tilt of a carried flag, in degrees.
pub const CARRY_TILT_DEGREES: f32 = 30.0;

pub struct Flag;

impl EntityScript for Flag {
    fn on_spawn(&self, mut data: EntityData) -> Result<EntityData> {
        let team = Team::of(&data.state.custom_state).unwrap_or_else(|| {
            if data.model_path.contains("red") {
                Team::Red
            } else {
                Team::Blue
            }
        });

        let custom = &mut data.state.custom_state;
        custom.set("team", team.as_str());
        custom.set("carried", false);
        custom.set_vec3("spawnPosition", data.state.position);

        let (name, model) = match team {
            Team::Red => ("Red Flag", "models/flag_red.glb"),
            Team::Blue => ("Blue Flag", "models/flag_blue.glb"),
        };
        data.name = name.to_string();
        data.model_path = model.to_string();
        Ok(data)
    }

    fn update(
        &self,
        host: &mut dyn Host,
        ctx: &EntityContext,
        mut state: EntityState,
    ) -> Result<EntityState> {
        if !ctx.interactions.is_empty() {
            let base = state
                .custom_state
                .get_vec3("spawnPosition")
                .unwrap_or(state.position);
            host.detach_entity(ctx.id, base);
            state.position = base;
            state.velocity = Vec3::ZERO;
            state.rotation = Quat::IDENTITY;
            state.scale = Vec3::ONE;
            state.custom_state.set("carried", false);
            debug!(entity = %ctx.id, "flag returned to base");
            return Ok(state);
        }

        if ctx.is_anchored() {
            state.position = CARRY_OFFSET;
            state.rotation = Quat::from_rotation_x(CARRY_TILT_DEGREES.to_radians());
            state.custom_state.set("carried", true);
        } else {
            state.rotation = Quat::IDENTITY;
            state.scale = Vec3::ONE;
            state.custom_state.set("carried", false);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use sim_types::CustomState;

    use super::*;

    fn flag_data(model_path: &str, custom: CustomState) -> EntityData {
        EntityData {
            entity_type: crate::FLAG,
            name: "Flag".to_string(),
            model_path: model_path.to_string(),
            state: EntityState {
                custom_state: custom,
                ..EntityState::at(Vec3::new(4.5, 1.5, 16.5))
            },
        }
    }

    #[test]
    fn test_team_from_custom_state_wins_over_model() {
        let data = Flag
            .on_spawn(flag_data("models/flag_red.glb", CustomState::new().with("team", "blue")))
            .unwrap();
        assert_eq!(data.name, "Blue Flag");
        assert_eq!(data.model_path, "models/flag_blue.glb");
        assert_eq!(
            data.state.custom_state.get_vec3("spawnPosition"),
            Some(Vec3::new(4.5, 1.5, 16.5))
        );
    }

    #[test]
    fn test_team_falls_back_to_model_path() {
        let data = Flag.on_spawn(flag_data("models/flag_red.glb", CustomState::new())).unwrap();
        assert_eq!(Team::of(&data.state.custom_state), Some(Team::Red));
        assert_eq!(data.state.custom_state.get_bool("carried"), Some(false));
    }
}
