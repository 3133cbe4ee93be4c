//! Player movement, combat and flag pickup.

use anyhow::Result;
use sim_math::{DT, Vec2, Vec3};
use sim_script::{Host, PlayerContext, PlayerScript};
use sim_types::{
    AnchorParent, AnimationState, CollisionTarget, CustomState, EntityId, Initiator, Interaction,
    PlayerId, PlayerState,
};
use tracing::info;

use crate::{BACK_SLOT, BALL, BULLET, FLAG, HAND_SLOT, PICKUP, Team};

pub const GRAVITY: f32 = -20.0;
pub const MOVE_SPEED: f32 = 10.0;
pub const JUMP_SPEED: f32 = 12.0;
/// Horizontal velocity kept per tick without input.
pub const DAMPING: f32 = 0.9;
pub const MAX_HEALTH: f32 = 3.0;
/// Seconds a dead player waits before respawning.
pub const RESPAWN_TIME: f32 = 3.0;
/// Height of the muzzle above the feet.
pub const MUZZLE_HEIGHT: f32 = 1.0;
/// A dropped flag further than this from its base can be returned.
const RETURN_DISTANCE: f32 = 0.5;

/// Behaviour shared by every player.
pub struct Players;

impl PlayerScript for Players {
    fn on_spawn(
        &self,
        _host: &mut dyn Host,
        _id: PlayerId,
        mut state: PlayerState,
    ) -> Result<PlayerState> {
        let custom = &mut state.custom_state;
        if custom.get_f32("health").is_none() {
            custom.set("health", MAX_HEALTH);
        }
        if custom.get_vec3("spawnPosition").is_none() {
            custom.set_vec3("spawnPosition", state.position);
        }
        Ok(state)
    }

    fn update(
        &self,
        host: &mut dyn Host,
        ctx: &PlayerContext,
        mut state: PlayerState,
    ) -> Result<PlayerState> {
        if state.animation_state == AnimationState::Dead {
            wait_for_respawn(ctx.id, &mut state);
            return Ok(state);
        }

        handle_collisions(host, ctx, &mut state);
        if state.animation_state == AnimationState::Dead {
            return Ok(state);
        }

        apply_movement(host, ctx, &mut state);

        if ctx.controls.fire {
            pull_trigger(host, ctx, &state);
        }
        Ok(state)
    }
}

fn wait_for_respawn(id: PlayerId, state: &mut PlayerState) {
    let remaining = state.custom_state.get_f32("respawnTimer").unwrap_or(0.0) - DT;
    if remaining > 0.0 {
        state.custom_state.set("respawnTimer", remaining);
        return;
    }
    state.custom_state.remove("respawnTimer");
    state.custom_state.set("health", MAX_HEALTH);
    state.position = state
        .custom_state
        .get_vec3("spawnPosition")
        .unwrap_or(state.position);
    state.velocity = Vec3::ZERO;
    state.animation_state = AnimationState::Idle;
    info!(player = %id, "player respawned");
}

fn handle_collisions(host: &mut dyn Host, ctx: &PlayerContext, state: &mut PlayerState) {
    let team = Team::of(&state.custom_state);
    let mut health = state.custom_state.get_f32("health").unwrap_or(MAX_HEALTH);

    for collision in &ctx.collisions {
        let CollisionTarget::Entity(id) = collision.target else {
            continue;
        };
        let Some(entity) = host.get_entity(id) else {
            continue;
        };
        let custom = &entity.data.state.custom_state;
        match entity.data.entity_type {
            BULLET | BALL if Team::of(custom) != team => {
                // Only the first player to claim a projectile takes the hit.
                if host.despawn_entity(id) {
                    health -= 1.0;
                }
            }
            PICKUP if custom.get_bool("active") == Some(true) && health < MAX_HEALTH => {
                health = MAX_HEALTH;
                host.interact_entity(id, touch(ctx.id, state));
            }
            FLAG if entity.anchor.is_none() => {
                let flag_team = Team::of(custom);
                if flag_team.is_some() && flag_team != team {
                    host.anchor_entity(id, AnchorParent::Player(ctx.id), BACK_SLOT);
                } else if is_away_from_base(&entity.data.state.position, custom) {
                    host.interact_entity(id, touch(ctx.id, state));
                }
            }
            _ => {}
        }
    }

    state.custom_state.set("health", health.max(0.0));
    if health <= 0.0 {
        die(host, ctx, state);
    }
}

fn is_away_from_base(position: &Vec3, custom: &CustomState) -> bool {
    custom
        .get_vec3("spawnPosition")
        .is_some_and(|base| base.distance(*position) > RETURN_DISTANCE)
}

fn touch(id: PlayerId, state: &PlayerState) -> Interaction {
    Interaction::new(Initiator::Player(id), state.position, state.facing_angle)
}

fn die(host: &mut dyn Host, ctx: &PlayerContext, state: &mut PlayerState) {
    for &flag in ctx.attached(BACK_SLOT) {
        host.detach_entity(flag, state.position);
    }
    state.animation_state = AnimationState::Dead;
    state.velocity = Vec3::ZERO;
    state.custom_state.set("respawnTimer", RESPAWN_TIME);
    info!(player = %ctx.id, "player died");
}

/// Turn the input into a desired displacement and let the resolver clip it.
fn apply_movement(host: &mut dyn Host, ctx: &PlayerContext, state: &mut PlayerState) {
    let controls = &ctx.controls;
    let mut velocity = state.velocity;

    let input = controls.move_direction;
    if input != Vec2::ZERO {
        let input = input.normalize();
        let (sin_yaw, cos_yaw) = controls.camera_yaw.sin_cos();
        let dir_x = input.x * cos_yaw - input.y * sin_yaw;
        let dir_z = input.x * sin_yaw + input.y * cos_yaw;
        velocity.x = dir_x * MOVE_SPEED;
        velocity.z = -dir_z * MOVE_SPEED;
    } else {
        velocity.x *= DAMPING;
        velocity.z *= DAMPING;
    }

    if controls.jump && state.on_ground {
        velocity.y = JUMP_SPEED;
    }
    velocity.y += GRAVITY * DT;

    let result = host.check_movement_for_collisions(ctx.id, state.position, velocity * DT);
    state.position += result.corrected_displacement;
    state.velocity = result.constrain_velocity(velocity);
    state.on_ground = result.is_on_ground;
    state.facing_angle = controls.camera_yaw;
    state.animation_state = if !state.on_ground {
        if state.velocity.y > 0.0 {
            AnimationState::Jumping
        } else {
            AnimationState::Falling
        }
    } else if Vec2::new(state.velocity.x, state.velocity.z).length() > 0.1 {
        AnimationState::Walking
    } else {
        AnimationState::Idle
    };
}

fn pull_trigger(host: &mut dyn Host, ctx: &PlayerContext, state: &PlayerState) {
    for &gun in ctx.attached(HAND_SLOT) {
        let muzzle = host
            .get_entity(gun)
            .map_or(state.position, |g| g.world_position())
            + Vec3::Y * MUZZLE_HEIGHT;
        let shot = Interaction::new(Initiator::Player(ctx.id), muzzle, state.facing_angle)
            .with_pitch(ctx.controls.camera_pitch);
        host.interact_entity(gun, shot);
    }
}

/// Entities held in `slot` by `player`, for callers outside a player update.
#[must_use]
pub fn held(host: &dyn Host, player: PlayerId, slot: &str) -> Vec<EntityId> {
    host.get_entities()
        .into_iter()
        .filter(|e| {
            e.anchor
                .as_ref()
                .is_some_and(|a| a.parent == AnchorParent::Player(player) && a.slot == slot)
        })
        .map(|e| e.id)
        .collect()
}
