//! Whole-match scenarios run against the capture-the-flag rules.

use std::time::Duration;

use ctf::{BALL, BULLET, FLAG, HAND_SLOT, SHOTGUN, Team};
use sim_app::{EntitySpawn, Level, SimConfig, Simulation};
use sim_math::{IVec3, Quat, Vec2, Vec3};
use sim_physics::BlockGrid;
use sim_types::{
    AnimationState, Controls, CustomState, EntityId, Lifecycle, PlayerId, PlayerState,
};
use uuid::Uuid;

const RED_BASE: Vec3 = Vec3::new(4.5, 1.5, 8.5);
const BLUE_BASE: Vec3 = Vec3::new(11.5, 1.5, 8.5);

fn floor() -> BlockGrid {
    let mut blocks = BlockGrid::new(IVec3::new(16, 4, 16)).unwrap();
    blocks.fill(IVec3::ZERO, IVec3::new(15, 0, 15), 1);
    blocks
}

fn config() -> SimConfig {
    SimConfig::new()
        .with_match_id(Uuid::from_u128(7))
        .with_script_budget(Duration::from_secs(1))
}

fn simulation(level: Level) -> Simulation {
    Simulation::new(config(), ctf::registry(), level)
}

fn flag_level() -> Level {
    let flag = |team: Team, base: Vec3| {
        EntitySpawn::new(FLAG, base)
            .with_custom_state(CustomState::new().with("team", team.as_str()))
    };
    Level::new(floor())
        .with_entity(flag(Team::Red, RED_BASE))
        .with_entity(flag(Team::Blue, BLUE_BASE))
}

fn flag_of(sim: &Simulation, team: Team) -> EntityId {
    sim.entities()
        .into_iter()
        .find(|e| {
            e.data.entity_type == FLAG && Team::of(&e.data.state.custom_state) == Some(team)
        })
        .map(|e| e.id)
        .unwrap()
}

fn teleport(sim: &mut Simulation, id: PlayerId, position: Vec3) {
    let mut state = sim.player_state(id).unwrap().clone();
    state.position = position;
    state.velocity = Vec3::ZERO;
    assert!(sim.override_player_state(id, state));
}

#[test]
fn test_joining_player_gets_team_spawn_and_gun() {
    let mut sim = simulation(flag_level());
    let red = sim.add_player(PlayerState::default());
    let blue = sim.add_player(PlayerState::default());

    let red_state = sim.player_state(red).unwrap();
    assert_eq!(Team::of(&red_state.custom_state), Some(Team::Red));
    assert_eq!(red_state.position, RED_BASE);
    let blue_state = sim.player_state(blue).unwrap();
    assert_eq!(Team::of(&blue_state.custom_state), Some(Team::Blue));
    assert_eq!(blue_state.position, BLUE_BASE);

    for player in [red, blue] {
        let attached = sim.store().attached_entities(player);
        assert_eq!(attached.get(HAND_SLOT).map(Vec::len), Some(1));
    }
}

#[test]
fn test_dead_player_respawns_after_three_seconds() {
    let mut sim = simulation(Level::new(floor()));
    let spawn = Vec3::new(8.0, 1.0, 8.0);
    let id = sim.add_player(PlayerState::at(spawn));

    let mut state = sim.player_state(id).unwrap().clone();
    state.custom_state.set("health", 1.0);
    sim.override_player_state(id, state);

    let bullet = sim
        .with_host(|host| {
            host.spawn_entity(
                BULLET,
                spawn + Vec3::new(0.0, 0.7, 0.0),
                Quat::IDENTITY,
                Vec3::ZERO,
                Some(CustomState::new().with("team", "blue")),
            )
        })
        .unwrap();

    sim.tick();
    let state = sim.player_state(id).unwrap();
    assert_eq!(state.animation_state, AnimationState::Dead);
    assert_eq!(state.custom_state.get_f32("health"), Some(0.0));
    assert_eq!(sim.entity_lifecycle(bullet), Lifecycle::Removed);

    for _ in 0..170 {
        sim.tick();
    }
    assert_eq!(sim.player_state(id).unwrap().animation_state, AnimationState::Dead);

    for _ in 0..11 {
        sim.tick();
    }
    let state = sim.player_state(id).unwrap();
    assert_ne!(state.animation_state, AnimationState::Dead);
    assert_eq!(state.custom_state.get_f32("health"), Some(3.0));
    assert!(state.position.distance(spawn) < 0.01);
}

#[test]
fn test_carrying_enemy_flag_home_scores() {
    let mut sim = simulation(flag_level());
    let id = sim.add_player(PlayerState::default());
    let red_flag = flag_of(&sim, Team::Red);
    let blue_flag = flag_of(&sim, Team::Blue);

    teleport(&mut sim, id, Vec3::new(11.5, 1.0, 8.5));
    sim.tick();
    let carried = sim.entity(blue_flag).unwrap();
    assert!(carried.anchor.is_some());
    assert_eq!(carried.data.state.custom_state.get_bool("carried"), Some(true));

    teleport(&mut sim, id, Vec3::new(4.5, 1.0, 8.5));
    sim.tick();
    let world = sim.world_state().custom();
    assert_eq!(world.get_f32("redScore"), Some(1.0));
    assert_eq!(world.get_f32("blueScore"), Some(0.0));
    assert_eq!(sim.store().pending_interactions(red_flag).len(), 1);
    assert_eq!(sim.store().pending_interactions(blue_flag).len(), 1);

    sim.tick();
    let returned = sim.entity(blue_flag).unwrap();
    assert!(returned.anchor.is_none());
    assert_eq!(returned.data.state.position, BLUE_BASE);
    assert_eq!(sim.world_state().custom().get_f32("redScore"), Some(1.0));
}

#[test]
fn test_same_team_flags_never_score() {
    let red_flag = |position: Vec3| {
        EntitySpawn::new(FLAG, position)
            .with_custom_state(CustomState::new().with("team", Team::Red.as_str()))
    };
    let level = Level::new(floor())
        .with_entity(red_flag(RED_BASE))
        .with_entity(red_flag(Vec3::new(5.45, 1.25, 8.25)));
    let mut sim = simulation(level);
    let red = sim.add_player(PlayerState::at(Vec3::new(12.0, 1.0, 12.0)));
    let blue = sim.add_player(PlayerState::at(Vec3::new(12.0, 1.0, 4.0)));
    assert_eq!(Team::of(&sim.player_state(red).unwrap().custom_state), Some(Team::Red));
    assert_eq!(Team::of(&sim.player_state(blue).unwrap().custom_state), Some(Team::Blue));

    // Grab the first flag and stand next to the second without touching it.
    teleport(&mut sim, red, Vec3::new(12.0, 1.0, 12.0));
    teleport(&mut sim, blue, Vec3::new(4.5, 1.0, 8.5));
    sim.tick();

    let flags: Vec<_> = sim
        .entities()
        .into_iter()
        .filter(|e| e.data.entity_type == FLAG)
        .collect();
    assert_eq!(flags.len(), 2);
    assert!(flags[0].anchor.is_some());
    assert!(flags[1].anchor.is_none());
    assert!(flags[0].world_position().distance(flags[1].world_position()) < 1.0);

    let world = sim.world_state().custom();
    assert_eq!(world.get_f32("redScore"), Some(0.0));
    assert_eq!(world.get_f32("blueScore"), Some(0.0));
    assert!(sim.store().pending_interactions(flags[1].id).is_empty());
}

#[test]
fn test_fire_spawns_one_bullet_the_same_tick() {
    let mut sim = simulation(Level::new(floor()));
    let id = sim.add_player(PlayerState::at(Vec3::new(8.0, 1.0, 8.0)));
    sim.set_controls(
        id,
        Controls {
            fire: true,
            ..Controls::default()
        },
    );

    sim.tick();
    let bullets: Vec<_> = sim
        .entities()
        .into_iter()
        .filter(|e| e.data.entity_type == BULLET)
        .collect();
    assert_eq!(bullets.len(), 1);
    let bullet = &bullets[0];
    let custom = &bullet.data.state.custom_state;
    assert_eq!(custom.get_str("team"), Some("red"));
    assert_eq!(custom.get_u64("shooter"), Some(id.id()));
    assert!(bullet.data.state.position.distance(Vec3::new(8.0, 2.0, 7.0)) < 0.01);
    assert!((bullet.data.state.velocity - Vec3::new(0.0, 0.0, -50.0)).length() < 1e-3);
    assert!(sim.snapshot().sounds.iter().any(|s| s.sound_id == "gun_fire"));

    // Still reloading.
    sim.tick();
    let bullets = sim
        .entities()
        .into_iter()
        .filter(|e| e.data.entity_type == BULLET)
        .count();
    assert_eq!(bullets, 1);
}

#[test]
fn test_shotgun_balls_bounce_to_rest_then_expire() {
    let registry = ctf::registry_with_weapon(SHOTGUN);
    let mut sim = Simulation::new(config(), registry, Level::new(floor()));
    let id = sim.add_player(PlayerState::at(Vec3::new(8.0, 1.0, 8.0)));
    let balls = |sim: &Simulation| -> Vec<_> {
        sim.entities()
            .into_iter()
            .filter(|e| e.data.entity_type == BALL)
            .collect()
    };
    let fire = |fire: bool| Controls {
        fire,
        ..Controls::default()
    };

    sim.set_controls(id, fire(true));
    let report = sim.tick();
    assert_eq!(report.bodies_moved, 3);
    let volley = balls(&sim);
    assert_eq!(volley.len(), ctf::shotgun::PELLETS);
    for ball in &volley {
        let custom = &ball.data.state.custom_state;
        assert_eq!(custom.get_str("team"), Some("red"));
        assert_eq!(custom.get_u64("shooter"), Some(id.id()));
    }
    assert!(sim.snapshot().sounds.iter().any(|s| s.sound_id == "shotgun_fire"));

    sim.tick();
    assert_eq!(balls(&sim).len(), 3);

    sim.set_controls(id, fire(false));
    for _ in 0..120 {
        sim.tick();
    }
    for ball in balls(&sim) {
        let state = &ball.data.state;
        assert!((state.position.y - 1.25).abs() < 1e-3, "{state:?}");
        assert_eq!(state.velocity.y, 0.0);
    }

    for _ in 0..200 {
        sim.tick();
    }
    assert!(balls(&sim).is_empty());
}

#[test]
fn test_identical_inputs_give_identical_snapshots() {
    fn run() -> Vec<Vec<u8>> {
        let mut sim = simulation(ctf::arena::arena().unwrap());
        let players: Vec<_> = (0..4)
            .map(|_| sim.add_player(PlayerState::default()))
            .collect();
        let mut encoded = Vec::new();
        for tick in 0..300u64 {
            for (i, &id) in players.iter().enumerate() {
                let phase = tick + i as u64 * 11;
                sim.set_controls(
                    id,
                    Controls {
                        move_direction: Vec2::new(0.0, 1.0),
                        jump: phase % 90 == 0,
                        fire: phase % 40 == 0,
                        camera_yaw: (phase as f32 * 0.01).sin(),
                        camera_pitch: 0.0,
                    },
                );
            }
            let report = sim.tick();
            assert!(report.script_faults.is_empty());
            encoded.push(sim.snapshot().encode().unwrap());
        }
        encoded
    }

    assert_eq!(run(), run());
}
