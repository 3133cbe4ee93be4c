//! Headless capture-the-flag match with scripted bots.
//!
//! Runs the built-in arena (or a level file) at a fixed tick rate until the
//! tick limit is reached or Ctrl-C is pressed, then prints the final world
//! state as JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ctf::{BACK_SLOT, Team};
use sim_app::{Level, SimConfig, Simulation, TickConfig, TickLoop};
use sim_math::{TICK_RATE, Vec2, Vec3};
use sim_types::{Controls, PlayerId, PlayerState};

#[derive(Parser)]
#[command(name = "ctf_match", about = "Headless capture-the-flag match")]
struct Args {
    /// Number of ticks to simulate (0 = until interrupted)
    #[arg(short, long, default_value_t = 1800)]
    ticks: u64,

    /// Level JSON file; the built-in arena when omitted
    #[arg(short, long)]
    level: Option<PathBuf>,

    /// Target ticks per second
    #[arg(long, default_value_t = f64::from(TICK_RATE))]
    tick_rate: f64,

    /// Number of bot players
    #[arg(short, long, default_value_t = 4)]
    bots: u32,

    /// Fixed match ID (random when omitted)
    #[arg(long)]
    match_id: Option<Uuid>,

    /// Hand every player a shotgun instead of a gun
    #[arg(long)]
    shotgun: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ctf_match=info".parse()?)
                .add_directive("ctf=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let level = match &args.level {
        Some(path) => {
            info!(path = %path.display(), "loading level");
            Level::load(path)?
        }
        None => ctf::arena::arena()?,
    };

    let mut config = SimConfig::new();
    if let Some(match_id) = args.match_id {
        config = config.with_match_id(match_id);
    }
    let weapon = if args.shotgun { ctf::SHOTGUN } else { ctf::GUN };
    let mut simulation = Simulation::new(config, ctf::registry_with_weapon(weapon), level);
    let bots: Vec<PlayerId> = (0..args.bots)
        .map(|_| simulation.add_player(PlayerState::default()))
        .collect();

    let tick_config = TickConfig {
        tick_rate: args.tick_rate,
        max_ticks: args.ticks,
    };
    let mut interval = tokio::time::interval(tick_config.tick_duration());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick_loop = TickLoop::new(tick_config, simulation);

    info!(
        match_id = %tick_loop.simulation().config().match_id,
        bots = bots.len(),
        "match starting"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let simulation = tick_loop.simulation_mut();
                for &bot in &bots {
                    let controls = bot_controls(simulation, bot);
                    simulation.set_controls(bot, controls);
                }

                let report = tick_loop.step();
                for fault in &report.script_faults {
                    warn!(tick_id = report.tick, %fault, "script fault");
                }
                if report.tick % (u64::from(TICK_RATE) * 5) == 0 {
                    log_score(tick_loop.simulation());
                }
                if tick_loop.is_finished() {
                    break;
                }
            }
            result = &mut shutdown => {
                result?;
                info!("interrupted");
                break;
            }
        }
    }

    log_score(tick_loop.simulation());
    println!(
        "{}",
        serde_json::to_string_pretty(tick_loop.simulation().world_state())?
    );
    Ok(())
}

/// Run at the enemy base, or home while carrying a flag. Shoot and jump on
/// a fixed rhythm staggered by player ID.
fn bot_controls(simulation: &Simulation, id: PlayerId) -> Controls {
    let Some(state) = simulation.player_state(id) else {
        return Controls::default();
    };
    let Some(team) = Team::of(&state.custom_state) else {
        return Controls::default();
    };

    let carrying = simulation
        .store()
        .attached_entities(id)
        .get(BACK_SLOT)
        .is_some_and(|flags| !flags.is_empty());
    let goal = if carrying { team } else { team.opponent() };
    let world = simulation.world_state().custom();
    let Some(target) = world.get_vec3(goal.spawn_key()) else {
        return Controls::default();
    };

    let delta = target - state.position;
    let flat = Vec3::new(delta.x, 0.0, delta.z);
    let tick = simulation.tick_id() + id.id() * 7;
    Controls {
        move_direction: if flat.length() > 0.25 { Vec2::Y } else { Vec2::ZERO },
        jump: tick % 120 == 0,
        fire: tick % 45 == 0,
        // Forward for yaw θ is (-sin θ, 0, -cos θ).
        camera_yaw: (-delta.x).atan2(-delta.z),
        camera_pitch: 0.0,
    }
}

fn log_score(simulation: &Simulation) {
    let world = simulation.world_state().custom();
    info!(
        tick_id = simulation.tick_id(),
        red = world.get_f32(Team::Red.score_key()).unwrap_or(0.0),
        blue = world.get_f32(Team::Blue.score_key()).unwrap_or(0.0),
        entities = simulation.store().entity_count(),
        "score"
    );
}
