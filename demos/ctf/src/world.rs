//! Match rules: team assignment, spawn points and scoring.

use anyhow::Result;
use sim_math::{Quat, Vec3};
use sim_script::{Host, WorldScript};
use sim_types::{
    AnchorParent, EntitySnapshot, EntityTypeId, Initiator, Interaction, PlayerId, PlayerState,
    WorldState,
};
use tracing::info;

use crate::player::held;
use crate::{FLAG, HAND_SLOT, Team};

/// A carried flag closer than this to the other flag is captured.
pub const CAPTURE_DISTANCE: f32 = 1.0;

pub struct CaptureTheFlag {
    /// Entity type every player gets in their hand on joining.
    pub weapon: EntityTypeId,
}

impl WorldScript for CaptureTheFlag {
    fn init(&self, host: &mut dyn Host, mut world: WorldState) -> Result<WorldState> {
        let custom = world.custom_mut();
        for flag in flags(host) {
            if let Some(team) = Team::of(&flag.data.state.custom_state) {
                custom.set_vec3(team.spawn_key(), flag.world_position());
            }
        }
        for team in [Team::Red, Team::Blue] {
            custom.set(team.score_key(), 0);
        }
        Ok(world)
    }

    fn on_add_player(
        &self,
        host: &mut dyn Host,
        world: WorldState,
        id: PlayerId,
        mut player: PlayerState,
    ) -> Result<(WorldState, PlayerState)> {
        let team = smallest_team(host, id);
        player.custom_state.set("team", team.as_str());
        if let Some(spawn) = world.custom().get_vec3(team.spawn_key()) {
            player.position = spawn;
            player.custom_state.set_vec3("spawnPosition", spawn);
        }

        if held(host, id, HAND_SLOT).is_empty()
            && let Some(weapon) =
                host.spawn_entity(self.weapon, player.position, Quat::IDENTITY, Vec3::ZERO, None)
        {
            host.anchor_entity(weapon, AnchorParent::Player(id), HAND_SLOT);
        }

        info!(player = %id, team = team.as_str(), "player joined");
        Ok((world, player))
    }

    fn update(&self, host: &mut dyn Host, mut world: WorldState) -> Result<WorldState> {
        let flags = flags(host);
        for (i, a) in flags.iter().enumerate() {
            for b in &flags[i + 1..] {
                if a.world_position().distance(b.world_position()) >= CAPTURE_DISTANCE {
                    continue;
                }
                let (Some(team_a), Some(team_b)) = (team_of(a), team_of(b)) else {
                    continue;
                };
                if team_a == team_b {
                    continue;
                }
                let (carried, carried_team) = match (is_carried(a), is_carried(b)) {
                    (true, false) => (a, team_a),
                    (false, true) => (b, team_b),
                    _ => continue,
                };

                let scorer = carried_team.opponent();
                let custom = world.custom_mut();
                let score = custom.get_f32(scorer.score_key()).unwrap_or(0.0) as u64 + 1;
                custom.set(scorer.score_key(), score);

                for flag in [a, b] {
                    let reset = Interaction::new(Initiator::World, flag.world_position(), 0.0);
                    host.interact_entity(flag.id, reset);
                }
                host.play_sound("flag_capture", carried.world_position(), 1.0);
                info!(team = scorer.as_str(), score, "flag captured");
            }
        }
        Ok(world)
    }
}

fn team_of(flag: &EntitySnapshot) -> Option<Team> {
    Team::of(&flag.data.state.custom_state)
}

/// The flag script keeps `carried` in step with the flag's anchor.
fn is_carried(flag: &EntitySnapshot) -> bool {
    flag.data.state.custom_state.get_bool("carried") == Some(true)
}

fn flags(host: &dyn Host) -> Vec<EntitySnapshot> {
    host.get_entities()
        .into_iter()
        .filter(|e| e.data.entity_type == FLAG)
        .collect()
}

/// The team with fewer players, red on a tie.
fn smallest_team(host: &dyn Host, joining: PlayerId) -> Team {
    let (mut red, mut blue) = (0, 0);
    for id in host.player_ids() {
        if id == joining {
            continue;
        }
        match host
            .get_player_state(id)
            .and_then(|p| Team::of(&p.custom_state))
        {
            Some(Team::Red) => red += 1,
            Some(Team::Blue) => blue += 1,
            None => {}
        }
    }
    if blue < red { Team::Blue } else { Team::Red }
}
