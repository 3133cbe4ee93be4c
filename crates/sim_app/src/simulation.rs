//! The per-match simulation and its fixed-order tick.

use std::collections::BTreeMap;

use sim_math::Vec3;
use sim_physics::{BlockGrid, step_body};
use sim_script::{EntityContext, Host, PlayerContext, ScriptFault, ScriptRegistry, sandbox};
use sim_types::{
    Controls, EntityId, EntitySnapshot, Lifecycle, PlayerId, PlayerState, WorldState,
};
use tracing::{debug, info, info_span, warn};

use crate::config::SimConfig;
use crate::host::HostContext;
use crate::level::Level;
use crate::queries::CollisionWorld;
use crate::snapshot::TickSnapshot;
use crate::store::Store;

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Connected players visited by the player phase, whether or not a
    /// player script is installed.
    pub players_processed: usize,
    /// Entities whose update ran (or that have no script and were live
    /// when their turn came).
    pub entities_processed: usize,
    pub script_faults: Vec<ScriptFault>,
    /// Unanchored dynamic entities advanced by the body step.
    pub bodies_moved: usize,
    /// Entities physically removed at the end of the tick.
    pub despawned: Vec<EntityId>,
}

/// One match: state, rules and the block grid.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    registry: ScriptRegistry,
    blocks: BlockGrid,
    store: Store,
    tick: u64,
    /// Faults raised outside a tick (spawns, joins), reported with the next tick.
    faults: Vec<ScriptFault>,
    snapshot: TickSnapshot,
}

impl Simulation {
    /// Create a match: spawn the level's entities, then run the world
    /// script's `init`.
    #[must_use]
    pub fn new(config: SimConfig, registry: ScriptRegistry, level: Level) -> Self {
        let snapshot = TickSnapshot {
            match_id: config.match_id,
            tick: 0,
            players: Vec::new(),
            entities: Vec::new(),
            world: WorldState::default(),
            sounds: Vec::new(),
        };
        let mut sim = Self {
            config,
            registry,
            blocks: level.blocks,
            store: Store::new(),
            tick: 0,
            faults: Vec::new(),
            snapshot,
        };

        for spawn in level.entities {
            sim.with_host(|host| {
                host.spawn_entity(
                    spawn.entity_type,
                    spawn.position,
                    spawn.rotation,
                    spawn.velocity,
                    spawn.custom_state,
                )
            });
        }

        if let Some(script) = sim.registry.world_script() {
            let world = sim.store.world().clone();
            let mut host = HostContext::new(
                &mut sim.store,
                &sim.registry,
                &sim.blocks,
                &sim.config,
                &mut sim.faults,
                0,
            );
            let result = sandbox::invoke(
                || "world init".to_string(),
                sim.config.script_budget,
                || script.init(&mut host, world),
            );
            match result {
                Ok(world) => sim.store.set_world(world),
                Err(fault) => {
                    warn!(%fault, "world init faulted, starting from an empty world state");
                    sim.faults.push(fault);
                }
            }
        }

        sim.snapshot = sim.build_snapshot();
        info!(
            match_id = %sim.config.match_id,
            entities = sim.store.entity_count(),
            entity_types = sim.registry.type_count(),
            "simulation created"
        );
        sim
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// The last completed tick (0 before the first).
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The block grid.
    #[must_use]
    pub fn blocks(&self) -> &BlockGrid {
        &self.blocks
    }

    /// The state store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The snapshot published by the last tick.
    #[must_use]
    pub fn snapshot(&self) -> &TickSnapshot {
        &self.snapshot
    }

    /// A live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.store.entity_snapshot(id)
    }

    /// Every live entity, in ID order.
    #[must_use]
    pub fn entities(&self) -> Vec<EntitySnapshot> {
        self.store.entity_snapshots()
    }

    /// Lifecycle of an entity ID.
    #[must_use]
    pub fn entity_lifecycle(&self, id: EntityId) -> Lifecycle {
        self.store.entity_lifecycle(id)
    }

    /// State of a connected player.
    #[must_use]
    pub fn player_state(&self, id: PlayerId) -> Option<&PlayerState> {
        self.store.player_state(id)
    }

    /// The world aggregate.
    #[must_use]
    pub fn world_state(&self) -> &WorldState {
        self.store.world()
    }

    // ── Outside-the-tick operations ─────────────────────────────────────

    /// Run `f` with the same host scripts get, at the current tick.
    ///
    /// Effects apply immediately; despawns are finalized at the end of the
    /// next tick.
    pub fn with_host<R>(&mut self, f: impl FnOnce(&mut dyn Host) -> R) -> R {
        let mut host = HostContext::new(
            &mut self.store,
            &self.registry,
            &self.blocks,
            &self.config,
            &mut self.faults,
            self.tick,
        );
        f(&mut host)
    }

    /// Connect a player. The world script's `on_add_player` decides the
    /// initial state; the player script's `on_spawn` runs on its first tick.
    pub fn add_player(&mut self, initial: PlayerState) -> PlayerId {
        let id = self.store.add_player(initial.clone());

        if let Some(script) = self.registry.world_script() {
            let world = self.store.world().clone();
            let mut host = HostContext::new(
                &mut self.store,
                &self.registry,
                &self.blocks,
                &self.config,
                &mut self.faults,
                self.tick,
            );
            let result = sandbox::invoke(
                || format!("world on_add_player {id}"),
                self.config.script_budget,
                || script.on_add_player(&mut host, world, id, initial),
            );
            match result {
                Ok((world, state)) => {
                    self.store.set_world(world);
                    if let Ok(record) = self.store.player_mut(id) {
                        record.state = state;
                    }
                }
                Err(fault) => {
                    warn!(player = %id, %fault, "on_add_player faulted, keeping initial state");
                    self.faults.push(fault);
                }
            }
        }

        info!(player = %id, "player added");
        id
    }

    /// Disconnect a player. Attached entities are dropped where the player
    /// stood. Returns `false` for an unknown player.
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        match self.store.remove_player(id) {
            Ok(_) => {
                info!(player = %id, "player removed");
                true
            }
            Err(err) => {
                warn!(%err, "remove_player ignored");
                false
            }
        }
    }

    /// Record the latest input of a player for the next tick.
    pub fn set_controls(&mut self, id: PlayerId, controls: Controls) -> bool {
        match self.store.player_mut(id) {
            Ok(record) => {
                record.controls = controls;
                true
            }
            Err(err) => {
                debug!(%err, "controls for unknown player dropped");
                false
            }
        }
    }

    /// Replace a player's state from outside the scripts (e.g. a server
    /// teleport).
    pub fn override_player_state(&mut self, id: PlayerId, state: PlayerState) -> bool {
        match self.store.player_mut(id) {
            Ok(record) => {
                record.state = state;
                true
            }
            Err(err) => {
                warn!(%err, "player state override ignored");
                false
            }
        }
    }

    // ── The tick ────────────────────────────────────────────────────────

    /// Advance the match by exactly one fixed timestep.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;
        let tick = self.tick;
        let span = info_span!("tick", match_id = %self.config.match_id, tick_id = tick);
        let _guard = span.enter();

        let mut report = TickReport {
            tick,
            script_faults: std::mem::take(&mut self.faults),
            ..TickReport::default()
        };

        self.run_players(tick, &mut report);
        self.run_entities(tick, &mut report);
        self.run_world(tick, &mut report);
        self.run_bodies(&mut report);

        report.despawned = self.store.finalize_removals();
        self.store.assert_consistent();
        self.snapshot = self.build_snapshot();

        debug!(
            players = report.players_processed,
            entities = report.entities_processed,
            faults = report.script_faults.len(),
            bodies = report.bodies_moved,
            despawned = report.despawned.len(),
            "tick complete"
        );
        report
    }

    fn run_players(&mut self, tick: u64, report: &mut TickReport) {
        let player_ids = self.store.player_ids();
        let mut collisions: BTreeMap<PlayerId, _> = {
            let world =
                CollisionWorld::new(&self.store, &self.registry, &self.blocks, &self.config);
            player_ids
                .iter()
                .map(|&id| (id, world.player_collisions(id)))
                .collect()
        };

        let Some(script) = self.registry.player_script() else {
            report.players_processed += player_ids.len();
            return;
        };
        let budget = self.config.script_budget;

        for id in player_ids {
            let Ok(record) = self.store.player_mut(id) else {
                continue;
            };
            let needs_spawn_hook = std::mem::replace(&mut record.needs_spawn_hook, false);
            let controls = record.controls;
            let mut state = record.state.clone();

            let mut host = HostContext::new(
                &mut self.store,
                &self.registry,
                &self.blocks,
                &self.config,
                &mut report.script_faults,
                tick,
            );

            let mut faulted = None;
            if needs_spawn_hook {
                match sandbox::invoke(
                    || format!("player {id} on_spawn"),
                    budget,
                    || script.on_spawn(&mut host, id, state.clone()),
                ) {
                    Ok(spawned) => state = spawned,
                    Err(fault) => faulted = Some(fault),
                }
            }

            let ctx = PlayerContext {
                id,
                controls,
                collisions: collisions.remove(&id).unwrap_or_default(),
                attached_entities: host.store().attached_entities(id),
                tick,
            };
            let updated = sandbox::invoke(
                || format!("player {id} update"),
                budget,
                || script.update(&mut host, &ctx, state.clone()),
            );
            drop(host);

            let committed = match updated {
                Ok(new_state) => new_state,
                Err(fault) => {
                    warn!(player = %id, %fault, "player script faulted, keeping prior state");
                    report.script_faults.push(fault);
                    state
                }
            };
            if let Some(fault) = faulted {
                warn!(player = %id, %fault, "player on_spawn faulted");
                report.script_faults.push(fault);
            }
            if let Ok(record) = self.store.player_mut(id) {
                record.state = committed;
            }
            report.players_processed += 1;
        }
    }

    fn run_entities(&mut self, tick: u64, report: &mut TickReport) {
        let budget = self.config.script_budget;

        for id in self.store.live_entity_ids() {
            if !self.store.is_live(id) {
                continue;
            }
            let interactions = self.store.take_interactions(id);
            let Some(data) = self.store.entity(id) else {
                continue;
            };
            report.entities_processed += 1;
            let Some(script) = self.registry.entity_script(data.entity_type) else {
                continue;
            };
            let ctx = EntityContext {
                id,
                entity_type: data.entity_type,
                anchor: self.store.anchor_of(id).cloned(),
                interactions,
                tick,
            };
            let state = data.state.clone();

            let mut host = HostContext::new(
                &mut self.store,
                &self.registry,
                &self.blocks,
                &self.config,
                &mut report.script_faults,
                tick,
            );
            let updated = sandbox::invoke(
                || format!("entity {id} update"),
                budget,
                || script.update(&mut host, &ctx, state),
            );
            drop(host);

            match updated {
                Ok(new_state) => {
                    // An entity that despawned itself keeps no result.
                    if let Err(err) = self.store.commit_entity_state(id, new_state) {
                        debug!(%err, "update result discarded");
                    }
                }
                Err(fault) => {
                    warn!(entity = %id, %fault, "entity script faulted, keeping prior state");
                    report.script_faults.push(fault);
                }
            }
        }
    }

    fn run_world(&mut self, tick: u64, report: &mut TickReport) {
        let Some(script) = self.registry.world_script() else {
            return;
        };
        let world = self.store.world().clone();
        let mut host = HostContext::new(
            &mut self.store,
            &self.registry,
            &self.blocks,
            &self.config,
            &mut report.script_faults,
            tick,
        );
        let updated = sandbox::invoke(
            || "world update".to_string(),
            self.config.script_budget,
            || script.update(&mut host, world),
        );
        drop(host);

        match updated {
            Ok(world) => self.store.set_world(world),
            Err(fault) => {
                warn!(%fault, "world script faulted, keeping prior state");
                report.script_faults.push(fault);
            }
        }
    }

    /// Integrate live, unanchored entities of dynamic types. Runs after every
    /// script so a script's velocity change takes effect the same tick.
    fn run_bodies(&mut self, report: &mut TickReport) {
        for id in self.store.live_entity_ids() {
            if self.store.anchor_of(id).is_some() {
                continue;
            }
            let Some(data) = self.store.entity(id) else {
                continue;
            };
            let Some(info) = self
                .registry
                .entity_type(data.entity_type)
                .map(|entry| &entry.info)
                .filter(|info| info.dynamic)
            else {
                continue;
            };
            let half_extents = info.collider.map_or(Vec3::ZERO, |c| c.half_extents);
            let step = step_body(
                &self.blocks,
                half_extents,
                data.state.position,
                data.state.velocity,
            );

            let mut state = data.state.clone();
            state.position = step.position;
            state.velocity = step.velocity;
            if let Err(err) = self.store.commit_entity_state(id, state) {
                debug!(%err, "body step discarded");
                continue;
            }
            report.bodies_moved += 1;
        }
    }

    fn build_snapshot(&mut self) -> TickSnapshot {
        TickSnapshot {
            match_id: self.config.match_id,
            tick: self.tick,
            players: self.store.player_snapshots(),
            entities: self.store.entity_snapshots(),
            world: self.store.world().clone(),
            sounds: self.store.take_sounds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::{Result, bail};
    use sim_math::{IVec3, Quat};
    use sim_script::{EntityScript, PlayerScript, WorldScript};
    use sim_types::{
        AnchorParent, ColliderShape, CustomState, EntityState, EntityType, Initiator, Interaction,
    };

    use super::*;
    use crate::level::EntitySpawn;

    const COUNTER: u8 = 1;
    const KILLER: u8 = 2;
    const SPAWNER: u8 = 3;
    const THROWER: u8 = 4;
    const PANICKER: u8 = 5;
    const BOUNCER: u8 = 6;

    fn bump(custom: &mut CustomState, key: &str, by: f32) {
        let value = custom.get_f32(key).unwrap_or(0.0) + by;
        custom.set(key, value);
    }

    struct Counter;

    impl EntityScript for Counter {
        fn update(
            &self,
            _: &mut dyn Host,
            ctx: &EntityContext,
            mut state: EntityState,
        ) -> Result<EntityState> {
            bump(&mut state.custom_state, "updates", 1.0);
            bump(&mut state.custom_state, "seen", ctx.interactions.len() as f32);
            state.custom_state.set("anchored", ctx.is_anchored());
            Ok(state)
        }
    }

    struct Killer;

    impl EntityScript for Killer {
        fn update(
            &self,
            host: &mut dyn Host,
            _: &EntityContext,
            state: EntityState,
        ) -> Result<EntityState> {
            if let Some(target) = state.custom_state.get_u64("target") {
                host.despawn_entity(EntityId(target));
            }
            Ok(state)
        }
    }

    struct Spawner;

    impl EntityScript for Spawner {
        fn update(
            &self,
            host: &mut dyn Host,
            _: &EntityContext,
            mut state: EntityState,
        ) -> Result<EntityState> {
            if state.custom_state.get_bool("done") != Some(true) {
                host.spawn_entity(COUNTER, Vec3::ONE, Quat::IDENTITY, Vec3::ZERO, None);
                state.custom_state.set("done", true);
            }
            Ok(state)
        }
    }

    struct Thrower;

    impl EntityScript for Thrower {
        fn update(
            &self,
            _: &mut dyn Host,
            _: &EntityContext,
            mut state: EntityState,
        ) -> Result<EntityState> {
            bump(&mut state.custom_state, "updates", 1.0);
            bail!("script error")
        }
    }

    struct Panicker;

    impl EntityScript for Panicker {
        fn update(
            &self,
            _: &mut dyn Host,
            _: &EntityContext,
            _: EntityState,
        ) -> Result<EntityState> {
            panic!("script panic")
        }
    }

    struct Players;

    impl PlayerScript for Players {
        fn on_spawn(
            &self,
            _: &mut dyn Host,
            _: PlayerId,
            mut state: PlayerState,
        ) -> Result<PlayerState> {
            bump(&mut state.custom_state, "spawned", 1.0);
            Ok(state)
        }

        fn update(
            &self,
            host: &mut dyn Host,
            ctx: &PlayerContext,
            mut state: PlayerState,
        ) -> Result<PlayerState> {
            bump(&mut state.custom_state, "updates", 1.0);
            state.position.x += 1.0;
            if ctx.controls.fire {
                host.play_sound("gun_fire", state.position, 1.0);
            }
            match state.custom_state.get_str("fault") {
                Some("error") if ctx.tick > 1 => bail!("player script error"),
                Some("panic") if ctx.tick > 1 => panic!("player script panic"),
                _ => Ok(state),
            }
        }
    }

    struct Rules;

    impl WorldScript for Rules {
        fn init(&self, _: &mut dyn Host, mut world: WorldState) -> Result<WorldState> {
            bump(world.custom_mut(), "inits", 1.0);
            Ok(world)
        }

        fn on_add_player(
            &self,
            _: &mut dyn Host,
            mut world: WorldState,
            _: PlayerId,
            mut player: PlayerState,
        ) -> Result<(WorldState, PlayerState)> {
            bump(world.custom_mut(), "joins", 1.0);
            player.position = Vec3::new(4.0, 1.0, 4.0);
            Ok((world, player))
        }

        fn update(&self, host: &mut dyn Host, world: WorldState) -> Result<WorldState> {
            if host.tick() == 1 {
                for entity in host.get_entities() {
                    if entity.data.entity_type == COUNTER {
                        let reset = Interaction::new(Initiator::World, Vec3::ZERO, 0.0);
                        host.interact_entity(entity.id, reset);
                    }
                }
            }
            Ok(world)
        }
    }

    /// World rules that fail everywhere except `init`.
    struct BrokenRules;

    impl WorldScript for BrokenRules {
        fn init(&self, _: &mut dyn Host, mut world: WorldState) -> Result<WorldState> {
            bump(world.custom_mut(), "inits", 1.0);
            Ok(world)
        }

        fn on_add_player(
            &self,
            _: &mut dyn Host,
            mut world: WorldState,
            _: PlayerId,
            mut player: PlayerState,
        ) -> Result<(WorldState, PlayerState)> {
            bump(world.custom_mut(), "joins", 1.0);
            player.position = Vec3::new(4.0, 1.0, 4.0);
            bail!("no room")
        }

        fn update(&self, host: &mut dyn Host, mut world: WorldState) -> Result<WorldState> {
            bump(world.custom_mut(), "updates", 1.0);
            if host.tick() % 2 == 0 {
                panic!("world script panic");
            }
            bail!("world script error")
        }
    }

    fn registry(with_world: bool) -> ScriptRegistry {
        let registry = ScriptRegistry::new()
            .with_entity_type(EntityType::new(COUNTER, "Counter", "counter.glb"), Counter)
            .with_entity_type(EntityType::new(KILLER, "Killer", "killer.glb"), Killer)
            .with_entity_type(EntityType::new(SPAWNER, "Spawner", "spawner.glb"), Spawner)
            .with_entity_type(EntityType::new(THROWER, "Thrower", "thrower.glb"), Thrower)
            .with_entity_type(EntityType::new(PANICKER, "Panicker", "panicker.glb"), Panicker)
            .with_entity_type(
                EntityType::new(BOUNCER, "Bouncer", "bouncer.glb")
                    .with_collider(ColliderShape::cube(0.25))
                    .with_dynamic(),
                Counter,
            )
            .with_player_script(Players);
        if with_world {
            registry.with_world_script(Rules)
        } else {
            registry
        }
    }

    fn simulation(with_world: bool, entities: Vec<EntitySpawn>) -> Simulation {
        simulation_with(registry(with_world), entities)
    }

    fn simulation_with(registry: ScriptRegistry, entities: Vec<EntitySpawn>) -> Simulation {
        let mut level = Level::new(BlockGrid::new(IVec3::new(8, 8, 8)).unwrap());
        level.entities = entities;
        let config = SimConfig::new().with_script_budget(Duration::from_secs(1));
        Simulation::new(config, registry, level)
    }

    fn killer(target: u64) -> EntitySpawn {
        EntitySpawn::new(KILLER, Vec3::ZERO)
            .with_custom_state(CustomState::new().with("target", target))
    }

    fn custom(sim: &Simulation, id: u64) -> CustomState {
        sim.entity(EntityId(id)).unwrap().data.state.custom_state
    }

    #[test]
    fn test_despawn_mid_phase_skips_and_defers_removal() {
        let mut sim = simulation(
            false,
            vec![
                killer(3),
                EntitySpawn::new(COUNTER, Vec3::ZERO),
                EntitySpawn::new(COUNTER, Vec3::ZERO),
                EntitySpawn::new(SPAWNER, Vec3::ZERO),
            ],
        );

        let report = sim.tick();
        // Killer, counter 2 and the spawner; counter 3 was despawned first and
        // the freshly spawned counter 5 was not live when the phase began.
        assert_eq!(report.entities_processed, 3);
        assert_eq!(report.despawned, vec![EntityId(3)]);
        assert_eq!(sim.entity_lifecycle(EntityId(3)), Lifecycle::Removed);
        assert_eq!(sim.entity_lifecycle(EntityId(5)), Lifecycle::Live);
        assert!(!custom(&sim, 5).contains_key("updates"));

        let report = sim.tick();
        assert_eq!(report.entities_processed, 4);
        assert!(report.despawned.is_empty());
        assert_eq!(custom(&sim, 5).get_f32("updates"), Some(1.0));
    }

    #[test]
    fn test_interaction_delivered_exactly_once() {
        let mut sim = simulation(true, vec![EntitySpawn::new(COUNTER, Vec3::ZERO)]);
        let target = EntityId(1);
        sim.with_host(|host| {
            host.interact_entity(target, Interaction::new(Initiator::World, Vec3::ZERO, 0.0))
        });

        sim.tick();
        assert_eq!(custom(&sim, 1).get_f32("seen"), Some(1.0));
        // The world script queued another one after the counter ran.
        assert_eq!(sim.store().pending_interactions(target).len(), 1);

        sim.tick();
        assert_eq!(custom(&sim, 1).get_f32("seen"), Some(2.0));
        sim.tick();
        assert_eq!(custom(&sim, 1).get_f32("seen"), Some(2.0));
        assert_eq!(custom(&sim, 1).get_f32("updates"), Some(3.0));
    }

    #[test]
    fn test_parent_despawn_detaches_child_before_its_update() {
        let mut sim = simulation(
            false,
            vec![
                killer(3),
                EntitySpawn::new(COUNTER, Vec3::ZERO),
                EntitySpawn::new(COUNTER, Vec3::new(2.0, 1.0, 2.0)),
            ],
        );
        assert!(sim.with_host(|host| host.anchor_entity(
            EntityId(2),
            AnchorParent::Entity(EntityId(3)),
            "top"
        )));

        sim.tick();
        let child = sim.entity(EntityId(2)).unwrap();
        assert!(child.anchor.is_none());
        assert_eq!(child.data.state.custom_state.get_bool("anchored"), Some(false));
        assert_eq!(child.world_position(), Vec3::new(2.0, 1.0, 2.0));
    }

    #[test]
    fn test_removed_player_detaches_children() {
        let mut sim = simulation(false, vec![EntitySpawn::new(COUNTER, Vec3::ZERO)]);
        let player = sim.add_player(PlayerState::at(Vec3::new(3.0, 1.0, 3.0)));
        let gun = EntityId(1);
        assert!(sim.with_host(|host| host.anchor_entity(
            gun,
            AnchorParent::Player(player),
            "hand_right_anchor"
        )));
        assert!(sim.remove_player(player));
        assert!(!sim.remove_player(player));

        sim.tick();
        let snapshot = sim.entity(gun).unwrap();
        assert!(snapshot.anchor.is_none());
        assert_eq!(snapshot.world_position(), Vec3::new(3.0, 1.0, 3.0));
        assert_eq!(snapshot.data.state.custom_state.get_bool("anchored"), Some(false));
    }

    #[test]
    fn test_faulting_scripts_keep_prior_state() {
        let mut sim = simulation(
            false,
            vec![
                EntitySpawn::new(THROWER, Vec3::ZERO),
                EntitySpawn::new(PANICKER, Vec3::new(1.0, 0.0, 0.0)),
                EntitySpawn::new(COUNTER, Vec3::ZERO),
            ],
        );
        let report = sim.tick();
        assert_eq!(report.script_faults.len(), 2);
        assert!(matches!(report.script_faults[0], ScriptFault::Error { .. }));
        assert!(matches!(report.script_faults[1], ScriptFault::Panic { .. }));
        assert!(custom(&sim, 1).is_empty());
        assert_eq!(
            sim.entity(EntityId(2)).unwrap().data.state.position,
            Vec3::new(1.0, 0.0, 0.0)
        );
        assert_eq!(custom(&sim, 3).get_f32("updates"), Some(1.0));
    }

    #[test]
    fn test_faulting_player_keeps_prior_state() {
        let mut sim = simulation(false, Vec::new());
        let faulty = |fault: &str| {
            let mut state = PlayerState::at(Vec3::new(1.0, 1.0, 1.0));
            state.custom_state.set("fault", fault);
            state
        };
        let erroring = sim.add_player(faulty("error"));
        let panicking = sim.add_player(faulty("panic"));
        let healthy = sim.add_player(PlayerState::at(Vec3::new(1.0, 1.0, 1.0)));

        let report = sim.tick();
        assert!(report.script_faults.is_empty());
        let before: Vec<_> = [erroring, panicking]
            .iter()
            .map(|&id| sim.player_state(id).unwrap().clone())
            .collect();

        let report = sim.tick();
        assert_eq!(report.players_processed, 3);
        assert_eq!(report.script_faults.len(), 2);
        assert!(matches!(report.script_faults[0], ScriptFault::Error { .. }));
        assert!(matches!(report.script_faults[1], ScriptFault::Panic { .. }));
        assert_eq!(sim.player_state(erroring).unwrap(), &before[0]);
        assert_eq!(sim.player_state(panicking).unwrap(), &before[1]);

        let state = sim.player_state(healthy).unwrap();
        assert_eq!(state.custom_state.get_f32("updates"), Some(2.0));
        assert_eq!(state.position, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn test_faulting_world_hooks_keep_prior_state() {
        let registry = ScriptRegistry::new()
            .with_entity_type(EntityType::new(COUNTER, "Counter", "counter.glb"), Counter)
            .with_world_script(BrokenRules);
        let mut sim = simulation_with(registry, vec![EntitySpawn::new(COUNTER, Vec3::ZERO)]);
        let initial = sim.world_state().clone();
        assert_eq!(initial.custom().get_f32("inits"), Some(1.0));

        let player = sim.add_player(PlayerState::at(Vec3::new(2.0, 1.0, 2.0)));
        assert_eq!(sim.world_state(), &initial);
        assert_eq!(sim.player_state(player).unwrap().position, Vec3::new(2.0, 1.0, 2.0));

        // The join fault is reported with the first tick, next to the update fault.
        let report = sim.tick();
        assert_eq!(report.script_faults.len(), 2);
        assert!(report.script_faults[0].label().contains("on_add_player"));
        assert!(matches!(report.script_faults[1], ScriptFault::Error { .. }));
        assert_eq!(sim.world_state(), &initial);

        let report = sim.tick();
        assert!(matches!(report.script_faults[..], [ScriptFault::Panic { .. }]));
        assert_eq!(sim.world_state(), &initial);
        assert_eq!(custom(&sim, 1).get_f32("updates"), Some(2.0));
        assert_eq!(report.players_processed, 1);
    }

    #[test]
    fn test_dynamic_entities_fall_unless_anchored() {
        let mut sim = simulation(
            false,
            vec![
                EntitySpawn::new(BOUNCER, Vec3::new(2.5, 5.0, 2.5)),
                EntitySpawn::new(BOUNCER, Vec3::new(5.5, 5.0, 5.5)),
                EntitySpawn::new(COUNTER, Vec3::new(4.5, 5.0, 4.5)),
            ],
        );
        let player = sim.add_player(PlayerState::at(Vec3::new(5.5, 1.0, 5.5)));
        assert!(sim.with_host(|host| host.anchor_entity(
            EntityId(2),
            AnchorParent::Player(player),
            "hand_right_anchor"
        )));

        let report = sim.tick();
        assert_eq!(report.bodies_moved, 1);
        assert!(sim.entity(EntityId(1)).unwrap().data.state.position.y < 5.0);
        assert_eq!(sim.entity(EntityId(2)).unwrap().data.state.position, Vec3::ZERO);
        assert_eq!(
            sim.entity(EntityId(3)).unwrap().data.state.position,
            Vec3::new(4.5, 5.0, 4.5)
        );

        for _ in 0..600 {
            sim.tick();
        }
        // The empty grid rests on its solid outside.
        let ball = sim.entity(EntityId(1)).unwrap().data.state;
        assert!((ball.position.y - 0.25).abs() < 1e-3);
        assert_eq!(ball.velocity, Vec3::ZERO);
        assert_eq!(custom(&sim, 1).get_f32("updates"), Some(601.0));
    }

    #[test]
    fn test_player_hooks_run_once() {
        let mut sim = simulation(true, Vec::new());
        assert_eq!(sim.world_state().custom().get_f32("inits"), Some(1.0));

        let player = sim.add_player(PlayerState::default());
        assert_eq!(sim.world_state().custom().get_f32("joins"), Some(1.0));
        assert_eq!(sim.player_state(player).unwrap().position, Vec3::new(4.0, 1.0, 4.0));

        for _ in 0..3 {
            let report = sim.tick();
            assert_eq!(report.players_processed, 1);
        }
        let state = sim.player_state(player).unwrap();
        assert_eq!(state.custom_state.get_f32("spawned"), Some(1.0));
        assert_eq!(state.custom_state.get_f32("updates"), Some(3.0));
        assert_eq!(sim.world_state().custom().get_f32("joins"), Some(1.0));
    }

    #[test]
    fn test_sounds_live_for_one_snapshot() {
        let mut sim = simulation(false, Vec::new());
        let player = sim.add_player(PlayerState::default());
        let fire = Controls {
            fire: true,
            ..Controls::default()
        };
        assert!(sim.set_controls(player, fire));

        sim.tick();
        assert_eq!(sim.snapshot().sounds.len(), 1);
        assert!(sim.set_controls(player, Controls::default()));
        sim.tick();
        assert!(sim.snapshot().sounds.is_empty());
        assert_eq!(sim.snapshot().tick, 2);
        assert!(!sim.set_controls(PlayerId(99), Controls::default()));
    }
}
