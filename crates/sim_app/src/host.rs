//! The [`Host`] implementation scripts are handed during a tick.
//!
//! A [`HostContext`] borrows the store mutably for the length of a single
//! script invocation. Invalid requests are logged and ignored so a buggy
//! script degrades into a no-op rather than failing the match.

use sim_math::{IVec3, Quat, Vec3};
use sim_physics::BlockGrid;
use sim_script::{Host, ScriptFault, ScriptRegistry, sandbox};
use sim_types::{
    AnchorParent, BlockId, Collision, CustomState, EntityData, EntityId, EntitySnapshot,
    EntityState, EntityTypeId, Interaction, MovementResult, PlayerId, PlayerState, SoundEvent,
};
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::queries::CollisionWorld;
use crate::store::Store;

/// Everything a script invocation may touch.
pub struct HostContext<'a> {
    store: &'a mut Store,
    registry: &'a ScriptRegistry,
    blocks: &'a BlockGrid,
    config: &'a SimConfig,
    faults: &'a mut Vec<ScriptFault>,
    tick: u64,
}

impl<'a> HostContext<'a> {
    /// Create a host for one invocation during `tick`. Faults of hooks
    /// run on the script's behalf (e.g. `on_spawn`) are appended to `faults`.
    #[must_use]
    pub fn new(
        store: &'a mut Store,
        registry: &'a ScriptRegistry,
        blocks: &'a BlockGrid,
        config: &'a SimConfig,
        faults: &'a mut Vec<ScriptFault>,
        tick: u64,
    ) -> Self {
        Self {
            store,
            registry,
            blocks,
            config,
            faults,
            tick,
        }
    }

    /// The store behind this host.
    #[must_use]
    pub fn store(&self) -> &Store {
        &*self.store
    }

    fn collision_world(&self) -> CollisionWorld<'_> {
        CollisionWorld::new(&*self.store, self.registry, self.blocks, self.config)
    }

    /// Default data for a new entity, adjusted by the type's `on_spawn`.
    fn spawn_data(
        &mut self,
        entity_type: EntityTypeId,
        state: EntityState,
    ) -> Option<EntityData> {
        let registry = self.registry;
        let entry = registry.entity_type(entity_type)?;
        let defaults = EntityData {
            entity_type,
            name: entry.info.name.clone(),
            model_path: entry.info.default_model_path.clone(),
            state,
        };
        let Some(script) = entry.script.as_deref() else {
            return Some(defaults);
        };

        let spawned = sandbox::invoke(
            || format!("entity type {entity_type} on_spawn"),
            self.config.script_budget,
            || script.on_spawn(defaults.clone()),
        );
        match spawned {
            Ok(mut data) => {
                if data.entity_type != entity_type {
                    debug!(
                        entity_type,
                        returned = data.entity_type,
                        "on_spawn changed the entity type, ignoring"
                    );
                    data.entity_type = entity_type;
                }
                Some(data)
            }
            Err(fault) => {
                warn!(tick_id = self.tick, %fault, "on_spawn faulted, keeping defaults");
                self.faults.push(fault);
                Some(defaults)
            }
        }
    }
}

impl Host for HostContext<'_> {
    fn tick(&self) -> u64 {
        self.tick
    }

    fn get_entities(&self) -> Vec<EntitySnapshot> {
        self.store.entity_snapshots()
    }

    fn get_entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.store.entity_snapshot(id)
    }

    fn get_entity_data(&self, id: EntityId) -> Option<EntityData> {
        self.store.entity(id).cloned()
    }

    fn get_player_state(&self, id: PlayerId) -> Option<PlayerState> {
        self.store.player_state(id).cloned()
    }

    fn player_ids(&self) -> Vec<PlayerId> {
        self.store.player_ids()
    }

    fn get_block(&self, cell: IVec3) -> BlockId {
        self.blocks.block_at(cell)
    }

    fn spawn_entity(
        &mut self,
        entity_type: EntityTypeId,
        position: Vec3,
        rotation: Quat,
        velocity: Vec3,
        custom_state: Option<CustomState>,
    ) -> Option<EntityId> {
        let state = EntityState {
            position,
            velocity,
            rotation,
            scale: Vec3::ONE,
            custom_state: custom_state.unwrap_or_default(),
        };
        let Some(data) = self.spawn_data(entity_type, state) else {
            warn!(tick_id = self.tick, entity_type, "spawn of unknown entity type ignored");
            return None;
        };
        let id = self.store.insert_entity(data);
        debug!(tick_id = self.tick, entity = %id, entity_type, "entity spawned");
        Some(id)
    }

    fn despawn_entity(&mut self, id: EntityId) -> bool {
        match self.store.despawn_entity(id) {
            Ok(()) => {
                debug!(tick_id = self.tick, entity = %id, "entity despawned");
                true
            }
            Err(err) => {
                warn!(tick_id = self.tick, %err, "despawn ignored");
                false
            }
        }
    }

    fn anchor_entity(&mut self, id: EntityId, parent: AnchorParent, slot: &str) -> bool {
        match self.store.anchor_entity(id, parent, slot) {
            Ok(change) => {
                debug!(tick_id = self.tick, entity = %id, %parent, slot, ?change, "anchor");
                true
            }
            Err(err) => {
                warn!(tick_id = self.tick, entity = %id, %parent, slot, %err, "anchor ignored");
                false
            }
        }
    }

    fn detach_entity(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.store.detach_entity(id, position) {
            Ok(()) => true,
            Err(err) => {
                warn!(tick_id = self.tick, %err, "detach ignored");
                false
            }
        }
    }

    fn interact_entity(&mut self, id: EntityId, interaction: Interaction) -> bool {
        match self.store.interact(id, interaction) {
            Ok(()) => true,
            Err(err) => {
                warn!(tick_id = self.tick, %err, "interaction dropped");
                false
            }
        }
    }

    fn check_movement_for_collisions(
        &self,
        player: PlayerId,
        position: Vec3,
        desired: Vec3,
    ) -> MovementResult {
        let desired = if position.is_finite() && desired.is_finite() {
            desired
        } else {
            warn!(
                tick_id = self.tick,
                %player,
                ?position,
                ?desired,
                "non-finite movement request, not moving"
            );
            Vec3::ZERO
        };
        self.collision_world().check_movement(position, desired)
    }

    fn get_collisions_for_entity(&self, id: EntityId) -> Vec<Collision> {
        self.collision_world().entity_collisions(id)
    }

    fn get_collisions_for_player(&self, id: PlayerId) -> Vec<Collision> {
        self.collision_world().player_collisions(id)
    }

    fn is_player_on_ground(&self, id: PlayerId) -> bool {
        self.collision_world().player_on_ground(id)
    }

    fn play_sound(&mut self, sound_id: &str, position: Vec3, volume: f32) {
        self.store.push_sound(SoundEvent {
            sound_id: sound_id.to_string(),
            position,
            volume,
        });
    }
}
