//! Script hooks and the read-only context passed alongside state.

use std::collections::BTreeMap;

use anyhow::Result;
use sim_types::{
    Anchor, Collision, Controls, EntityData, EntityId, EntityState, EntityTypeId, Interaction,
    PlayerId, PlayerState, WorldState,
};

use crate::host::Host;

/// Read-only facts about an entity delivered with its update.
#[derive(Debug, Clone)]
pub struct EntityContext {
    /// The entity being updated.
    pub id: EntityId,
    /// Its type.
    pub entity_type: EntityTypeId,
    /// Current anchor, if attached.
    pub anchor: Option<Anchor>,
    /// Interactions queued since the entity last ran, oldest first. Each
    /// one is delivered exactly once.
    pub interactions: Vec<Interaction>,
    /// Tick being simulated.
    pub tick: u64,
}

impl EntityContext {
    /// Returns `true` if the entity is attached to something.
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }
}

/// Read-only facts about a player delivered with its update.
#[derive(Debug, Clone)]
pub struct PlayerContext {
    /// The player being updated.
    pub id: PlayerId,
    /// Latest input received from the client.
    pub controls: Controls,
    /// Collisions computed at the start of the tick.
    pub collisions: Vec<Collision>,
    /// Attached entities by slot, each slot in ID order.
    pub attached_entities: BTreeMap<String, Vec<EntityId>>,
    /// Tick being simulated.
    pub tick: u64,
}

impl PlayerContext {
    /// Entities attached in `slot`.
    #[must_use]
    pub fn attached(&self, slot: &str) -> &[EntityId] {
        self.attached_entities
            .get(slot)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Behaviour of one entity type.
pub trait EntityScript: Send + Sync {
    /// Adjust the defaults of a freshly spawned entity. Only the name,
    /// model path and state are taken from the result.
    fn on_spawn(&self, data: EntityData) -> Result<EntityData> {
        Ok(data)
    }

    /// Advance one entity by one tick.
    fn update(
        &self,
        host: &mut dyn Host,
        ctx: &EntityContext,
        state: EntityState,
    ) -> Result<EntityState>;
}

/// Behaviour shared by every player.
pub trait PlayerScript: Send + Sync {
    /// Runs once, at the start of the player's first update.
    fn on_spawn(
        &self,
        _host: &mut dyn Host,
        _id: PlayerId,
        state: PlayerState,
    ) -> Result<PlayerState> {
        Ok(state)
    }

    /// Advance one player by one tick.
    fn update(
        &self,
        host: &mut dyn Host,
        ctx: &PlayerContext,
        state: PlayerState,
    ) -> Result<PlayerState>;
}

/// Match-level rules: teams, spawn points, scoring.
pub trait WorldScript: Send + Sync {
    /// Runs once before the first tick, after the initial entities exist.
    fn init(&self, _host: &mut dyn Host, world: WorldState) -> Result<WorldState> {
        Ok(world)
    }

    /// Runs exactly once per joining player and decides their initial state.
    fn on_add_player(
        &self,
        _host: &mut dyn Host,
        world: WorldState,
        _id: PlayerId,
        player: PlayerState,
    ) -> Result<(WorldState, PlayerState)> {
        Ok((world, player))
    }

    /// Runs once per tick after every entity has been updated.
    fn update(&self, host: &mut dyn Host, world: WorldState) -> Result<WorldState>;
}
