//! The authoritative state store.
//!
//! Owns every entity, player and the world aggregate, together with the
//! anchor graph and the interaction queues. Every mutation made by a script
//! goes through here, which is where argument validation and the lifecycle
//! rules live. Invalid requests return a [`StoreError`]; broken internal
//! invariants panic.

use std::collections::BTreeMap;

use sim_math::{Quat, Transform3D, Vec3};
use sim_types::{
    Anchor, AnchorParent, Controls, EntityData, EntityId, EntitySnapshot, EntityState,
    IdAllocator, Interaction, Lifecycle, PlayerId, PlayerSnapshot, PlayerState, SoundEvent,
    WorldState,
};
use thiserror::Error;
use tracing::debug;

use crate::anchors::{AnchorChange, AnchorError, AnchorGraph};
use crate::interactions::InteractionQueue;

/// Reasons a store operation is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} does not exist")]
    UnknownEntity(EntityId),
    #[error("{0} has been despawned")]
    EntityNotLive(EntityId),
    #[error("{0} is not connected")]
    UnknownPlayer(PlayerId),
    #[error(transparent)]
    Anchor(#[from] AnchorError),
}

#[derive(Debug, Clone)]
struct EntityRecord {
    data: EntityData,
    lifecycle: Lifecycle,
}

/// A connected player.
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    /// Current state.
    pub state: PlayerState,
    /// Latest input.
    pub controls: Controls,
    /// Set until the player script's `on_spawn` has run.
    pub needs_spawn_hook: bool,
}

/// Every piece of mutable match state.
#[derive(Debug, Default)]
pub struct Store {
    entity_ids: IdAllocator,
    player_ids: IdAllocator,
    entities: BTreeMap<EntityId, EntityRecord>,
    players: BTreeMap<PlayerId, PlayerRecord>,
    world: WorldState,
    anchors: AnchorGraph,
    interactions: InteractionQueue,
    sounds: Vec<SoundEvent>,
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Entities ────────────────────────────────────────────────────────

    /// Insert a fully built entity as live and return its new ID.
    pub fn insert_entity(&mut self, data: EntityData) -> EntityId {
        let id = EntityId(self.entity_ids.allocate());
        self.entities.insert(
            id,
            EntityRecord {
                data,
                lifecycle: Lifecycle::Live,
            },
        );
        id
    }

    /// Where `id` is in its lifecycle.
    #[must_use]
    pub fn entity_lifecycle(&self, id: EntityId) -> Lifecycle {
        match self.entities.get(&id) {
            Some(record) => record.lifecycle,
            None if self.entity_ids.was_allocated(id.0) => Lifecycle::Removed,
            None => Lifecycle::Unspawned,
        }
    }

    /// Returns `true` if `id` is live.
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.entity_lifecycle(id) == Lifecycle::Live
    }

    fn live_record(&self, id: EntityId) -> Result<&EntityRecord, StoreError> {
        match self.entities.get(&id) {
            Some(record) if record.lifecycle == Lifecycle::Live => Ok(record),
            Some(_) => Err(StoreError::EntityNotLive(id)),
            None => Err(StoreError::UnknownEntity(id)),
        }
    }

    fn live_record_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord, StoreError> {
        match self.entities.get_mut(&id) {
            Some(record) if record.lifecycle == Lifecycle::Live => Ok(record),
            Some(_) => Err(StoreError::EntityNotLive(id)),
            None => Err(StoreError::UnknownEntity(id)),
        }
    }

    /// Identity and state of a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntityData> {
        self.live_record(id).ok().map(|record| &record.data)
    }

    /// IDs of every live entity, in ID order.
    #[must_use]
    pub fn live_entity_ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, record)| record.lifecycle == Lifecycle::Live)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of entities still held, including those pending removal.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Replace the state of a live entity with a script's result.
    ///
    /// # Errors
    ///
    /// Fails if the entity is unknown or was despawned.
    pub fn commit_entity_state(
        &mut self,
        id: EntityId,
        mut state: EntityState,
    ) -> Result<(), StoreError> {
        let record = self.live_record_mut(id)?;
        state.rotation = normalized(state.rotation);
        record.data.state = state;
        Ok(())
    }

    /// Mark a live entity for removal at the end of the tick.
    ///
    /// Children are detached on the spot and dropped where the entity was.
    ///
    /// # Errors
    ///
    /// Fails if the entity is unknown or already despawned.
    pub fn despawn_entity(&mut self, id: EntityId) -> Result<(), StoreError> {
        self.live_record(id)?;
        let drop = self.world_transform(id).map_or(Vec3::ZERO, |t| t.position);
        self.detach_children(AnchorParent::Entity(id), drop);
        self.anchors.detach(id);
        if let Some(record) = self.entities.get_mut(&id) {
            record.lifecycle = Lifecycle::PendingDespawn;
        }
        Ok(())
    }

    /// Physically remove every entity despawned since the last call.
    ///
    /// # Panics
    ///
    /// Panics if an entity is removed twice.
    pub fn finalize_removals(&mut self) -> Vec<EntityId> {
        let pending: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, record)| record.lifecycle == Lifecycle::PendingDespawn)
            .map(|(id, _)| *id)
            .collect();
        for id in &pending {
            self.remove_entity(*id);
        }
        pending
    }

    fn remove_entity(&mut self, id: EntityId) {
        match self.entities.remove(&id) {
            Some(record) if record.lifecycle == Lifecycle::PendingDespawn => {
                self.interactions.discard(id);
                debug!(entity = %id, "entity removed");
            }
            Some(record) => panic!("{id} removed while {:?}", record.lifecycle),
            None => panic!("{id} removed twice"),
        }
    }

    // ── Anchors ─────────────────────────────────────────────────────────

    /// Attach a live entity to a live parent's slot.
    ///
    /// A newly attached entity starts at the slot origin, at rest.
    ///
    /// # Errors
    ///
    /// Fails if either side is not live or the anchor graph rejects it.
    pub fn anchor_entity(
        &mut self,
        id: EntityId,
        parent: AnchorParent,
        slot: &str,
    ) -> Result<AnchorChange, StoreError> {
        self.live_record(id)?;
        match parent {
            AnchorParent::Player(player) => {
                self.player(player)?;
            }
            AnchorParent::Entity(entity) => {
                self.live_record(entity)?;
            }
        }
        let change = self.anchors.anchor(id, Anchor::new(parent, slot))?;
        if change == AnchorChange::Attached {
            let state = &mut self.live_record_mut(id)?.data.state;
            state.position = Vec3::ZERO;
            state.velocity = Vec3::ZERO;
            state.rotation = Quat::IDENTITY;
        }
        Ok(change)
    }

    /// Clear a live entity's anchor (if any) and drop it at `position`.
    ///
    /// # Errors
    ///
    /// Fails if the entity is unknown or despawned.
    pub fn detach_entity(&mut self, id: EntityId, position: Vec3) -> Result<(), StoreError> {
        let state = &mut self.live_record_mut(id)?.data.state;
        place_at(state, position);
        self.anchors.detach(id);
        Ok(())
    }

    fn detach_children(&mut self, parent: AnchorParent, drop: Vec3) {
        for child in self.anchors.detach_all_from(parent) {
            if let Some(record) = self.entities.get_mut(&child) {
                place_at(&mut record.data.state, drop);
            }
            debug!(entity = %child, %parent, "detached from removed parent");
        }
    }

    /// The anchor graph.
    #[must_use]
    pub fn anchors(&self) -> &AnchorGraph {
        &self.anchors
    }

    /// Anchor of a live entity.
    #[must_use]
    pub fn anchor_of(&self, id: EntityId) -> Option<&Anchor> {
        self.anchors.anchor_of(id)
    }

    /// Entities attached to a player, by slot.
    #[must_use]
    pub fn attached_entities(&self, player: PlayerId) -> BTreeMap<String, Vec<EntityId>> {
        self.anchors.slots_of(AnchorParent::Player(player))
    }

    /// World transform of a live entity, resolved through its anchor.
    #[must_use]
    pub fn world_transform(&self, id: EntityId) -> Option<Transform3D> {
        let local = self.entity(id)?.state.local_transform();
        let Some(anchor) = self.anchors.anchor_of(id) else {
            return Some(local);
        };
        let parent = match anchor.parent {
            AnchorParent::Player(player) => self.players.get(&player)?.state.transform(),
            AnchorParent::Entity(entity) => self.entity(entity)?.state.local_transform(),
        };
        Some(parent.compose(&local))
    }

    // ── Interactions ────────────────────────────────────────────────────

    /// Queue an interaction for a live entity.
    ///
    /// # Errors
    ///
    /// Fails if the target is unknown or despawned.
    pub fn interact(&mut self, id: EntityId, interaction: Interaction) -> Result<(), StoreError> {
        self.live_record(id)?;
        self.interactions.push(id, interaction);
        Ok(())
    }

    /// Hand out, and forget, everything queued for `id`.
    pub fn take_interactions(&mut self, id: EntityId) -> Vec<Interaction> {
        self.interactions.take(id)
    }

    /// Interactions queued for `id`, without consuming them.
    #[must_use]
    pub fn pending_interactions(&self, id: EntityId) -> &[Interaction] {
        self.interactions.pending_for(id)
    }

    // ── Players ─────────────────────────────────────────────────────────

    /// Add a player. Its `on_spawn` hook is still owed.
    pub fn add_player(&mut self, state: PlayerState) -> PlayerId {
        let id = PlayerId(self.player_ids.allocate());
        self.players.insert(
            id,
            PlayerRecord {
                state,
                controls: Controls::default(),
                needs_spawn_hook: true,
            },
        );
        id
    }

    /// Remove a player at once. Attached entities are detached and dropped
    /// at the player's position, never despawned.
    ///
    /// # Errors
    ///
    /// Fails if the player is not connected.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<PlayerState, StoreError> {
        let record = self
            .players
            .remove(&id)
            .ok_or(StoreError::UnknownPlayer(id))?;
        self.detach_children(AnchorParent::Player(id), record.state.position);
        Ok(record.state)
    }

    /// Where a player ID is in its lifecycle. Players are never pending.
    #[must_use]
    pub fn player_lifecycle(&self, id: PlayerId) -> Lifecycle {
        if self.players.contains_key(&id) {
            Lifecycle::Live
        } else if self.player_ids.was_allocated(id.0) {
            Lifecycle::Removed
        } else {
            Lifecycle::Unspawned
        }
    }

    /// A connected player.
    ///
    /// # Errors
    ///
    /// Fails if the player is not connected.
    pub fn player(&self, id: PlayerId) -> Result<&PlayerRecord, StoreError> {
        self.players.get(&id).ok_or(StoreError::UnknownPlayer(id))
    }

    /// A connected player, mutably.
    ///
    /// # Errors
    ///
    /// Fails if the player is not connected.
    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut PlayerRecord, StoreError> {
        self.players.get_mut(&id).ok_or(StoreError::UnknownPlayer(id))
    }

    /// State of a connected player.
    #[must_use]
    pub fn player_state(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id).map(|record| &record.state)
    }

    /// IDs of every connected player, in ID order.
    #[must_use]
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    // ── World ───────────────────────────────────────────────────────────

    /// The world aggregate.
    #[must_use]
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Replace the world aggregate.
    pub fn set_world(&mut self, world: WorldState) {
        self.world = world;
    }

    // ── Sounds ──────────────────────────────────────────────────────────

    /// Record a sound for this tick's snapshot.
    pub fn push_sound(&mut self, sound: SoundEvent) {
        self.sounds.push(sound);
    }

    /// Drain the sounds recorded since the last call.
    pub fn take_sounds(&mut self) -> Vec<SoundEvent> {
        std::mem::take(&mut self.sounds)
    }

    // ── Views ───────────────────────────────────────────────────────────

    /// Snapshot of a live entity.
    #[must_use]
    pub fn entity_snapshot(&self, id: EntityId) -> Option<EntitySnapshot> {
        Some(EntitySnapshot {
            id,
            data: self.entity(id)?.clone(),
            anchor: self.anchors.anchor_of(id).cloned(),
            world_transform: self.world_transform(id)?,
        })
    }

    /// Snapshots of every live entity, in ID order.
    #[must_use]
    pub fn entity_snapshots(&self) -> Vec<EntitySnapshot> {
        self.live_entity_ids()
            .into_iter()
            .filter_map(|id| self.entity_snapshot(id))
            .collect()
    }

    /// Snapshots of every connected player, in ID order.
    #[must_use]
    pub fn player_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players
            .iter()
            .map(|(id, record)| PlayerSnapshot {
                id: *id,
                state: record.state.clone(),
                attached_entities: self.attached_entities(*id),
            })
            .collect()
    }

    /// Check that every anchor joins live bodies and the graph is well formed.
    ///
    /// # Panics
    ///
    /// Panics on any violation.
    pub fn assert_consistent(&self) {
        self.anchors.assert_consistent();
        for (child, anchor) in self.anchors.iter() {
            assert!(self.is_live(child), "anchored {child} is not live");
            let parent_live = match anchor.parent {
                AnchorParent::Player(player) => self.players.contains_key(&player),
                AnchorParent::Entity(entity) => self.is_live(entity),
            };
            assert!(parent_live, "{child} anchored to missing {}", anchor.parent);
        }
    }
}

/// Drop an entity at `position`, at rest and upright.
fn place_at(state: &mut EntityState, position: Vec3) {
    state.position = position;
    state.velocity = Vec3::ZERO;
    state.rotation = Quat::IDENTITY;
}

fn normalized(rotation: Quat) -> Quat {
    if rotation.is_finite() && rotation.length_squared() > f32::EPSILON {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    }
}
