//! Operations a script may perform on the simulation.

use sim_math::{IVec3, Quat, Vec3};
use sim_types::{
    AnchorParent, BlockId, Collision, CustomState, EntityData, EntityId, EntitySnapshot,
    EntityTypeId, Interaction, MovementResult, PlayerId, PlayerState,
};

/// The side-effect surface exposed to scripts.
///
/// Mutating operations apply to the authoritative store immediately: an
/// entity spawned by one script is visible to every script that runs after
/// it in the same tick. Invalid arguments (unknown or despawned IDs, bad
/// anchors) never fail the caller; the operation is a logged no-op and the
/// boolean result is `false`.
pub trait Host {
    /// The tick currently being simulated.
    fn tick(&self) -> u64;

    // ── Queries ─────────────────────────────────────────────────────────

    /// Every live entity, in ID order.
    fn get_entities(&self) -> Vec<EntitySnapshot>;

    /// A single live entity.
    fn get_entity(&self, id: EntityId) -> Option<EntitySnapshot>;

    /// Identity and state of a live entity.
    fn get_entity_data(&self, id: EntityId) -> Option<EntityData> {
        self.get_entity(id).map(|snapshot| snapshot.data)
    }

    /// State of a connected player.
    fn get_player_state(&self, id: PlayerId) -> Option<PlayerState>;

    /// Every connected player, in ID order.
    fn player_ids(&self) -> Vec<PlayerId>;

    /// Block at `cell`; empty outside the grid.
    fn get_block(&self, cell: IVec3) -> BlockId;

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Spawn an entity of a registered type. The type's `on_spawn` hook has
    /// already run when this returns. `None` for an unknown type.
    fn spawn_entity(
        &mut self,
        entity_type: EntityTypeId,
        position: Vec3,
        rotation: Quat,
        velocity: Vec3,
        custom_state: Option<CustomState>,
    ) -> Option<EntityId>;

    /// Mark an entity for removal at the end of the tick. It disappears
    /// from every query straight away.
    fn despawn_entity(&mut self, id: EntityId) -> bool;

    // ── Anchors and interactions ────────────────────────────────────────

    /// Attach an entity to a named slot on a player or another entity.
    fn anchor_entity(&mut self, id: EntityId, parent: AnchorParent, slot: &str) -> bool;

    /// Clear an entity's anchor and drop it at `position` (world space).
    fn detach_entity(&mut self, id: EntityId, position: Vec3) -> bool;

    /// Queue an interaction for the target's next update.
    fn interact_entity(&mut self, id: EntityId, interaction: Interaction) -> bool;

    // ── Collision ───────────────────────────────────────────────────────

    /// Sweep a player box from `position` along `desired` against the
    /// block grid.
    ///
    /// The box has the configured player size, so only `position` decides
    /// where it starts; `player` names the caller in diagnostics. A
    /// non-finite `position` or `desired` is treated as no movement.
    fn check_movement_for_collisions(
        &self,
        player: PlayerId,
        position: Vec3,
        desired: Vec3,
    ) -> MovementResult;

    /// Current collisions of an unanchored entity. Empty for unknown IDs.
    fn get_collisions_for_entity(&self, id: EntityId) -> Vec<Collision>;

    /// Current collisions of a player. Empty for unknown IDs.
    fn get_collisions_for_player(&self, id: PlayerId) -> Vec<Collision>;

    /// Whether the player's stored position rests on a solid block.
    fn is_player_on_ground(&self, id: PlayerId) -> bool;

    // ── Output ──────────────────────────────────────────────────────────

    /// Emit a positional sound in this tick's snapshot.
    fn play_sound(&mut self, sound_id: &str, position: Vec3, volume: f32);
}
