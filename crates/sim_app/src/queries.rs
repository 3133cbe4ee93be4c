//! Collision queries over the live store.
//!
//! Collisions are never stored. Every query recomputes them from current
//! positions, so a body moved earlier in the tick is seen where it now is.
//! Anchored entities ride along with their parent and take no part in
//! collision queries.

use sim_math::{Aabb, Vec3};
use sim_physics::{BlockGrid, block_collisions, is_on_ground, resolve_movement};
use sim_script::ScriptRegistry;
use sim_types::{
    Collision, CollisionKind, CollisionTarget, EntityId, MovementResult, PlayerId,
};

use crate::config::SimConfig;
use crate::store::Store;

/// A collider placed in the world.
#[derive(Debug, Clone, Copy)]
struct Body {
    aabb: Aabb,
    sensor: bool,
}

fn kind_for(a_sensor: bool, b_sensor: bool) -> CollisionKind {
    if a_sensor || b_sensor {
        CollisionKind::Intersection
    } else {
        CollisionKind::Contact
    }
}

/// Read-only view used to answer collision and movement queries.
#[derive(Debug, Clone, Copy)]
pub struct CollisionWorld<'a> {
    store: &'a Store,
    registry: &'a ScriptRegistry,
    blocks: &'a BlockGrid,
    config: &'a SimConfig,
}

impl<'a> CollisionWorld<'a> {
    /// Create a view over the current state.
    #[must_use]
    pub fn new(
        store: &'a Store,
        registry: &'a ScriptRegistry,
        blocks: &'a BlockGrid,
        config: &'a SimConfig,
    ) -> Self {
        Self {
            store,
            registry,
            blocks,
            config,
        }
    }

    fn entity_body(&self, id: EntityId) -> Option<Body> {
        if self.store.anchor_of(id).is_some() {
            return None;
        }
        let data = self.store.entity(id)?;
        let collider = self.registry.entity_type(data.entity_type)?.info.collider?;
        Some(Body {
            aabb: Aabb::from_center(data.state.position, collider.half_extents * data.state.scale),
            sensor: collider.sensor,
        })
    }

    fn player_body(&self, id: PlayerId) -> Option<Body> {
        let state = self.store.player_state(id)?;
        Some(Body {
            aabb: Aabb::from_feet(state.position, self.config.player_size),
            sensor: false,
        })
    }

    /// Collisions of `body` with every other collider, skipping `exclude`.
    fn collide(&self, body: Body, exclude: CollisionTarget) -> Vec<Collision> {
        let block_kind = kind_for(body.sensor, false);
        let mut collisions = block_collisions(self.blocks, &body.aabb, block_kind);

        for id in self.store.live_entity_ids() {
            let target = CollisionTarget::Entity(id);
            if target == exclude {
                continue;
            }
            if let Some(other) = self.entity_body(id)
                && other.aabb.overlaps(&body.aabb)
            {
                collisions.push(Collision::overlap(kind_for(body.sensor, other.sensor), target));
            }
        }

        for id in self.store.player_ids() {
            let target = CollisionTarget::Player(id);
            if target == exclude {
                continue;
            }
            if let Some(other) = self.player_body(id)
                && other.aabb.overlaps(&body.aabb)
            {
                collisions.push(Collision::overlap(kind_for(body.sensor, other.sensor), target));
            }
        }
        collisions
    }

    /// Current collisions of a live, unanchored entity with a collider.
    #[must_use]
    pub fn entity_collisions(&self, id: EntityId) -> Vec<Collision> {
        self.entity_body(id)
            .map(|body| self.collide(body, CollisionTarget::Entity(id)))
            .unwrap_or_default()
    }

    /// Current collisions of a connected player.
    #[must_use]
    pub fn player_collisions(&self, id: PlayerId) -> Vec<Collision> {
        self.player_body(id)
            .map(|body| self.collide(body, CollisionTarget::Player(id)))
            .unwrap_or_default()
    }

    /// Sweep a player-sized box from `position` along `desired`.
    #[must_use]
    pub fn check_movement(&self, position: Vec3, desired: Vec3) -> MovementResult {
        resolve_movement(self.blocks, self.config.player_size, position, desired)
    }

    /// Whether a connected player stands on a solid block.
    #[must_use]
    pub fn player_on_ground(&self, id: PlayerId) -> bool {
        self.store
            .player_state(id)
            .is_some_and(|state| is_on_ground(self.blocks, self.config.player_size, state.position))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use sim_math::IVec3;
    use sim_script::{EntityContext, EntityScript, Host};
    use sim_types::{
        AnchorParent, ColliderShape, EntityData, EntityState, EntityType, PlayerState,
    };

    use super::*;

    struct Idle;

    impl EntityScript for Idle {
        fn update(
            &self,
            _: &mut dyn Host,
            _: &EntityContext,
            state: EntityState,
        ) -> Result<EntityState> {
            Ok(state)
        }
    }

    const SOLID: u8 = 0;
    const SENSOR: u8 = 1;

    fn registry() -> ScriptRegistry {
        ScriptRegistry::new()
            .with_entity_type(
                EntityType::new(SOLID, "Box", "box.glb").with_collider(ColliderShape::cube(0.25)),
                Idle,
            )
            .with_entity_type(
                EntityType::new(SENSOR, "Pickup", "pickup.glb")
                    .with_collider(ColliderShape::sensor(0.25)),
                Idle,
            )
    }

    fn spawn(store: &mut Store, entity_type: u8, position: Vec3) -> EntityId {
        store.insert_entity(EntityData {
            entity_type,
            name: String::new(),
            model_path: String::new(),
            state: EntityState::at(position),
        })
    }

    fn grid() -> BlockGrid {
        let mut grid = BlockGrid::new(IVec3::new(16, 16, 16)).unwrap();
        grid.fill(IVec3::ZERO, IVec3::new(15, 0, 15), 1);
        grid
    }

    #[test]
    fn test_entity_overlap_kinds() {
        let registry = registry();
        let blocks = grid();
        let config = SimConfig::default();
        let mut store = Store::new();
        let a = spawn(&mut store, SOLID, Vec3::new(5.0, 3.0, 5.0));
        let b = spawn(&mut store, SOLID, Vec3::new(5.2, 3.0, 5.0));
        let c = spawn(&mut store, SENSOR, Vec3::new(4.8, 3.0, 5.0));

        let world = CollisionWorld::new(&store, &registry, &blocks, &config);
        let hits = world.entity_collisions(a);
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&Collision::overlap(CollisionKind::Contact, CollisionTarget::Entity(b))));
        assert!(hits.contains(&Collision::overlap(
            CollisionKind::Intersection,
            CollisionTarget::Entity(c)
        )));
    }

    #[test]
    fn test_anchored_entities_are_ignored() {
        let registry = registry();
        let blocks = grid();
        let config = SimConfig::default();
        let mut store = Store::new();
        let player = store.add_player(PlayerState::at(Vec3::new(5.0, 1.0, 5.0)));
        let held = spawn(&mut store, SOLID, Vec3::ZERO);
        store
            .anchor_entity(held, AnchorParent::Player(player), "hand_right_anchor")
            .unwrap();
        let loose = spawn(&mut store, SOLID, Vec3::new(5.0, 1.5, 5.0));

        let world = CollisionWorld::new(&store, &registry, &blocks, &config);
        assert!(world.entity_collisions(held).is_empty());
        let hits = world.player_collisions(player);
        assert_eq!(
            hits,
            vec![Collision::overlap(CollisionKind::Contact, CollisionTarget::Entity(loose))]
        );
    }

    #[test]
    fn test_unknown_ids_have_no_collisions() {
        let registry = registry();
        let blocks = grid();
        let config = SimConfig::default();
        let store = Store::new();
        let world = CollisionWorld::new(&store, &registry, &blocks, &config);
        assert!(world.entity_collisions(EntityId(42)).is_empty());
        assert!(world.player_collisions(PlayerId(42)).is_empty());
        assert!(!world.player_on_ground(PlayerId(42)));
    }

    #[test]
    fn test_entity_in_floor_hits_block() {
        let registry = registry();
        let blocks = grid();
        let config = SimConfig::default();
        let mut store = Store::new();
        let id = spawn(&mut store, SOLID, Vec3::new(5.5, 1.1, 5.5));
        let world = CollisionWorld::new(&store, &registry, &blocks, &config);
        let hits = world.entity_collisions(id);
        assert_eq!(hits.len(), 1);
        assert!(matches!(hits[0].target, CollisionTarget::Block { block: 1, .. }));
        assert_eq!(hits[0].normal, Vec3::Y);
    }
}
