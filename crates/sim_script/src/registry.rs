//! Script registry: static dispatch from entity type to behaviour.
//!
//! Built once at load time and read-only while the match runs. Entity
//! types are keyed by their numeric ID; a type may have no script, in which
//! case its entities keep their state unchanged every tick.

use std::collections::BTreeMap;
use std::fmt;

use sim_types::{EntityType, EntityTypeId};
use tracing::warn;

use crate::behaviour::{EntityScript, PlayerScript, WorldScript};

/// A registered entity type and its behaviour.
pub struct EntityTypeEntry {
    /// Static type information.
    pub info: EntityType,
    /// Behaviour, if the type has one.
    pub script: Option<Box<dyn EntityScript>>,
}

impl fmt::Debug for EntityTypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTypeEntry")
            .field("info", &self.info)
            .field("scripted", &self.script.is_some())
            .finish()
    }
}

/// Every behaviour script of a match.
#[derive(Default)]
pub struct ScriptRegistry {
    entity_types: BTreeMap<EntityTypeId, EntityTypeEntry>,
    player: Option<Box<dyn PlayerScript>>,
    world: Option<Box<dyn WorldScript>>,
}

impl ScriptRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type with its script. Registering the same type
    /// ID twice replaces the earlier entry.
    pub fn register_entity_type(&mut self, info: EntityType, script: impl EntityScript + 'static) {
        self.insert(info, Some(Box::new(script)));
    }

    /// Register an entity type whose entities never change on their own.
    pub fn register_static_type(&mut self, info: EntityType) {
        self.insert(info, None);
    }

    fn insert(&mut self, info: EntityType, script: Option<Box<dyn EntityScript>>) {
        let id = info.id;
        if self
            .entity_types
            .insert(id, EntityTypeEntry { info, script })
            .is_some()
        {
            warn!(entity_type = id, "entity type registered twice, keeping the latest");
        }
    }

    /// Install the script shared by all players.
    pub fn set_player_script(&mut self, script: impl PlayerScript + 'static) {
        self.player = Some(Box::new(script));
    }

    /// Install the world script.
    pub fn set_world_script(&mut self, script: impl WorldScript + 'static) {
        self.world = Some(Box::new(script));
    }

    /// Builder form of [`ScriptRegistry::register_entity_type`].
    #[must_use]
    pub fn with_entity_type(
        mut self,
        info: EntityType,
        script: impl EntityScript + 'static,
    ) -> Self {
        self.register_entity_type(info, script);
        self
    }

    /// Builder form of [`ScriptRegistry::set_player_script`].
    #[must_use]
    pub fn with_player_script(mut self, script: impl PlayerScript + 'static) -> Self {
        self.set_player_script(script);
        self
    }

    /// Builder form of [`ScriptRegistry::set_world_script`].
    #[must_use]
    pub fn with_world_script(mut self, script: impl WorldScript + 'static) -> Self {
        self.set_world_script(script);
        self
    }

    /// Look up an entity type.
    #[must_use]
    pub fn entity_type(&self, id: EntityTypeId) -> Option<&EntityTypeEntry> {
        self.entity_types.get(&id)
    }

    /// The script of an entity type, if it has one.
    #[must_use]
    pub fn entity_script(&self, id: EntityTypeId) -> Option<&dyn EntityScript> {
        self.entity_types.get(&id)?.script.as_deref()
    }

    /// The player script, if installed.
    #[must_use]
    pub fn player_script(&self) -> Option<&dyn PlayerScript> {
        self.player.as_deref()
    }

    /// The world script, if installed.
    #[must_use]
    pub fn world_script(&self) -> Option<&dyn WorldScript> {
        self.world.as_deref()
    }

    /// Returns an iterator over all registered types, in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityTypeEntry> {
        self.entity_types.values()
    }

    /// Returns the number of registered entity types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.entity_types.len()
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("entity_types", &self.entity_types)
            .field("player", &self.player.is_some())
            .field("world", &self.world.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use sim_types::{EntityState, WorldState};

    use super::*;
    use crate::behaviour::EntityContext;
    use crate::host::Host;

    struct Noop;

    impl EntityScript for Noop {
        fn update(
            &self,
            _: &mut dyn Host,
            _: &EntityContext,
            state: EntityState,
        ) -> Result<EntityState> {
            Ok(state)
        }
    }

    impl WorldScript for Noop {
        fn update(&self, _: &mut dyn Host, world: WorldState) -> Result<WorldState> {
            Ok(world)
        }
    }

    #[test]
    fn test_register_entity_types() {
        let mut registry = ScriptRegistry::new();
        registry.register_entity_type(EntityType::new(1, "Gun", "gun.glb"), Noop);
        registry.register_static_type(EntityType::new(5, "Crate", "crate.glb"));
        assert_eq!(registry.type_count(), 2);
        assert!(registry.entity_script(1).is_some());
        assert!(registry.entity_script(5).is_none());
        assert!(registry.entity_type(5).is_some());
        assert!(registry.entity_type(9).is_none());
    }

    #[test]
    fn test_duplicate_type_replaces() {
        let mut registry = ScriptRegistry::new();
        registry.register_static_type(EntityType::new(1, "Old", "old.glb"));
        registry.register_entity_type(EntityType::new(1, "New", "new.glb"), Noop);
        assert_eq!(registry.type_count(), 1);
        assert_eq!(registry.entity_type(1).unwrap().info.name, "New");
    }

    #[test]
    fn test_iter_in_id_order() {
        let registry = ScriptRegistry::new()
            .with_entity_type(EntityType::new(3, "C", "c"), Noop)
            .with_entity_type(EntityType::new(1, "A", "a"), Noop)
            .with_world_script(Noop);
        let ids: Vec<_> = registry.iter().map(|e| e.info.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(registry.world_script().is_some());
        assert!(registry.player_script().is_none());
    }
}
