//! Entity/component store as seen by the interface layer.
//!
//! The interface core never owns entities or components. It only asks three
//! questions of whatever store the process runs: does an entity exist, which
//! [`InterfaceKey`] does a component advertise, and which component carries a
//! given key. [`ComponentDirectory`] is that contract; [`InMemoryDirectory`]
//! is a plain map-backed implementation used by the binary and by tests.

use std::collections::{BTreeMap, HashMap};

use crate::component::{ComponentId, InterfaceKey};
use crate::entity::{EntityAllocator, EntityId};

/// Errors raised while mutating an [`InMemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The entity does not exist (never spawned, or already despawned).
    #[error("{0} does not exist")]
    UnknownEntity(EntityId),

    /// The entity already carries a component with this id.
    #[error("{entity} already has {component}")]
    DuplicateComponent {
        entity: EntityId,
        component: ComponentId,
    },

    /// Another component on the entity already advertises this key.
    #[error("{entity} already advertises {key}")]
    DuplicateKey { entity: EntityId, key: InterfaceKey },
}

/// Read-only lookups the router and registry rely on.
pub trait ComponentDirectory {
    /// Returns `true` if the entity is currently alive.
    fn entity_exists(&self, entity: EntityId) -> bool;

    /// The interface key advertised by `component` on `entity`, if any.
    fn interface_key(&self, entity: EntityId, component: ComponentId) -> Option<InterfaceKey>;

    /// The component on `entity` that advertises `key`, if any.
    fn component_for(&self, entity: EntityId, key: InterfaceKey) -> Option<ComponentId>;
}

/// Map-backed [`ComponentDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    allocator: EntityAllocator,
    /// Advertised keys per entity, keyed by component id.
    entities: HashMap<EntityId, BTreeMap<ComponentId, InterfaceKey>>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        let entity = self.allocator.allocate();
        self.entities.insert(entity, BTreeMap::new());
        entity
    }

    /// Insert an entity with a known id (e.g. mirrored from the server).
    ///
    /// Returns `false` if the entity was already present or is
    /// [`EntityId::INVALID`].
    pub fn insert_entity(&mut self, entity: EntityId) -> bool {
        if !entity.is_valid() || self.entities.contains_key(&entity) {
            return false;
        }
        self.entities.insert(entity, BTreeMap::new());
        true
    }

    /// Remove an entity and all its components.
    ///
    /// Returns `true` if the entity existed.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        self.entities.remove(&entity).is_some()
    }

    /// Attach a component advertising `key` to `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] if the entity is unknown, or the component
    /// id or key is already in use on that entity.
    pub fn attach(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        key: InterfaceKey,
    ) -> Result<(), DirectoryError> {
        let components = self
            .entities
            .get_mut(&entity)
            .ok_or(DirectoryError::UnknownEntity(entity))?;
        if components.contains_key(&component) {
            return Err(DirectoryError::DuplicateComponent { entity, component });
        }
        if components.values().any(|k| *k == key) {
            return Err(DirectoryError::DuplicateKey { entity, key });
        }
        components.insert(component, key);
        Ok(())
    }

    /// Detach a component. Returns the key it advertised, if it existed.
    pub fn detach(&mut self, entity: EntityId, component: ComponentId) -> Option<InterfaceKey> {
        self.entities.get_mut(&entity)?.remove(&component)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl ComponentDirectory for InMemoryDirectory {
    fn entity_exists(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn interface_key(&self, entity: EntityId, component: ComponentId) -> Option<InterfaceKey> {
        self.entities.get(&entity)?.get(&component).copied()
    }

    fn component_for(&self, entity: EntityId, key: InterfaceKey) -> Option<ComponentId> {
        self.entities
            .get(&entity)?
            .iter()
            .find(|(_, k)| **k == key)
            .map(|(c, _)| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> InterfaceKey {
        InterfaceKey::from_name(name)
    }

    #[test]
    fn test_spawn_and_despawn() {
        let mut dir = InMemoryDirectory::new();
        let e = dir.spawn();
        assert!(dir.entity_exists(e));
        assert_eq!(dir.entity_count(), 1);
        assert!(dir.despawn(e));
        assert!(!dir.entity_exists(e));
        assert!(!dir.despawn(e));
    }

    #[test]
    fn test_attach_advertises_key_both_ways() {
        let mut dir = InMemoryDirectory::new();
        let e = dir.spawn();
        dir.attach(e, ComponentId(3), key("storage")).unwrap();
        assert_eq!(dir.interface_key(e, ComponentId(3)), Some(key("storage")));
        assert_eq!(dir.component_for(e, key("storage")), Some(ComponentId(3)));
        assert_eq!(dir.interface_key(e, ComponentId(4)), None);
    }

    #[test]
    fn test_attach_to_missing_entity_fails() {
        let mut dir = InMemoryDirectory::new();
        let err = dir
            .attach(EntityId(7), ComponentId(1), key("storage"))
            .unwrap_err();
        assert_eq!(err, DirectoryError::UnknownEntity(EntityId(7)));
    }

    #[test]
    fn test_duplicate_component_and_key_rejected() {
        let mut dir = InMemoryDirectory::new();
        let e = dir.spawn();
        dir.attach(e, ComponentId(1), key("a")).unwrap();
        assert!(matches!(
            dir.attach(e, ComponentId(1), key("b")),
            Err(DirectoryError::DuplicateComponent { .. })
        ));
        assert!(matches!(
            dir.attach(e, ComponentId(2), key("a")),
            Err(DirectoryError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_insert_entity_with_known_id() {
        let mut dir = InMemoryDirectory::new();
        assert!(dir.insert_entity(EntityId(40)));
        assert!(!dir.insert_entity(EntityId(40)));
        assert!(dir.entity_exists(EntityId(40)));
    }

    #[test]
    fn test_invalid_entity_cannot_be_inserted() {
        let mut dir = InMemoryDirectory::new();
        assert!(!dir.insert_entity(EntityId::INVALID));
        assert!(!dir.entity_exists(EntityId::INVALID));
        assert_eq!(dir.entity_count(), 0);
    }

    #[test]
    fn test_detach() {
        let mut dir = InMemoryDirectory::new();
        let e = dir.spawn();
        dir.attach(e, ComponentId(1), key("a")).unwrap();
        assert_eq!(dir.detach(e, ComponentId(1)), Some(key("a")));
        assert_eq!(dir.component_for(e, key("a")), None);
    }
}
