//! Interface instance registry.
//!
//! Owns every live [`InterfaceInstance`] on this process, keyed by
//! `(entity, key)`, and the factories that build them. There is at most one
//! live instance per pair.

use std::collections::HashMap;

use bui_component::{ComponentDirectory, EntityId, InterfaceKey};
use tracing::{debug, info};

use crate::context::Outgoing;
use crate::error::UiError;
use crate::instance::{BoundInterface, InstanceId, InterfaceInstance};

/// Construction parameters handed to a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceSeed {
    /// Id the new instance will carry.
    pub id: InstanceId,
    /// The entity hosting the interface.
    pub owner: EntityId,
    /// The interface key.
    pub key: InterfaceKey,
}

/// Builds the behaviour for one interface key.
pub type InterfaceFactory = Box<dyn Fn(&InstanceSeed) -> Box<dyn BoundInterface> + Send>;

/// Result of [`InterfaceRegistry::open`].
#[derive(Debug)]
pub struct Opened {
    /// The live instance's id.
    pub id: InstanceId,
    /// `false` if the instance already existed.
    pub created: bool,
    /// What the instance's `open` callback asked to send.
    pub outgoing: Vec<Outgoing>,
}

/// Registry of live interface instances.
#[derive(Default)]
pub struct InterfaceRegistry {
    factories: HashMap<InterfaceKey, InterfaceFactory>,
    instances: HashMap<(EntityId, InterfaceKey), InterfaceInstance>,
    next_id: u64,
}

impl std::fmt::Debug for InterfaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceRegistry")
            .field("factories", &self.factories.len())
            .field("instances", &self.instances.len())
            .finish()
    }
}

impl InterfaceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `key`, replacing any previous one.
    pub fn register<F>(&mut self, key: impl Into<InterfaceKey>, factory: F)
    where
        F: Fn(&InstanceSeed) -> Box<dyn BoundInterface> + Send + 'static,
    {
        self.factories.insert(key.into(), Box::new(factory));
    }

    /// Open the instance for `(entity, key)`, creating it if needed.
    ///
    /// A new instance is built by its factory and opened exactly once. An
    /// existing instance is returned untouched.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::UnknownKey`] if no factory is registered for `key`.
    pub fn open(&mut self, entity: EntityId, key: InterfaceKey) -> Result<Opened, UiError> {
        if let Some(existing) = self.instances.get(&(entity, key)) {
            return Ok(Opened {
                id: existing.id(),
                created: false,
                outgoing: Vec::new(),
            });
        }
        let factory = self.factories.get(&key).ok_or(UiError::UnknownKey(key))?;

        self.next_id += 1;
        let seed = InstanceSeed {
            id: InstanceId(self.next_id),
            owner: entity,
            key,
        };
        let mut instance = InterfaceInstance::new(seed.id, entity, key, factory(&seed));
        let outgoing = instance.open();
        self.instances.insert((entity, key), instance);

        info!(%entity, %key, id = %seed.id, "interface instance created");
        Ok(Opened {
            id: seed.id,
            created: true,
            outgoing,
        })
    }

    /// The live instance for `(entity, key)`.
    #[must_use]
    pub fn lookup(&self, entity: EntityId, key: InterfaceKey) -> Option<&InterfaceInstance> {
        self.instances.get(&(entity, key))
    }

    /// Mutable access to the live instance for `(entity, key)`.
    pub fn lookup_mut(
        &mut self,
        entity: EntityId,
        key: InterfaceKey,
    ) -> Option<&mut InterfaceInstance> {
        self.instances.get_mut(&(entity, key))
    }

    /// Close and dispose the instance for `(entity, key)`, removing it.
    ///
    /// Returns `false` if there was nothing to close. A server-driven close can
    /// race a client-driven one, so a missing instance is not an error.
    pub fn close(&mut self, entity: EntityId, key: InterfaceKey) -> bool {
        match self.instances.remove(&(entity, key)) {
            Some(mut instance) => {
                instance.close();
                info!(%entity, %key, id = %instance.id(), "interface instance closed");
                true
            }
            None => {
                debug!(%entity, %key, "close for absent interface ignored");
                false
            }
        }
    }

    /// Close every instance whose owner no longer exists in `directory`, or
    /// no longer carries a component advertising the instance's key.
    ///
    /// Returns the `(entity, key)` pairs that were closed.
    pub fn sweep_orphans<D: ComponentDirectory + ?Sized>(
        &mut self,
        directory: &D,
    ) -> Vec<(EntityId, InterfaceKey)> {
        let orphans: Vec<(EntityId, InterfaceKey)> = self
            .instances
            .keys()
            .filter(|(entity, key)| directory.component_for(*entity, *key).is_none())
            .copied()
            .collect();
        for (entity, key) in &orphans {
            self.close(*entity, *key);
        }
        if !orphans.is_empty() {
            info!(count = orphans.len(), "swept orphaned interface instances");
        }
        orphans
    }

    /// Close every instance.
    pub fn close_all(&mut self) -> usize {
        let keys: Vec<_> = self.instances.keys().copied().collect();
        for (entity, key) in &keys {
            self.close(*entity, *key);
        }
        keys.len()
    }

    /// Iterate over every live instance.
    pub fn iter(&self) -> impl Iterator<Item = &InterfaceInstance> {
        self.instances.values()
    }

    /// Number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if no instance is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
