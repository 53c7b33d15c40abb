//! The per-process interface system.
//!
//! [`UiSystem`] wires a registry, a router and a prediction coordinator to a
//! directory and a transport, and is the only thing the simulation loop
//! talks to. It is driven from a single thread: inbound frames are routed and
//! outbound requests flushed synchronously, in call order.

use bui_component::{ComponentDirectory, EntityId, InterfaceKey};
use bui_net::{
    ChannelId, EntityFrame, Envelope, InterfaceMessage, InterfaceState, Transport, UiPayload,
};
use tracing::{debug, warn};

use crate::config::{Role, UiConfig};
use crate::context::Outgoing;
use crate::error::{RouteError, UiError};
use crate::instance::{BoundInterface, InstanceId};
use crate::prediction::PredictionCoordinator;
use crate::registry::{InstanceSeed, InterfaceRegistry};
use crate::router::{Effect, RouteOutcome, Router, RouterStats};

/// Bound-interface driver for one process.
#[derive(Debug)]
pub struct UiSystem<D, T> {
    config: UiConfig,
    directory: D,
    transport: T,
    registry: InterfaceRegistry,
    router: Router,
    predictions: PredictionCoordinator,
    ticks: u64,
}

impl<D: ComponentDirectory, T: Transport> UiSystem<D, T> {
    /// Create a system.
    #[must_use]
    pub fn new(config: UiConfig, directory: D, transport: T) -> Self {
        let router = Router::new(config.role);
        Self {
            config,
            directory,
            transport,
            registry: InterfaceRegistry::new(),
            router,
            predictions: PredictionCoordinator::new(),
            ticks: 0,
        }
    }

    /// Register the factory for an interface key.
    pub fn register<F>(&mut self, key: impl Into<InterfaceKey>, factory: F)
    where
        F: Fn(&InstanceSeed) -> Box<dyn BoundInterface> + Send + 'static,
    {
        self.registry.register(key, factory);
    }

    /// This process's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.config.role
    }

    /// The entity/component directory.
    #[must_use]
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Mutable access to the directory.
    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The instance registry.
    #[must_use]
    pub fn registry(&self) -> &InterfaceRegistry {
        &self.registry
    }

    /// The prediction coordinator.
    #[must_use]
    pub fn predictions(&self) -> &PredictionCoordinator {
        &self.predictions
    }

    /// Router counters.
    #[must_use]
    pub fn router_stats(&self) -> RouterStats {
        self.router.stats()
    }

    /// Open `(entity, key)` on this process.
    ///
    /// On a client this is local policy: the instance opens immediately and
    /// an open request goes to the server.
    ///
    /// # Errors
    ///
    /// Returns [`UiError`] if the entity does not exist, does not advertise
    /// `key`, or no factory is registered for `key`.
    pub fn open(&mut self, entity: EntityId, key: InterfaceKey) -> Result<InstanceId, UiError> {
        self.check_target(entity, key)?;
        let opened = self.registry.open(entity, key)?;
        // The server must see the open before anything the instance sends.
        if let (true, Role::Client { server }) = (opened.created, self.config.role) {
            self.transmit(server, entity, key, &UiPayload::Open);
        }
        self.flush_outgoing(entity, key, opened.outgoing);
        Ok(opened.id)
    }

    /// Close `(entity, key)`. Returns `false` if it was not open.
    ///
    /// The instance is released locally at once; replies still in flight are
    /// dropped by the router when they arrive. On the server every viewer is
    /// told to close.
    pub fn close(&mut self, entity: EntityId, key: InterfaceKey) -> bool {
        match self.config.role {
            Role::Client { server } => {
                if !self.registry.close(entity, key) {
                    return false;
                }
                self.predictions.forget(entity, key);
                self.transmit(server, entity, key, &UiPayload::Close);
                true
            }
            Role::Server => {
                let actors: Vec<ChannelId> = match self.registry.lookup(entity, key) {
                    Some(instance) => instance.actors().iter().copied().collect(),
                    None => return false,
                };
                for channel in actors {
                    self.transmit(channel, entity, key, &UiPayload::Close);
                }
                self.registry.close(entity, key)
            }
        }
    }

    /// Send a message without local application.
    ///
    /// Returns `false` if the interface is not open.
    pub fn send(&mut self, entity: EntityId, key: InterfaceKey, message: InterfaceMessage) -> bool {
        if !self.is_open(entity, key) {
            debug!(%entity, %key, "send on closed interface dropped");
            return false;
        }
        self.deliver(entity, key, UiPayload::Message(message));
        true
    }

    /// Apply a message locally, then send it (client). On the server this is
    /// a plain [`send`](Self::send).
    ///
    /// Returns `false` if the interface is not open.
    pub fn send_predicted(
        &mut self,
        entity: EntityId,
        key: InterfaceKey,
        message: InterfaceMessage,
    ) -> bool {
        if self.config.role.is_server() {
            return self.send(entity, key, message);
        }
        let Some(instance) = self.registry.lookup_mut(entity, key) else {
            debug!(%entity, %key, "predicted send on absent interface dropped");
            return false;
        };
        let Some(predicted) = self.predictions.apply(instance, message.clone()) else {
            debug!(%entity, %key, "predicted send on closed interface dropped");
            return false;
        };
        debug!(%entity, %key, seq = predicted.seq, applied = predicted.applied, "predicted message");
        // A prediction may not start another one.
        let outgoing = predicted
            .outgoing
            .into_iter()
            .filter(|item| {
                let nested = matches!(item, Outgoing::SendPredicted(_));
                if nested {
                    warn!(%entity, %key, "predicted send raised while predicting, ignoring");
                }
                !nested
            })
            .collect();
        self.flush_outgoing(entity, key, outgoing);
        self.deliver(entity, key, UiPayload::Message(message));
        true
    }

    /// Replace the authoritative state and push it to every viewer.
    ///
    /// # Errors
    ///
    /// Returns [`UiError::ServerOnly`] on a client.
    pub fn set_state(
        &mut self,
        entity: EntityId,
        key: InterfaceKey,
        state: InterfaceState,
    ) -> Result<bool, UiError> {
        if !self.config.role.is_server() {
            return Err(UiError::ServerOnly("set interface state"));
        }
        Ok(self.apply_server_state(entity, key, state))
    }

    /// Open `(entity, key)` for the client on `channel` (server).
    ///
    /// # Errors
    ///
    /// Returns [`UiError`] on a client, or if the target cannot host the key.
    pub fn open_for(
        &mut self,
        channel: ChannelId,
        entity: EntityId,
        key: InterfaceKey,
    ) -> Result<InstanceId, UiError> {
        if !self.config.role.is_server() {
            return Err(UiError::ServerOnly("open an interface for a channel"));
        }
        self.check_target(entity, key)?;
        let opened = self.registry.open(entity, key)?;
        let mut snapshot = None;
        if let Some(instance) = self.registry.lookup_mut(entity, key) {
            instance.attach_actor(channel);
            snapshot = instance.state().cloned();
        }
        self.transmit(channel, entity, key, &UiPayload::Open);
        if let Some(state) = snapshot {
            self.transmit(channel, entity, key, &UiPayload::State(state));
        }
        self.flush_outgoing(entity, key, opened.outgoing);
        Ok(opened.id)
    }

    /// Close `(entity, key)` for one viewer (server). The instance closes
    /// when its last viewer leaves. Returns `false` if the channel was not
    /// viewing it.
    pub fn close_for(&mut self, channel: ChannelId, entity: EntityId, key: InterfaceKey) -> bool {
        if !self.config.role.is_server() {
            return false;
        }
        let Some(instance) = self.registry.lookup_mut(entity, key) else {
            return false;
        };
        if !instance.detach_actor(channel) {
            return false;
        }
        let last = instance.actors().is_empty();
        self.transmit(channel, entity, key, &UiPayload::Close);
        if last {
            self.registry.close(entity, key);
        }
        true
    }

    /// Route one inbound envelope and flush what it produced.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] if the envelope violates the protocol.
    pub fn route(&mut self, envelope: &Envelope) -> Result<RouteOutcome, RouteError> {
        let routed = self.router.route(
            envelope,
            &self.directory,
            &mut self.registry,
            &mut self.predictions,
        )?;
        for effect in routed.effects {
            match effect {
                Effect::Outgoing { entity, key, items } => self.flush_outgoing(entity, key, items),
                Effect::Transmit {
                    channel,
                    entity,
                    key,
                    payload,
                } => self.transmit(channel, entity, key, &payload),
            }
        }
        Ok(routed.outcome)
    }

    /// Wrap a raw frame from `channel` and route it.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Malformed`] if the frame is not a component
    /// message, or any error from [`route`](Self::route).
    pub fn receive(
        &mut self,
        channel: ChannelId,
        frame: EntityFrame,
    ) -> Result<RouteOutcome, RouteError> {
        let envelope = Envelope::from_frame(channel, frame)?;
        self.route(&envelope)
    }

    /// A channel went away: detach it from every interface (server).
    pub fn disconnect(&mut self, channel: ChannelId) -> usize {
        let viewed: Vec<(EntityId, InterfaceKey)> = self
            .registry
            .iter()
            .filter(|i| i.actors().contains(&channel))
            .map(|i| (i.owner(), i.key()))
            .collect();
        for (entity, key) in &viewed {
            if let Some(instance) = self.registry.lookup_mut(*entity, *key) {
                instance.detach_actor(channel);
                if instance.actors().is_empty() {
                    self.registry.close(*entity, *key);
                }
            }
        }
        viewed.len()
    }

    /// Close instances whose owner entity is gone.
    pub fn sweep(&mut self) -> usize {
        let swept = self.registry.sweep_orphans(&self.directory);
        for (entity, key) in &swept {
            self.predictions.forget(*entity, *key);
        }
        swept.len()
    }

    /// Advance one tick, running the orphan sweep when due.
    pub fn tick(&mut self) {
        self.ticks += 1;
        let interval = self.config.sweep_interval_ticks;
        if interval > 0 && self.ticks % interval == 0 {
            self.sweep();
        }
    }

    /// Ticks seen so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Close everything, e.g. on shutdown.
    pub fn shutdown(&mut self) -> usize {
        let keys: Vec<_> = self.registry.iter().map(|i| (i.owner(), i.key())).collect();
        for (entity, key) in &keys {
            self.close(*entity, *key);
        }
        keys.len()
    }

    fn is_open(&self, entity: EntityId, key: InterfaceKey) -> bool {
        self.registry
            .lookup(entity, key)
            .is_some_and(|i| i.is_open())
    }

    fn check_target(&self, entity: EntityId, key: InterfaceKey) -> Result<(), UiError> {
        if !self.directory.entity_exists(entity) {
            return Err(UiError::UnknownEntity(entity));
        }
        if self.directory.component_for(entity, key).is_none() {
            return Err(UiError::NotAdvertised { entity, key });
        }
        Ok(())
    }

    fn apply_server_state(&mut self, entity: EntityId, key: InterfaceKey, state: InterfaceState) -> bool {
        let Some(instance) = self.registry.lookup_mut(entity, key) else {
            debug!(%entity, %key, "state for absent interface dropped");
            return false;
        };
        instance.store_state(state.clone());
        self.deliver(entity, key, UiPayload::State(state));
        true
    }

    /// Send to the other side: the server for a client, every viewer for the server.
    fn deliver(&mut self, entity: EntityId, key: InterfaceKey, payload: UiPayload) {
        match self.config.role {
            Role::Client { server } => self.transmit(server, entity, key, &payload),
            Role::Server => {
                let actors: Vec<ChannelId> = self
                    .registry
                    .lookup(entity, key)
                    .map(|i| i.actors().iter().copied().collect())
                    .unwrap_or_default();
                for channel in actors {
                    self.transmit(channel, entity, key, &payload);
                }
            }
        }
    }

    fn flush_outgoing(&mut self, entity: EntityId, key: InterfaceKey, items: Vec<Outgoing>) {
        for item in items {
            match item {
                Outgoing::Send(message) => {
                    self.send(entity, key, message);
                }
                Outgoing::SendPredicted(message) => {
                    self.send_predicted(entity, key, message);
                }
                Outgoing::SetState(state) => {
                    if self.config.role.is_server() {
                        self.apply_server_state(entity, key, state);
                    } else {
                        warn!(%entity, %key, "client interface tried to set state, ignoring");
                    }
                }
            }
        }
    }

    fn transmit(&mut self, channel: ChannelId, entity: EntityId, key: InterfaceKey, payload: &UiPayload) {
        let Some(component) = self.directory.component_for(entity, key) else {
            debug!(%entity, %key, "no component advertises key, not transmitting");
            return;
        };
        match EntityFrame::component_message(entity, component, payload) {
            Ok(frame) => self.transport.send(channel, frame),
            Err(e) => warn!(%entity, %key, error = %e, kind = payload.label(), "failed to encode payload"),
        }
    }
}
