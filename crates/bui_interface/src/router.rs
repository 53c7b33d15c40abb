//! Inbound envelope routing.
//!
//! The router decodes an [`Envelope`]'s payload, asks the directory which
//! [`InterfaceKey`] the target component advertises, and dispatches to the
//! live instance for `(entity, key)`. It never touches the transport: what
//! needs sending comes back as [`Effect`]s for the caller to flush.
//!
//! A message whose target is gone is not an error. Instances close while
//! messages are in flight, so such messages are dropped with a diagnostic
//! and reported as [`RouteOutcome::Dropped`].

use bui_component::{ComponentDirectory, EntityId, InterfaceKey};
use bui_net::{ChannelId, Envelope, UiPayload};
use tracing::{debug, warn};

use crate::config::Role;
use crate::context::Outgoing;
use crate::error::RouteError;
use crate::prediction::PredictionCoordinator;
use crate::registry::InterfaceRegistry;

/// Why a well-formed message was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The target entity does not exist.
    UnknownEntity,
    /// The target component does not advertise an interface key.
    NotAdvertised,
    /// No live instance for the resolved `(entity, key)`.
    NoInstance,
    /// No factory for the resolved key.
    NoFactory,
    /// The sending channel is not viewing the interface.
    NotAttached,
    /// A client received a frame from a channel other than its server.
    NotFromServer,
}

/// What routing did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The interface was opened (or was already open).
    Opened { created: bool },
    /// The interface was closed and disposed.
    Closed,
    /// A viewer detached; the interface stays open for the others.
    Detached,
    /// A snapshot replaced the instance's state.
    StateApplied,
    /// A message reached `receive_message`.
    Delivered,
    /// Nothing happened.
    Dropped(DropReason),
}

/// Follow-up work produced while routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Requests made by an instance callback.
    Outgoing {
        entity: EntityId,
        key: InterfaceKey,
        items: Vec<Outgoing>,
    },
    /// A payload the router itself wants sent.
    Transmit {
        channel: ChannelId,
        entity: EntityId,
        key: InterfaceKey,
        payload: UiPayload,
    },
}

/// Result of routing one envelope.
#[derive(Debug)]
pub struct Routed {
    /// What happened.
    pub outcome: RouteOutcome,
    /// What should be sent as a consequence.
    pub effects: Vec<Effect>,
}

impl Routed {
    fn dropped(reason: DropReason) -> Self {
        Self {
            outcome: RouteOutcome::Dropped(reason),
            effects: Vec::new(),
        }
    }

    fn with(outcome: RouteOutcome, effects: Vec<Effect>) -> Self {
        Self { outcome, effects }
    }
}

/// Running counters, for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RouterStats {
    /// Envelopes that had an effect.
    pub delivered: u64,
    /// Well-formed envelopes that were dropped.
    pub dropped: u64,
    /// Envelopes rejected as protocol violations.
    pub rejected: u64,
}

/// Resolves envelopes to interface instances.
#[derive(Debug)]
pub struct Router {
    role: Role,
    stats: RouterStats,
}

impl Router {
    /// Create a router for `role`.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            stats: RouterStats::default(),
        }
    }

    /// The role this router dispatches for.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    /// Route one envelope.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for protocol violations. The registry is not
    /// modified in that case.
    pub fn route<D: ComponentDirectory + ?Sized>(
        &mut self,
        envelope: &Envelope,
        directory: &D,
        registry: &mut InterfaceRegistry,
        predictions: &mut PredictionCoordinator,
    ) -> Result<Routed, RouteError> {
        let result = self.dispatch(envelope, directory, registry, predictions);
        match &result {
            Ok(Routed {
                outcome: RouteOutcome::Dropped(reason),
                ..
            }) => {
                self.stats.dropped += 1;
                debug!(
                    channel = %envelope.channel(),
                    entity = %envelope.entity(),
                    component = %envelope.component(),
                    ?reason,
                    "dropping component message"
                );
            }
            Ok(_) => self.stats.delivered += 1,
            Err(e) => {
                self.stats.rejected += 1;
                warn!(
                    channel = %envelope.channel(),
                    entity = %envelope.entity(),
                    error = %e,
                    "rejected component message"
                );
            }
        }
        result
    }

    fn dispatch<D: ComponentDirectory + ?Sized>(
        &self,
        envelope: &Envelope,
        directory: &D,
        registry: &mut InterfaceRegistry,
        predictions: &mut PredictionCoordinator,
    ) -> Result<Routed, RouteError> {
        let payload = envelope.decode_payload()?;
        let entity = envelope.entity();
        let channel = envelope.channel();

        if !directory.entity_exists(entity) {
            return Ok(Routed::dropped(DropReason::UnknownEntity));
        }
        let Some(key) = directory.interface_key(entity, envelope.component()) else {
            return Ok(Routed::dropped(DropReason::NotAdvertised));
        };

        match self.role {
            Role::Server => dispatch_server(channel, entity, key, payload, registry),
            Role::Client { server } => {
                if channel != server {
                    return Ok(Routed::dropped(DropReason::NotFromServer));
                }
                Ok(dispatch_client(entity, key, payload, registry, predictions))
            }
        }
    }
}

fn outgoing(entity: EntityId, key: InterfaceKey, items: Vec<Outgoing>) -> Vec<Effect> {
    if items.is_empty() {
        Vec::new()
    } else {
        vec![Effect::Outgoing { entity, key, items }]
    }
}

fn dispatch_client(
    entity: EntityId,
    key: InterfaceKey,
    payload: UiPayload,
    registry: &mut InterfaceRegistry,
    predictions: &mut PredictionCoordinator,
) -> Routed {
    match payload {
        UiPayload::Open => match registry.open(entity, key) {
            Ok(opened) => Routed::with(
                RouteOutcome::Opened {
                    created: opened.created,
                },
                outgoing(entity, key, opened.outgoing),
            ),
            Err(_) => Routed::dropped(DropReason::NoFactory),
        },
        UiPayload::Close => {
            if registry.close(entity, key) {
                predictions.forget(entity, key);
                Routed::with(RouteOutcome::Closed, Vec::new())
            } else {
                Routed::dropped(DropReason::NoInstance)
            }
        }
        UiPayload::State(state) => {
            let Some(instance) = registry.lookup_mut(entity, key) else {
                return Routed::dropped(DropReason::NoInstance);
            };
            let items = instance.update_state(state);
            predictions.reconcile(entity, key);
            Routed::with(RouteOutcome::StateApplied, outgoing(entity, key, items))
        }
        UiPayload::Message(message) => {
            let Some(instance) = registry.lookup_mut(entity, key) else {
                return Routed::dropped(DropReason::NoInstance);
            };
            let items = instance.receive_message(&message);
            Routed::with(RouteOutcome::Delivered, outgoing(entity, key, items))
        }
    }
}

fn dispatch_server(
    channel: ChannelId,
    entity: EntityId,
    key: InterfaceKey,
    payload: UiPayload,
    registry: &mut InterfaceRegistry,
) -> Result<Routed, RouteError> {
    let routed = match payload {
        UiPayload::Open => {
            let opened = match registry.open(entity, key) {
                Ok(opened) => opened,
                Err(_) => return Ok(Routed::dropped(DropReason::NoFactory)),
            };
            let mut effects = outgoing(entity, key, opened.outgoing);
            if let Some(instance) = registry.lookup_mut(entity, key) {
                instance.attach_actor(channel);
                if let Some(state) = instance.state() {
                    effects.push(Effect::Transmit {
                        channel,
                        entity,
                        key,
                        payload: UiPayload::State(state.clone()),
                    });
                }
            }
            Routed::with(
                RouteOutcome::Opened {
                    created: opened.created,
                },
                effects,
            )
        }
        UiPayload::Close => {
            let Some(instance) = registry.lookup_mut(entity, key) else {
                return Ok(Routed::dropped(DropReason::NoInstance));
            };
            if !instance.detach_actor(channel) {
                return Ok(Routed::dropped(DropReason::NotAttached));
            }
            if instance.actors().is_empty() {
                registry.close(entity, key);
                Routed::with(RouteOutcome::Closed, Vec::new())
            } else {
                Routed::with(RouteOutcome::Detached, Vec::new())
            }
        }
        UiPayload::State(_) => return Err(RouteError::StateFromClient { channel, entity }),
        UiPayload::Message(message) => {
            let Some(instance) = registry.lookup_mut(entity, key) else {
                return Ok(Routed::dropped(DropReason::NoInstance));
            };
            if !instance.is_attached(channel) {
                return Ok(Routed::dropped(DropReason::NotAttached));
            }
            let items = instance.receive_message(&message);
            Routed::with(RouteOutcome::Delivered, outgoing(entity, key, items))
        }
    };
    Ok(routed)
}
