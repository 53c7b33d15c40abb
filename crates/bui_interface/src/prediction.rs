//! Client-side prediction bookkeeping.
//!
//! A predicted message is applied to the instance's working state right away
//! and sent to the server. It stays pending until the server's next snapshot
//! for that instance arrives; the snapshot then replaces the working state
//! wholesale and every pending prediction for the instance is dropped. There
//! is no merge and no replay.

use std::collections::HashMap;

use bui_component::{EntityId, InterfaceKey};
use bui_net::InterfaceMessage;
use tracing::debug;

use crate::context::Outgoing;
use crate::instance::InterfaceInstance;

/// A predicted message awaiting the server's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPrediction {
    /// Monotonic sequence number, unique per coordinator.
    pub seq: u64,
    /// The message as sent.
    pub message: InterfaceMessage,
}

/// Outcome of [`PredictionCoordinator::apply`].
#[derive(Debug)]
pub struct Predicted {
    /// Sequence number assigned to the prediction.
    pub seq: u64,
    /// Whether the instance changed its working state.
    pub applied: bool,
    /// Anything the instance sent while reacting to its new state.
    pub outgoing: Vec<Outgoing>,
}

/// Tracks speculative messages per `(entity, key)`.
#[derive(Debug, Default)]
pub struct PredictionCoordinator {
    next_seq: u64,
    pending: HashMap<(EntityId, InterfaceKey), Vec<PendingPrediction>>,
}

impl PredictionCoordinator {
    /// Create an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `message` to `instance` locally and record it as pending.
    ///
    /// Returns `None` if the instance is not open; nothing is recorded then.
    pub fn apply(
        &mut self,
        instance: &mut InterfaceInstance,
        message: InterfaceMessage,
    ) -> Option<Predicted> {
        if !instance.is_open() {
            return None;
        }
        let (applied, outgoing) = instance.predict(&message);
        let seq = self.record(instance.owner(), instance.key(), message);
        Some(Predicted {
            seq,
            applied,
            outgoing,
        })
    }

    /// Record a message as pending without applying it. Returns its sequence number.
    pub fn record(&mut self, entity: EntityId, key: InterfaceKey, message: InterfaceMessage) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending
            .entry((entity, key))
            .or_default()
            .push(PendingPrediction { seq, message });
        seq
    }

    /// An authoritative snapshot arrived: drop every pending prediction for
    /// the instance. Returns how many were superseded.
    pub fn reconcile(&mut self, entity: EntityId, key: InterfaceKey) -> usize {
        let superseded = self
            .pending
            .remove(&(entity, key))
            .map_or(0, |p| p.len());
        if superseded > 0 {
            debug!(%entity, %key, superseded, "snapshot superseded predictions");
        }
        superseded
    }

    /// The instance closed: forget its predictions. Late replies are absorbed
    /// by the router's missing-instance rule.
    pub fn forget(&mut self, entity: EntityId, key: InterfaceKey) -> usize {
        self.pending
            .remove(&(entity, key))
            .map_or(0, |p| p.len())
    }

    /// Pending predictions for `(entity, key)`, oldest first.
    #[must_use]
    pub fn pending(&self, entity: EntityId, key: InterfaceKey) -> &[PendingPrediction] {
        self.pending
            .get(&(entity, key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total pending predictions across every instance.
    #[must_use]
    pub fn total_pending(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }
}
