//! The bound interface capability and its lifecycle wrapper.
//!
//! Concrete interfaces implement [`BoundInterface`]. The registry wraps each
//! one in an [`InterfaceInstance`], which enforces the lifecycle:
//!
//! ```text
//! Constructed --open--> Opened --close--> Closed --> Disposed
//!       \                  \______________________/^
//!        \_____________ dropped without close _____/ (safety net)
//! ```

use std::collections::BTreeSet;

use bui_component::{EntityId, InterfaceKey};
use bui_net::{ChannelId, InterfaceMessage, InterfaceState};
use tracing::{debug, warn};

use crate::context::{InterfaceContext, Outgoing};
use crate::disposal::Disposals;

/// Behaviour of one kind of bound interface.
///
/// Every method has an empty default so an interface only overrides what it
/// cares about. Callbacks never run concurrently on the same process.
pub trait BoundInterface: Send {
    /// Invoked once, right after construction. Create windows and other
    /// owned resources here and [`track`](InterfaceContext::track) them.
    fn open(&mut self, _ctx: &mut InterfaceContext<'_>) {}

    /// Invoked with each new authoritative (or locally predicted) state.
    fn update_state(&mut self, _state: &InterfaceState, _ctx: &mut InterfaceContext<'_>) {}

    /// Invoked for each message from the other side.
    fn receive_message(&mut self, _message: &InterfaceMessage, _ctx: &mut InterfaceContext<'_>) {}

    /// Apply a predicted message to the working state.
    ///
    /// Returns `true` if `state` was changed. The next server snapshot
    /// overwrites whatever this produced.
    fn predict(&mut self, _message: &InterfaceMessage, _state: &mut Option<InterfaceState>) -> bool {
        false
    }

    /// Invoked once when the instance closes, before its resources are released.
    fn close(&mut self) {}

    /// Invoked once on the explicit disposal path, after `close`.
    fn dispose(&mut self) {}
}

/// Unique id of an interface instance within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance({})", self.0)
    }
}

/// Lifecycle of an [`InterfaceInstance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Built but `open` not yet run.
    Constructed,
    /// Live: accepts state and messages.
    Opened,
    /// Closed; resources about to be released.
    Closed,
    /// Terminal. Resources released.
    Disposed,
}

/// A live interface for one `(entity, key)` pair.
pub struct InterfaceInstance {
    id: InstanceId,
    owner: EntityId,
    key: InterfaceKey,
    state: Option<InterfaceState>,
    disposals: Disposals,
    lifecycle: Lifecycle,
    /// Channels viewing this interface. Only populated on the server.
    actors: BTreeSet<ChannelId>,
    behaviour: Box<dyn BoundInterface>,
}

impl std::fmt::Debug for InterfaceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceInstance")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("key", &self.key)
            .field("lifecycle", &self.lifecycle)
            .field("has_state", &self.state.is_some())
            .field("actors", &self.actors)
            .field("disposals", &self.disposals)
            .finish()
    }
}

impl InterfaceInstance {
    pub(crate) fn new(
        id: InstanceId,
        owner: EntityId,
        key: InterfaceKey,
        behaviour: Box<dyn BoundInterface>,
    ) -> Self {
        Self {
            id,
            owner,
            key,
            state: None,
            disposals: Disposals::new(),
            lifecycle: Lifecycle::Constructed,
            actors: BTreeSet::new(),
            behaviour,
        }
    }

    /// Process-unique id.
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// The entity hosting this interface.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// The interface key.
    #[must_use]
    pub fn key(&self) -> InterfaceKey {
        self.key
    }

    /// Current working state: the last snapshot, or a prediction on top of it.
    #[must_use]
    pub fn state(&self) -> Option<&InterfaceState> {
        self.state.as_ref()
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns `true` while the instance accepts state and messages.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Opened
    }

    /// Channels currently viewing this interface (server only).
    #[must_use]
    pub fn actors(&self) -> &BTreeSet<ChannelId> {
        &self.actors
    }

    /// Number of owned resources not yet released.
    #[must_use]
    pub fn pending_disposals(&self) -> usize {
        self.disposals.len()
    }

    pub(crate) fn attach_actor(&mut self, channel: ChannelId) -> bool {
        self.actors.insert(channel)
    }

    pub(crate) fn detach_actor(&mut self, channel: ChannelId) -> bool {
        self.actors.remove(&channel)
    }

    pub(crate) fn is_attached(&self, channel: ChannelId) -> bool {
        self.actors.contains(&channel)
    }

    /// Run `f` against the behaviour with a fresh context and collect what it sent.
    fn call<R>(
        &mut self,
        f: impl FnOnce(&mut dyn BoundInterface, &mut InterfaceContext<'_>) -> R,
    ) -> (R, Vec<Outgoing>) {
        let mut ctx =
            InterfaceContext::new(self.owner, self.key, self.state.as_ref(), &mut self.disposals);
        let result = f(self.behaviour.as_mut(), &mut ctx);
        (result, ctx.into_outgoing())
    }

    /// `Constructed -> Opened`. Does nothing in any other stage.
    pub(crate) fn open(&mut self) -> Vec<Outgoing> {
        if self.lifecycle != Lifecycle::Constructed {
            return Vec::new();
        }
        self.lifecycle = Lifecycle::Opened;
        debug!(entity = %self.owner, key = %self.key, id = %self.id, "interface opened");
        self.call(|b, ctx| b.open(ctx)).1
    }

    /// Replace the working state wholesale and notify the behaviour.
    pub(crate) fn update_state(&mut self, state: InterfaceState) -> Vec<Outgoing> {
        if !self.is_open() {
            debug!(entity = %self.owner, key = %self.key, lifecycle = ?self.lifecycle, "state for non-open interface ignored");
            return Vec::new();
        }
        self.state = Some(state);
        self.call(|b, ctx| {
            if let Some(state) = ctx.state() {
                b.update_state(state, ctx);
            }
        })
        .1
    }

    /// Store a server-authored state without notifying the behaviour.
    pub(crate) fn store_state(&mut self, state: InterfaceState) {
        self.state = Some(state);
    }

    pub(crate) fn receive_message(&mut self, message: &InterfaceMessage) -> Vec<Outgoing> {
        if !self.is_open() {
            debug!(entity = %self.owner, key = %self.key, lifecycle = ?self.lifecycle, "message for non-open interface ignored");
            return Vec::new();
        }
        self.call(|b, ctx| b.receive_message(message, ctx)).1
    }

    /// Apply `message` locally. Returns whether the working state changed.
    pub(crate) fn predict(&mut self, message: &InterfaceMessage) -> (bool, Vec<Outgoing>) {
        if !self.is_open() {
            return (false, Vec::new());
        }
        if !self.behaviour.predict(message, &mut self.state) {
            return (false, Vec::new());
        }
        let ((), outgoing) = self.call(|b, ctx| {
            if let Some(state) = ctx.state() {
                b.update_state(state, ctx);
            }
        });
        (true, outgoing)
    }

    /// `Opened -> Closed -> Disposed`. Returns `false` if already closed.
    pub(crate) fn close(&mut self) -> bool {
        match self.lifecycle {
            Lifecycle::Closed | Lifecycle::Disposed => false,
            Lifecycle::Constructed | Lifecycle::Opened => {
                self.behaviour.close();
                self.lifecycle = Lifecycle::Closed;
                self.dispose();
                true
            }
        }
    }

    /// Explicit disposal. Idempotent.
    pub(crate) fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        self.behaviour.dispose();
        let released = self.disposals.dispose_all();
        self.lifecycle = Lifecycle::Disposed;
        debug!(entity = %self.owner, key = %self.key, released, "interface disposed");
    }
}

impl Drop for InterfaceInstance {
    fn drop(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        // Only the owned handles are touched here; the behaviour may be mid-teardown.
        let released = self.disposals.release_leaked();
        warn!(
            entity = %self.owner,
            key = %self.key,
            id = %self.id,
            released,
            "interface dropped without being closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct Probe {
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl BoundInterface for Probe {
        fn open(&mut self, ctx: &mut InterfaceContext<'_>) {
            self.calls.lock().unwrap().push("open");
            let calls = Arc::clone(&self.calls);
            ctx.track(move || calls.lock().unwrap().push("release"));
        }

        fn update_state(&mut self, _state: &InterfaceState, _ctx: &mut InterfaceContext<'_>) {
            self.calls.lock().unwrap().push("update");
        }

        fn close(&mut self) {
            self.calls.lock().unwrap().push("close");
        }

        fn dispose(&mut self) {
            self.calls.lock().unwrap().push("dispose");
        }
    }

    fn probe() -> (InterfaceInstance, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let instance = InterfaceInstance::new(
            InstanceId(1),
            EntityId(1),
            InterfaceKey::from_name("probe"),
            Box::new(Probe {
                calls: Arc::clone(&calls),
            }),
        );
        (instance, calls)
    }

    fn state() -> InterfaceState {
        InterfaceState {
            type_id: bui_net::PayloadTypeId(1),
            data: vec![1],
        }
    }

    #[test]
    fn test_open_runs_once() {
        let (mut inst, calls) = probe();
        inst.open();
        inst.open();
        assert_eq!(*calls.lock().unwrap(), vec!["open"]);
        assert!(inst.is_open());
        assert_eq!(inst.pending_disposals(), 1);
    }

    #[test]
    fn test_state_before_open_is_ignored() {
        let (mut inst, calls) = probe();
        inst.update_state(state());
        assert!(inst.state().is_none());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_close_sequence_and_idempotence() {
        let (mut inst, calls) = probe();
        inst.open();
        inst.update_state(state());
        assert!(inst.close());
        assert!(!inst.close());
        assert_eq!(inst.lifecycle(), Lifecycle::Disposed);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["open", "update", "close", "dispose", "release"]
        );
    }

    #[test]
    fn test_drop_without_close_releases_resources_only() {
        let (mut inst, calls) = probe();
        inst.open();
        drop(inst);
        assert_eq!(*calls.lock().unwrap(), vec!["open", "release"]);
    }

    #[test]
    fn test_predict_without_local_behaviour_changes_nothing() {
        let (mut inst, _calls) = probe();
        inst.open();
        let msg = InterfaceMessage {
            type_id: bui_net::PayloadTypeId(2),
            data: vec![],
        };
        let (applied, out) = inst.predict(&msg);
        assert!(!applied);
        assert!(out.is_empty());
    }
}
