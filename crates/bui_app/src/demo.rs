//! A counter interface shared by the demo client and server.
//!
//! Both processes build the same tiny world: one entity carrying a counter
//! component. The server owns the count; clients predict increments and are
//! corrected by the next snapshot.

use bui_component::{ComponentId, EntityId, InMemoryDirectory, InterfaceKey};
use bui_interface::{BoundInterface, InstanceSeed, InterfaceContext, Role, UiSystem};
use bui_net::{InterfaceMessage, InterfaceState, Transport, UiPayloadType};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Interface keys known to the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoUiKey {
    Counter,
}

impl DemoUiKey {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Counter => "demo.counter",
        }
    }
}

impl From<DemoUiKey> for InterfaceKey {
    fn from(key: DemoUiKey) -> Self {
        InterfaceKey::from_name(key.name())
    }
}

/// Network id of the counter component on its entity.
pub const COUNTER_COMPONENT: ComponentId = ComponentId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub value: i64,
}

impl UiPayloadType for CounterState {
    fn type_name() -> &'static str {
        "demo.CounterState"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Increment {
    pub by: i64,
}

impl UiPayloadType for Increment {
    fn type_name() -> &'static str {
        "demo.Increment"
    }
}

fn read_value(state: Option<&InterfaceState>) -> i64 {
    state
        .and_then(|s| s.unpack::<CounterState>().ok())
        .map_or(0, |s| s.value)
}

/// Client view: shows the value and predicts increments.
#[derive(Debug)]
struct CounterView {
    owner: EntityId,
}

impl BoundInterface for CounterView {
    fn open(&mut self, ctx: &mut InterfaceContext<'_>) {
        info!(entity = %self.owner, "counter window opened");
        let owner = self.owner;
        ctx.track(move || info!(entity = %owner, "counter window released"));
    }

    fn update_state(&mut self, state: &InterfaceState, _ctx: &mut InterfaceContext<'_>) {
        info!(entity = %self.owner, value = read_value(Some(state)), "counter updated");
    }

    fn predict(&mut self, message: &InterfaceMessage, state: &mut Option<InterfaceState>) -> bool {
        let Ok(inc) = message.unpack::<Increment>() else {
            return false;
        };
        let Some(value) = read_value(state.as_ref()).checked_add(inc.by) else {
            warn!(entity = %self.owner, by = inc.by, "predicted increment overflows, not predicting");
            return false;
        };
        match InterfaceState::pack(&CounterState { value }) {
            Ok(packed) => {
                *state = Some(packed);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to pack predicted counter");
                false
            }
        }
    }
}

/// Server side: the authoritative count.
#[derive(Debug, Default)]
struct CounterAuthority {
    value: i64,
}

impl CounterAuthority {
    fn publish(&self, ctx: &mut InterfaceContext<'_>) {
        if let Err(e) = ctx.set_state_value(&CounterState { value: self.value }) {
            warn!(error = %e, "failed to pack counter state");
        }
    }
}

impl BoundInterface for CounterAuthority {
    fn open(&mut self, ctx: &mut InterfaceContext<'_>) {
        self.publish(ctx);
    }

    fn receive_message(&mut self, message: &InterfaceMessage, ctx: &mut InterfaceContext<'_>) {
        match message.unpack::<Increment>() {
            Ok(inc) => match self.value.checked_add(inc.by) {
                Some(value) => {
                    self.value = value;
                    self.publish(ctx);
                }
                None => warn!(entity = %ctx.owner(), by = inc.by, "counter increment overflows, dropped"),
            },
            Err(e) => warn!(entity = %ctx.owner(), error = %e, "unexpected counter message"),
        }
    }
}

/// Populate the directory and register the counter behaviour for `role`.
///
/// Returns the counter entity.
pub fn install<T: Transport>(ui: &mut UiSystem<InMemoryDirectory, T>) -> EntityId {
    let entity = ui.directory_mut().spawn();
    if let Err(e) = ui
        .directory_mut()
        .attach(entity, COUNTER_COMPONENT, DemoUiKey::Counter.into())
    {
        warn!(error = %e, "failed to attach counter component");
    }
    match ui.role() {
        Role::Server => ui.register(DemoUiKey::Counter, |_: &InstanceSeed| -> Box<dyn BoundInterface> {
            Box::new(CounterAuthority::default())
        }),
        Role::Client { .. } => {
            ui.register(DemoUiKey::Counter, |seed: &InstanceSeed| -> Box<dyn BoundInterface> {
                Box::new(CounterView { owner: seed.owner })
            });
        }
    }
    entity
}

/// Current counter value as seen by this process.
#[must_use]
pub fn value<T: Transport>(ui: &UiSystem<InMemoryDirectory, T>, entity: EntityId) -> Option<i64> {
    ui.registry()
        .lookup(entity, DemoUiKey::Counter.into())
        .map(|i| read_value(i.state()))
}
