use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bui_component::{ComponentId, EntityId, InMemoryDirectory, InterfaceKey};
use bui_interface::{
    BoundInterface, DropReason, InstanceSeed, InterfaceContext, Lifecycle, RouteOutcome, UiConfig,
    UiSystem,
};
use bui_net::{
    ChannelId, EntityFrame, Envelope, InterfaceMessage, InterfaceState, RecordingTransport,
    UiPayload, UiPayloadType,
};
use serde::{Deserialize, Serialize};

// ── Test interface ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CounterState {
    counter: i64,
}

impl UiPayloadType for CounterState {
    fn type_name() -> &'static str {
        "CounterState"
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Increment;

impl UiPayloadType for Increment {
    fn type_name() -> &'static str {
        "Increment"
    }
}

const COMPONENT: ComponentId = ComponentId(9);

fn key_a() -> InterfaceKey {
    InterfaceKey::from_name("counter")
}

/// Client side: predicts increments, owns one releasable resource.
struct CounterView {
    releases: Arc<AtomicUsize>,
}

impl BoundInterface for CounterView {
    fn open(&mut self, ctx: &mut InterfaceContext<'_>) {
        let releases = Arc::clone(&self.releases);
        ctx.track(move || {
            releases.fetch_add(1, Ordering::SeqCst);
        });
    }

    fn predict(&mut self, message: &InterfaceMessage, state: &mut Option<InterfaceState>) -> bool {
        if !message.is::<Increment>() {
            return false;
        }
        let mut current = state
            .as_ref()
            .and_then(|s| s.unpack::<CounterState>().ok())
            .unwrap_or(CounterState { counter: 0 });
        current.counter += 1;
        *state = Some(InterfaceState::pack(&current).unwrap());
        true
    }
}

/// Server side: owns the authoritative count.
#[derive(Default)]
struct CounterAuthority {
    count: i64,
}

impl BoundInterface for CounterAuthority {
    fn receive_message(&mut self, message: &InterfaceMessage, ctx: &mut InterfaceContext<'_>) {
        if message.is::<Increment>() {
            self.count += 1;
            ctx.set_state_value(&CounterState {
                counter: self.count,
            })
            .unwrap();
        }
    }
}

fn counter(state: Option<&InterfaceState>) -> i64 {
    state.unwrap().unpack::<CounterState>().unwrap().counter
}

// ── Fixtures ────────────────────────────────────────────────────────────────

fn directory_with(entities: &[EntityId]) -> InMemoryDirectory {
    let mut dir = InMemoryDirectory::new();
    for e in entities {
        dir.insert_entity(*e);
        dir.attach(*e, COMPONENT, key_a()).unwrap();
    }
    dir
}

fn client(entities: &[EntityId]) -> (UiSystem<InMemoryDirectory, RecordingTransport>, Arc<AtomicUsize>) {
    let releases = Arc::new(AtomicUsize::new(0));
    let mut ui = UiSystem::new(
        UiConfig::client(),
        directory_with(entities),
        RecordingTransport::new(),
    );
    let r = Arc::clone(&releases);
    ui.register(key_a(), move |_: &InstanceSeed| -> Box<dyn BoundInterface> {
        Box::new(CounterView {
            releases: Arc::clone(&r),
        })
    });
    (ui, releases)
}

fn server(entities: &[EntityId]) -> UiSystem<InMemoryDirectory, RecordingTransport> {
    let mut ui = UiSystem::new(
        UiConfig::server(),
        directory_with(entities),
        RecordingTransport::new(),
    );
    ui.register(key_a(), |_: &InstanceSeed| -> Box<dyn BoundInterface> {
        Box::new(CounterAuthority::default())
    });
    ui
}

fn snapshot(entity: EntityId, value: i64) -> Envelope {
    let state = InterfaceState::pack(&CounterState { counter: value }).unwrap();
    let frame = EntityFrame::component_message(entity, COMPONENT, &UiPayload::State(state)).unwrap();
    Envelope::from_frame(ChannelId::SERVER, frame).unwrap()
}

/// Deliver everything `from` has sent to `to`, as if it arrived on `channel`.
fn pump(
    from: &mut UiSystem<InMemoryDirectory, RecordingTransport>,
    to: &mut UiSystem<InMemoryDirectory, RecordingTransport>,
    channel: ChannelId,
) -> Vec<RouteOutcome> {
    from.transport_mut()
        .take()
        .into_iter()
        .map(|out| to.receive(channel, out.frame).unwrap())
        .collect()
}

const E1: EntityId = EntityId(1);
const E2: EntityId = EntityId(2);

// ── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_scenario_a_update_state_replaces_state() {
    let (mut ui, _) = client(&[E1]);
    ui.open(E1, key_a()).unwrap();
    ui.route(&snapshot(E1, 1)).unwrap();
    let instance = ui.registry().lookup(E1, key_a()).unwrap();
    assert_eq!(counter(instance.state()), 1);
}

#[test]
fn test_scenario_b_server_snapshot_wins_over_prediction() {
    let (mut ui, _) = client(&[E1]);
    ui.open(E1, key_a()).unwrap();

    let msg = InterfaceMessage::pack(&Increment).unwrap();
    assert!(ui.send_predicted(E1, key_a(), msg));
    let instance = ui.registry().lookup(E1, key_a()).unwrap();
    assert_eq!(counter(instance.state()), 1);
    assert_eq!(ui.predictions().pending(E1, key_a()).len(), 1);

    ui.route(&snapshot(E1, 0)).unwrap();
    let instance = ui.registry().lookup(E1, key_a()).unwrap();
    assert_eq!(counter(instance.state()), 0);
    assert!(ui.predictions().pending(E1, key_a()).is_empty());
}

#[test]
fn test_scenario_c_message_for_unopened_interface_is_dropped() {
    let (mut ui, _) = client(&[E1, E2]);
    ui.open(E1, key_a()).unwrap();

    let payload = UiPayload::Message(InterfaceMessage::pack(&Increment).unwrap());
    let frame = EntityFrame::component_message(E2, COMPONENT, &payload).unwrap();
    let env = Envelope::from_frame(ChannelId::SERVER, frame).unwrap();

    let outcome = ui.route(&env).unwrap();
    assert_eq!(outcome, RouteOutcome::Dropped(DropReason::NoInstance));
    assert_eq!(ui.registry().len(), 1);
    assert!(ui.registry().lookup(E2, key_a()).is_none());
    assert_eq!(ui.router_stats().dropped, 1);
}

#[test]
fn test_scenario_d_double_close_releases_once() {
    let (mut ui, releases) = client(&[E1]);
    ui.open(E1, key_a()).unwrap();
    assert!(ui.close(E1, key_a()));
    assert!(!ui.close(E1, key_a()));
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

// ── Properties ──────────────────────────────────────────────────────────────

#[test]
fn test_open_twice_yields_same_instance() {
    let (mut ui, _) = client(&[E1]);
    let first = ui.open(E1, key_a()).unwrap();
    let second = ui.open(E1, key_a()).unwrap();
    assert_eq!(first, second);
    // Only the first open is announced to the server.
    assert_eq!(ui.transport().payloads_to(ChannelId::SERVER), vec![UiPayload::Open]);
}

#[test]
fn test_predicted_send_on_closed_interface_is_dropped() {
    let (mut ui, _) = client(&[E1]);
    ui.open(E1, key_a()).unwrap();
    ui.close(E1, key_a());
    let msg = InterfaceMessage::pack(&Increment).unwrap();
    assert!(!ui.send_predicted(E1, key_a(), msg));
    assert_eq!(ui.predictions().total_pending(), 0);
}

/// Re-predicts whenever its state changes.
struct EagerView;

impl BoundInterface for EagerView {
    fn update_state(&mut self, _state: &InterfaceState, ctx: &mut InterfaceContext<'_>) {
        ctx.send_predicted(InterfaceMessage::pack(&Increment).unwrap());
    }

    fn predict(&mut self, message: &InterfaceMessage, state: &mut Option<InterfaceState>) -> bool {
        CounterView {
            releases: Arc::new(AtomicUsize::new(0)),
        }
        .predict(message, state)
    }
}

#[test]
fn test_prediction_cannot_start_another_prediction() {
    let mut ui = UiSystem::new(UiConfig::client(), directory_with(&[E1]), RecordingTransport::new());
    ui.register(key_a(), |_: &InstanceSeed| -> Box<dyn BoundInterface> { Box::new(EagerView) });
    ui.open(E1, key_a()).unwrap();

    assert!(ui.send_predicted(E1, key_a(), InterfaceMessage::pack(&Increment).unwrap()));
    assert_eq!(counter(ui.registry().lookup(E1, key_a()).unwrap().state()), 1);
    assert_eq!(ui.predictions().total_pending(), 1);
    // Open, then the one predicted message.
    assert_eq!(ui.transport_mut().take().len(), 2);

    // A snapshot may start one prediction, which may not start another.
    ui.route(&snapshot(E1, 5)).unwrap();
    assert_eq!(counter(ui.registry().lookup(E1, key_a()).unwrap().state()), 6);
    assert_eq!(ui.predictions().total_pending(), 1);
    assert_eq!(ui.transport_mut().take().len(), 1);
}

#[test]
fn test_open_rejects_unadvertised_key() {
    let (mut ui, _) = client(&[E1]);
    let other = InterfaceKey::from_name("other");
    assert!(ui.open(E1, other).is_err());
    assert!(ui.open(EntityId(77), key_a()).is_err());
    assert!(ui.registry().is_empty());
}

#[test]
fn test_system_frames_are_rejected_before_routing() {
    let (mut ui, _) = client(&[E1]);
    let mut frame = EntityFrame::component_message(E1, COMPONENT, &UiPayload::Open).unwrap();
    frame.kind = bui_net::EntityMessageKind::SystemMessage;
    assert!(ui.receive(ChannelId::SERVER, frame).is_err());
    assert!(ui.registry().is_empty());
}

#[test]
fn test_sweep_closes_instances_of_despawned_entities() {
    let (mut ui, releases) = client(&[E1]);
    ui.open(E1, key_a()).unwrap();
    ui.directory_mut().despawn(E1);
    assert_eq!(ui.sweep(), 1);
    assert!(ui.registry().is_empty());
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_tick_runs_sweep_on_interval() {
    let releases = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&releases);
    let mut ui = UiSystem::new(
        UiConfig::client().with_sweep_interval(2),
        directory_with(&[E1]),
        RecordingTransport::new(),
    );
    ui.register(key_a(), move |_: &InstanceSeed| -> Box<dyn BoundInterface> {
        Box::new(CounterView {
            releases: Arc::clone(&r),
        })
    });
    ui.open(E1, key_a()).unwrap();
    ui.directory_mut().despawn(E1);
    ui.tick();
    assert_eq!(ui.registry().len(), 1);
    ui.tick();
    assert!(ui.registry().is_empty());
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dropping_system_without_close_still_releases() {
    let (mut ui, releases) = client(&[E1]);
    ui.open(E1, key_a()).unwrap();
    drop(ui);
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

// ── Client ↔ server ─────────────────────────────────────────────────────────

const CLIENT: ChannelId = ChannelId(42);

#[test]
fn test_predicted_increment_round_trip() {
    let (mut client, _) = client(&[E1]);
    let mut server = server(&[E1]);

    client.open(E1, key_a()).unwrap();
    let outcomes = pump(&mut client, &mut server, CLIENT);
    assert_eq!(outcomes, vec![RouteOutcome::Opened { created: true }]);
    assert!(server.registry().lookup(E1, key_a()).unwrap().actors().contains(&CLIENT));

    let msg = InterfaceMessage::pack(&Increment).unwrap();
    client.send_predicted(E1, key_a(), msg);
    assert_eq!(counter(client.registry().lookup(E1, key_a()).unwrap().state()), 1);

    let outcomes = pump(&mut client, &mut server, CLIENT);
    assert_eq!(outcomes, vec![RouteOutcome::Delivered]);
    assert_eq!(counter(server.registry().lookup(E1, key_a()).unwrap().state()), 1);

    let outcomes = pump(&mut server, &mut client, ChannelId::SERVER);
    assert_eq!(outcomes, vec![RouteOutcome::StateApplied]);
    assert_eq!(counter(client.registry().lookup(E1, key_a()).unwrap().state()), 1);
    assert_eq!(client.predictions().total_pending(), 0);
}

#[test]
fn test_late_state_after_client_close_is_absorbed() {
    let (mut client, releases) = client(&[E1]);
    let mut server = server(&[E1]);

    client.open(E1, key_a()).unwrap();
    pump(&mut client, &mut server, CLIENT);
    client.send_predicted(E1, key_a(), InterfaceMessage::pack(&Increment).unwrap());
    pump(&mut client, &mut server, CLIENT);

    // The server's reply is in flight when the client closes.
    client.close(E1, key_a());
    assert_eq!(releases.load(Ordering::SeqCst), 1);
    let outcomes = pump(&mut server, &mut client, ChannelId::SERVER);
    assert_eq!(outcomes, vec![RouteOutcome::Dropped(DropReason::NoInstance)]);

    let outcomes = pump(&mut client, &mut server, CLIENT);
    assert_eq!(outcomes, vec![RouteOutcome::Closed]);
    assert!(server.registry().is_empty());
}

#[test]
fn test_server_open_for_pushes_open_and_state() {
    let (mut client, _) = client(&[E1]);
    let mut server = server(&[E1]);

    server.open_for(CLIENT, E1, key_a()).unwrap();
    server
        .set_state(
            E1,
            key_a(),
            InterfaceState::pack(&CounterState { counter: 5 }).unwrap(),
        )
        .unwrap();

    let outcomes = pump(&mut server, &mut client, ChannelId::SERVER);
    assert_eq!(
        outcomes,
        vec![RouteOutcome::Opened { created: true }, RouteOutcome::StateApplied]
    );
    let instance = client.registry().lookup(E1, key_a()).unwrap();
    assert_eq!(instance.lifecycle(), Lifecycle::Opened);
    assert_eq!(counter(instance.state()), 5);

    assert!(server.close_for(CLIENT, E1, key_a()));
    let outcomes = pump(&mut server, &mut client, ChannelId::SERVER);
    assert_eq!(outcomes, vec![RouteOutcome::Closed]);
    assert!(client.registry().is_empty());
    assert!(server.registry().is_empty());
}

#[test]
fn test_server_state_reaches_every_viewer() {
    let mut server = server(&[E1]);
    server.open_for(ChannelId(1), E1, key_a()).unwrap();
    server.open_for(ChannelId(2), E1, key_a()).unwrap();
    server.transport_mut().take();

    let state = InterfaceState::pack(&CounterState { counter: 3 }).unwrap();
    assert!(server.set_state(E1, key_a(), state.clone()).unwrap());
    for ch in [ChannelId(1), ChannelId(2)] {
        assert_eq!(
            server.transport().payloads_to(ch),
            vec![UiPayload::State(state.clone())]
        );
    }

    assert_eq!(server.disconnect(ChannelId(1)), 1);
    assert_eq!(server.registry().len(), 1);
    assert_eq!(server.disconnect(ChannelId(2)), 1);
    assert!(server.registry().is_empty());
}

#[test]
fn test_client_cannot_author_state() {
    let (mut client, _) = client(&[E1]);
    client.open(E1, key_a()).unwrap();
    let state = InterfaceState::pack(&CounterState { counter: 1 }).unwrap();
    assert!(client.set_state(E1, key_a(), state).is_err());
}
