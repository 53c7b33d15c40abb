//! # bui_interface
//!
//! Stateful bound interfaces attached to entities, kept in sync between an
//! authoritative server and its clients.
//!
//! The pieces, leaves first:
//!
//! - [`Disposals`]: owned sub-resources released exactly once.
//! - [`BoundInterface`] / [`InterfaceInstance`]: one interface kind's
//!   behaviour, and the lifecycle wrapper around it.
//! - [`InterfaceRegistry`]: at most one live instance per `(entity, key)`.
//! - [`Router`]: envelope → instance dispatch.
//! - [`PredictionCoordinator`]: client-side speculative messages.
//! - [`UiSystem`]: wires all of the above to a directory and a transport.
//!
//! ## Usage
//!
//! ```rust
//! use bui_component::{ComponentId, InMemoryDirectory, InterfaceKey};
//! use bui_interface::{BoundInterface, InstanceSeed, UiConfig, UiSystem};
//! use bui_net::RecordingTransport;
//!
//! struct Panel;
//! impl BoundInterface for Panel {}
//!
//! let key = InterfaceKey::from_name("panel");
//! let mut directory = InMemoryDirectory::new();
//! let entity = directory.spawn();
//! directory.attach(entity, ComponentId(1), key).unwrap();
//!
//! let mut ui = UiSystem::new(UiConfig::client(), directory, RecordingTransport::new());
//! ui.register(key, |_: &InstanceSeed| -> Box<dyn BoundInterface> { Box::new(Panel) });
//! ui.open(entity, key).unwrap();
//! assert!(ui.registry().lookup(entity, key).is_some());
//! ```

pub mod config;
pub mod context;
pub mod disposal;
pub mod error;
pub mod instance;
pub mod prediction;
pub mod registry;
pub mod router;
pub mod system;

pub use config::{Role, UiConfig};
pub use context::{InterfaceContext, Outgoing};
pub use disposal::{Disposable, Disposals};
pub use error::{RouteError, UiError};
pub use instance::{BoundInterface, InstanceId, InterfaceInstance, Lifecycle};
pub use prediction::{PendingPrediction, PredictionCoordinator};
pub use registry::{InstanceSeed, InterfaceRegistry};
pub use router::{DropReason, Effect, RouteOutcome, Router, RouterStats};
pub use system::UiSystem;
