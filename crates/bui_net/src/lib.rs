//! # bui_net
//!
//! Wire layer for bound-interface synchronisation.
//!
//! This crate provides:
//!
//! - [`channel`]: identity of the remote peer a frame came from or goes to.
//! - [`messages`]: entity frames, interface payloads and opaque state/message values.
//! - [`envelope`]: the validated, immutable routing wrapper for inbound frames.
//! - [`codec`]: MessagePack serialisation/deserialisation helpers.
//! - [`subjects`]: NATS subject names.
//! - [`connection`]: NATS connection management.
//! - [`transport`]: the fire-and-forget outbound [`Transport`] seam.
//! - [`error`]: Network-layer error types.

pub mod channel;
pub mod codec;
pub mod connection;
pub mod envelope;
pub mod error;
pub mod messages;
pub mod subjects;
pub mod transport;

pub use channel::ChannelId;
pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use envelope::Envelope;
pub use error::NetError;
pub use messages::{
    EntityFrame, EntityMessageKind, InterfaceMessage, InterfaceState, PayloadTypeId, UiPayload,
    UiPayloadType,
};
pub use transport::{Outbound, QueuedTransport, RecordingTransport, Transport};
