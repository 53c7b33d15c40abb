//! Network-layer error types.

use crate::messages::{EntityMessageKind, PayloadTypeId};

/// Errors that can occur while building, decoding or moving frames.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Failed to encode a message to MessagePack.
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a message from MessagePack.
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// An inbound frame declared a kind other than the one expected.
    #[error("expected a {expected:?} frame, got {actual:?}")]
    UnexpectedKind {
        expected: EntityMessageKind,
        actual: EntityMessageKind,
    },

    /// An opaque payload was unpacked as the wrong type.
    #[error("payload is {actual}, not {expected}")]
    PayloadType {
        expected: &'static str,
        actual: PayloadTypeId,
    },

    /// NATS subscription error.
    #[error("NATS subscribe error: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// NATS publish error.
    #[error("NATS publish error: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// NATS connection error.
    #[error("NATS connection error: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// A required NATS header was missing or malformed.
    #[error("missing NATS header: {0}")]
    MissingHeader(String),
}
