//! Inbound routing envelope.

use bui_component::{ComponentId, EntityId};

use crate::channel::ChannelId;
use crate::codec;
use crate::error::NetError;
use crate::messages::{EntityFrame, EntityMessageKind, UiPayload};

/// An inbound component message bound to its routing metadata.
///
/// Envelopes only exist for frames declared as
/// [`EntityMessageKind::ComponentMessage`]; any other kind is rejected at
/// construction. The payload stays encoded until the router decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    channel: ChannelId,
    entity: EntityId,
    component: ComponentId,
    payload: Vec<u8>,
}

impl Envelope {
    /// Wrap a frame received on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::UnexpectedKind`] if the frame is not a component
    /// message.
    pub fn from_frame(channel: ChannelId, frame: EntityFrame) -> Result<Self, NetError> {
        if frame.kind != EntityMessageKind::ComponentMessage {
            return Err(NetError::UnexpectedKind {
                expected: EntityMessageKind::ComponentMessage,
                actual: frame.kind,
            });
        }
        Ok(Self {
            channel,
            entity: frame.entity,
            component: frame.component,
            payload: frame.payload,
        })
    }

    /// The channel the frame arrived on.
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// The target entity.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The target component.
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Decode the payload as a [`UiPayload`].
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Decode`] if the payload is malformed.
    pub fn decode_payload(&self) -> Result<UiPayload, NetError> {
        codec::decode(&self.payload)
    }
}
