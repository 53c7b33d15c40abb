//! Interface-layer error types.

use bui_component::{EntityId, InterfaceKey};
use bui_net::{ChannelId, NetError};

/// Errors from opening or driving interfaces.
#[derive(Debug, thiserror::Error)]
pub enum UiError {
    /// No factory is registered for the key.
    #[error("no interface factory registered for {0}")]
    UnknownKey(InterfaceKey),

    /// The entity does not exist.
    #[error("{0} does not exist")]
    UnknownEntity(EntityId),

    /// No component on the entity advertises the key.
    #[error("{entity} has no component advertising {key}")]
    NotAdvertised { entity: EntityId, key: InterfaceKey },

    /// The operation is only meaningful on the server.
    #[error("only the server may {0}")]
    ServerOnly(&'static str),
}

/// Protocol violations found while routing one envelope.
///
/// These reject the single message; registry state is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The payload could not be decoded.
    #[error("malformed payload: {0}")]
    Malformed(#[from] NetError),

    /// A client tried to author interface state.
    #[error("{channel} sent a state snapshot for {entity}; only the server authors state")]
    StateFromClient { channel: ChannelId, entity: EntityId },
}
