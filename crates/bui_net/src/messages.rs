//! Message types exchanged between server and clients.
//!
//! An [`EntityFrame`] is what travels on the wire. Its payload is a
//! MessagePack-encoded [`UiPayload`], which in turn may carry an opaque
//! [`InterfaceState`] snapshot or [`InterfaceMessage`] event. The interface
//! layer never inspects those two; concrete interfaces pack and unpack them
//! with their own [`UiPayloadType`] types.

use bui_component::{ComponentId, EntityId, stable_hash};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::NetError;

// ── Frames ──────────────────────────────────────────────────────────────────

/// The declared kind of an entity frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityMessageKind {
    /// Directed at one component on one entity. The only kind interfaces use.
    ComponentMessage,
    /// Entity-system traffic handled elsewhere.
    SystemMessage,
}

/// A raw entity-addressed frame as received from or handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFrame {
    /// What the payload is.
    pub kind: EntityMessageKind,
    /// Target entity.
    pub entity: EntityId,
    /// Target component on that entity.
    pub component: ComponentId,
    /// Encoded payload; a [`UiPayload`] for component messages.
    pub payload: Vec<u8>,
}

impl EntityFrame {
    /// Build a component-message frame carrying `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if the payload cannot be encoded.
    pub fn component_message(
        entity: EntityId,
        component: ComponentId,
        payload: &UiPayload,
    ) -> Result<Self, NetError> {
        Ok(Self {
            kind: EntityMessageKind::ComponentMessage,
            entity,
            component,
            payload: codec::encode(payload)?,
        })
    }
}

/// What a component message asks of a bound interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiPayload {
    /// Open the interface (server instruction, or client request).
    Open,
    /// Close the interface (server instruction, or client request).
    Close,
    /// Authoritative full-state snapshot. Server → Client.
    State(InterfaceState),
    /// Discrete event, either direction.
    Message(InterfaceMessage),
}

impl UiPayload {
    /// Short label for diagnostics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::State(_) => "state",
            Self::Message(_) => "message",
        }
    }
}

// ── Opaque interface payloads ───────────────────────────────────────────────

/// Type tag of an opaque payload, the FNV-1a hash of its type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadTypeId(pub u64);

impl PayloadTypeId {
    /// Compute the id for a payload type name.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(stable_hash(name))
    }
}

impl std::fmt::Display for PayloadTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayloadType({:#018x})", self.0)
    }
}

/// A concrete state or message type that can be packed into an opaque payload.
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use bui_net::{InterfaceState, UiPayloadType};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct StorageState {
///     slots: Vec<u32>,
/// }
///
/// impl UiPayloadType for StorageState {
///     fn type_name() -> &'static str { "StorageState" }
/// }
///
/// let state = InterfaceState::pack(&StorageState { slots: vec![1, 2] }).unwrap();
/// assert!(state.is::<StorageState>());
/// ```
pub trait UiPayloadType: Serialize + DeserializeOwned {
    /// A stable name, identical on every peer.
    fn type_name() -> &'static str;

    /// The [`PayloadTypeId`] derived from [`UiPayloadType::type_name`].
    fn payload_type_id() -> PayloadTypeId {
        PayloadTypeId::from_name(Self::type_name())
    }
}

fn pack<T: UiPayloadType>(value: &T) -> Result<(PayloadTypeId, Vec<u8>), NetError> {
    Ok((T::payload_type_id(), codec::encode(value)?))
}

fn unpack<T: UiPayloadType>(type_id: PayloadTypeId, data: &[u8]) -> Result<T, NetError> {
    if type_id != T::payload_type_id() {
        return Err(NetError::PayloadType {
            expected: T::type_name(),
            actual: type_id,
        });
    }
    codec::decode(data)
}

/// Full server-authored state of one interface instance.
///
/// A new snapshot replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceState {
    /// Concrete type of `data`.
    pub type_id: PayloadTypeId,
    /// Encoded state.
    pub data: Vec<u8>,
}

impl InterfaceState {
    /// Pack a typed state.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if the value cannot be encoded.
    pub fn pack<T: UiPayloadType>(value: &T) -> Result<Self, NetError> {
        let (type_id, data) = pack(value)?;
        Ok(Self { type_id, data })
    }

    /// Unpack as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::PayloadType`] if the state is not a `T`, or
    /// [`NetError::Decode`] if it is malformed.
    pub fn unpack<T: UiPayloadType>(&self) -> Result<T, NetError> {
        unpack(self.type_id, &self.data)
    }

    /// Returns `true` if this state holds a `T`.
    #[must_use]
    pub fn is<T: UiPayloadType>(&self) -> bool {
        self.type_id == T::payload_type_id()
    }
}

/// One discrete interface event, e.g. a button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceMessage {
    /// Concrete type of `data`.
    pub type_id: PayloadTypeId,
    /// Encoded message.
    pub data: Vec<u8>,
}

impl InterfaceMessage {
    /// Pack a typed message.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if the value cannot be encoded.
    pub fn pack<T: UiPayloadType>(value: &T) -> Result<Self, NetError> {
        let (type_id, data) = pack(value)?;
        Ok(Self { type_id, data })
    }

    /// Unpack as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::PayloadType`] if the message is not a `T`, or
    /// [`NetError::Decode`] if it is malformed.
    pub fn unpack<T: UiPayloadType>(&self) -> Result<T, NetError> {
        unpack(self.type_id, &self.data)
    }

    /// Returns `true` if this message holds a `T`.
    #[must_use]
    pub fn is<T: UiPayloadType>(&self) -> bool {
        self.type_id == T::payload_type_id()
    }
}
