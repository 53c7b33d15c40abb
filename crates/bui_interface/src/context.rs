//! Per-call context handed to interface callbacks.

use bui_component::{EntityId, InterfaceKey};
use bui_net::{InterfaceMessage, InterfaceState, NetError, UiPayloadType};

use crate::disposal::{Disposable, Disposals};

/// Something an interface asked to have sent once its callback returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Transmit without local application.
    Send(InterfaceMessage),
    /// Apply locally first, then transmit. Client only; the server sends plainly.
    SendPredicted(InterfaceMessage),
    /// Replace the authoritative state and push it to viewers. Server only.
    SetState(InterfaceState),
}

/// Context provided to every [`BoundInterface`](crate::BoundInterface) callback.
///
/// It gives read access to the instance's current state, lets the callback
/// hand owned resources to the instance's disposal list, and collects
/// outgoing requests. The instance never holds a reference to the system
/// that owns it; everything it wants sent goes through here.
#[derive(Debug)]
pub struct InterfaceContext<'a> {
    owner: EntityId,
    key: InterfaceKey,
    state: Option<&'a InterfaceState>,
    disposals: &'a mut Disposals,
    outgoing: Vec<Outgoing>,
}

impl<'a> InterfaceContext<'a> {
    pub(crate) fn new(
        owner: EntityId,
        key: InterfaceKey,
        state: Option<&'a InterfaceState>,
        disposals: &'a mut Disposals,
    ) -> Self {
        Self {
            owner,
            key,
            state,
            disposals,
            outgoing: Vec::new(),
        }
    }

    /// The entity hosting the interface.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// The interface key.
    #[must_use]
    pub fn key(&self) -> InterfaceKey {
        self.key
    }

    /// The instance's current working state.
    #[must_use]
    pub fn state(&self) -> Option<&'a InterfaceState> {
        self.state
    }

    /// Hand a resource to the instance; it is released when the instance closes.
    pub fn track(&mut self, handle: impl Disposable + 'static) {
        self.disposals.track(handle);
    }

    /// Send a message to the other side.
    pub fn send(&mut self, message: InterfaceMessage) {
        self.outgoing.push(Outgoing::Send(message));
    }

    /// Pack and send a typed message.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if the value cannot be packed.
    pub fn send_value<T: UiPayloadType>(&mut self, value: &T) -> Result<(), NetError> {
        self.send(InterfaceMessage::pack(value)?);
        Ok(())
    }

    /// Apply a message locally, then send it.
    pub fn send_predicted(&mut self, message: InterfaceMessage) {
        self.outgoing.push(Outgoing::SendPredicted(message));
    }

    /// Replace the authoritative state.
    pub fn set_state(&mut self, state: InterfaceState) {
        self.outgoing.push(Outgoing::SetState(state));
    }

    /// Pack and set a typed state.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Encode`] if the value cannot be packed.
    pub fn set_state_value<T: UiPayloadType>(&mut self, value: &T) -> Result<(), NetError> {
        self.set_state(InterfaceState::pack(value)?);
        Ok(())
    }

    pub(crate) fn into_outgoing(self) -> Vec<Outgoing> {
        self.outgoing
    }
}
