//! Channel identity.

use serde::{Deserialize, Serialize};

/// Identifies the remote peer on the other end of a network channel.
///
/// On the server every connected client has its own channel. A client only
/// talks to the server, which it addresses as [`ChannelId::SERVER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// The channel a client uses to reach the server.
    pub const SERVER: ChannelId = ChannelId(0);

    /// Returns `true` for the server channel.
    #[must_use]
    pub const fn is_server(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_server() {
            write!(f, "Channel(server)")
        } else {
            write!(f, "Channel({})", self.0)
        }
    }
}
