//! NATS subject hierarchy.
//!
//! All subjects are prefixed with `bui.` to namespace within a shared NATS
//! cluster.

use crate::channel::ChannelId;

/// Root prefix for all subjects.
pub const PREFIX: &str = "bui";

/// Frames sent by any client to the server. Clients → Server.
pub const SERVER_INBOX: &str = "bui.server.inbox";

/// Build the subject the server uses to reach one client.
///
/// `bui.client.<channel>`
#[must_use]
pub fn client_inbox(channel: ChannelId) -> String {
    format!("bui.client.{}", channel.0)
}

/// Header keys carried alongside frame payloads.
pub mod headers {
    /// The sending peer's channel id, in decimal.
    pub const CHANNEL_ID: &str = "channel-id";
}
