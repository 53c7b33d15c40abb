//! Outbound transport seam.
//!
//! The interface layer sends frames synchronously from inside the simulation
//! loop and never waits on the network. [`QueuedTransport`] hands frames to an
//! unbounded channel; [`pump`] runs on the async runtime and publishes them.
//! Delivery guarantees beyond that are the transport's business.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::channel::ChannelId;
use crate::codec;
use crate::connection::NatsConnection;
use crate::messages::{EntityFrame, UiPayload};

/// Fire-and-forget outbound frame sink.
pub trait Transport {
    /// Queue `frame` for delivery to `channel`.
    fn send(&mut self, channel: ChannelId, frame: EntityFrame);
}

/// A frame addressed to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Destination peer.
    pub channel: ChannelId,
    /// The frame itself.
    pub frame: EntityFrame,
}

/// [`Transport`] backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct QueuedTransport {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl QueuedTransport {
    /// Create a transport and the receiver a [`pump`] should drain.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for QueuedTransport {
    fn send(&mut self, channel: ChannelId, frame: EntityFrame) {
        if self.tx.send(Outbound { channel, frame }).is_err() {
            warn!(%channel, "outbound queue closed, dropping frame");
        }
    }
}

/// Publish everything arriving on `rx` until all senders are gone.
///
/// `subject_for` maps a destination channel to a NATS subject. Publish errors
/// are logged and the pump keeps going.
pub async fn pump<F>(
    conn: NatsConnection,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    local: ChannelId,
    subject_for: F,
) where
    F: Fn(ChannelId) -> String,
{
    while let Some(out) = rx.recv().await {
        let subject = subject_for(out.channel);
        if let Err(e) = conn.publish_frame(&subject, local, &out.frame).await {
            warn!(error = %e, subject = %subject, "failed to publish frame");
        }
    }
    debug!("outbound pump finished");
}

/// [`Transport`] that keeps every frame in memory. Useful in tests and tools.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Frames in send order.
    pub sent: Vec<Outbound>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take and clear everything recorded so far.
    pub fn take(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.sent)
    }

    /// Decoded payloads sent to `channel`, in order. Undecodable frames are skipped.
    #[must_use]
    pub fn payloads_to(&self, channel: ChannelId) -> Vec<UiPayload> {
        self.sent
            .iter()
            .filter(|o| o.channel == channel)
            .filter_map(|o| codec::decode(&o.frame.payload).ok())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, channel: ChannelId, frame: EntityFrame) {
        self.sent.push(Outbound { channel, frame });
    }
}
