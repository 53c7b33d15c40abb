//! NATS connection management.
//!
//! A thin wrapper around `async-nats` that publishes entity frames with the
//! sender's channel id in a header.

use tracing::info;

use crate::channel::ChannelId;
use crate::error::NetError;
use crate::messages::EntityFrame;
use crate::subjects::headers;

/// Default NATS server URL.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable used to override the NATS URL.
pub const NATS_URL_ENV: &str = "NATS_URL";

/// A wrapper around an `async-nats` client with frame helpers.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect to NATS using the URL from the `NATS_URL` environment variable,
    /// falling back to [`DEFAULT_NATS_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect() -> Result<Self, NetError> {
        let url = std::env::var(NATS_URL_ENV).unwrap_or_else(|_| DEFAULT_NATS_URL.to_string());
        Self::connect_to(&url).await
    }

    /// Connect to NATS at the specified URL.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the connection cannot be established.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        info!(url, "connecting to NATS");
        let client = async_nats::connect(url).await?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Returns a reference to the underlying `async-nats` client.
    #[must_use]
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }

    /// Publish a frame, stamping it with the sender's channel id.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if encoding or publishing fails.
    pub async fn publish_frame(
        &self,
        subject: &str,
        from: ChannelId,
        frame: &EntityFrame,
    ) -> Result<(), NetError> {
        let payload = crate::codec::encode(frame)?;
        let mut header_map = async_nats::HeaderMap::new();
        header_map.insert(headers::CHANNEL_ID, from.0.to_string().as_str());
        self.client
            .publish_with_headers(subject.to_string(), header_map, payload.into())
            .await?;
        Ok(())
    }

    /// Subscribe to a subject.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Subscribe`] if the subscription fails.
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, NetError> {
        let sub = self.client.subscribe(subject.to_string()).await?;
        Ok(sub)
    }
}

/// Split a received NATS message into its sender channel and frame.
///
/// # Errors
///
/// Returns [`NetError::MissingHeader`] if the channel header is absent or not
/// a number, or [`NetError::Decode`] if the frame is malformed.
pub fn read_frame(message: &async_nats::Message) -> Result<(ChannelId, EntityFrame), NetError> {
    let raw = message
        .headers
        .as_ref()
        .and_then(|h| h.get(headers::CHANNEL_ID))
        .ok_or_else(|| NetError::MissingHeader(headers::CHANNEL_ID.to_string()))?;
    let channel = raw
        .as_str()
        .parse::<u64>()
        .map(ChannelId)
        .map_err(|_| NetError::MissingHeader(headers::CHANNEL_ID.to_string()))?;
    let frame = crate::codec::decode(message.payload.as_ref())?;
    Ok((channel, frame))
}
