//! Interface system configuration.

use bui_net::ChannelId;

/// Which side of the connection this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Authoritative. Tracks which channels view each interface.
    Server,
    /// Mirrors the server; may predict.
    Client {
        /// Channel the server is reached on.
        server: ChannelId,
    },
}

impl Role {
    /// Returns `true` for [`Role::Server`].
    #[must_use]
    pub fn is_server(self) -> bool {
        matches!(self, Self::Server)
    }
}

/// Configuration for a [`UiSystem`](crate::UiSystem).
#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Client or server.
    pub role: Role,
    /// Run the orphan sweep every this many ticks (0 disables it).
    pub sweep_interval_ticks: u64,
}

impl UiConfig {
    /// Default sweep interval: once a second at 60 Hz.
    pub const DEFAULT_SWEEP_INTERVAL: u64 = 60;

    /// Configuration for a client talking to [`ChannelId::SERVER`].
    #[must_use]
    pub fn client() -> Self {
        Self {
            role: Role::Client {
                server: ChannelId::SERVER,
            },
            sweep_interval_ticks: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Configuration for the server.
    #[must_use]
    pub fn server() -> Self {
        Self {
            role: Role::Server,
            sweep_interval_ticks: Self::DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Override the server channel. Has no effect on a server config.
    #[must_use]
    pub fn with_server_channel(mut self, channel: ChannelId) -> Self {
        if let Role::Client { server } = &mut self.role {
            *server = channel;
        }
        self
    }

    /// Override the sweep interval.
    #[must_use]
    pub fn with_sweep_interval(mut self, ticks: u64) -> Self {
        self.sweep_interval_ticks = ticks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let config = UiConfig::client();
        assert_eq!(
            config.role,
            Role::Client {
                server: ChannelId::SERVER
            }
        );
        assert_eq!(config.sweep_interval_ticks, UiConfig::DEFAULT_SWEEP_INTERVAL);
    }

    #[test]
    fn test_builders() {
        let config = UiConfig::client()
            .with_server_channel(ChannelId(5))
            .with_sweep_interval(0);
        assert_eq!(config.role, Role::Client { server: ChannelId(5) });
        assert_eq!(config.sweep_interval_ticks, 0);

        let server = UiConfig::server().with_server_channel(ChannelId(5));
        assert!(server.role.is_server());
    }
}
