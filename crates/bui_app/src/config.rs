//! Command-line arguments and the runtime configuration built from them.

use std::time::Duration;

use bui_interface::UiConfig;
use bui_net::ChannelId;
use clap::{Parser, ValueEnum};

/// Which side of the demo to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Client,
    Server,
}

#[derive(Debug, Parser)]
#[command(name = "bui_app", about = "Bound interface demo over NATS")]
pub struct Args {
    /// Run as client or server
    #[arg(short, long, value_enum, default_value_t = RoleArg::Client)]
    pub role: RoleArg,

    /// NATS server URL (falls back to $NATS_URL, then nats://localhost:4222)
    #[arg(short, long)]
    pub nats_url: Option<String>,

    /// Target ticks per second
    #[arg(short, long, default_value_t = 60.0)]
    pub tick_rate: f64,

    /// Stop after this many ticks (0 = run until interrupted)
    #[arg(short, long, default_value_t = 0)]
    pub max_ticks: u64,

    /// Orphan sweep interval in ticks (0 disables the sweep)
    #[arg(long, default_value_t = UiConfig::DEFAULT_SWEEP_INTERVAL)]
    pub sweep_interval: u64,
}

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl TickConfig {
    /// Accepted tick rates. Periods range from one microsecond to 1000 seconds.
    pub const MIN_TICK_RATE: f64 = 0.001;
    pub const MAX_TICK_RATE: f64 = 1_000_000.0;

    /// Time between ticks, never zero.
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.tick_rate)
            .unwrap_or(Duration::from_secs(1))
            .max(Duration::from_nanos(1))
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub nats_url: Option<String>,
    pub tick: TickConfig,
    pub ui: UiConfig,
    /// This process's channel id. The server is always [`ChannelId::SERVER`].
    pub local: ChannelId,
}

impl AppConfig {
    /// Build the configuration, minting a client channel id if needed.
    #[must_use]
    pub fn from_args(args: Args) -> Self {
        let (ui, local) = match args.role {
            RoleArg::Server => (UiConfig::server(), ChannelId::SERVER),
            RoleArg::Client => (UiConfig::client(), fresh_client_channel()),
        };
        let tick_rate = if args.tick_rate.is_finite() && args.tick_rate > 0.0 {
            args.tick_rate.clamp(TickConfig::MIN_TICK_RATE, TickConfig::MAX_TICK_RATE)
        } else {
            60.0
        };
        Self {
            nats_url: args.nats_url,
            tick: TickConfig {
                tick_rate,
                max_ticks: args.max_ticks,
            },
            ui: ui.with_sweep_interval(args.sweep_interval),
            local,
        }
    }

    #[must_use]
    pub fn is_server(&self) -> bool {
        self.ui.role.is_server()
    }
}

/// A random channel id that never collides with the server's.
fn fresh_client_channel() -> ChannelId {
    let (high, _) = uuid::Uuid::new_v4().as_u64_pair();
    ChannelId(high.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> AppConfig {
        AppConfig::from_args(Args::parse_from(argv))
    }

    #[test]
    fn test_defaults_to_client() {
        let config = parse(&["bui_app"]);
        assert!(!config.is_server());
        assert!(!config.local.is_server());
        assert_eq!(config.tick.tick_rate, 60.0);
        assert_eq!(config.ui.sweep_interval_ticks, UiConfig::DEFAULT_SWEEP_INTERVAL);
    }

    #[test]
    fn test_server_role() {
        let config = parse(&["bui_app", "--role", "server", "--max-ticks", "10"]);
        assert!(config.is_server());
        assert_eq!(config.local, ChannelId::SERVER);
        assert_eq!(config.tick.max_ticks, 10);
    }

    #[test]
    fn test_bad_tick_rate_falls_back() {
        let config = parse(&["bui_app", "--tick-rate", "0"]);
        assert_eq!(config.tick.tick_rate, 60.0);
        let config = parse(&["bui_app", "--tick-rate", "inf"]);
        assert_eq!(config.tick.tick_rate, 60.0);
        let config = parse(&["bui_app", "--tick-rate", "NaN"]);
        assert_eq!(config.tick.tick_rate, 60.0);
    }

    #[test]
    fn test_huge_tick_rate_keeps_nonzero_period() {
        let config = parse(&["bui_app", "--tick-rate", "1e12"]);
        assert_eq!(config.tick.tick_rate, TickConfig::MAX_TICK_RATE);
        assert!(config.tick.period() > Duration::ZERO);
        let config = parse(&["bui_app", "--tick-rate", "1e-300"]);
        assert_eq!(config.tick.tick_rate, TickConfig::MIN_TICK_RATE);
        assert_eq!(config.tick.period(), Duration::from_secs(1000));

        let raw = TickConfig {
            tick_rate: f64::INFINITY,
            max_ticks: 0,
        };
        assert_eq!(raw.period(), Duration::from_nanos(1));
    }

    #[test]
    fn test_clients_get_distinct_channels() {
        assert_ne!(fresh_client_channel(), fresh_client_channel());
    }
}
