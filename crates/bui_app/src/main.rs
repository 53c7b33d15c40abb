//! # bui_app: bound interface demo
//!
//! Runs either the authoritative server or a client. Both build the same
//! world (one entity with a counter interface) and exchange interface
//! traffic as entity component messages over NATS.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments and connect to NATS (`--nats-url`, else `$NATS_URL`,
//!    else `nats://localhost:4222`).
//! 2. Start the outbound pump and subscribe to this process's inbox.
//! 3. Enter the fixed-timestep tick loop; type `help` for console commands.

mod config;
mod console;
mod demo;
mod tick;

use anyhow::Result;
use bui_component::InMemoryDirectory;
use bui_interface::UiSystem;
use bui_net::{ChannelId, NatsConnection, QueuedTransport, subjects, transport};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{AppConfig, Args};
use console::{Console, CounterCommand};
use tick::TickLoop;

fn to_server(_: ChannelId) -> String {
    subjects::SERVER_INBOX.to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("bui_app=info".parse()?))
        .init();

    let config = AppConfig::from_args(Args::parse());
    info!(server = config.is_server(), channel = %config.local, "bound interface demo starting");

    let conn = match &config.nats_url {
        Some(url) => NatsConnection::connect_to(url).await?,
        None => NatsConnection::connect().await?,
    };

    // Outbound: interface frames leave through the pump task.
    let (queued, outbound) = QueuedTransport::new();
    let subject_for: fn(ChannelId) -> String = if config.is_server() {
        subjects::client_inbox
    } else {
        to_server
    };
    let pump = tokio::spawn(transport::pump(conn.clone(), outbound, config.local, subject_for));

    // Inbound: frames and console lines are queued for the tick loop.
    let inbox = if config.is_server() {
        subjects::SERVER_INBOX.to_string()
    } else {
        subjects::client_inbox(config.local)
    };
    let subscriber = conn.subscribe(&inbox).await?;
    info!(subject = %inbox, "listening");
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    tokio::spawn(tick::forward_inbound(subscriber, frame_tx));
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    tokio::spawn(tick::read_console(line_tx));

    let mut ui = UiSystem::new(config.ui.clone(), InMemoryDirectory::new(), queued);
    let counter = demo::install(&mut ui);
    let mut console = Console::with_builtins(!config.is_server());
    console.register(CounterCommand::new(counter));

    let mut tick_loop = TickLoop::new(config.tick.clone(), ui, console, frame_rx, line_rx);
    tick_loop.run().await;
    info!(ticks = tick_loop.ui().ticks(), "tick loop stopped");

    // Dropping the loop drops the last transport handle, letting the pump
    // publish what is left and finish.
    drop(tick_loop);
    if let Err(e) = pump.await {
        warn!(error = %e, "outbound pump failed");
    }
    if let Err(e) = conn.client().flush().await {
        warn!(error = %e, "failed to flush NATS connection");
    }

    info!("bound interface demo shut down");
    Ok(())
}
