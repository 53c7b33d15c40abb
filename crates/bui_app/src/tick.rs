//! Fixed-timestep loop.
//!
//! Each tick:
//!
//! 1. Drain inbound frames in arrival order and route them.
//! 2. Advance the interface system (runs the orphan sweep when due).
//! 3. Run console lines typed since the last tick.
//!
//! Network and stdin readers run as separate tasks and only ever push onto
//! unbounded queues, so nothing inside a tick awaits.

use std::time::Instant;

use bui_net::connection::read_frame;
use bui_net::{ChannelId, EntityFrame};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::TickConfig;
use crate::console::{AppUi, Console, ConsoleLine};

/// A frame received from a peer.
pub type Inbound = (ChannelId, EntityFrame);

/// The tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    ui: AppUi,
    console: Console,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    lines: mpsc::UnboundedReceiver<String>,
}

impl TickLoop {
    #[must_use]
    pub fn new(
        config: TickConfig,
        ui: AppUi,
        console: Console,
        inbound: mpsc::UnboundedReceiver<Inbound>,
        lines: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            tick_id: 0,
            config,
            ui,
            console,
            inbound,
            lines,
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn ui(&self) -> &AppUi {
        &self.ui
    }

    /// Run one tick. Returns the console output it produced.
    pub fn tick(&mut self) -> Vec<ConsoleLine> {
        self.tick_id += 1;

        let mut routed = 0usize;
        while let Ok((channel, frame)) = self.inbound.try_recv() {
            routed += 1;
            if let Err(e) = self.ui.receive(channel, frame) {
                warn!(tick_id = self.tick_id, %channel, error = %e, "discarding inbound frame");
            }
        }

        self.ui.tick();

        let mut output = Vec::new();
        while let Ok(line) = self.lines.try_recv() {
            let executed = self.console.run_line(&mut self.ui, &line);
            if !executed.handled {
                debug!(line = %line, "console line not handled locally");
            }
            output.extend(executed.output);
        }

        if routed > 0 {
            debug!(tick_id = self.tick_id, routed, "tick");
        }
        output
    }

    /// Run until `max_ticks` is reached or the process is interrupted, then
    /// close every open interface.
    pub async fn run(&mut self) {
        let tick_duration = self.config.period();
        let mut interval = tokio::time::interval(tick_duration);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut ctrl_c => {
                    info!(tick_id = self.tick_id, "interrupted");
                    break;
                }
            }

            let start = Instant::now();
            for line in self.tick() {
                println!("{line}");
            }

            if self.config.max_ticks > 0 && self.tick_id >= self.config.max_ticks {
                info!(ticks = self.tick_id, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed > tick_duration {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }

        let closed = self.ui.shutdown();
        info!(closed, "closed open interfaces");
    }
}

/// Decode frames from `subscriber` and queue them for the tick loop.
pub async fn forward_inbound(mut subscriber: async_nats::Subscriber, tx: mpsc::UnboundedSender<Inbound>) {
    while let Some(message) = subscriber.next().await {
        match read_frame(&message) {
            Ok(inbound) => {
                if tx.send(inbound).is_err() {
                    break;
                }
            }
            Err(e) => warn!(subject = %message.subject, error = %e, "dropping undecodable frame"),
        }
    }
    debug!("inbound forwarder finished");
}

/// Queue stdin lines for the console.
pub async fn read_console(tx: mpsc::UnboundedSender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read console input");
                break;
            }
        }
    }
    debug!("console reader finished");
}
