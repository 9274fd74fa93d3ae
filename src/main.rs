//! slircbot - administrative command layer of the Straylight IRC bot.
//!
//! Without a transport attached the binary runs against the local console:
//! every stdin line is either a control-bus command (`verb [args]`) or, when
//! it starts with `{`, a JSON-encoded inbound event. Outbound actions are
//! logged instead of sent.

mod bus;
mod commands;
mod config;
mod dispatch;
mod error;
mod outbound;
mod resolver;
mod state;
mod store;
mod suspend;
mod telemetry;
#[cfg(test)]
mod testing;

use crate::bus::{ADMIN_HEADER, Bus, BusMessage};
use crate::commands::CommandRouter;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::outbound::{Outbound, OutboundAction, QueuedOutbound};
use crate::state::BotState;
use slircbot_proto::IrcEvent;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "slircbot.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        nickname = %config.bot.nickname,
        resources = %config.resources.directory.display(),
        "Starting slircbot"
    );

    // Handlers and continuations share one logical thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let (outbound, mut outbound_rx) = QueuedOutbound::channel();
    let (bus, mut bus_rx) = Bus::channel();
    let outbound: Arc<dyn Outbound> = Arc::new(outbound);
    let state = Arc::new(BotState::new(config, Arc::clone(&outbound), bus)?);
    let dispatcher = Dispatcher::new(Arc::clone(&state), CommandRouter::new());

    let channels: Vec<String> = state.channels.lock().all().map(str::to_string).collect();
    for channel in &channels {
        outbound.join(channel, None);
    }
    info!(count = channels.len(), "Joining configured channels");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => console_line(&dispatcher, line.trim()).await,
                Ok(None) => {
                    info!("Console closed, shutting down");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Console read failed");
                    break;
                }
            },
            Some(message) = bus_rx.recv() => {
                if message.header == ADMIN_HEADER {
                    let _ = dispatcher.route_bus(&message).await;
                } else {
                    info!(header = %message.header, payload = %message.payload, "Bus notification");
                }
            }
            Some(action) = outbound_rx.recv() => {
                if stop_requested(&action) {
                    break;
                }
            }
        }
    }

    drain_outbound(&mut outbound_rx);
    Ok(())
}

async fn console_line(dispatcher: &Dispatcher, line: &str) {
    if line.is_empty() {
        return;
    }
    if line.starts_with('{') {
        match serde_json::from_str::<IrcEvent>(line) {
            Ok(event) => {
                dispatcher.handle(event).await;
            }
            Err(e) => warn!(error = %e, "Ignoring malformed event"),
        }
        return;
    }
    let _ = dispatcher
        .route_bus(&BusMessage::text(ADMIN_HEADER, line))
        .await;
}

/// Log an outbound action. True for a quit that ends the process.
fn stop_requested(action: &OutboundAction) -> bool {
    info!(target: "outbound", "{action}");
    match action {
        OutboundAction::Quit {
            reconnect: false, ..
        } => true,
        OutboundAction::Quit {
            reconnect: true, ..
        } => {
            info!("Reconnect requested; no transport attached");
            false
        }
        _ => false,
    }
}

fn drain_outbound(rx: &mut UnboundedReceiver<OutboundAction>) {
    while let Ok(action) = rx.try_recv() {
        info!(target: "outbound", "{action}");
    }
}
