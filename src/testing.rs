//! Test harness: a full `BotState` over a temporary resource directory,
//! with every outbound action and bus envelope recorded.

use crate::bus::{ADMIN_HEADER, Bus, BusMessage};
use crate::commands::{CommandRouter, Invocation, Invoker, Origin, Permission, ReplySink};
use crate::config::{AdminConfig, BotConfig, Config, ResourceConfig};
use crate::dispatch::Dispatcher;
use crate::outbound::{OutboundAction, QueuedOutbound};
use crate::state::BotState;
use parking_lot::Mutex;
use slircbot_proto::{EventKind, IrcEvent};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct Harness {
    pub state: Arc<BotState>,
    pub dispatcher: Dispatcher,
    outbound_rx: UnboundedReceiver<OutboundAction>,
    bus_rx: UnboundedReceiver<BusMessage>,
    _dir: TempDir,
}

pub fn config(dir: &TempDir) -> Config {
    let mut printer = BTreeMap::new();
    printer.insert("bell".to_string(), toml::Value::String("off".into()));
    let mut settings = BTreeMap::new();
    settings.insert("printer".to_string(), printer);

    Config {
        bot: BotConfig {
            nickname: "slircbot".into(),
            prefix: "!".into(),
            home_channels: vec!["#straylight".into()],
            guest_channels: vec!["#sprawl".into()],
        },
        resources: ResourceConfig {
            directory: dir.path().to_path_buf(),
        },
        admin: AdminConfig::default(),
        settings,
    }
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let (outbound, outbound_rx) = QueuedOutbound::channel();
        let (bus, bus_rx) = Bus::channel();
        let state = Arc::new(BotState::new(config(&dir), Arc::new(outbound), bus).unwrap());
        let dispatcher = Dispatcher::new(Arc::clone(&state), CommandRouter::new());
        Self {
            state,
            dispatcher,
            outbound_rx,
            bus_rx,
            _dir: dir,
        }
    }

    /// A channel message from wintermute, who holds `permission`.
    pub async fn chat(&mut self, channel: &str, text: &str, permission: Permission) {
        let event = IrcEvent::new(EventKind::Chan)
            .with_channel(channel)
            .with_sender("wintermute", "wm", "tessier.ashpool")
            .with_content(text);
        self.dispatcher.dispatch(event, permission).await;
        self.settle().await;
    }

    pub async fn event(&mut self, event: IrcEvent) {
        self.dispatcher.dispatch(event, Permission::Anyone).await;
        self.settle().await;
    }

    /// An `admin` bus envelope; rejected envelopes are ignored.
    pub async fn bus(&mut self, text: &str) {
        let _ = self
            .dispatcher
            .route_bus(&BusMessage::text(ADMIN_HEADER, text))
            .await;
        self.settle().await;
    }

    /// Let spawned continuations run until they park again.
    pub async fn settle(&self) {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }

    /// Drain every recorded outbound action.
    pub fn outbound(&mut self) -> Vec<OutboundAction> {
        let mut sent = Vec::new();
        while let Ok(action) = self.outbound_rx.try_recv() {
            sent.push(action);
        }
        sent
    }

    /// Drain every recorded outbound action, keeping reply texts only.
    pub fn replies(&mut self) -> Vec<String> {
        self.outbound()
            .into_iter()
            .filter_map(|action| match action {
                OutboundAction::Reply { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn bus_messages(&mut self) -> Vec<BusMessage> {
        let mut seen = Vec::new();
        while let Ok(message) = self.bus_rx.try_recv() {
            seen.push(message);
        }
        seen
    }

    /// An invocation of `verb` reporting into `sink`.
    pub fn invocation(
        &self,
        verb: &'static str,
        channel: Option<&str>,
        args: &[&str],
        sink: Arc<dyn ReplySink>,
    ) -> Invocation {
        Invocation {
            state: Arc::clone(&self.state),
            verb,
            invoker: Invoker::console(),
            channel: channel.map(str::to_string),
            args: args.iter().map(|a| a.to_string()).collect(),
            sink,
        }
    }
}

/// Reply sink that keeps every line.
pub struct RecordingSink {
    origin: Origin,
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new(origin: Origin) -> Arc<Self> {
        Arc::new(Self {
            origin,
            lines: Mutex::new(Vec::new()),
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl ReplySink for RecordingSink {
    fn origin(&self) -> Origin {
        self.origin
    }

    fn target_channel(&self) -> Option<&str> {
        None
    }

    fn reply(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }
}
