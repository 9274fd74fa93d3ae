//! Inbound event dispatch.
//!
//! Every event first updates the session, then resumes the awaits that are
//! interested in it, and only then reaches the command router. A command
//! started by an event therefore never sees that same event delivered to
//! the awaits it registers.

use crate::bus::BusMessage;
use crate::commands::{ChatMessage, CommandRouter, Permission};
use crate::error::BusError;
use crate::state::BotState;
use crate::store::Class;
use crate::telemetry::spans;
use slircbot_proto::{EventKind, IrcEvent};
use std::sync::Arc;
use tracing::{Instrument, info, warn};

/// Feeds events to the suspension registry and the command router.
pub struct Dispatcher {
    state: Arc<BotState>,
    router: CommandRouter,
}

impl Dispatcher {
    pub fn new(state: Arc<BotState>, router: CommandRouter) -> Self {
        Self { state, router }
    }

    /// Dispatch an event with the sender's permission looked up from the
    /// classification store.
    pub async fn handle(&self, event: IrcEvent) -> usize {
        let permission = self.permission_of(&event);
        self.dispatch(event, permission).await
    }

    /// Dispatch an event whose sender holds `permission`. Returns how many
    /// awaits were resumed plus how many commands ran.
    pub async fn dispatch(&self, event: IrcEvent, permission: Permission) -> usize {
        let span = spans::event(event.kind.as_str(), event.channel.as_deref());
        async {
            self.state.session.observe(&event);
            self.trace_raw(&event);

            let resumed = self.state.suspender.dispatch(&event);
            let invoked = match event.kind {
                EventKind::Chan | EventKind::Query => {
                    let message = ChatMessage::from_event(&event, permission);
                    self.router.route(&self.state, message).await
                }
                _ => 0,
            };
            resumed + invoked
        }
        .instrument(span)
        .await
    }

    /// Route a control-bus envelope. Errors are logged and returned.
    pub async fn route_bus(&self, message: &BusMessage) -> Result<(), BusError> {
        let result = self.router.route_bus(&self.state, message).await;
        if let Err(e) = &result {
            warn!(
                header = %message.header,
                payload = %message.payload,
                code = e.error_code(),
                error = %e,
                "Bus message rejected"
            );
        }
        result
    }

    /// Highest class the sender holds in the event's channel.
    ///
    /// Blacklisting wins over everything else. A sender with an account
    /// but no class is `Registered`.
    pub fn permission_of(&self, event: &IrcEvent) -> Permission {
        let account = event
            .sender
            .account
            .clone()
            .or_else(|| self.state.session.account_of(&event.sender.nickname));
        let Some(account) = account else {
            return Permission::Anyone;
        };
        let Some(channel) = event.channel.as_deref() else {
            return Permission::Registered;
        };

        let classes = self.state.classes.lock().classes_of(&account, channel);
        if classes.contains(&Class::Blacklist) {
            return Permission::Blacklist;
        }
        classes
            .into_iter()
            .map(|class| match class {
                Class::Admin => Permission::Admin,
                Class::Staff => Permission::Staff,
                Class::Operator => Permission::Operator,
                Class::Elevated => Permission::Elevated,
                Class::Whitelist => Permission::Whitelist,
                Class::Registered | Class::Blacklist => Permission::Registered,
            })
            .max()
            .unwrap_or(Permission::Registered)
    }

    fn trace_raw(&self, event: &IrcEvent) {
        let session = &self.state.session;
        if session.printraw() && !event.raw.is_empty() {
            info!(target: "raw", line = %event.raw);
        }
        if session.printbytes() && !event.content.is_empty() {
            info!(target: "bytes", bytes = ?event.content.as_bytes());
        }
    }
}
