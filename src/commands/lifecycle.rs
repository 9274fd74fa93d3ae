//! State, connection and settings commands.

use super::Invocation;
use crate::bus::RELOAD_HEADER;
use crate::error::HandlerResult;
use crate::outbound::OutboundAction;
use crate::state::{ChannelRole, SettingUpdate};
use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{info, warn};

pub(super) fn save(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        inv.stored("Saving", inv.state.save())?;
        info!(by = %inv.invoker, "State saved");
        inv.reply("State saved.");
        Ok(())
    }
    .boxed()
}

pub(super) fn reload(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        match inv.arg(0) {
            Some(plugin) => {
                inv.state.bus.notify(RELOAD_HEADER, plugin);
                inv.reply(format!("Asked {plugin} to reload."));
            }
            None => {
                inv.stored("Reloading", inv.state.reload())?;
                inv.state.bus.notify(RELOAD_HEADER, "");
                inv.reply("Reloaded.");
            }
        }
        Ok(())
    }
    .boxed()
}

fn disconnect(inv: &Invocation, reconnect: bool) {
    let message = inv.rest(0);
    warn!(reconnect, message = ?message, by = %inv.invoker, "Disconnect requested");
    inv.reply(if reconnect { "Reconnecting." } else { "Quitting." });
    inv.state.outbound.send(OutboundAction::Quit { message, reconnect });
}

pub(super) fn reconnect(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        disconnect(&inv, true);
        Ok(())
    }
    .boxed()
}

pub(super) fn quit(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        disconnect(&inv, false);
        Ok(())
    }
    .boxed()
}

pub(super) fn get(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        let key = inv.arg(0).unwrap_or_default();
        if key.contains('.') {
            match inv.state.session.setting(key) {
                Some(value) => inv.reply(format!("{key} = {value}")),
                None => inv.reply(format!("No such setting: {key}")),
            }
        } else {
            let settings = inv.state.session.plugin_settings(key);
            if settings.is_empty() {
                inv.reply(format!("No settings for {key}."));
            } else {
                let listed: Vec<String> = settings
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect();
                inv.reply(format!("{key}: {}", listed.join(", ")));
            }
        }
        Ok(())
    }
    .boxed()
}

pub(super) fn set(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        let assignment = inv.rest(0).unwrap_or_default();
        let Some((key, value)) = assignment.split_once('=') else {
            inv.reply("Usage: set plugin.setting=value");
            return Ok(());
        };
        let (key, value) = (key.trim(), value.trim());
        match inv.state.session.set_setting(key, value) {
            SettingUpdate::Updated { previous } => {
                info!(
                    setting = %key,
                    value = %value,
                    previous = %previous,
                    by = %inv.invoker,
                    "Setting changed"
                );
                inv.reply(format!("{key} set to {value} (was {previous})."));
            }
            SettingUpdate::UnknownSetting => inv.reply(format!("No such setting: {key}")),
        }
        Ok(())
    }
    .boxed()
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

pub(super) fn printraw(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        let now = inv.state.session.toggle_printraw();
        inv.reply(format!("printraw is now {}.", on_off(now)));
        Ok(())
    }
    .boxed()
}

pub(super) fn printbytes(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        let now = inv.state.session.toggle_printbytes();
        inv.reply(format!("printbytes is now {}.", on_off(now)));
        Ok(())
    }
    .boxed()
}

pub(super) fn status(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    async move {
        let state = &inv.state;
        let uptime = Utc::now() - state.session.started();
        let secs = uptime.num_seconds().max(0);
        let (home, guest) = {
            let channels = state.channels.lock();
            (
                channels.list(ChannelRole::Home).len(),
                channels.list(ChannelRole::Guest).len(),
            )
        };
        inv.reply(format!(
            "Up {}h {}m {}s; {home} home and {guest} guest channels; {} pending awaits; {} known users.",
            secs / 3600,
            secs % 3600 / 60,
            secs % 60,
            state.suspender.pending_count(),
            state.session.known_users(),
        ));
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use crate::bus::BusMessage;
    use crate::commands::Permission;
    use crate::outbound::OutboundAction;
    use crate::state::ChannelMembership;
    use crate::store::Class;
    use crate::testing::Harness;

    #[tokio::test]
    async fn save_writes_channels_and_stores() {
        let mut h = Harness::new();
        h.chat("#x", "!guest add #new", Permission::Admin).await;
        h.chat("#x", "!save", Permission::Admin).await;
        assert_eq!(h.replies(), vec!["Guest channel added.", "State saved."]);

        let resources = &h.state.config.resources;
        let saved = ChannelMembership::load(&resources.channels_file(), ChannelMembership::default())
            .unwrap();
        assert!(saved.contains(crate::state::ChannelRole::Guest, "#new"));
        assert!(resources.users_file().exists());
        assert!(resources.hostmasks_file().exists());
    }

    #[tokio::test]
    async fn reload_picks_up_external_edits_and_announces() {
        let mut h = Harness::new();
        {
            let path = h.state.config.resources.users_file();
            let mut other = crate::store::ClassificationStore::load(&path).unwrap();
            other.alter(true, Class::Admin, "3jane", "#x").unwrap();
        }
        assert!(!h.state.classes.lock().contains(Class::Admin, "3jane", "#x"));

        h.bus("reload").await;
        assert!(h.state.classes.lock().contains(Class::Admin, "3jane", "#x"));
        assert_eq!(h.bus_messages(), vec![BusMessage::text("reload", "")]);

        h.bus("reload seen").await;
        assert_eq!(h.bus_messages(), vec![BusMessage::text("reload", "seen")]);
    }

    #[tokio::test]
    async fn reconnect_and_quit_carry_message() {
        let mut h = Harness::new();
        h.bus("reconnect be right back").await;
        h.bus("quit").await;
        assert_eq!(
            h.outbound(),
            vec![
                OutboundAction::Quit {
                    message: Some("be right back".into()),
                    reconnect: true
                },
                OutboundAction::Quit {
                    message: None,
                    reconnect: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn settings_get_and_set() {
        let mut h = Harness::new();
        h.chat("#x", "!get printer.bell", Permission::Admin).await;
        h.chat("#x", "!set printer.bell = on", Permission::Admin).await;
        h.chat("#x", "!get printer", Permission::Admin).await;
        h.chat("#x", "!set printer.colour=yes", Permission::Admin).await;
        h.chat("#x", "!get nothing", Permission::Admin).await;
        assert_eq!(
            h.replies(),
            vec![
                "printer.bell = off",
                "printer.bell set to on (was off).",
                "printer: bell=on",
                "No such setting: printer.colour",
                "No settings for nothing.",
            ]
        );
    }

    #[tokio::test]
    async fn debug_toggles_flip() {
        let mut h = Harness::new();
        h.chat("#x", "!printraw", Permission::Admin).await;
        h.chat("#x", "!printbytes", Permission::Admin).await;
        h.chat("#x", "!printraw", Permission::Admin).await;
        assert_eq!(
            h.replies(),
            vec![
                "printraw is now on.",
                "printbytes is now on.",
                "printraw is now off.",
            ]
        );
        assert!(h.state.session.printbytes());
    }

    #[tokio::test]
    async fn status_reports_counts() {
        let mut h = Harness::new();
        h.chat("#x", "!status", Permission::Operator).await;
        let replies = h.replies();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("1 home and 1 guest channels"));
        assert!(replies[0].contains("0 pending awaits"));
    }
}
