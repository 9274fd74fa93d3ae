//! Channel list maintenance and join/part/cycle.

use super::Invocation;
use crate::error::HandlerResult;
use crate::state::{AddChannelOutcome, BotState, ChannelRole, JOIN_INTEREST, JoinStep, join_step};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use slircbot_proto::{ChannelExt, EventKind, irc_eq};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub(super) fn home(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    manage(inv, ChannelRole::Home).boxed()
}

pub(super) fn guest(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    manage(inv, ChannelRole::Guest).boxed()
}

pub(super) fn join(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    join_command(inv).boxed()
}

pub(super) fn part(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    part_command(inv).boxed()
}

pub(super) fn cycle(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    cycle_command(inv).boxed()
}

fn title(role: ChannelRole) -> &'static str {
    match role {
        ChannelRole::Home => "Home",
        ChannelRole::Guest => "Guest",
    }
}

/// Channel named at `index`, or the invocation scope. Also returns the index
/// of the first argument after it.
fn scoped_channel(inv: &Invocation, index: usize) -> (Option<String>, usize) {
    match inv.arg(index) {
        Some(arg) if arg.is_channel_name() => (Some(arg.to_string()), index + 1),
        _ => (inv.channel.clone(), index),
    }
}

/// Channel to act on, replying when there is none or it is malformed.
fn required_channel(inv: &Invocation, index: usize) -> Option<(String, usize)> {
    match scoped_channel(inv, index) {
        (Some(channel), next) => Some((channel, next)),
        (None, _) => {
            match inv.arg(index) {
                Some(bad) => inv.reply(format!("Invalid channel name: {bad}")),
                None => inv.reply("Please specify a channel."),
            }
            None
        }
    }
}

async fn manage(inv: Invocation, role: ChannelRole) -> HandlerResult {
    match inv.arg(0).map(str::to_ascii_lowercase).as_deref() {
        Some("list") => {
            let channels = inv.state.channels.lock().list(role).to_vec();
            if channels.is_empty() {
                inv.reply(format!("There are no {role} channels."));
            } else {
                inv.reply(format!("{} channels: {}", title(role), channels.join(", ")));
            }
            Ok(())
        }
        Some("add") => {
            let Some(channel) = inv.channel_arg(1) else {
                return Ok(());
            };
            add_channel(inv, role, channel).await
        }
        Some("del") => {
            let Some(channel) = inv.channel_arg(1) else {
                return Ok(());
            };
            del_channel(&inv, role, &channel);
            Ok(())
        }
        _ => {
            inv.reply(format!("Usage: {role} {{add|del|list}} [channel]"));
            Ok(())
        }
    }
}

/// Add `channel` to the `role` list and join it.
///
/// The list entry and the success reply go out before the server has
/// answered; a refusal later rolls the entry back and reports why. A
/// redirect moves the entry to the new channel under the same rules as a
/// fresh add, and a redirect into a channel already listed ends the wait
/// without touching that channel's entry.
async fn add_channel(inv: Invocation, role: ChannelRole, channel: String) -> HandlerResult {
    let state = Arc::clone(&inv.state);
    let outcome = state.channels.lock().add(role, &channel);
    match outcome {
        AddChannelOutcome::AlreadyPresent => {
            inv.reply(format!("We are already in that {role} channel."));
            return Ok(());
        }
        AddChannelOutcome::AlreadyHome => {
            inv.reply(format!("{channel} is already a home channel."));
            return Ok(());
        }
        AddChannelOutcome::Promoted => {
            // Already sitting in it as a guest: rejoin instead of joining.
            info!(channel = %channel, "Guest channel promoted to home");
            inv.reply(format!("{} channel added.", title(role)));
            return cycle_channel(&state, &channel, Duration::ZERO, None).await;
        }
        AddChannelOutcome::Added => {}
    }

    let mut waiter = state.suspender.register(&JOIN_INTEREST, "join outcome");
    state.outbound.join(&channel, None);
    inv.reply(format!("{} channel added.", title(role)));

    let mut target = channel;
    loop {
        let event = waiter.next().await?;
        match join_step(&target, &event) {
            JoinStep::Ignore => {}
            JoinStep::Succeeded => {
                info!(channel = %target, role = %role, "Join confirmed");
                return Ok(());
            }
            JoinStep::Redirected { to } => {
                info!(from = %target, to = %to, role = %role, "Join redirected");
                let outcome = {
                    let mut channels = state.channels.lock();
                    channels.remove(role, &target);
                    channels.add(role, &to)
                };
                match outcome {
                    AddChannelOutcome::Added => target = to,
                    // Already sitting in it; no join reply will follow.
                    AddChannelOutcome::AlreadyPresent | AddChannelOutcome::Promoted => {
                        info!(channel = %to, role = %role, "Redirected into a listed channel");
                        return Ok(());
                    }
                    AddChannelOutcome::AlreadyHome => {
                        inv.reply(format!("{to} is already a home channel."));
                        return Ok(());
                    }
                }
            }
            JoinStep::Failed(failure) => {
                state.channels.lock().remove(role, &target);
                warn!(
                    channel = %target,
                    role = %role,
                    reply = %failure.kind,
                    reason = %failure.reason,
                    "Join refused, rolled back"
                );
                inv.reply(format!("Could not join {target}: {}.", failure.describe()));
                return Ok(());
            }
        }
    }
}

/// Drop `channel` from the `role` list and leave it.
fn del_channel(inv: &Invocation, role: ChannelRole, channel: &str) {
    if !inv.state.channels.lock().remove(role, channel) {
        inv.reply(format!("Channel {channel} was not listed as a {role} channel."));
        return;
    }
    inv.state.outbound.part(channel, None);
    info!(channel = %channel, role = %role, "Channel removed");

    // We just left; a reply there would bounce.
    let replying_there = inv
        .sink
        .target_channel()
        .is_some_and(|target| irc_eq(target, channel));
    if !replying_there {
        inv.reply(format!("{} channel removed.", title(role)));
    }
}

async fn join_command(inv: Invocation) -> HandlerResult {
    let Some((channel, next)) = required_channel(&inv, 0) else {
        return Ok(());
    };
    inv.state.outbound.join(&channel, inv.arg(next));
    inv.reply(format!("Joining {channel}."));
    Ok(())
}

async fn part_command(inv: Invocation) -> HandlerResult {
    let Some((channel, next)) = required_channel(&inv, 0) else {
        return Ok(());
    };
    let reason = inv.rest(next);
    inv.state.outbound.part(&channel, reason.as_deref());
    let replying_there = inv
        .sink
        .target_channel()
        .is_some_and(|target| irc_eq(target, &channel));
    if !replying_there {
        inv.reply(format!("Left {channel}."));
    }
    Ok(())
}

async fn cycle_command(inv: Invocation) -> HandlerResult {
    let Some((channel, mut next)) = required_channel(&inv, 0) else {
        return Ok(());
    };
    let mut delay = Duration::from_secs(inv.state.config.admin.cycle_delay_secs);
    if let Some(secs) = inv.arg(next).and_then(|arg| arg.parse::<u64>().ok()) {
        delay = Duration::from_secs(secs);
        next += 1;
    }
    let key = inv.arg(next).map(str::to_string);

    inv.reply(format!("Cycling {channel}."));
    cycle_channel(&inv.state, &channel, delay, key.as_deref()).await
}

/// Part `channel`, wait until the server confirms we left it, optionally
/// sleep, then join it again.
async fn cycle_channel(
    state: &BotState,
    channel: &str,
    delay: Duration,
    key: Option<&str>,
) -> HandlerResult {
    let mut waiter = state.suspender.register(&[EventKind::SelfPart], "cycle part");
    state.outbound.part(channel, Some("Cycling"));
    waiter
        .next_matching(|event| {
            event
                .channel
                .as_deref()
                .is_some_and(|parted| irc_eq(parted, channel))
        })
        .await?;
    drop(waiter);

    if !delay.is_zero() {
        state.suspender.delay(delay).await?;
    }
    state.outbound.join(channel, key);
    info!(channel = %channel, "Cycled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::commands::Permission;
    use crate::outbound::OutboundAction;
    use crate::testing::Harness;
    use slircbot_proto::{EventKind, IrcEvent};

    fn join(channel: &str) -> OutboundAction {
        OutboundAction::Join {
            channel: channel.into(),
            key: None,
        }
    }

    fn part(channel: &str, reason: Option<&str>) -> OutboundAction {
        OutboundAction::Part {
            channel: channel.into(),
            reason: reason.map(str::to_string),
        }
    }

    fn home(h: &Harness) -> Vec<String> {
        h.state
            .channels
            .lock()
            .list(crate::state::ChannelRole::Home)
            .to_vec()
    }

    #[tokio::test]
    async fn home_add_and_del_scenario() {
        let mut h = Harness::new();

        h.chat("#x", "!home add #test", Permission::Admin).await;
        assert_eq!(h.replies(), vec!["Home channel added."]);
        h.chat("#x", "!home add #test", Permission::Admin).await;
        assert_eq!(h.replies(), vec!["We are already in that home channel."]);
        assert_eq!(home(&h), vec!["#straylight", "#test"]);

        h.chat("#x", "!home del #test", Permission::Admin).await;
        assert_eq!(h.replies(), vec!["Home channel removed."]);
        h.chat("#x", "!home del #test", Permission::Admin).await;
        assert_eq!(
            h.replies(),
            vec!["Channel #test was not listed as a home channel."]
        );
    }

    #[tokio::test]
    async fn confirmed_join_keeps_entry_and_unregisters() {
        let mut h = Harness::new();
        h.chat("#x", "!home add #test", Permission::Admin).await;
        assert!(h.outbound().contains(&join("#test")));
        assert_eq!(h.state.suspender.pending_count(), 1);

        h.event(IrcEvent::new(EventKind::SelfJoin).with_channel("#other")).await;
        assert_eq!(h.state.suspender.pending_count(), 1);
        h.event(IrcEvent::new(EventKind::SelfJoin).with_channel("#test")).await;

        assert_eq!(h.state.suspender.pending_count(), 0);
        assert_eq!(home(&h), vec!["#straylight", "#test"]);
    }

    #[tokio::test]
    async fn refused_join_rolls_back_and_reports() {
        let mut h = Harness::new();
        h.chat("#x", "!guest add #vault", Permission::Admin).await;
        h.replies();

        h.event(
            IrcEvent::new(EventKind::ErrBannedFromChan)
                .with_channel("#vault")
                .with_content("Cannot join channel (+b)"),
        )
        .await;

        assert_eq!(h.replies(), vec!["Could not join #vault: banned from channel."]);
        assert!(
            !h.state
                .channels
                .lock()
                .contains(crate::state::ChannelRole::Guest, "#vault")
        );
        assert_eq!(h.state.suspender.pending_count(), 0);
    }

    #[tokio::test]
    async fn redirect_replaces_entry_and_keeps_waiting() {
        let mut h = Harness::new();
        h.chat("#x", "!home add #old", Permission::Admin).await;
        h.replies();

        h.event(
            IrcEvent::new(EventKind::ErrLinkChannel)
                .with_channel("#old")
                .with_aux("#new"),
        )
        .await;
        assert_eq!(home(&h), vec!["#straylight", "#new"]);
        assert_eq!(h.state.suspender.pending_count(), 1);

        // The redirected channel can still fail.
        h.event(IrcEvent::new(EventKind::ErrChannelIsFull).with_channel("#new")).await;
        assert_eq!(home(&h), vec!["#straylight"]);
        assert_eq!(h.replies(), vec!["Could not join #new: channel is full."]);
    }

    fn guest(h: &Harness) -> Vec<String> {
        h.state
            .channels
            .lock()
            .list(crate::state::ChannelRole::Guest)
            .to_vec()
    }

    #[tokio::test]
    async fn redirect_into_listed_channel_keeps_it_through_later_errors() {
        let mut h = Harness::new();
        h.chat("#x", "!home add #old", Permission::Admin).await;
        h.replies();

        h.event(
            IrcEvent::new(EventKind::ErrLinkChannel)
                .with_channel("#old")
                .with_aux("#straylight"),
        )
        .await;
        assert_eq!(home(&h), vec!["#straylight"]);
        assert_eq!(h.state.suspender.pending_count(), 0);

        h.event(IrcEvent::new(EventKind::ErrChannelIsFull).with_channel("#straylight")).await;
        assert_eq!(home(&h), vec!["#straylight"]);
        assert!(h.replies().is_empty());
    }

    #[tokio::test]
    async fn home_redirect_into_guest_channel_promotes_it() {
        let mut h = Harness::new();
        h.chat("#x", "!home add #old", Permission::Admin).await;
        h.replies();

        h.event(
            IrcEvent::new(EventKind::ErrLinkChannel)
                .with_channel("#old")
                .with_aux("#Sprawl"),
        )
        .await;
        assert_eq!(home(&h), vec!["#straylight", "#Sprawl"]);
        assert!(guest(&h).is_empty());
        assert_eq!(h.state.suspender.pending_count(), 0);
    }

    #[tokio::test]
    async fn guest_redirect_into_home_channel_is_refused() {
        let mut h = Harness::new();
        h.chat("#x", "!guest add #old", Permission::Admin).await;
        h.replies();

        h.event(
            IrcEvent::new(EventKind::ErrLinkChannel)
                .with_channel("#old")
                .with_aux("#straylight"),
        )
        .await;
        assert_eq!(h.replies(), vec!["#straylight is already a home channel."]);
        assert_eq!(home(&h), vec!["#straylight"]);
        assert_eq!(guest(&h), vec!["#sprawl"]);
        assert_eq!(h.state.suspender.pending_count(), 0);
    }

    #[tokio::test]
    async fn home_add_of_guest_promotes_and_cycles() {
        let mut h = Harness::new();
        h.chat("#x", "!home add #sprawl", Permission::Admin).await;
        let sent = h.outbound();
        assert!(sent.iter().any(|action| matches!(
            action,
            OutboundAction::Reply { text, .. } if text == "Home channel added."
        )));
        assert!(sent.contains(&part("#sprawl", Some("Cycling"))));
        assert!(!sent.contains(&join("#sprawl")));
        assert!(
            h.state
                .channels
                .lock()
                .list(crate::state::ChannelRole::Guest)
                .is_empty()
        );

        h.event(IrcEvent::new(EventKind::SelfPart).with_channel("#sprawl")).await;
        assert_eq!(h.outbound(), vec![join("#sprawl")]);
    }

    #[tokio::test]
    async fn del_in_the_removed_channel_stays_quiet() {
        let mut h = Harness::new();
        h.chat("#straylight", "!home del", Permission::Admin).await;
        assert_eq!(h.outbound(), vec![part("#straylight", None)]);
        assert!(home(&h).is_empty());
    }

    #[tokio::test]
    async fn cycle_waits_for_its_own_part() {
        let mut h = Harness::new();
        h.chat("#x", "!cycle #chan", Permission::Admin).await;
        let sent = h.outbound();
        assert!(sent.contains(&part("#chan", Some("Cycling"))));

        h.event(IrcEvent::new(EventKind::SelfPart).with_channel("#other")).await;
        assert!(h.outbound().is_empty());
        assert_eq!(h.state.suspender.pending_count(), 1);

        h.event(IrcEvent::new(EventKind::SelfPart).with_channel("#chan")).await;
        assert_eq!(h.outbound(), vec![join("#chan")]);
        assert_eq!(h.state.suspender.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_honours_delay_and_key() {
        let mut h = Harness::new();
        h.chat("#x", "!cycle #vault 30 sekrit", Permission::Admin).await;
        h.outbound();
        h.event(IrcEvent::new(EventKind::SelfPart).with_channel("#vault")).await;
        assert!(h.outbound().is_empty());
        assert_eq!(h.state.suspender.labels(), vec!["delay"]);

        tokio::time::sleep(std::time::Duration::from_secs(31)).await;
        h.settle().await;
        assert_eq!(
            h.outbound(),
            vec![OutboundAction::Join {
                channel: "#vault".into(),
                key: Some("sekrit".into())
            }]
        );
    }

    #[tokio::test]
    async fn bus_needs_an_explicit_channel() {
        let mut h = Harness::new();
        h.bus("home add").await;
        assert!(h.outbound().is_empty());
        assert_eq!(home(&h), vec!["#straylight"]);

        h.bus("guest add #bus").await;
        assert_eq!(h.outbound(), vec![join("#bus")]);
    }

    #[tokio::test]
    async fn malformed_channel_is_rejected_without_changes() {
        let mut h = Harness::new();
        h.chat("#x", "!home add nohash", Permission::Admin).await;
        assert_eq!(h.replies(), vec!["Invalid channel name: nohash"]);
        assert_eq!(home(&h), vec!["#straylight"]);
    }

    #[tokio::test]
    async fn join_and_part_leave_lists_alone() {
        let mut h = Harness::new();
        h.chat("#x", "!join #chiba neon", Permission::Operator).await;
        h.chat("#x", "!part #chiba gone fishing", Permission::Operator).await;
        let sent = h.outbound();
        assert!(sent.contains(&OutboundAction::Join {
            channel: "#chiba".into(),
            key: Some("neon".into())
        }));
        assert!(sent.contains(&part("#chiba", Some("gone fishing"))));
        let texts: Vec<String> = sent
            .into_iter()
            .filter_map(|action| match action {
                OutboundAction::Reply { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Joining #chiba.", "Left #chiba."]);
        assert_eq!(home(&h), vec!["#straylight"]);

        h.chat("#sprawl", "!part", Permission::Operator).await;
        assert_eq!(h.outbound(), vec![part("#sprawl", None)]);
    }

    #[tokio::test]
    async fn list_shows_each_role() {
        let mut h = Harness::new();
        h.chat("#x", "!home list", Permission::Admin).await;
        h.chat("#x", "!guest list", Permission::Admin).await;
        assert_eq!(
            h.replies(),
            vec!["Home channels: #straylight", "Guest channels: #sprawl"]
        );
    }
}
