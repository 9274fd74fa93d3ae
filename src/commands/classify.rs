//! Account classification commands (`whitelist`, `operator`, ...).

use super::{Invocation, Origin};
use crate::bus::RELOAD_HEADER;
use crate::error::{HandlerError, HandlerResult};
use crate::resolver::{self, Resolution};
use crate::store::{AlterOutcome, Class};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::info;

pub(super) fn classify(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    classify_command(inv).boxed()
}

async fn classify_command(inv: Invocation) -> HandlerResult {
    let class: Class = inv
        .verb
        .parse()
        .map_err(|()| HandlerError::Internal(format!("'{}' is not a class", inv.verb)))?;

    let sub = inv.arg(0).map(str::to_ascii_lowercase);
    match sub.as_deref() {
        Some("list") => {
            let Some(channel) = inv.channel_arg(1) else {
                return Ok(());
            };
            let accounts = inv.state.classes.lock().list(class, &channel);
            if accounts.is_empty() {
                inv.reply(format!("The {class} for {channel} is empty."));
            } else {
                inv.reply(format!("{class} for {channel}: {}", accounts.join(", ")));
            }
            Ok(())
        }
        Some(action @ ("add" | "del")) => {
            let Some(specified) = inv.arg(1).map(str::to_string) else {
                inv.reply(format!("Usage: {class} {action} <account|nickname> [channel]"));
                return Ok(());
            };
            let Some(channel) = inv.channel_arg(2) else {
                return Ok(());
            };
            if action == "add" {
                lookup_enlist(&inv, &specified, class, &channel).await
            } else {
                delist(&inv, &specified, class, &channel)
            }
        }
        _ => {
            inv.reply(format!(
                "Usage: {class} {{add|del|list}} [account|nickname] [channel]"
            ));
            Ok(())
        }
    }
}

/// Resolve `specified` to an account and put it in `class` for `channel`,
/// taking it out of every other class there first.
async fn lookup_enlist(
    inv: &Invocation,
    specified: &str,
    class: Class,
    channel: &str,
) -> HandlerResult {
    let resolution = resolver::resolve(&inv.state, specified).await;
    let Some(account) = resolution.account().map(str::to_string) else {
        match inv.origin() {
            Origin::Chat => inv.reply(format!(
                "{specified} is not a valid nickname, and I do not know that account."
            )),
            Origin::Bus => inv.reply(format!("Cannot enlist '{specified}': invalid nickname.")),
        }
        return Ok(());
    };
    if let Resolution::Unverified(literal) = &resolution {
        info!(nickname = %literal, "No account found, enlisting the nickname as given");
    }

    let enlisted = inv.state.classes.lock().enlist(class, &account, channel);
    let (outcome, left) = inv.stored(&format!("Updating the {class}"), enlisted)?;
    for other in &left {
        info!(
            account = %account,
            from = %other,
            to = %class,
            channel = %channel,
            by = %inv.invoker,
            "Reclassified"
        );
    }
    if !left.is_empty() && outcome != AlterOutcome::Success {
        inv.state.bus.notify(RELOAD_HEADER, "users");
    }

    match outcome {
        AlterOutcome::AlreadyInList => {
            inv.reply(format!("{account} is already in {class} for {channel}."));
        }
        _ => {
            inv.state.bus.notify(RELOAD_HEADER, "users");
            inv.reply(format!("{account} added to {class} for {channel}."));
        }
    }
    Ok(())
}

/// Take `specified` out of `class` for `channel`.
///
/// No lookup round-trip: a nickname the session does not know is taken to be
/// the account itself.
fn delist(inv: &Invocation, specified: &str, class: Class, channel: &str) -> HandlerResult {
    let account =
        resolver::known_account(&inv.state, specified).unwrap_or_else(|| specified.to_string());
    let removed = inv.state.classes.lock().alter(false, class, &account, channel);
    let outcome = inv.stored(&format!("Updating the {class}"), removed)?;
    match outcome {
        AlterOutcome::Success => {
            info!(
                account = %account,
                class = %class,
                channel = %channel,
                by = %inv.invoker,
                "Delisted"
            );
            inv.state.bus.notify(RELOAD_HEADER, "users");
            inv.reply(format!("{account} removed from {class} for {channel}."));
        }
        AlterOutcome::NoSuchAccount => {
            inv.reply(format!("{account} was not found in {class} for {channel}."));
        }
        AlterOutcome::NoSuchChannel | AlterOutcome::AlreadyInList => {
            inv.reply(format!("No {class} entries found for {channel}."));
        }
    }
    Ok(())
}
