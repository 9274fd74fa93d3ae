use super::Invocation;
use crate::bus::RELOAD_HEADER;
use crate::error::HandlerResult;
use crate::store::MaskOutcome;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::info;

const USAGE: &str = "Usage: hostmask {add account mask | del mask | list}";

pub(super) fn hostmask(inv: Invocation) -> BoxFuture<'static, HandlerResult> {
    hostmask_command(inv).boxed()
}

async fn hostmask_command(inv: Invocation) -> HandlerResult {
    let sub = inv.arg(0).map(str::to_ascii_lowercase);
    match (sub.as_deref(), inv.arg(1), inv.arg(2)) {
        (Some("list"), _, _) => {
            let masks = inv.state.hostmasks.lock().list();
            if masks.is_empty() {
                inv.reply("No hostmasks defined.");
            } else {
                let listed: Vec<String> = masks
                    .iter()
                    .map(|(mask, account)| format!("{mask} = {account}"))
                    .collect();
                inv.reply(format!("Hostmasks: {}", listed.join(", ")));
            }
        }
        (Some("add"), Some(account), Some(mask)) => {
            let modified = inv.state.hostmasks.lock().modify(true, account, mask);
            let outcome = inv.stored("Updating hostmasks", modified)?;
            match outcome {
                MaskOutcome::InvalidMask(e) => {
                    inv.reply(format!("Invalid hostmask '{mask}': {e}."));
                }
                MaskOutcome::ReservedMask => {
                    inv.reply(format!("{mask} only shows the format; give a real hostmask."));
                }
                MaskOutcome::Replaced { previous } => {
                    info!(
                        mask = %mask,
                        account = %account,
                        previous = %previous,
                        by = %inv.invoker,
                        "Hostmask remapped"
                    );
                    inv.state.bus.notify(RELOAD_HEADER, "hostmasks");
                    inv.reply(format!("Hostmask {mask} now maps to {account} (was {previous})."));
                }
                _ => {
                    info!(
                        mask = %mask,
                        account = %account,
                        by = %inv.invoker,
                        "Hostmask mapped"
                    );
                    inv.state.bus.notify(RELOAD_HEADER, "hostmasks");
                    inv.reply(format!("Hostmask {mask} now maps to {account}."));
                }
            }
        }
        (Some("del"), Some(mask), _) => {
            let modified = inv.state.hostmasks.lock().modify(false, "", mask);
            let outcome = inv.stored("Updating hostmasks", modified)?;
            if outcome == MaskOutcome::Removed {
                info!(mask = %mask, by = %inv.invoker, "Hostmask removed");
                inv.state.bus.notify(RELOAD_HEADER, "hostmasks");
                inv.reply(format!("Hostmask {mask} removed."));
            } else {
                inv.reply(format!("Hostmask {mask} was not found."));
            }
        }
        _ => inv.reply(USAGE),
    }
    Ok(())
}
