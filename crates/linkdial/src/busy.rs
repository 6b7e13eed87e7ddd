//! Waiting for a shared channel to clear before transmitting.

use std::time::Duration;

use linkdial_core::modem::BusyChannel;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default interval between busy-detector polls.
pub const DEFAULT_BUSY_POLL: Duration = Duration::from_millis(300);

/// Return once `channel` reports clear.
///
/// With `ignore_busy` set, a busy channel is logged and dialed anyway. A
/// detector that errors counts as clear. Cancelling `cancel` ends the wait
/// early; the caller sees the cancellation when it goes on to dial.
pub async fn wait_clear<C>(
    channel: &C,
    ignore_busy: bool,
    poll_interval: Duration,
    cancel: &CancellationToken,
) where
    C: BusyChannel + ?Sized,
{
    let mut waiting = false;
    loop {
        match channel.busy().await {
            Ok(false) => break,
            Ok(true) => {}
            Err(e) => {
                warn!(error = %e, "Busy detector failed; assuming clear channel");
                break;
            }
        }
        if ignore_busy {
            warn!("Ignoring busy channel!");
            break;
        }
        if !waiting {
            info!("Waiting for clear channel...");
            waiting = true;
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }
    if waiting {
        info!("Channel clear");
    }
}
