// ── Background tasks ──
//
// The observation loop and the watchdog always run as a pair against one
// client. Both end only by being aborted (pair replacement or shutdown);
// the observation loop additionally returns once its stream is gone.

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, warn};

use airctrl_api::{DeviceClient, Error};

use super::Supervisor;

/// Consume the push stream until it fails, then hand off to reconnect.
pub(super) async fn observe_task(supervisor: Supervisor, client: Arc<dyn DeviceClient>) {
    let reason = consume_stream(&supervisor, client.as_ref()).await;

    supervisor.mark_unavailable("observation stream ended");
    debug!(
        host = %supervisor.host(),
        error = %reason,
        "observation stream ended, scheduling reconnect"
    );
    if supervisor.trigger_reconnect() {
        return;
    }
    // A reconnect is still in flight, possibly the one that started this
    // task and is still finishing on another worker. Start a fresh one once
    // it is done. A reconnect that installs a new pair aborts this task
    // before that.
    supervisor.wait_for_reconnect().await;
    supervisor.trigger_reconnect();
}

/// Returns the error that ended the stream ([`Error::StreamClosed`] for a
/// clean end).
async fn consume_stream(supervisor: &Supervisor, client: &dyn DeviceClient) -> Error {
    let mut stream = match client.observe_status().await {
        Ok(stream) => stream,
        Err(e) => return e,
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(status) => {
                supervisor.touch();
                supervisor.mark_available();
                supervisor.inner.store.replace(status);
            }
            Err(e) => return e,
        }
    }
    Error::StreamClosed
}

/// Periodically check for staleness; reconnect (and wait) when stale.
pub(super) async fn watchdog_task(supervisor: Supervisor) {
    let closed = supervisor.inner.closed.clone();

    loop {
        // Re-read every cycle: a reconnect may have changed the hint.
        let tolerance = supervisor.staleness_tolerance();

        tokio::select! {
            biased;
            () = closed.cancelled() => break,
            () = tokio::time::sleep(tolerance) => {}
        }

        let Some(last_update) = supervisor.last_update() else {
            continue;
        };
        let elapsed = last_update.elapsed();
        if elapsed <= tolerance {
            continue;
        }

        supervisor.mark_unavailable("watchdog timeout");
        warn!(
            host = %supervisor.host(),
            elapsed_secs = elapsed.as_secs(),
            tolerance_secs = tolerance.as_secs(),
            "no status update within tolerance, reconnecting"
        );
        supervisor.reconnect_and_wait().await;
    }
}
