// ── Timeout-guarded connect helpers ──
//
// The vendor handshake can hang indefinitely on a half-open link, so every
// connect goes through an explicit deadline. `fetch_status` is the standalone
// connectivity probe used by setup and repair flows: it opens a throwaway
// client, reads status once, and always closes it again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::client::{Connector, DeviceClient};
use crate::error::Error;
use crate::status::StatusMap;

/// Connect deadline used by setup and by every reconnect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(25);

/// Connect and status deadlines for the connectivity probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Open a client against `host`, failing with [`Error::Timeout`] if the
/// handshake does not finish within `timeout`.
pub async fn connect_with_timeout(
    connector: &dyn Connector,
    host: &str,
    timeout: Duration,
) -> Result<Arc<dyn DeviceClient>, Error> {
    with_deadline("connect", timeout, connector.connect(host)).await
}

/// Fetch the current status using a temporary client, then shut it down.
///
/// Shutdown errors are swallowed; the status (or the fetch error) is what
/// the caller cares about.
pub async fn fetch_status(
    connector: &dyn Connector,
    host: &str,
    connect_timeout: Duration,
    status_timeout: Duration,
) -> Result<StatusMap, Error> {
    let client = connect_with_timeout(connector, host, connect_timeout).await?;

    let result = with_deadline("status request", status_timeout, client.get_status()).await;

    if let Err(e) = client.shutdown().await {
        debug!(host, error = %e, "probe client shutdown failed (ignored)");
    }

    result.map(|report| report.status)
}

async fn with_deadline<T, F>(operation: &'static str, timeout: Duration, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::Timeout {
            operation,
            timeout_secs: timeout.as_secs(),
        })?
}
