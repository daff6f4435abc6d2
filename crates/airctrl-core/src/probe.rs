// ── Connectivity probe ──
//
// One-shot status read used by configuration flows: "is there a device at
// this address, and what does it report?" Never touches a supervisor.

use airctrl_api::{Connector, Error, StatusMap};
use tracing::debug;

use crate::config::ProbeConfig;

/// Connect, read status once, and close the client again.
pub async fn probe(
    connector: &dyn Connector,
    host: &str,
    config: &ProbeConfig,
) -> Result<StatusMap, Error> {
    let result =
        airctrl_api::fetch_status(connector, host, config.connect_timeout, config.status_timeout)
            .await;

    match &result {
        Ok(status) => debug!(host, keys = status.len(), "probe succeeded"),
        Err(e) => debug!(host, error = %e, "probe failed"),
    }
    result
}
