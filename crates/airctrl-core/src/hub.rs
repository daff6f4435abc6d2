// ── Multi-device hub ──
//
// One supervisor per configured device, keyed by device id. Map guards are
// never held across an `.await`: supervisors are cloned or removed out of
// the map first, then driven.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use airctrl_api::Connector;

use crate::config::SupervisorConfig;
use crate::error::CoreError;
use crate::model::DeviceInformation;
use crate::supervisor::Supervisor;

/// Registry of supervised devices sharing one connector.
pub struct Hub {
    connector: Arc<dyn Connector>,
    config: SupervisorConfig,
    supervisors: DashMap<String, Supervisor>,
}

impl Hub {
    pub fn new(connector: Arc<dyn Connector>, config: SupervisorConfig) -> Self {
        Self {
            connector,
            config,
            supervisors: DashMap::new(),
        }
    }

    /// Set up a device with the hub-wide supervisor config.
    pub async fn setup(&self, info: DeviceInformation) -> Result<Supervisor, CoreError> {
        self.setup_with(info, self.config.clone()).await
    }

    /// Set up a device with its own supervisor config.
    ///
    /// An existing supervisor for the same device id is shut down first.
    pub async fn setup_with(
        &self,
        info: DeviceInformation,
        config: SupervisorConfig,
    ) -> Result<Supervisor, CoreError> {
        let device_id = info.device_id.clone();

        if self.unload(&device_id).await {
            debug!(device_id = %device_id, "replaced existing supervisor");
        }

        let supervisor = Supervisor::setup(info, config, Arc::clone(&self.connector)).await?;
        // A concurrent setup for the same id may have finished in the meantime.
        let previous = self.supervisors.insert(device_id.clone(), supervisor.clone());
        if let Some(previous) = previous {
            debug!(device_id = %device_id, "replaced supervisor from overlapping setup");
            previous.shutdown().await;
        }
        info!(device_id = %device_id, host = %supervisor.host(), "device added");
        Ok(supervisor)
    }

    /// Shut down and forget a device. Returns whether it was present.
    pub async fn unload(&self, device_id: &str) -> bool {
        let removed = self.supervisors.remove(device_id);
        match removed {
            Some((_, supervisor)) => {
                supervisor.shutdown().await;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, device_id: &str) -> Option<Supervisor> {
        self.supervisors.get(device_id).map(|entry| entry.value().clone())
    }

    /// Device ids in sorted order.
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.supervisors.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    /// Shut down every supervisor and empty the hub.
    pub async fn shutdown_all(&self) {
        for device_id in self.device_ids() {
            self.unload(&device_id).await;
        }
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("devices", &self.device_ids())
            .finish_non_exhaustive()
    }
}
