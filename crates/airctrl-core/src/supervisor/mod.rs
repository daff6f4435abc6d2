// ── Connection supervisor ──
//
// Owns one device's connection lifecycle: the current client handle, the
// status cache, the availability flag, and three background tasks
// (observation, watchdog, reconnect). Everything recoverable is recovered
// here; only setup failures and direct command failures reach the caller.

mod background;
mod tasks;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use airctrl_api::{Connector, DeviceClient, Error, StatusMap, StatusReport, StatusValue};

use crate::catalog;
use crate::config::SupervisorConfig;
use crate::error::CoreError;
use crate::model::{DeviceInformation, DeviceModelConfig};
use crate::store::{ListenerId, StatusStore};
use crate::stream::StatusSubscription;
use crate::sync::lock;

use self::tasks::{ReconnectTask, TaskSlots};

pub use self::tasks::TaskState;

// ── Supervisor ───────────────────────────────────────────────────────

/// The per-device entry point for consumers.
///
/// Cheaply cloneable via `Arc<SupervisorInner>`. Background tasks hold
/// clones too, so a supervisor stays alive until [`shutdown()`](Self::shutdown)
/// is called.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    info: DeviceInformation,
    config: SupervisorConfig,
    model: &'static DeviceModelConfig,
    connector: Arc<dyn Connector>,
    /// Replaced wholesale by reconnect; never borrowed across an `.await`.
    client: Mutex<Option<Arc<dyn DeviceClient>>>,
    store: StatusStore,
    poll_interval_secs: AtomicU64,
    last_update: Mutex<Option<Instant>>,
    available: watch::Sender<bool>,
    tasks: Mutex<TaskSlots>,
    closed: CancellationToken,
}

impl Supervisor {
    /// Wrap an already-open client. Does NOT fetch or observe: call
    /// [`first_refresh_and_observe()`](Self::first_refresh_and_observe) next.
    pub fn new(
        info: DeviceInformation,
        config: SupervisorConfig,
        connector: Arc<dyn Connector>,
        client: Arc<dyn DeviceClient>,
    ) -> Self {
        let model = catalog::model_config(&info.model);
        let poll_interval_secs = AtomicU64::new(config.default_poll_interval.as_secs());
        let (available, _) = watch::channel(true);

        Self {
            inner: Arc::new(SupervisorInner {
                info,
                config,
                model,
                connector,
                client: Mutex::new(Some(client)),
                store: StatusStore::new(),
                poll_interval_secs,
                last_update: Mutex::new(None),
                available,
                tasks: Mutex::new(TaskSlots::default()),
                closed: CancellationToken::new(),
            }),
        }
    }

    /// Open the first client for `info.host` within the connect deadline.
    pub async fn connect(
        info: DeviceInformation,
        config: SupervisorConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, CoreError> {
        let client =
            airctrl_api::connect_with_timeout(connector.as_ref(), &info.host, config.connect_timeout)
                .await
                .map_err(|e| CoreError::NotReady {
                    host: info.host.clone(),
                    reason: e.to_string(),
                })?;

        debug!(host = %info.host, model = %info.model, "device client opened");
        Ok(Self::new(info, config, connector, client))
    }

    /// Connect, fetch the initial status, and start supervising.
    ///
    /// On a failed first fetch the fresh client is closed again before the
    /// error is returned.
    pub async fn setup(
        info: DeviceInformation,
        config: SupervisorConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, CoreError> {
        let supervisor = Self::connect(info, config, connector).await?;
        if let Err(e) = supervisor.first_refresh_and_observe().await {
            supervisor.shutdown().await;
            return Err(e);
        }
        Ok(supervisor)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Populate the cache with one synchronous fetch, then start the
    /// observation and watchdog tasks.
    ///
    /// This is the only place where a fetch failure is returned to the
    /// caller, as [`CoreError::NotReady`]. Afterwards the supervisor heals
    /// itself.
    pub async fn first_refresh_and_observe(&self) -> Result<(), CoreError> {
        let Some(client) = self.current_client() else {
            return Err(self.not_ready("supervisor is shut down"));
        };

        let report = match client.get_status().await {
            Ok(report) => report,
            Err(e) => {
                self.mark_unavailable("initial status fetch failed");
                return Err(self.not_ready(e.to_string()));
            }
        };

        self.apply_report(report);
        self.touch();
        self.start_observing();

        info!(
            host = %self.inner.info.host,
            poll_interval_secs = self.poll_interval().as_secs(),
            "device supervised"
        );
        Ok(())
    }

    /// One synchronous status fetch outside the push stream.
    ///
    /// Updates the poll interval, availability, and cache on success; marks
    /// the device unavailable and returns the error otherwise.
    pub async fn refresh(&self) -> Result<Arc<StatusMap>, Error> {
        let client = self.current_client().ok_or(Error::Closed)?;

        match client.get_status().await {
            Ok(report) => {
                self.apply_report(report);
                self.inner.store.snapshot().ok_or(Error::Closed)
            }
            Err(e) => {
                self.mark_unavailable("status refresh failed");
                Err(e)
            }
        }
    }

    /// Start a reconnect in the background unless one is already running.
    ///
    /// Returns whether a new attempt was started. Never starts one after
    /// [`shutdown()`](Self::shutdown).
    pub fn trigger_reconnect(&self) -> bool {
        let mut tasks = lock(&self.inner.tasks);
        if self.inner.closed.is_cancelled() {
            return false;
        }
        if tasks.reconnect_in_flight() {
            debug!(host = %self.inner.info.host, "reconnect already in flight");
            return false;
        }

        let finished = CancellationToken::new();
        let guard = finished.clone().drop_guard();
        let supervisor = self.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            supervisor.do_reconnect().await;
        });
        tasks.set_reconnect(ReconnectTask { handle, finished });
        true
    }

    /// The reconnect body: replace the client and restart both loops.
    ///
    /// Never fails. A failed connect keeps the old client reference and
    /// leaves recovery to the next trigger. Prefer
    /// [`trigger_reconnect()`](Self::trigger_reconnect), which guarantees
    /// a single attempt at a time.
    pub async fn do_reconnect(&self) {
        if self.inner.closed.is_cancelled() {
            return;
        }
        let host = self.inner.info.host.as_str();

        if let Some(old) = self.current_client() {
            if let Err(e) = old.shutdown().await {
                debug!(host, error = %e, "closing stale client failed (ignored)");
            }
        }

        let client = match self.connect_with_retry().await {
            Ok(client) => client,
            Err(e) => {
                error!(host, error = %e, "reconnect failed");
                return;
            }
        };
        if !self.install_client(&client) {
            // Shut down while connecting: nobody owns this client.
            let _ = client.shutdown().await;
            return;
        }
        info!(host, "reconnected");

        match client.get_status().await {
            Ok(report) => self.apply_report(report),
            Err(e) => {
                self.mark_unavailable("reconnect status fetch failed");
                debug!(host, error = %e, "status fetch after reconnect failed");
            }
        }

        self.start_observing();
    }

    /// Stop every background task and close the client.
    ///
    /// Idempotent. Waits until the tasks have actually stopped.
    pub async fn shutdown(&self) {
        self.inner.closed.cancel();

        let handles = lock(&self.inner.tasks).abort_all();
        for handle in handles {
            let _ = handle.await;
        }

        let client = lock(&self.inner.client).take();
        if let Some(client) = client {
            if let Err(e) = client.shutdown().await {
                debug!(host = %self.inner.info.host, error = %e, "client shutdown failed (ignored)");
            }
            debug!(host = %self.inner.info.host, "supervisor shut down");
        }
    }

    // ── Command path ─────────────────────────────────────────────────

    /// Write one key. See [`set_control_values`](Self::set_control_values).
    pub async fn set_control_value(
        &self,
        key: impl Into<String>,
        value: impl Into<StatusValue>,
    ) -> Result<(), Error> {
        let values = StatusMap::from([(key.into(), value.into())]);
        self.set_control_values(&values).await
    }

    /// Forward a write to the current client.
    ///
    /// No validation, retry, or queuing, and the cache is left alone:
    /// patching it after success is the caller's call
    /// ([`StatusStore::patch`]). Errors come back unchanged.
    pub async fn set_control_values(&self, values: &StatusMap) -> Result<(), Error> {
        let client = self.current_client().ok_or(Error::Closed)?;
        client.set_control_values(values).await
    }

    /// Switch the device on or off using its generation's power encoding.
    pub async fn set_power(&self, on: bool) -> Result<(), Error> {
        self.set_control_values(&self.inner.model.power_command(on))
            .await
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn device_info(&self) -> &DeviceInformation {
        &self.inner.info
    }

    pub fn host(&self) -> &str {
        &self.inner.info.host
    }

    pub fn model(&self) -> &str {
        &self.inner.info.model
    }

    pub fn name(&self) -> &str {
        &self.inner.info.name
    }

    pub fn device_id(&self) -> &str {
        &self.inner.info.device_id
    }

    pub fn model_config(&self) -> &'static DeviceModelConfig {
        self.inner.model
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }

    // ── Status cache ─────────────────────────────────────────────────

    /// Latest status, or `None` before the first successful fetch.
    pub fn status(&self) -> Option<Arc<StatusMap>> {
        self.inner.store.snapshot()
    }

    pub fn store(&self) -> &StatusStore {
        &self.inner.store
    }

    pub fn subscribe(&self) -> StatusSubscription {
        self.inner.store.subscribe()
    }

    /// Register a callback run after every cache replacement.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.store.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.store.remove_listener(id)
    }

    // ── Observability ────────────────────────────────────────────────

    pub fn is_available(&self) -> bool {
        *self.inner.available.borrow()
    }

    /// Watch the availability flag. Changes only on transitions.
    pub fn availability(&self) -> watch::Receiver<bool> {
        self.inner.available.subscribe()
    }

    /// Current poll-interval hint (device-supplied or the default).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.inner.poll_interval_secs.load(Ordering::SeqCst))
    }

    /// Monotonic time of the last status received, if any.
    pub fn last_update(&self) -> Option<Instant> {
        *lock(&self.inner.last_update)
    }

    pub fn tasks(&self) -> TaskState {
        lock(&self.inner.tasks).state()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn current_client(&self) -> Option<Arc<dyn DeviceClient>> {
        lock(&self.inner.client).clone()
    }

    /// Store `client` as the current one unless shutdown has begun.
    fn install_client(&self, client: &Arc<dyn DeviceClient>) -> bool {
        let mut slot = lock(&self.inner.client);
        if self.inner.closed.is_cancelled() {
            return false;
        }
        *slot = Some(Arc::clone(client));
        true
    }

    fn not_ready(&self, reason: impl Into<String>) -> CoreError {
        CoreError::NotReady {
            host: self.inner.info.host.clone(),
            reason: reason.into(),
        }
    }

    /// Store hint, mark available, publish. Shared by every fetch path.
    fn apply_report(&self, report: StatusReport) {
        self.set_poll_interval(report.poll_interval_secs);
        self.mark_available();
        self.inner.store.replace(report.status);
    }

    /// A hint of 0 means "no hint": fall back to the configured default.
    fn set_poll_interval(&self, secs: u64) {
        let secs = if secs == 0 {
            self.inner.config.default_poll_interval.as_secs()
        } else {
            secs
        };
        self.inner.poll_interval_secs.store(secs, Ordering::SeqCst);
    }

    fn touch(&self) {
        *lock(&self.inner.last_update) = Some(Instant::now());
    }

    /// How long the device may stay silent before the watchdog acts.
    /// Saturates at `Duration::MAX` for absurd device hints.
    fn staleness_tolerance(&self) -> Duration {
        let interval = self.poll_interval().max(Duration::from_secs(1));
        interval
            .checked_mul(self.inner.config.missed_packet_count.max(1))
            .unwrap_or(Duration::MAX)
    }

    fn mark_available(&self) {
        let changed = self.inner.available.send_if_modified(|available| {
            let was = *available;
            *available = true;
            !was
        });
        if changed {
            info!(host = %self.inner.info.host, "device available again");
        }
    }

    fn mark_unavailable(&self, reason: &'static str) {
        let changed = self.inner.available.send_if_modified(|available| {
            let was = *available;
            *available = false;
            was
        });
        if changed {
            warn!(host = %self.inner.info.host, reason, "device unavailable");
        }
    }

    /// Spawn a fresh observation/watchdog pair against the current client.
    fn start_observing(&self) {
        let Some(client) = self.current_client() else {
            debug!(host = %self.inner.info.host, "no client, not observing");
            return;
        };

        let observe = tokio::spawn(background::observe_task(self.clone(), client));
        let watchdog = tokio::spawn(background::watchdog_task(self.clone()));

        let mut tasks = lock(&self.inner.tasks);
        if self.inner.closed.is_cancelled() {
            observe.abort();
            watchdog.abort();
            return;
        }
        tasks.replace_pair(observe, watchdog);
    }

    /// Trigger a reconnect (or join the one in flight) and wait for it.
    async fn reconnect_and_wait(&self) {
        self.trigger_reconnect();
        self.wait_for_reconnect().await;
    }

    /// Wait until the current (or most recent) reconnect has finished.
    async fn wait_for_reconnect(&self) {
        let latch = lock(&self.inner.tasks).reconnect_latch();
        if let Some(finished) = latch {
            finished.cancelled().await;
        }
    }

    async fn connect_with_retry(&self) -> Result<Arc<dyn DeviceClient>, Error> {
        let host = self.inner.info.host.as_str();
        let reconnect = &self.inner.config.reconnect;
        let attempts = reconnect.connect_attempts.max(1);
        let mut attempt = 0;

        loop {
            let result = airctrl_api::connect_with_timeout(
                self.inner.connector.as_ref(),
                host,
                self.inner.config.connect_timeout,
            )
            .await;

            match result {
                Ok(client) => return Ok(client),
                Err(e) if attempt + 1 < attempts => {
                    let delay = reconnect.backoff(attempt);
                    debug!(
                        host,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "connect attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("host", &self.inner.info.host)
            .field("model", &self.inner.info.model)
            .field("available", &self.is_available())
            .field("tasks", &self.tasks())
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
