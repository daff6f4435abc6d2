//! Scripted in-memory fakes of [`Connector`] and [`DeviceClient`].
//!
//! Enabled with the `test-util` feature. Every call is recorded so tests can
//! assert on side effects (writes, shutdowns, connect attempts), and every
//! outcome is scripted up front.
//!
//! ```rust,ignore
//! let client = FakeClient::with_status(status, 60);
//! let connector = FakeConnector::new();
//! connector.push_client(Arc::clone(&client));
//!
//! client.push(next_status);   // delivered on the observation stream
//! client.end_stream();        // device closed the push channel
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::client::{Connector, DeviceClient, StatusStream};
use crate::error::Error;
use crate::status::{StatusMap, StatusReport};

type PushItem = Result<StatusMap, Error>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── FakeClient ───────────────────────────────────────────────────────

/// A device client whose answers are scripted by the test.
#[derive(Debug)]
pub struct FakeClient {
    /// One-shot status answers, consumed front to back.
    scripted_status: Mutex<VecDeque<Result<StatusReport, Error>>>,
    /// Answer used once the script is exhausted.
    sticky_status: Mutex<Option<StatusReport>>,
    push_tx: Mutex<Option<mpsc::UnboundedSender<PushItem>>>,
    push_rx: Mutex<Option<mpsc::UnboundedReceiver<PushItem>>>,
    observe_error: Mutex<Option<Error>>,
    write_error: Mutex<Option<String>>,
    writes: Mutex<Vec<StatusMap>>,
    fail_shutdown: AtomicBool,
    status_calls: AtomicUsize,
    observe_calls: AtomicUsize,
    shutdown_calls: AtomicUsize,
}

impl FakeClient {
    /// A client with nothing scripted: status fetches fail, the push
    /// stream stays silent.
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            scripted_status: Mutex::new(VecDeque::new()),
            sticky_status: Mutex::new(None),
            push_tx: Mutex::new(Some(tx)),
            push_rx: Mutex::new(Some(rx)),
            observe_error: Mutex::new(None),
            write_error: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            fail_shutdown: AtomicBool::new(false),
            status_calls: AtomicUsize::new(0),
            observe_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
        })
    }

    /// A client that answers every status fetch with `status`.
    pub fn with_status(status: StatusMap, poll_interval_secs: u64) -> Arc<Self> {
        let client = Self::new();
        *lock(&client.sticky_status) = Some(StatusReport::new(status, poll_interval_secs));
        client
    }

    // ── Scripting ────────────────────────────────────────────────────

    /// Queue a one-shot status answer.
    pub fn script_status(&self, status: StatusMap, poll_interval_secs: u64) {
        lock(&self.scripted_status).push_back(Ok(StatusReport::new(status, poll_interval_secs)));
    }

    /// Queue a one-shot status failure.
    pub fn script_status_error(&self, error: Error) {
        lock(&self.scripted_status).push_back(Err(error));
    }

    /// Make the next `observe_status()` call fail outright.
    pub fn fail_observe(&self, error: Error) {
        *lock(&self.observe_error) = Some(error);
    }

    /// Make every subsequent write fail with a [`Error::Write`] carrying `message`.
    pub fn fail_writes(&self, message: &str) {
        *lock(&self.write_error) = Some(message.to_owned());
    }

    /// Make `shutdown()` fail (the call is still counted).
    pub fn fail_shutdown(&self) {
        self.fail_shutdown.store(true, Ordering::SeqCst);
    }

    // ── Push channel ─────────────────────────────────────────────────

    /// Deliver a status snapshot on the observation stream.
    pub fn push(&self, status: StatusMap) {
        if let Some(tx) = lock(&self.push_tx).as_ref() {
            let _ = tx.send(Ok(status));
        }
    }

    /// Fail the observation stream with `error`.
    pub fn push_error(&self, error: Error) {
        if let Some(tx) = lock(&self.push_tx).as_ref() {
            let _ = tx.send(Err(error));
        }
    }

    /// End the observation stream without an error item.
    pub fn end_stream(&self) {
        lock(&self.push_tx).take();
    }

    // ── Recorded calls ───────────────────────────────────────────────

    pub fn writes(&self) -> Vec<StatusMap> {
        lock(&self.writes).clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn observe_calls(&self) -> usize {
        self.observe_calls.load(Ordering::SeqCst)
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceClient for FakeClient {
    async fn get_status(&self) -> Result<StatusReport, Error> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(next) = lock(&self.scripted_status).pop_front() {
            return next;
        }
        lock(&self.sticky_status)
            .clone()
            .ok_or_else(|| Error::Status("no status scripted".into()))
    }

    async fn observe_status(&self) -> Result<StatusStream, Error> {
        self.observe_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = lock(&self.observe_error).take() {
            return Err(error);
        }

        // A second subscription on the same client never hears from the device.
        match lock(&self.push_rx).take() {
            Some(rx) => Ok(UnboundedReceiverStream::new(rx).boxed()),
            None => Ok(futures_util::stream::pending::<PushItem>().boxed()),
        }
    }

    async fn set_control_values(&self, values: &StatusMap) -> Result<(), Error> {
        if let Some(message) = lock(&self.write_error).clone() {
            return Err(Error::Write(message));
        }
        lock(&self.writes).push(values.clone());
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdown.load(Ordering::SeqCst) {
            return Err(Error::Shutdown("link already broken".into()));
        }
        Ok(())
    }
}

// ── FakeConnector ────────────────────────────────────────────────────

#[derive(Debug)]
enum ConnectOutcome {
    Client(Arc<FakeClient>),
    Delayed(Duration, Arc<FakeClient>),
    Fail(Error),
    Hang,
}

/// A connector that hands out scripted outcomes in order.
///
/// Once the script runs dry every connect fails with [`Error::Connect`].
#[derive(Debug, Default)]
pub struct FakeConnector {
    outcomes: Mutex<VecDeque<ConnectOutcome>>,
    hosts: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_client(&self, client: Arc<FakeClient>) {
        lock(&self.outcomes).push_back(ConnectOutcome::Client(client));
    }

    /// Hand out `client` only after `delay` has elapsed.
    pub fn push_delayed(&self, delay: Duration, client: Arc<FakeClient>) {
        lock(&self.outcomes).push_back(ConnectOutcome::Delayed(delay, client));
    }

    pub fn push_failure(&self, error: Error) {
        lock(&self.outcomes).push_back(ConnectOutcome::Fail(error));
    }

    /// The next connect never completes (only a timeout gets the caller out).
    pub fn push_hang(&self) {
        lock(&self.outcomes).push_back(ConnectOutcome::Hang);
    }

    /// Number of connect attempts so far.
    pub fn connect_count(&self) -> usize {
        lock(&self.hosts).len()
    }

    /// Hosts passed to `connect`, in call order.
    pub fn hosts(&self) -> Vec<String> {
        lock(&self.hosts).clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, host: &str) -> Result<Arc<dyn DeviceClient>, Error> {
        lock(&self.hosts).push(host.to_owned());
        let outcome = lock(&self.outcomes).pop_front();

        match outcome {
            Some(ConnectOutcome::Client(client)) => Ok(client),
            Some(ConnectOutcome::Delayed(delay, client)) => {
                tokio::time::sleep(delay).await;
                Ok(client)
            }
            Some(ConnectOutcome::Fail(error)) => Err(error),
            Some(ConnectOutcome::Hang) => {
                std::future::pending::<Result<Arc<dyn DeviceClient>, Error>>().await
            }
            None => Err(Error::Connect {
                host: host.to_owned(),
                reason: "no client scripted".into(),
            }),
        }
    }
}
