// ── Background task slots ──
//
// At most one observation task, one watchdog task, and one reconnect task
// exist per supervisor. Observation and watchdog are always started and
// stopped together. The reconnect slot carries a completion latch so the
// watchdog can wait for the attempt it triggered.

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Which background tasks a supervisor currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskState {
    /// The observation task is still running.
    pub observing: bool,
    /// The watchdog task is still running.
    pub watchdog: bool,
    /// A reconnect is in flight (started and not yet finished).
    pub reconnecting: bool,
}

#[derive(Debug)]
pub(super) struct ReconnectTask {
    pub(super) handle: JoinHandle<()>,
    /// Cancelled when the reconnect future completes or is dropped.
    pub(super) finished: CancellationToken,
}

#[derive(Debug, Default)]
pub(super) struct TaskSlots {
    observe: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
    reconnect: Option<ReconnectTask>,
}

impl TaskSlots {
    /// Install a fresh observation/watchdog pair, aborting the previous one.
    pub(super) fn replace_pair(&mut self, observe: JoinHandle<()>, watchdog: JoinHandle<()>) {
        if let Some(old) = self.observe.replace(observe) {
            old.abort();
        }
        if let Some(old) = self.watchdog.replace(watchdog) {
            old.abort();
        }
    }

    pub(super) fn reconnect_in_flight(&self) -> bool {
        self.reconnect
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished() && !task.finished.is_cancelled())
    }

    pub(super) fn set_reconnect(&mut self, task: ReconnectTask) {
        self.reconnect = Some(task);
    }

    /// Latch of the current (or most recent) reconnect.
    pub(super) fn reconnect_latch(&self) -> Option<CancellationToken> {
        self.reconnect.as_ref().map(|task| task.finished.clone())
    }

    /// Abort every task and hand back the handles so the caller can join them.
    pub(super) fn abort_all(&mut self) -> Vec<JoinHandle<()>> {
        let handles: Vec<JoinHandle<()>> = [
            self.observe.take(),
            self.watchdog.take(),
            self.reconnect.take().map(|task| task.handle),
        ]
        .into_iter()
        .flatten()
        .collect();

        for handle in &handles {
            handle.abort();
        }
        handles
    }

    pub(super) fn state(&self) -> TaskState {
        TaskState {
            observing: is_running(self.observe.as_ref()),
            watchdog: is_running(self.watchdog.as_ref()),
            reconnecting: self.reconnect_in_flight(),
        }
    }
}

fn is_running(handle: Option<&JoinHandle<()>>) -> bool {
    handle.is_some_and(|handle| !handle.is_finished())
}

// ── Tests ────────────────────────────────────────────────────────────
