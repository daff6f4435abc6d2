// ── Reactive status subscriptions ──
//
// Async-side view of the `StatusStore`: a point-in-time snapshot plus
// change notification, either via `changed()` or as a `Stream`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use airctrl_api::StatusMap;

type Snapshot = Option<Arc<StatusMap>>;

/// A subscription to one device's status snapshots.
pub struct StatusSubscription {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl StatusSubscription {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> Option<&Arc<StatusMap>> {
        self.current.as_ref()
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<StatusMap>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            self.current.clone_from(&snap);
            if snap.is_some() {
                return snap;
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first (if any), then every
    /// replacement.
    pub fn into_stream(self) -> StatusWatchStream {
        StatusWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct StatusWatchStream {
    inner: WatchStream<Snapshot>,
}

impl Stream for StatusWatchStream {
    type Item = Arc<StatusMap>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Some(status)) => return Poll::Ready(Some(status)),
                // Nothing fetched yet; wait for the first real snapshot.
                Some(None) => {}
                None => return Poll::Ready(None),
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
