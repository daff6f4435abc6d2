// ── Device status cache ──
//
// Holds the latest full-state snapshot reported by the device. Every
// replacement is broadcast twice: to async subscribers through a `watch`
// channel, and to synchronous observers through an ordered callback list.
//
// The supervisor is the only writer of full snapshots. Consumers may
// `patch` a single key after a successful write (optimistic update); the
// next device report overwrites it either way.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use airctrl_api::{StatusMap, StatusValue};

use crate::stream::StatusSubscription;
use crate::sync::lock;

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`StatusStore::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Latest device status plus its change observers.
pub struct StatusStore {
    snapshot: watch::Sender<Option<Arc<StatusMap>>>,
    version: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl StatusStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(None);
        Self {
            snapshot,
            version: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The latest snapshot, or `None` before the first successful fetch.
    pub fn snapshot(&self) -> Option<Arc<StatusMap>> {
        self.snapshot.borrow().clone()
    }

    /// Single-key convenience read.
    pub fn get(&self, key: &str) -> Option<StatusValue> {
        self.snapshot.borrow().as_ref()?.get(key).cloned()
    }

    /// Number of writes so far (0 = never written).
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription::new(self.snapshot.subscribe())
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the whole snapshot and notify every observer.
    pub(crate) fn replace(&self, status: StatusMap) {
        self.snapshot.send_replace(Some(Arc::new(status)));
        self.version.fetch_add(1, Ordering::SeqCst);
        self.notify();
    }

    /// Optimistically overwrite one key after a successful write.
    ///
    /// Returns `false` (and changes nothing) when no snapshot exists yet.
    pub fn patch(&self, key: impl Into<String>, value: impl Into<StatusValue>) -> bool {
        let key = key.into();
        let value = value.into();

        let patched = self.snapshot.send_if_modified(|snapshot| match snapshot {
            Some(status) => {
                Arc::make_mut(status).insert(key, value);
                true
            }
            None => false,
        });

        if patched {
            self.version.fetch_add(1, Ordering::SeqCst);
            self.notify();
        }
        patched
    }

    // ── Observers ────────────────────────────────────────────────────

    /// Register a callback run after every snapshot change.
    ///
    /// Callbacks run synchronously on the writer's task, in registration
    /// order. They must not block.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Unregister a callback. Returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn notify(&self) {
        // Snapshot the list so callbacks may (un)register without deadlocking.
        let listeners: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusStore")
            .field("snapshot", &*self.snapshot.borrow())
            .field("version", &self.version())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
