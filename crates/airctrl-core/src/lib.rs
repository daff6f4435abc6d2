//! Device-connection supervisor for Philips air purifiers and humidifiers.
//!
//! This crate owns the one long-lived connection to each physical device and
//! keeps a cached status map fresh:
//!
//! - **[`Supervisor`]**: Opens the device client, performs the initial
//!   synchronous fetch, then runs the push observation loop and an
//!   independent staleness watchdog. Either loop can trigger the guarded,
//!   single-flight reconnect procedure, which replaces the client and
//!   restarts both loops. Commands go straight through to the current client.
//!
//! - **[`StatusStore`]**: Latest full-state snapshot in a `watch` channel,
//!   plus an ordered observer list of change callbacks. Written only by the
//!   supervisor (and by consumers' optimistic [`patch`](StatusStore::patch)).
//!
//! - **[`Hub`]**: One supervisor per configured device, keyed by device id.
//!
//! - **Model catalog** ([`catalog`], [`model`]): Static per-model records
//!   (API generation, preset-mode patterns, capabilities) with family-prefix
//!   fallback.

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hub;
pub mod model;
pub mod probe;
pub mod store;
pub mod stream;
pub mod supervisor;

mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use catalog::model_config;
pub use config::{ProbeConfig, ReconnectConfig, SupervisorConfig};
pub use error::CoreError;
pub use hub::Hub;
pub use model::{ApiGeneration, DeviceInformation, DeviceModelConfig, Preset, Setting};
pub use probe::probe;
pub use store::{ListenerId, StatusStore};
pub use stream::StatusSubscription;
pub use supervisor::{Supervisor, TaskState};

// Status types come from the client seam; re-export for ergonomics.
pub use airctrl_api::{StatusMap, StatusValue};
