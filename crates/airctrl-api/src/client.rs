//! Device client traits.
//!
//! The wire protocol (CoAP with the vendor's encryption layer) lives behind
//! these traits. Implementations are expected to fail by returning an
//! [`Error`]; no retry logic is assumed inside them. Recovery is the
//! supervisor's job.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::Error;
use crate::status::{StatusMap, StatusReport};

/// Lazy, conceptually infinite sequence of pushed status snapshots.
///
/// The device closing the push channel shows up either as an `Err` item or
/// as the stream simply ending.
pub type StatusStream = BoxStream<'static, Result<StatusMap, Error>>;

/// An open connection to one physical device.
#[async_trait]
pub trait DeviceClient: Send + Sync + fmt::Debug {
    /// Fetch the full status once, plus the device's push interval hint.
    async fn get_status(&self) -> Result<StatusReport, Error>;

    /// Subscribe to pushed status updates.
    async fn observe_status(&self) -> Result<StatusStream, Error>;

    /// Write exactly the given keys to the device.
    async fn set_control_values(&self, values: &StatusMap) -> Result<(), Error>;

    /// Close the connection. May fail on an already-broken link.
    async fn shutdown(&self) -> Result<(), Error>;
}

/// Opens [`DeviceClient`]s. One connector is shared by every supervisor.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str) -> Result<Arc<dyn DeviceClient>, Error>;
}
