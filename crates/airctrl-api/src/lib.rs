// airctrl-api: Device client seam for Philips air purifiers (status types, client traits, connect helpers)

pub mod client;
pub mod connect;
pub mod error;
pub mod status;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::{Connector, DeviceClient, StatusStream};
pub use connect::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROBE_TIMEOUT, connect_with_timeout, fetch_status,
};
pub use error::Error;
pub use status::{StatusMap, StatusReport, StatusValue};
