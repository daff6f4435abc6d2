use thiserror::Error;

/// Top-level error type for the `airctrl-api` crate.
///
/// Covers every failure a device client can surface: connecting, fetching
/// status, the push subscription, writes, and teardown.
/// `airctrl-core` decides which of these are recoverable.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// Could not open a client against the host (unreachable, refused, bad handshake).
    #[error("Cannot connect to device at {host}: {reason}")]
    Connect { host: String, reason: String },

    /// An operation did not finish within its deadline.
    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    /// The client was shut down or was never opened.
    #[error("Device client is closed")]
    Closed,

    // ── Status ──────────────────────────────────────────────────────
    /// A synchronous status fetch failed.
    #[error("Status request failed: {0}")]
    Status(String),

    /// The device closed the push channel.
    #[error("Observation stream closed by device")]
    StreamClosed,

    /// The push channel failed mid-stream.
    #[error("Observation stream failed: {0}")]
    Stream(String),

    // ── Control ─────────────────────────────────────────────────────
    /// Writing control values was rejected or failed in transit.
    #[error("Control write failed: {0}")]
    Write(String),

    // ── Teardown ────────────────────────────────────────────────────
    /// Closing the client failed. Callers on teardown paths swallow this.
    #[error("Client shutdown failed: {0}")]
    Shutdown(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The device sent something the client could not make sense of.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns `true` if reconnecting might clear this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::Timeout { .. }
                | Self::Status(_)
                | Self::StreamClosed
                | Self::Stream(_)
        )
    }
}
