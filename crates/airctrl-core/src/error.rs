// ── Core error types ──
//
// Errors surfaced by setup, refresh, and the hub. Command-path failures
// are NOT wrapped: `Supervisor::set_control_values` returns the client's
// `airctrl_api::Error` untouched so callers see exactly what the device
// said.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lifecycle errors ─────────────────────────────────────────────
    /// The initial connect or status fetch failed. The device exists but
    /// is not usable yet; the host application should retry setup later.
    #[error("Device at {host} is not ready: {reason}")]
    NotReady { host: String, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Device errors (passed through) ───────────────────────────────
    #[error(transparent)]
    Device(#[from] airctrl_api::Error),
}

impl CoreError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotReady { .. } => true,
            Self::Config { .. } => false,
            Self::Device(err) => err.is_transient(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
