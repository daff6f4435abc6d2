// ── Runtime supervision configuration ──
//
// These types describe *how* a device connection is supervised: timeouts,
// staleness tolerance, and reconnect pacing. They never touch disk; the
// `airctrl-config` crate builds them from the TOML file and hands them in.

use std::time::Duration;

use airctrl_api::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROBE_TIMEOUT};

/// Poll interval assumed until the device reports its own hint.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// How many poll intervals may pass without an update before the
/// watchdog declares the connection stale.
pub const DEFAULT_MISSED_PACKET_COUNT: u32 = 3;

/// Tuning for one supervised device connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Deadline for opening a new client (initial connect and reconnects).
    pub connect_timeout: Duration,
    /// Staleness multiplier applied to the poll interval.
    pub missed_packet_count: u32,
    /// Poll interval used until (or unless) the device supplies one.
    pub default_poll_interval: Duration,
    /// Pacing of connect attempts inside one reconnect.
    pub reconnect: ReconnectConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            missed_packet_count: DEFAULT_MISSED_PACKET_COUNT,
            default_poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Connect retry pacing inside a single reconnect procedure.
///
/// The default is one attempt: a failed reconnect is logged and the next
/// watchdog cycle or stream failure starts a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Connect attempts per reconnect (values below 1 are treated as 1).
    pub connect_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            connect_attempts: 1,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectConfig {
    /// Exponential backoff with deterministic jitter.
    ///
    /// `attempt` is zero-based: `backoff(0)` is the wait after the first
    /// failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());

        // Deterministic "jitter" seeded from the attempt number.
        let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
        let with_jitter = (capped * jitter_factor).max(0.0);

        Duration::try_from_secs_f64(with_jitter).unwrap_or(self.max_delay)
    }
}

/// Deadlines for a one-shot status probe (used by configuration flows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub connect_timeout: Duration,
    pub status_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_PROBE_TIMEOUT,
            status_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
