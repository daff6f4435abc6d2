// ── Device status types ──
//
// A device always reports its full state as a flat map of protocol keys
// to scalar values. Updates replace the whole map; nothing is a delta.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar reported by (or written to) a device.
///
/// Untagged so a JSON status payload like `{"pwr": "1", "pm25": 12, "cl": false}`
/// maps straight onto the variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl StatusValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for StatusValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for StatusValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for StatusValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for StatusValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for StatusValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Full-state snapshot of a device, keyed by protocol-specific string keys.
///
/// A `BTreeMap` so snapshots compare and serialize deterministically.
pub type StatusMap = BTreeMap<String, StatusValue>;

/// Result of a synchronous status fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// The device's full reported state.
    pub status: StatusMap,
    /// How often the device intends to push (seconds). `0` means no hint.
    pub poll_interval_secs: u64,
}

impl StatusReport {
    pub fn new(status: StatusMap, poll_interval_secs: u64) -> Self {
        Self {
            status,
            poll_interval_secs,
        }
    }
}
