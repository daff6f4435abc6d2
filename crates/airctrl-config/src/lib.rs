//! Configuration for supervised air purifiers.
//!
//! One TOML file lists the devices and the supervision defaults, with
//! environment overrides layered on top. Everything here translates into
//! `airctrl_core` types; core itself never reads configuration files.
//!
//! ```toml
//! [defaults]
//! connect_timeout = 25
//! missed_packet_count = 3
//!
//! [devices.living-room]
//! host = "192.168.1.100"
//! model = "AC3858/51"
//! device_id = "aabbccddeeff"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use airctrl_core::{DeviceInformation, ProbeConfig, ReconnectConfig, SupervisorConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no device named '{name}' in config")]
    UnknownDevice { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Supervision defaults applied to every device.
    #[serde(default)]
    pub defaults: Defaults,

    /// Devices keyed by a user-chosen name.
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceEntry>,
}

/// Supervision tuning. Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    #[serde(default = "default_missed_packet_count")]
    pub missed_packet_count: u32,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    #[serde(default = "default_reconnect_initial_delay")]
    pub reconnect_initial_delay: u64,

    #[serde(default = "default_reconnect_max_delay")]
    pub reconnect_max_delay: u64,

    /// Connect and status deadline for the connectivity probe.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            missed_packet_count: default_missed_packet_count(),
            poll_interval: default_poll_interval(),
            connect_attempts: default_connect_attempts(),
            reconnect_initial_delay: default_reconnect_initial_delay(),
            reconnect_max_delay: default_reconnect_max_delay(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    25
}
fn default_missed_packet_count() -> u32 {
    3
}
fn default_poll_interval() -> u64 {
    60
}
fn default_connect_attempts() -> u32 {
    1
}
fn default_reconnect_initial_delay() -> u64 {
    1
}
fn default_reconnect_max_delay() -> u64 {
    30
}
fn default_probe_timeout() -> u64 {
    30
}

/// One configured device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceEntry {
    /// IP address or hostname.
    pub host: String,

    /// Model number, e.g. "AC3858/51".
    pub model: String,

    /// Stable device id (the `DeviceId` the device reports).
    pub device_id: String,

    /// Display name (defaults to the table name).
    pub name: Option<String>,

    pub mac: Option<String>,

    /// Override `defaults.connect_timeout`.
    pub connect_timeout: Option<u64>,

    /// Override `defaults.missed_packet_count`.
    pub missed_packet_count: Option<u32>,

    /// Override `defaults.poll_interval`.
    pub poll_interval: Option<u64>,

    /// Override `defaults.connect_attempts`.
    pub connect_attempts: Option<u32>,
}

impl Config {
    /// Check every value core would misbehave on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("defaults.missed_packet_count", u64::from(self.defaults.missed_packet_count))?;
        check_positive("defaults.connect_timeout", self.defaults.connect_timeout)?;
        check_positive("defaults.probe_timeout", self.defaults.probe_timeout)?;

        for (name, device) in &self.devices {
            if device.host.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("devices.{name}.host"),
                    reason: "must not be empty".into(),
                });
            }
            if device.device_id.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("devices.{name}.device_id"),
                    reason: "must not be empty".into(),
                });
            }
            if let Some(count) = device.missed_packet_count {
                check_positive(&format!("devices.{name}.missed_packet_count"), u64::from(count))?;
            }
            if let Some(timeout) = device.connect_timeout {
                check_positive(&format!("devices.{name}.connect_timeout"), timeout)?;
            }
        }
        Ok(())
    }

    /// Configured device names in sorted order.
    pub fn device_names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    fn device(&self, name: &str) -> Result<&DeviceEntry, ConfigError> {
        self.devices
            .get(name)
            .ok_or_else(|| ConfigError::UnknownDevice { name: name.into() })
    }
}

fn check_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "airctrl", "airctrl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("airctrl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate the config from `path` + environment.
///
/// A missing file is not an error: defaults and environment still apply.
/// Environment keys use `__` as the nesting separator, e.g.
/// `AIRCTRL_DEFAULTS__CONNECT_TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AIRCTRL_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`, creating parent dirs.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core types ───────────────────────────────────────

/// Identity of the device configured under `name`.
pub fn device_information(cfg: &Config, name: &str) -> Result<DeviceInformation, ConfigError> {
    let device = cfg.device(name)?;
    Ok(DeviceInformation {
        model: device.model.clone(),
        name: device.name.clone().unwrap_or_else(|| name.to_owned()),
        device_id: device.device_id.clone(),
        host: device.host.clone(),
        mac: device.mac.clone(),
    })
}

/// Supervisor tuning for `name`: defaults with the device's overrides.
pub fn supervisor_config(cfg: &Config, name: &str) -> Result<SupervisorConfig, ConfigError> {
    let device = cfg.device(name)?;
    let defaults = &cfg.defaults;

    Ok(SupervisorConfig {
        connect_timeout: Duration::from_secs(
            device.connect_timeout.unwrap_or(defaults.connect_timeout),
        ),
        missed_packet_count: device
            .missed_packet_count
            .unwrap_or(defaults.missed_packet_count),
        default_poll_interval: Duration::from_secs(
            device.poll_interval.unwrap_or(defaults.poll_interval),
        ),
        reconnect: ReconnectConfig {
            connect_attempts: device.connect_attempts.unwrap_or(defaults.connect_attempts),
            initial_delay: Duration::from_secs(defaults.reconnect_initial_delay),
            max_delay: Duration::from_secs(defaults.reconnect_max_delay),
        },
    })
}

/// Deadlines for the connectivity probe.
pub fn probe_config(cfg: &Config) -> ProbeConfig {
    let timeout = Duration::from_secs(cfg.defaults.probe_timeout);
    ProbeConfig {
        connect_timeout: timeout,
        status_timeout: timeout,
    }
}

// ── Tests ───────────────────────────────────────────────────────────
