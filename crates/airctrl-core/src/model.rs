// ── Device identity and per-model metadata ──
//
// `DeviceInformation` is what the host application knows about a device
// before connecting. `DeviceModelConfig` is the static, immutable record the
// catalog returns for a model: which API generation it speaks and which
// status patterns select its preset modes and fan speeds.
//
// Catalog records live in `static` tables, so everything here is built from
// `&'static` data and `const fn` constructors.

use std::fmt;

use serde::{Deserialize, Serialize};

use airctrl_api::{StatusMap, StatusValue};

// ── DeviceInformation ────────────────────────────────────────────────

/// Identity of one configured device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInformation {
    /// Model number as reported by the device, e.g. `AC3858/51`.
    pub model: String,
    /// User-facing name.
    pub name: String,
    /// Stable unique id (used as the hub key).
    pub device_id: String,
    /// Network address of the device.
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

// ── ApiGeneration ────────────────────────────────────────────────────

/// Protocol generation: decides the power key and its value encoding.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApiGeneration {
    Gen1,
    Gen2,
    Gen3,
}

impl ApiGeneration {
    /// Status key that switches the device on or off.
    pub const fn power_key(self) -> &'static str {
        match self {
            Self::Gen1 => "pwr",
            Self::Gen2 => "D03-02",
            Self::Gen3 => "D03102",
        }
    }

    /// Value written to [`power_key`](Self::power_key) for the given state.
    pub const fn power_value(self, on: bool) -> Setting {
        match (self, on) {
            (Self::Gen1, true) => Setting::Str("1"),
            (Self::Gen1, false) => Setting::Str("0"),
            (Self::Gen2, true) => Setting::Str("ON"),
            (Self::Gen2, false) => Setting::Str("OFF"),
            (Self::Gen3, true) => Setting::Int(1),
            (Self::Gen3, false) => Setting::Int(0),
        }
    }
}

// ── Setting / Preset ─────────────────────────────────────────────────

/// A constant status value usable in static tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Str(&'static str),
    Int(i64),
}

impl From<Setting> for StatusValue {
    fn from(setting: Setting) -> Self {
        match setting {
            Setting::Str(s) => StatusValue::from(s),
            Setting::Int(n) => StatusValue::Int(n),
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

/// A named status pattern: writing `values` selects the mode, and a status
/// containing all of `values` means the mode is active.
#[derive(Debug, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub values: &'static [(&'static str, Setting)],
}

impl Preset {
    /// The write map that activates this preset.
    pub fn command(&self) -> StatusMap {
        self.values
            .iter()
            .map(|&(key, value)| (key.to_owned(), StatusValue::from(value)))
            .collect()
    }

    /// Whether `status` currently matches this preset.
    pub fn matches(&self, status: &StatusMap) -> bool {
        self.values
            .iter()
            .all(|&(key, value)| status.get(key) == Some(&StatusValue::from(value)))
    }
}

// ── DeviceModelConfig ────────────────────────────────────────────────

/// Static metadata for one device model.
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceModelConfig {
    pub api_generation: ApiGeneration,
    pub preset_modes: &'static [Preset],
    pub speeds: &'static [Preset],
    pub switches: &'static [&'static str],
    pub lights: &'static [&'static str],
    pub selects: &'static [&'static str],
    pub numbers: &'static [&'static str],
    pub humidifiers: &'static [&'static str],
    pub heaters: &'static [&'static str],
    pub binary_sensors: &'static [&'static str],
    pub unavailable_filters: &'static [&'static str],
    pub unavailable_sensors: &'static [&'static str],
    /// Whether a fan entity makes sense (false for pure humidifiers).
    pub create_fan: bool,
    /// Some older models only change mode by stepping through each one.
    pub requires_mode_cycling: bool,
}

impl DeviceModelConfig {
    /// An empty record for `api_generation` (no presets, no capabilities).
    pub const fn new(api_generation: ApiGeneration) -> Self {
        Self {
            api_generation,
            preset_modes: &[],
            speeds: &[],
            switches: &[],
            lights: &[],
            selects: &[],
            numbers: &[],
            humidifiers: &[],
            heaters: &[],
            binary_sensors: &[],
            unavailable_filters: &[],
            unavailable_sensors: &[],
            create_fan: true,
            requires_mode_cycling: false,
        }
    }

    pub const fn power_key(&self) -> &'static str {
        self.api_generation.power_key()
    }

    pub const fn power_on(&self) -> Setting {
        self.api_generation.power_value(true)
    }

    pub const fn power_off(&self) -> Setting {
        self.api_generation.power_value(false)
    }

    /// The single-key write map that turns the device on or off.
    pub fn power_command(&self, on: bool) -> StatusMap {
        StatusMap::from([(
            self.power_key().to_owned(),
            StatusValue::from(self.api_generation.power_value(on)),
        )])
    }

    /// Whether `status` reports the device as powered on.
    pub fn is_on(&self, status: &StatusMap) -> bool {
        status.get(self.power_key()) == Some(&StatusValue::from(self.power_on()))
    }

    pub fn preset_mode(&self, name: &str) -> Option<&'static Preset> {
        self.preset_modes.iter().find(|p| p.name == name)
    }

    pub fn speed(&self, name: &str) -> Option<&'static Preset> {
        self.speeds.iter().find(|p| p.name == name)
    }

    /// The first preset mode whose pattern matches `status`.
    pub fn active_preset_mode(&self, status: &StatusMap) -> Option<&'static str> {
        self.preset_modes
            .iter()
            .find(|p| p.matches(status))
            .map(|p| p.name)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
