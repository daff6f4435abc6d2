// ── Diagnostics snapshot ──
//
// A JSON dump of one supervisor's state for bug reports. Identifying
// values (device ids, addresses, network names, secrets) are replaced
// with a marker wherever they appear, at any depth.

use serde_json::{Map, Value, json};

use crate::supervisor::Supervisor;

/// Replacement for redacted values.
pub const REDACTED: &str = "**REDACTED**";

/// Keys whose values never leave the process unredacted.
pub const TO_REDACT: &[&str] = &[
    "device_id",
    "DeviceId",
    "device_serial",
    "serial_number",
    "mac",
    "ip_address",
    "host",
    "ssid",
    "wifi_ssid",
    "network_name",
    "bssid",
    "wifi_password",
    "password",
    "token",
    "api_key",
    "unique_id",
    "id",
    "entry_id",
    "config_entry_id",
];

impl Supervisor {
    /// Redacted diagnostics for this device.
    pub fn diagnostics(&self) -> Value {
        let status = self.status();
        let status_keys: Vec<&str> = status
            .as_deref()
            .map(|s| s.keys().map(String::as_str).collect())
            .unwrap_or_default();
        let info = self.device_info();
        let model = self.model_config();

        let mut data = json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "device_info": {
                "model": info.model,
                "name": info.name,
                "host": info.host,
                "device_id": info.device_id,
                "mac": info.mac,
            },
            "supervisor": {
                "available": self.is_available(),
                "shut_down": self.is_shut_down(),
                "poll_interval_secs": self.poll_interval().as_secs(),
                "seconds_since_last_update": self.last_update().map(|t| t.elapsed().as_secs()),
                "tasks": self.tasks(),
                "cache_version": self.store().version(),
                "has_data": !status_keys.is_empty(),
                "status_keys": status_keys,
            },
            "model": {
                "api_generation": model.api_generation,
                "preset_modes": model.preset_modes.iter().map(|p| p.name).collect::<Vec<_>>(),
                "create_fan": model.create_fan,
                "requires_mode_cycling": model.requires_mode_cycling,
            },
            "device_status": status.as_deref(),
        });

        redact(&mut data, TO_REDACT);
        data
    }
}

/// Replace the values of `keys` with [`REDACTED`], recursively.
///
/// Null and empty-string values are left as they are: there is nothing to
/// hide and the emptiness itself is useful to see.
pub fn redact(value: &mut Value, keys: &[&str]) {
    match value {
        Value::Object(map) => redact_map(map, keys),
        Value::Array(items) => {
            for item in items {
                redact(item, keys);
            }
        }
        _ => {}
    }
}

fn redact_map(map: &mut Map<String, Value>, keys: &[&str]) {
    for (key, value) in map.iter_mut() {
        let empty = match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if empty {
            continue;
        }
        if keys.contains(&key.as_str()) {
            *value = Value::String(REDACTED.to_owned());
        } else {
            redact(value, keys);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
