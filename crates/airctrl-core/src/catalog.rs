// ── Model catalog ──
//
// Static lookup from model number to `DeviceModelConfig`. Models that share
// hardware share one record. Lookup tries the exact model first, then the
// six-character family prefix (`AC2889/10` → `AC2889`), then falls back to
// a bare GEN1 record.

use crate::model::{ApiGeneration, DeviceModelConfig, Preset, Setting};

// ── Status keys ──────────────────────────────────────────────────────

const POWER: &str = "pwr";
const MODE: &str = "mode";
const SPEED: &str = "om";
const NEW_POWER: &str = "D03-02";
const NEW_MODE: &str = "D03-12";
const NEW2_POWER: &str = "D03102";
const NEW2_MODE_B: &str = "D0310C";

const CHILD_LOCK: &str = "cl";
const DISPLAY_BACKLIGHT: &str = "uil";
const LIGHT_BRIGHTNESS: &str = "aqil";
const PREFERRED_INDEX: &str = "ddp";
const HUMIDITY_TARGET: &str = "rhset";
const ERROR_CODE: &str = "err";

// ── Pattern helpers ──────────────────────────────────────────────────

const fn s(value: &'static str) -> Setting {
    Setting::Str(value)
}

const fn n(value: i64) -> Setting {
    Setting::Int(value)
}

// ── Gen2 presets ─────────────────────────────────────────────────────

const GEN2_AUTO: Preset = Preset {
    name: "auto",
    values: &[(NEW_POWER, s("ON")), (NEW_MODE, s("Auto General"))],
};
const GEN2_SLEEP: Preset = Preset {
    name: "sleep",
    values: &[(NEW_POWER, s("ON")), (NEW_MODE, s("Sleep"))],
};
const GEN2_TURBO: Preset = Preset {
    name: "turbo",
    values: &[(NEW_POWER, s("ON")), (NEW_MODE, s("Turbo"))],
};
const GEN2_SPEED_1: Preset = Preset {
    name: "speed_1",
    values: &[(NEW_POWER, s("ON")), (NEW_MODE, s("Gentle/Speed 1"))],
};
const GEN2_SPEED_2: Preset = Preset {
    name: "speed_2",
    values: &[(NEW_POWER, s("ON")), (NEW_MODE, s("Speed 2"))],
};

// ── Gen3 presets ─────────────────────────────────────────────────────

const GEN3_AUTO: Preset = Preset {
    name: "auto",
    values: &[(NEW2_POWER, n(1)), (NEW2_MODE_B, n(0))],
};
const GEN3_SLEEP: Preset = Preset {
    name: "sleep",
    values: &[(NEW2_POWER, n(1)), (NEW2_MODE_B, n(17))],
};
const GEN3_TURBO: Preset = Preset {
    name: "turbo",
    values: &[(NEW2_POWER, n(1)), (NEW2_MODE_B, n(18))],
};
const GEN3_MEDIUM: Preset = Preset {
    name: "medium",
    values: &[(NEW2_POWER, n(1)), (NEW2_MODE_B, n(19))],
};
const GEN3_HIGH: Preset = Preset {
    name: "high",
    values: &[(NEW2_POWER, n(1)), (NEW2_MODE_B, n(65))],
};
const GEN3_SPEED_1: Preset = Preset {
    name: "speed_1",
    values: &[(NEW2_POWER, n(1)), (NEW2_MODE_B, n(1))],
};
const GEN3_SPEED_2: Preset = Preset {
    name: "speed_2",
    values: &[(NEW2_POWER, n(1)), (NEW2_MODE_B, n(2))],
};
const GEN3_SPEED_3: Preset = Preset {
    name: "speed_3",
    values: &[(NEW2_POWER, n(1)), (NEW2_MODE_B, n(3))],
};

// ── Gen1 presets ─────────────────────────────────────────────────────

const GEN1_AUTO: Preset = Preset {
    name: "auto",
    values: &[(POWER, s("1")), (MODE, s("AG"))],
};
const GEN1_POLLUTION_AUTO: Preset = Preset {
    name: "auto",
    values: &[(POWER, s("1")), (MODE, s("P"))],
};
const GEN1_ALLERGEN: Preset = Preset {
    name: "allergen",
    values: &[(POWER, s("1")), (MODE, s("A"))],
};
const GEN1_BACTERIA: Preset = Preset {
    name: "bacteria",
    values: &[(POWER, s("1")), (MODE, s("B"))],
};
const GEN1_SLEEP: Preset = Preset {
    name: "sleep",
    values: &[(POWER, s("1")), (MODE, s("S"))],
};
const GEN1_GENTLE: Preset = Preset {
    name: "gentle",
    values: &[(POWER, s("1")), (MODE, s("GT"))],
};
const GEN1_TURBO: Preset = Preset {
    name: "turbo",
    values: &[(POWER, s("1")), (MODE, s("T"))],
};
const GEN1_SLEEP_OM: Preset = Preset {
    name: "sleep",
    values: &[(POWER, s("1")), (MODE, s("S")), (SPEED, s("s"))],
};
const GEN1_SLEEP_ALLERGY: Preset = Preset {
    name: "allergy_sleep",
    values: &[(POWER, s("1")), (MODE, s("AS")), (SPEED, s("as"))],
};
const GEN1_SPEED_1: Preset = Preset {
    name: "speed_1",
    values: &[(POWER, s("1")), (MODE, s("M")), (SPEED, s("1"))],
};
const GEN1_SPEED_2: Preset = Preset {
    name: "speed_2",
    values: &[(POWER, s("1")), (MODE, s("M")), (SPEED, s("2"))],
};
const GEN1_SPEED_3: Preset = Preset {
    name: "speed_3",
    values: &[(POWER, s("1")), (MODE, s("M")), (SPEED, s("3"))],
};
const GEN1_TURBO_OM: Preset = Preset {
    name: "turbo",
    values: &[(POWER, s("1")), (MODE, s("T")), (SPEED, s("t"))],
};
const GEN1_MANUAL_SLEEP: Preset = Preset {
    name: "sleep",
    values: &[(POWER, s("1")), (MODE, s("M")), (SPEED, s("s"))],
};
const GEN1_MANUAL_TURBO: Preset = Preset {
    name: "turbo",
    values: &[(POWER, s("1")), (MODE, s("M")), (SPEED, s("t"))],
};

// AC1214 has no power key in its mode patterns.
const AC1214_AUTO: Preset = Preset {
    name: "auto",
    values: &[(MODE, s("P"))],
};
const AC1214_ALLERGEN: Preset = Preset {
    name: "allergen",
    values: &[(MODE, s("A"))],
};
const AC1214_NIGHT: Preset = Preset {
    name: "night",
    values: &[(MODE, s("N"))],
};
const AC1214_SPEED_1: Preset = Preset {
    name: "speed_1",
    values: &[(MODE, s("M")), (SPEED, s("1"))],
};
const AC1214_SPEED_2: Preset = Preset {
    name: "speed_2",
    values: &[(MODE, s("M")), (SPEED, s("2"))],
};
const AC1214_SPEED_3: Preset = Preset {
    name: "speed_3",
    values: &[(MODE, s("M")), (SPEED, s("3"))],
};
const AC1214_TURBO: Preset = Preset {
    name: "turbo",
    values: &[(MODE, s("M")), (SPEED, s("t"))],
};

// ── Shared records ───────────────────────────────────────────────────

const GEN1_LIGHTS: &[&str] = &[DISPLAY_BACKLIGHT, LIGHT_BRIGHTNESS];

static DEFAULT_CONFIG: DeviceModelConfig = DeviceModelConfig::new(ApiGeneration::Gen1);
static GEN3_BASE: DeviceModelConfig = DeviceModelConfig::new(ApiGeneration::Gen3);

static AC0850_GEN2: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[GEN2_AUTO, GEN2_TURBO, GEN2_SLEEP],
    speeds: &[GEN2_SLEEP, GEN2_TURBO],
    ..DeviceModelConfig::new(ApiGeneration::Gen2)
};

static AC0850_GEN3: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[GEN3_AUTO, GEN3_TURBO, GEN3_SLEEP],
    speeds: &[GEN3_SLEEP, GEN3_TURBO],
    ..DeviceModelConfig::new(ApiGeneration::Gen3)
};

static AC0950: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[GEN3_AUTO, GEN3_TURBO, GEN3_MEDIUM, GEN3_SLEEP],
    speeds: &[GEN3_SLEEP, GEN3_MEDIUM, GEN3_TURBO],
    ..DeviceModelConfig::new(ApiGeneration::Gen3)
};

static AC1214: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[
        AC1214_AUTO,
        AC1214_ALLERGEN,
        AC1214_NIGHT,
        AC1214_SPEED_1,
        AC1214_SPEED_2,
        AC1214_SPEED_3,
        AC1214_TURBO,
    ],
    speeds: &[
        AC1214_NIGHT,
        AC1214_SPEED_1,
        AC1214_SPEED_2,
        AC1214_SPEED_3,
        AC1214_TURBO,
    ],
    switches: &[CHILD_LOCK],
    lights: GEN1_LIGHTS,
    selects: &[PREFERRED_INDEX],
    requires_mode_cycling: true,
    ..DeviceModelConfig::new(ApiGeneration::Gen1)
};

static AC1715: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[
        GEN2_AUTO,
        GEN2_SPEED_1,
        GEN2_SPEED_2,
        GEN2_TURBO,
        GEN2_SLEEP,
    ],
    speeds: &[GEN2_SLEEP, GEN2_SPEED_1, GEN2_SPEED_2, GEN2_TURBO],
    ..DeviceModelConfig::new(ApiGeneration::Gen2)
};

static AC2729: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[
        GEN1_POLLUTION_AUTO,
        GEN1_ALLERGEN,
        GEN1_SPEED_1,
        GEN1_SPEED_2,
        GEN1_SPEED_3,
        GEN1_MANUAL_TURBO,
    ],
    speeds: &[GEN1_SPEED_1, GEN1_SPEED_2, GEN1_SPEED_3, GEN1_MANUAL_TURBO],
    switches: &[CHILD_LOCK],
    lights: GEN1_LIGHTS,
    selects: &[PREFERRED_INDEX],
    humidifiers: &[HUMIDITY_TARGET],
    binary_sensors: &[ERROR_CODE],
    ..DeviceModelConfig::new(ApiGeneration::Gen1)
};

// AC2889 and AC3259 share the pollution/allergen/bacteria layout.
static AC2889: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[
        GEN1_POLLUTION_AUTO,
        GEN1_ALLERGEN,
        GEN1_BACTERIA,
        GEN1_MANUAL_SLEEP,
        GEN1_SPEED_1,
        GEN1_SPEED_2,
        GEN1_SPEED_3,
        GEN1_MANUAL_TURBO,
    ],
    speeds: &[
        GEN1_MANUAL_SLEEP,
        GEN1_SPEED_1,
        GEN1_SPEED_2,
        GEN1_SPEED_3,
        GEN1_MANUAL_TURBO,
    ],
    lights: GEN1_LIGHTS,
    selects: &[PREFERRED_INDEX],
    ..DeviceModelConfig::new(ApiGeneration::Gen1)
};

static AC29XX: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[GEN1_AUTO, GEN1_SLEEP, GEN1_GENTLE, GEN1_TURBO],
    speeds: &[GEN1_SLEEP, GEN1_GENTLE, GEN1_TURBO],
    switches: &[CHILD_LOCK],
    lights: GEN1_LIGHTS,
    selects: &[PREFERRED_INDEX],
    ..DeviceModelConfig::new(ApiGeneration::Gen1)
};

static AC303X: DeviceModelConfig = AC303X_RECORD;

// Also used by the AC385x/50 variants, which share the same layout.
static AC305X: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[
        GEN1_AUTO,
        GEN1_SLEEP_OM,
        GEN1_SPEED_1,
        GEN1_SPEED_2,
        GEN1_TURBO_OM,
    ],
    speeds: &[GEN1_SLEEP_OM, GEN1_SPEED_1, GEN1_SPEED_2, GEN1_TURBO_OM],
    lights: GEN1_LIGHTS,
    selects: &[PREFERRED_INDEX],
    ..DeviceModelConfig::new(ApiGeneration::Gen1)
};

static AC385X51: DeviceModelConfig = DeviceModelConfig {
    switches: &[CHILD_LOCK],
    ..AC303X_RECORD
};

// `static` items cannot be used in struct-update position; keep a const copy.
const AC303X_RECORD: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[
        GEN1_AUTO,
        GEN1_SLEEP_OM,
        GEN1_SLEEP_ALLERGY,
        GEN1_SPEED_1,
        GEN1_SPEED_2,
        GEN1_TURBO_OM,
    ],
    speeds: &[GEN1_SLEEP_OM, GEN1_SPEED_1, GEN1_SPEED_2, GEN1_TURBO_OM],
    lights: GEN1_LIGHTS,
    selects: &[PREFERRED_INDEX],
    ..DeviceModelConfig::new(ApiGeneration::Gen1)
};

static AC32XX: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[GEN3_AUTO, GEN3_MEDIUM, GEN3_TURBO, GEN3_SLEEP],
    speeds: &[GEN3_SPEED_1, GEN3_SPEED_2, GEN3_SPEED_3],
    ..DeviceModelConfig::new(ApiGeneration::Gen3)
};

static AMFXXX: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[GEN3_AUTO, GEN3_SLEEP, GEN3_TURBO],
    speeds: &[GEN3_SPEED_1, GEN3_SPEED_2, GEN3_SPEED_3],
    ..DeviceModelConfig::new(ApiGeneration::Gen3)
};

static HU_HUMIDIFIER: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[GEN3_AUTO, GEN3_SLEEP, GEN3_MEDIUM, GEN3_HIGH],
    speeds: &[GEN3_SLEEP, GEN3_MEDIUM, GEN3_HIGH],
    create_fan: false,
    ..DeviceModelConfig::new(ApiGeneration::Gen3)
};

static AC5659: DeviceModelConfig = DeviceModelConfig {
    preset_modes: &[
        GEN1_POLLUTION_AUTO,
        GEN1_ALLERGEN,
        GEN1_BACTERIA,
        GEN1_MANUAL_SLEEP,
        GEN1_SPEED_1,
        GEN1_SPEED_2,
        GEN1_SPEED_3,
        GEN1_MANUAL_TURBO,
    ],
    speeds: &[
        GEN1_MANUAL_SLEEP,
        GEN1_SPEED_1,
        GEN1_SPEED_2,
        GEN1_SPEED_3,
        GEN1_MANUAL_TURBO,
    ],
    lights: GEN1_LIGHTS,
    selects: &[PREFERRED_INDEX],
    ..DeviceModelConfig::new(ApiGeneration::Gen1)
};

static GEN1_BASIC: DeviceModelConfig = DeviceModelConfig {
    switches: &[CHILD_LOCK],
    lights: GEN1_LIGHTS,
    selects: &[PREFERRED_INDEX],
    ..DeviceModelConfig::new(ApiGeneration::Gen1)
};

// ── Model table ──────────────────────────────────────────────────────

static MODELS: &[(&str, &DeviceModelConfig)] = &[
    // Gen2
    ("AC0650", &AC0850_GEN2),
    ("AC0850/11", &AC0850_GEN2),
    ("AC0850/20", &AC0850_GEN2),
    ("AC0850/31", &AC0850_GEN2),
    ("AC0850/41", &AC0850_GEN2),
    ("AC0850/70", &AC0850_GEN2),
    ("AC0850/85", &AC0850_GEN2),
    ("AC1715", &AC1715),
    // Gen3
    ("AC0850/11C", &AC0850_GEN3),
    ("AC0850/20C", &AC0850_GEN3),
    ("AC0850/31C", &AC0850_GEN3),
    ("AC0850/41C", &AC0850_GEN3),
    ("AC0850/70C", &AC0850_GEN3),
    ("AC0850/81", &AC0850_GEN3),
    ("AC0950", &AC0950),
    ("AC0951", &AC0950),
    ("AC3210", &AC32XX),
    ("AC3220", &AC32XX),
    ("AC3221", &AC32XX),
    ("AC3420", &AC0950),
    ("AC3421", &AC0950),
    ("AC3737", &GEN3_BASE),
    ("AC4220", &AC32XX),
    ("AC4221", &AC32XX),
    ("AMF765", &AMFXXX),
    ("AMF870", &AMFXXX),
    ("CX3120", &GEN3_BASE),
    ("CX3550", &GEN3_BASE),
    ("CX5120", &GEN3_BASE),
    ("HU1509", &HU_HUMIDIFIER),
    ("HU1510", &HU_HUMIDIFIER),
    ("HU5710", &HU_HUMIDIFIER),
    // Gen1
    ("AC1214", &AC1214),
    ("AC2729", &AC2729),
    ("AC2889", &AC2889),
    ("AC2936", &AC29XX),
    ("AC2939", &AC29XX),
    ("AC2958", &AC29XX),
    ("AC2959", &AC29XX),
    ("AC3033", &AC303X),
    ("AC3036", &AC303X),
    ("AC3039", &AC303X),
    ("AC3055", &AC305X),
    ("AC3059", &AC305X),
    ("AC3259", &AC2889),
    ("AC3829", &GEN1_BASIC),
    ("AC3836", &GEN1_BASIC),
    ("AC3854/50", &AC305X),
    ("AC3858/50", &AC305X),
    ("AC3854/51", &AC385X51),
    ("AC3858/51", &AC385X51),
    ("AC3858/83", &AC385X51),
    ("AC3858/86", &AC385X51),
    ("AC4236", &GEN1_BASIC),
    ("AC4550", &GEN1_BASIC),
    ("AC4558", &GEN1_BASIC),
    ("AC5659", &AC5659),
    ("AC5660", &AC5659),
];

/// Look up the record for `model`.
///
/// Never fails: unknown models get a bare GEN1 record.
pub fn model_config(model: &str) -> &'static DeviceModelConfig {
    if let Some(config) = find(model) {
        return config;
    }
    if let Some(config) = model.get(..6).and_then(find) {
        return config;
    }
    tracing::debug!(model, "unknown model, using GEN1 defaults");
    &DEFAULT_CONFIG
}

/// All model numbers with a dedicated record.
pub fn known_models() -> impl Iterator<Item = &'static str> {
    MODELS.iter().map(|&(model, _)| model)
}

fn find(model: &str) -> Option<&'static DeviceModelConfig> {
    MODELS
        .iter()
        .find(|&&(known, _)| known == model)
        .map(|&(_, config)| config)
}

// ── Tests ────────────────────────────────────────────────────────────
