use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Classification of a single telemetry reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ReadingStatus {
    Normal,
    Warning,
    Critical,
}

impl ReadingStatus {
    pub fn is_normal(&self) -> bool {
        matches!(self, ReadingStatus::Normal)
    }
}

/// Limits used by [`classify`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassificationThresholds {
    pub voltage_min_v: f64,
    pub voltage_max_v: f64,
    pub current_max_a: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            voltage_min_v: 220.0,
            voltage_max_v: 240.0,
            current_max_a: 12.0,
        }
    }
}

/// Label a voltage/current pair.
///
/// The voltage window is checked first, so an out-of-range voltage is a
/// `Warning` even when the current would be `Critical`.
pub fn classify(voltage_v: f64, current_a: f64, limits: &ClassificationThresholds) -> ReadingStatus {
    if voltage_v < limits.voltage_min_v || voltage_v > limits.voltage_max_v {
        ReadingStatus::Warning
    } else if current_a > limits.current_max_a {
        ReadingStatus::Critical
    } else {
        ReadingStatus::Normal
    }
}

/// One timestamped measurement from a simulated device. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryReading {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub voltage_v: f64,
    pub current_a: f64,
    pub temperature_c: f64,
    pub status: ReadingStatus,
}

impl TelemetryReading {
    pub fn new(
        device_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        voltage_v: f64,
        current_a: f64,
        temperature_c: f64,
        limits: &ClassificationThresholds,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
            voltage_v,
            current_a,
            temperature_c,
            status: classify(voltage_v, current_a, limits),
        }
    }

    pub fn power_w(&self) -> f64 {
        self.voltage_v * self.current_a
    }
}
