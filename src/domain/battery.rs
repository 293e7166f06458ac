use serde::{Deserialize, Serialize};

use super::source::within_rating;
use super::{PowerSource, SourceKind};
use crate::formulas;

/// Percent of charge drained per watt of load on each supplied tick.
pub const BATTERY_DRAIN_PER_WATT: f64 = 0.005;

/// Battery backup bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battery {
    name: String,
    /// Maximum discharge power in W.
    rated_output_watts: f64,
    /// Usable capacity at full charge, in Wh.
    capacity_wh: f64,
    /// State of charge in percent, within [0, 100].
    charge_level_percent: f64,
}

impl Battery {
    pub fn new(capacity_wh: f64, charge_level_percent: f64, rated_output_watts: f64) -> Self {
        Self::with_name("Battery", capacity_wh, charge_level_percent, rated_output_watts)
    }

    pub fn with_name(
        name: impl Into<String>,
        capacity_wh: f64,
        charge_level_percent: f64,
        rated_output_watts: f64,
    ) -> Self {
        Self {
            name: name.into(),
            rated_output_watts: rated_output_watts.max(0.0),
            capacity_wh: capacity_wh.max(0.0),
            charge_level_percent: Self::clamp_charge(charge_level_percent),
        }
    }

    fn clamp_charge(percent: f64) -> f64 {
        percent.clamp(0.0, 100.0)
    }

    pub fn capacity_wh(&self) -> f64 {
        self.capacity_wh
    }

    pub fn charge_level_percent(&self) -> f64 {
        self.charge_level_percent
    }

    /// Raise (or lower, for negative amounts) the charge, clamped to [0, 100].
    pub fn recharge(&mut self, amount_percent: f64) {
        self.charge_level_percent = Self::clamp_charge(self.charge_level_percent + amount_percent);
    }

    /// Energy currently held, in Wh.
    pub fn stored_energy_wh(&self) -> f64 {
        self.capacity_wh * self.charge_level_percent / 100.0
    }

    /// Hours the remaining charge would sustain `load_watts`.
    pub fn backup_time_hours(&self, load_watts: f64) -> f64 {
        formulas::backup_time_hours(self.stored_energy_wh(), load_watts)
    }
}

impl PowerSource for Battery {
    fn kind(&self) -> SourceKind {
        SourceKind::Battery
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rated_output_watts(&self) -> f64 {
        self.rated_output_watts
    }

    fn attempt_supply(&mut self, load_watts: f64) -> bool {
        if self.charge_level_percent <= 0.0 || !within_rating(self.rated_output_watts, load_watts) {
            return false;
        }
        self.charge_level_percent =
            (self.charge_level_percent - load_watts * BATTERY_DRAIN_PER_WATT).max(0.0);
        true
    }

    fn describe_status(&self) -> String {
        format!(
            "{}: {:.1}% charge ({:.0} of {:.0} Wh)",
            self.name,
            self.charge_level_percent,
            self.stored_energy_wh(),
            self.capacity_wh
        )
    }
}
