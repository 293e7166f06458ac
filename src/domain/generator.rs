use serde::{Deserialize, Serialize};

use super::source::within_rating;
use super::{PowerSource, SourceKind};

/// Percent of fuel burned per watt of load on each supplied tick.
pub const GENERATOR_FUEL_PER_WATT: f64 = 0.01;

/// Standby fuel generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    name: String,
    /// Nameplate output in W.
    rated_output_watts: f64,
    /// Tank level in percent, within [0, 100].
    fuel_level_percent: f64,
}

impl Generator {
    pub fn new(fuel_level_percent: f64, rated_output_watts: f64) -> Self {
        Self::with_name("Generator", fuel_level_percent, rated_output_watts)
    }

    pub fn with_name(
        name: impl Into<String>,
        fuel_level_percent: f64,
        rated_output_watts: f64,
    ) -> Self {
        Self {
            name: name.into(),
            rated_output_watts: rated_output_watts.max(0.0),
            fuel_level_percent: fuel_level_percent.clamp(0.0, 100.0),
        }
    }

    pub fn fuel_level_percent(&self) -> f64 {
        self.fuel_level_percent
    }

    /// Add fuel (or siphon it, for negative amounts), clamped to [0, 100].
    pub fn refuel(&mut self, amount_percent: f64) {
        self.fuel_level_percent = (self.fuel_level_percent + amount_percent).clamp(0.0, 100.0);
    }
}

impl PowerSource for Generator {
    fn kind(&self) -> SourceKind {
        SourceKind::Generator
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rated_output_watts(&self) -> f64 {
        self.rated_output_watts
    }

    fn attempt_supply(&mut self, load_watts: f64) -> bool {
        if self.fuel_level_percent <= 0.0 || !within_rating(self.rated_output_watts, load_watts) {
            return false;
        }
        self.fuel_level_percent =
            (self.fuel_level_percent - load_watts * GENERATOR_FUEL_PER_WATT).max(0.0);
        true
    }

    fn describe_status(&self) -> String {
        format!(
            "{}: running, fuel {:.1}%, {:.0} W rated",
            self.name, self.fuel_level_percent, self.rated_output_watts
        )
    }
}
