use serde::{Deserialize, Serialize};

use super::source::within_rating;
use super::{PowerSource, SourceKind};

/// Fraction of the load shaved off the rated output on every supplied tick.
pub const MAINS_LOSS_PER_WATT: f64 = 0.01;

/// Utility grid connection
///
/// `available` is driven from outside (simulated outages). Supplying never
/// touches a stored resource, it only erodes `rated_output_watts` to model
/// transmission losses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mains {
    name: String,
    /// Deliverable power in W. Only ever decreases.
    rated_output_watts: f64,
    available: bool,
}

impl Mains {
    pub fn new(rated_output_watts: f64) -> Self {
        Self::with_name("Mains", rated_output_watts)
    }

    pub fn with_name(name: impl Into<String>, rated_output_watts: f64) -> Self {
        Self {
            name: name.into(),
            rated_output_watts: rated_output_watts.max(0.0),
            available: true,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Flip grid availability. Does not change the rated output.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }
}

impl PowerSource for Mains {
    fn kind(&self) -> SourceKind {
        SourceKind::Mains
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rated_output_watts(&self) -> f64 {
        self.rated_output_watts
    }

    fn attempt_supply(&mut self, load_watts: f64) -> bool {
        if !self.available || !within_rating(self.rated_output_watts, load_watts) {
            return false;
        }
        self.rated_output_watts =
            (self.rated_output_watts - load_watts * MAINS_LOSS_PER_WATT).max(0.0);
        true
    }

    fn describe_status(&self) -> String {
        let grid = if self.available { "online" } else { "offline" };
        format!(
            "{}: grid {}, {:.1} W available",
            self.name, grid, self.rated_output_watts
        )
    }
}
