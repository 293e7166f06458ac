use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EnergyLedger, FailoverController, FailoverState};
use crate::domain::PowerSource;

/// Read-only view of the controller published after each tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerSnapshot {
    pub timestamp: DateTime<Utc>,
    pub state: FailoverState,
    /// Status line of the active source
    pub status: String,
    /// Load demanded on the last tick, in W
    pub load_w: f64,
    pub mains_available: bool,
    /// Remaining mains rating after erosion, in W
    pub mains_rated_w: f64,
    /// I²R loss on the feeder in W, zero unless on mains
    pub line_loss_w: f64,
    /// Battery state of charge, 0 to 100
    pub battery_charge_percent: f64,
    /// Hours the battery alone would carry `load_w`
    pub battery_backup_hours: f64,
    /// Generator tank level, 0 to 100
    pub generator_fuel_percent: f64,
    /// State changes since start
    pub transitions: u64,
    pub ledger: EnergyLedger,
}

impl PowerSnapshot {
    pub fn capture(controller: &FailoverController, ledger: &EnergyLedger, line_loss_w: f64) -> Self {
        let load_w = controller.last_load_w();
        let state = controller.state();
        Self {
            timestamp: Utc::now(),
            state,
            status: controller.system_status(),
            load_w,
            mains_available: controller.mains().is_available(),
            mains_rated_w: controller.mains().rated_output_watts(),
            line_loss_w: if state == FailoverState::OnMains { line_loss_w } else { 0.0 },
            battery_charge_percent: controller.battery().charge_level_percent(),
            battery_backup_hours: controller.battery().backup_time_hours(load_w),
            generator_fuel_percent: controller.generator().fuel_level_percent(),
            transitions: controller.transitions(),
            ledger: ledger.clone(),
        }
    }
}
