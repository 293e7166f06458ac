use serde::{Deserialize, Serialize};

use super::FailoverState;
use crate::formulas;

/// Energy served by each source over the simulation run, in kWh.
///
/// Blackout ticks count toward `unserved_kwh`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnergyLedger {
    pub mains_kwh: f64,
    pub battery_kwh: f64,
    pub generator_kwh: f64,
    pub unserved_kwh: f64,
}

impl EnergyLedger {
    pub fn record(&mut self, state: FailoverState, load_w: f64, hours: f64) {
        let kwh = formulas::energy_kwh(load_w, hours);
        match state {
            FailoverState::OnMains => self.mains_kwh += kwh,
            FailoverState::OnBattery => self.battery_kwh += kwh,
            FailoverState::OnGenerator => self.generator_kwh += kwh,
            FailoverState::Blackout => self.unserved_kwh += kwh,
        }
    }

    pub fn served_kwh(&self) -> f64 {
        self.mains_kwh + self.battery_kwh + self.generator_kwh
    }

    /// Share of demanded energy that was actually served, 1.0 with no demand.
    pub fn availability(&self) -> f64 {
        let demanded = self.served_kwh() + self.unserved_kwh;
        if demanded > 0.0 {
            self.served_kwh() / demanded
        } else {
            1.0
        }
    }
}
