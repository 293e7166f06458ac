//! # Failover Controller
//!
//! Picks the source that carries the load on every tick, in fixed priority
//! order: mains, then battery, then generator. When none can carry it the
//! system is in blackout.
//!
//! Each [`FailoverController::update`] is a full re-evaluation. There is no
//! hysteresis or minimum dwell time, so a flapping grid flag produces
//! flapping transitions. Remaining charge and fuel are not considered when
//! ranking sources.

pub mod ledger;
pub mod snapshot;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

pub use ledger::EnergyLedger;
pub use snapshot::PowerSnapshot;

use crate::domain::{Battery, Blackout, Generator, Mains, PowerSource, SourceKind};

/// Which source currently carries the load
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FailoverState {
    OnMains,
    OnBattery,
    OnGenerator,
    Blackout,
}

impl FailoverState {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            FailoverState::OnMains => SourceKind::Mains,
            FailoverState::OnBattery => SourceKind::Battery,
            FailoverState::OnGenerator => SourceKind::Generator,
            FailoverState::Blackout => SourceKind::Blackout,
        }
    }

    pub fn is_powered(&self) -> bool {
        !matches!(self, FailoverState::Blackout)
    }
}

/// Owns one source of each kind and tracks which one is active.
///
/// Single writer: only the owner mutates it, through [`Self::update`] and
/// the resource commands. Readers use the projections.
#[derive(Debug, Clone)]
pub struct FailoverController {
    mains: Mains,
    battery: Battery,
    generator: Generator,
    blackout: Blackout,
    state: FailoverState,
    last_load_w: f64,
    transitions: u64,
}

impl FailoverController {
    /// Starts de-energized until the first [`Self::update`].
    pub fn new(mains: Mains, battery: Battery, generator: Generator) -> Self {
        Self {
            mains,
            battery,
            generator,
            blackout: Blackout,
            state: FailoverState::Blackout,
            last_load_w: 0.0,
            transitions: 0,
        }
    }

    /// Re-evaluate the active source for `load_watts`.
    pub fn update(&mut self, load_watts: f64) -> FailoverState {
        let next = if self.mains.is_available() && self.mains.attempt_supply(load_watts) {
            FailoverState::OnMains
        } else if self.battery.attempt_supply(load_watts) {
            FailoverState::OnBattery
        } else if self.generator.attempt_supply(load_watts) {
            FailoverState::OnGenerator
        } else {
            FailoverState::Blackout
        };

        if next != self.state {
            self.transitions += 1;
            match next {
                FailoverState::Blackout => warn!(
                    from = %self.state,
                    load_w = load_watts,
                    "no source can carry the load, system de-energized"
                ),
                _ => info!(from = %self.state, to = %next, load_w = load_watts, "power source switched"),
            }
        } else {
            debug!(state = %next, load_w = load_watts, "failover tick");
        }

        self.state = next;
        self.last_load_w = load_watts;
        next
    }

    /// Inject the grid flag and re-evaluate in one step.
    pub fn update_with_mains(&mut self, load_watts: f64, mains_available: bool) -> FailoverState {
        self.mains.set_available(mains_available);
        self.update(load_watts)
    }

    pub fn state(&self) -> FailoverState {
        self.state
    }

    pub fn active_source(&self) -> &dyn PowerSource {
        match self.state {
            FailoverState::OnMains => &self.mains,
            FailoverState::OnBattery => &self.battery,
            FailoverState::OnGenerator => &self.generator,
            FailoverState::Blackout => &self.blackout,
        }
    }

    pub fn system_status(&self) -> String {
        self.active_source().describe_status()
    }

    pub fn last_load_w(&self) -> f64 {
        self.last_load_w
    }

    /// Number of state changes since construction.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn mains(&self) -> &Mains {
        &self.mains
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn set_mains_available(&mut self, available: bool) {
        if self.mains.is_available() != available {
            info!(available, "mains availability changed");
        }
        self.mains.set_available(available);
    }

    pub fn recharge_battery(&mut self, amount_percent: f64) {
        self.battery.recharge(amount_percent);
        info!(
            amount_percent,
            charge_percent = self.battery.charge_level_percent(),
            "battery recharged"
        );
    }

    pub fn refuel_generator(&mut self, amount_percent: f64) {
        self.generator.refuel(amount_percent);
        info!(
            amount_percent,
            fuel_percent = self.generator.fuel_level_percent(),
            "generator refueled"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BLACKOUT_STATUS;

    fn controller(mains_up: bool, charge: f64, fuel: f64) -> FailoverController {
        let mut mains = Mains::new(5000.0);
        mains.set_available(mains_up);
        FailoverController::new(mains, Battery::new(2400.0, charge, 2000.0), Generator::new(fuel, 4000.0))
    }

    #[test]
    fn test_prefers_mains_when_everything_works() {
        let mut ctl = controller(true, 100.0, 100.0);
        assert_eq!(ctl.update(500.0), FailoverState::OnMains);
        assert_eq!(ctl.battery().charge_level_percent(), 100.0);
        assert_eq!(ctl.generator().fuel_level_percent(), 100.0);
    }

    #[test]
    fn test_falls_back_to_battery() {
        let mut ctl = controller(false, 100.0, 100.0);
        assert_eq!(ctl.update(500.0), FailoverState::OnBattery);
        assert!((ctl.battery().charge_level_percent() - 97.5).abs() < 1e-9);
        assert_eq!(ctl.generator().fuel_level_percent(), 100.0);
        assert_eq!(ctl.active_source().kind(), SourceKind::Battery);
    }

    #[test]
    fn test_falls_back_to_generator() {
        let mut ctl = controller(false, 0.0, 50.0);
        assert_eq!(ctl.update(300.0), FailoverState::OnGenerator);
        assert!((ctl.generator().fuel_level_percent() - 47.0).abs() < 1e-9);
        assert_eq!(ctl.system_status(), ctl.generator().describe_status());
    }

    #[test]
    fn test_blackout_when_nothing_can_supply() {
        let mut ctl = controller(false, 0.0, 0.0);
        assert_eq!(ctl.update(300.0), FailoverState::Blackout);
        assert_eq!(ctl.system_status(), BLACKOUT_STATUS);
        assert_eq!(ctl.active_source().rated_output_watts(), 0.0);
    }

    #[test]
    fn test_load_above_every_rating_is_blackout() {
        let mut ctl = controller(true, 100.0, 100.0);
        assert_eq!(ctl.update(10_000.0), FailoverState::Blackout);
        assert_eq!(ctl.mains().rated_output_watts(), 5000.0);
    }

    #[test]
    fn test_priority_ignores_remaining_resources() {
        // Nearly empty battery still wins over a full generator
        let mut ctl = controller(false, 0.1, 100.0);
        assert_eq!(ctl.update(100.0), FailoverState::OnBattery);
    }

    #[test]
    fn test_flapping_mains_flaps_state() {
        let mut ctl = controller(true, 100.0, 100.0);
        let states: Vec<_> = [true, false, true, false]
            .into_iter()
            .map(|up| ctl.update_with_mains(200.0, up))
            .collect();
        assert_eq!(
            states,
            vec![
                FailoverState::OnMains,
                FailoverState::OnBattery,
                FailoverState::OnMains,
                FailoverState::OnBattery
            ]
        );
        // Blackout -> mains, then three more switches
        assert_eq!(ctl.transitions(), 4);
    }

    #[test]
    fn test_status_is_pure_projection() {
        let mut ctl = controller(false, 80.0, 100.0);
        ctl.update(400.0);
        let charge = ctl.battery().charge_level_percent();
        let _ = ctl.system_status();
        let _ = ctl.system_status();
        assert_eq!(ctl.battery().charge_level_percent(), charge);
    }

    #[test]
    fn test_recharge_restores_battery_branch() {
        let mut ctl = controller(false, 0.0, 0.0);
        assert_eq!(ctl.update(200.0), FailoverState::Blackout);
        ctl.recharge_battery(10.0);
        assert_eq!(ctl.update(200.0), FailoverState::OnBattery);
        ctl.refuel_generator(500.0);
        assert_eq!(ctl.generator().fuel_level_percent(), 100.0);
    }

    #[test]
    fn test_invalid_load_blacks_out_without_draining() {
        let mut ctl = controller(true, 90.0, 90.0);
        assert_eq!(ctl.update(f64::NAN), FailoverState::Blackout);
        assert_eq!(ctl.update(-2000.0), FailoverState::Blackout);
        assert_eq!(ctl.mains().rated_output_watts(), 5000.0);
        assert_eq!(ctl.battery().charge_level_percent(), 90.0);
        assert_eq!(ctl.generator().fuel_level_percent(), 90.0);
        assert_eq!(ctl.update(100.0), FailoverState::OnMains);
    }

    #[test]
    fn test_state_parse_and_display() {
        assert_eq!(FailoverState::OnGenerator.to_string(), "OnGenerator");
        assert_eq!("blackout".parse::<FailoverState>().unwrap(), FailoverState::Blackout);
        assert!(!FailoverState::Blackout.is_powered());
    }
}
