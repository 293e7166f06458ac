//! # Power Task
//!
//! Actor that owns the [`FailoverController`]. Grid flakiness and load are
//! random here; the controller itself only sees the injected values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::telemetry::sample_range;
use super::{SimulationEvent, TickInterval};
use crate::config::{Config, LoadConfig};
use crate::controller::{EnergyLedger, FailoverController, PowerSnapshot};
use crate::domain::{Battery, Generator, Mains};
use crate::formulas;

/// User actions forwarded to the power task
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PowerCommand {
    RechargeBattery(f64),
    RefuelGenerator(f64),
    /// Overrides the grid flag until the next random outage/restore roll
    SetMainsAvailable(bool),
}

pub struct PowerTask {
    controller: FailoverController,
    ledger: EnergyLedger,
    load: LoadConfig,
    outage_probability: f64,
    restore_probability: f64,
    nominal_voltage_v: f64,
    line_resistance_ohm: f64,
    rng: StdRng,
}

impl PowerTask {
    pub fn new(controller: FailoverController, cfg: &Config) -> Self {
        let rng = match cfg.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            controller,
            ledger: EnergyLedger::default(),
            load: cfg.load.clone(),
            outage_probability: cfg.mains.outage_probability,
            restore_probability: cfg.mains.restore_probability,
            nominal_voltage_v: cfg.mains.nominal_voltage_v,
            line_resistance_ohm: cfg.mains.line_resistance_ohm,
            rng,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let mut mains = Mains::new(cfg.mains.rated_output_w);
        mains.set_available(cfg.mains.initially_available);
        let battery = Battery::new(
            cfg.battery.capacity_wh,
            cfg.battery.initial_charge_percent,
            cfg.battery.rated_output_w,
        );
        let generator = Generator::new(cfg.generator.initial_fuel_percent, cfg.generator.rated_output_w);
        Self::new(FailoverController::new(mains, battery, generator), cfg)
    }

    pub fn controller(&self) -> &FailoverController {
        &self.controller
    }

    pub fn ledger(&self) -> &EnergyLedger {
        &self.ledger
    }

    pub fn apply(&mut self, command: PowerCommand) {
        match command {
            PowerCommand::RechargeBattery(amount) => self.controller.recharge_battery(amount),
            PowerCommand::RefuelGenerator(amount) => self.controller.refuel_generator(amount),
            PowerCommand::SetMainsAvailable(available) => self.controller.set_mains_available(available),
        }
    }

    /// Roll the grid, draw a load, run the controller for one tick of `elapsed`.
    pub fn tick(&mut self, elapsed: Duration) -> PowerSnapshot {
        let mains_up = self.roll_grid(self.controller.mains().is_available());
        let load_w = sample_range(&mut self.rng, self.load.min_w, self.load.max_w);
        self.step(load_w, mains_up, elapsed)
    }

    /// Deterministic tick with the grid flag and load supplied by the caller.
    pub fn step(&mut self, load_w: f64, mains_available: bool, elapsed: Duration) -> PowerSnapshot {
        self.controller.set_mains_available(mains_available);
        let state = self.controller.update(load_w);

        let hours = elapsed.as_secs_f64() / 3600.0;
        self.ledger.record(state, load_w, hours);

        let current_a = load_w / self.nominal_voltage_v;
        let line_loss_w = formulas::line_loss_watts(current_a, self.line_resistance_ohm);
        PowerSnapshot::capture(&self.controller, &self.ledger, line_loss_w)
    }

    fn roll_grid(&mut self, currently_up: bool) -> bool {
        if currently_up {
            !self.rng.gen_bool(self.outage_probability)
        } else {
            self.rng.gen_bool(self.restore_probability)
        }
    }

    /// Tick on random intervals until cancelled or the consumer is gone.
    /// Commands are applied as they arrive, between ticks.
    pub async fn run(
        mut self,
        interval: TickInterval,
        mut commands: UnboundedReceiver<PowerCommand>,
        events: UnboundedSender<SimulationEvent>,
        token: CancellationToken,
    ) {
        info!(status = %self.controller.system_status(), "power task started");
        loop {
            let delay = interval.sample(&mut self.rng);
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        info!(transitions = self.controller.transitions(), "power task stopped");
                        return;
                    }
                    Some(command) = commands.recv() => {
                        debug!(?command, "power command");
                        self.apply(command);
                    }
                    _ = &mut sleep => break,
                }
            }

            let snapshot = self.tick(delay);
            if events.send(SimulationEvent::Power(snapshot)).is_err() {
                debug!("event consumer dropped, power task exiting");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::FailoverState;

    fn cfg() -> Config {
        let mut cfg = Config::default();
        cfg.simulation.seed = Some(9);
        cfg
    }

    #[test]
    fn test_step_records_energy_and_line_loss() {
        let mut task = PowerTask::from_config(&cfg());
        let snapshot = task.step(460.0, true, Duration::from_secs(3600));

        assert_eq!(snapshot.state, FailoverState::OnMains);
        assert!((task.ledger().mains_kwh - 0.46).abs() < 1e-12);
        // 460W / 230V = 2A, 2A^2 * 0.5 ohm = 2W
        assert!((snapshot.line_loss_w - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_commands_reach_controller() {
        let mut cfg = cfg();
        cfg.battery.initial_charge_percent = 10.0;
        cfg.generator.initial_fuel_percent = 10.0;
        let mut task = PowerTask::from_config(&cfg);

        task.apply(PowerCommand::RechargeBattery(30.0));
        task.apply(PowerCommand::RefuelGenerator(200.0));
        task.apply(PowerCommand::SetMainsAvailable(false));

        assert_eq!(task.controller().battery().charge_level_percent(), 40.0);
        assert_eq!(task.controller().generator().fuel_level_percent(), 100.0);
        assert!(!task.controller().mains().is_available());
    }

    #[test]
    fn test_grid_never_fails_with_zero_outage_probability() {
        let mut cfg = cfg();
        cfg.mains.outage_probability = 0.0;
        let mut task = PowerTask::from_config(&cfg);
        for _ in 0..100 {
            let snapshot = task.tick(Duration::from_secs(1));
            assert_eq!(snapshot.state, FailoverState::OnMains);
            assert!((100.0..=1500.0).contains(&snapshot.load_w));
        }
    }

    #[test]
    fn test_dead_grid_stays_dead_without_restore() {
        let mut cfg = cfg();
        cfg.mains.initially_available = false;
        cfg.mains.restore_probability = 0.0;
        let mut task = PowerTask::from_config(&cfg);
        for _ in 0..20 {
            let snapshot = task.tick(Duration::from_secs(1));
            assert!(!snapshot.mains_available);
            assert_ne!(snapshot.state, FailoverState::OnMains);
        }
    }
}
