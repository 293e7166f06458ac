//! # Simulation Runtime
//!
//! Periodic producers feeding a single consumer.
//!
//! ## Components
//!
//! - **Telemetry**: one task per device, each emitting a classified reading
//!   after every random sleep
//! - **Power**: one task owning the failover controller, ticking on random
//!   sleeps and applying user commands between ticks
//! - **Dashboard**: the consumer side, holding capped reading history and the
//!   non-normal event log
//!
//! Every producer publishes into one unbounded, ordered channel. Capping
//! happens in the [`Dashboard`], never in the channel. Stopping cancels a
//! shared [`CancellationToken`]; producers check it between ticks.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use emergency_power_supply::config::Config;
//! use emergency_power_supply::simulation::{run_consumer, Dashboard, DashboardHandle, Simulation};
//!
//! # async fn demo() {
//! let cfg = Config::default();
//! let (simulation, events) = Simulation::spawn(&cfg);
//! let dashboard = DashboardHandle::new(Dashboard::from_config(&cfg.telemetry));
//! let consumer = tokio::spawn(run_consumer(events, dashboard.clone()));
//!
//! simulation.refuel_generator(25.0).ok();
//! simulation.shutdown().await;
//! consumer.await.ok();
//! # }
//! ```

pub mod dashboard;
pub mod power;
pub mod telemetry;

use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use dashboard::{run_consumer, Dashboard, DashboardHandle, DashboardSummary};
pub use power::{PowerCommand, PowerTask};
pub use telemetry::TelemetryGenerator;

use crate::config::Config;
use crate::controller::PowerSnapshot;
use crate::domain::TelemetryReading;

/// Everything a producer can publish
#[derive(Debug, Clone)]
pub enum SimulationEvent {
    Reading(TelemetryReading),
    Power(PowerSnapshot),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("power task is not running")]
    PowerTaskStopped,
}

/// Uniformly random sleep between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInterval {
    min: Duration,
    max: Duration,
}

impl TickInterval {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// Handle over the running producer tasks
///
/// Dropping the handle cancels every task. Use [`Self::shutdown`] to also
/// wait for them to finish.
pub struct Simulation {
    token: CancellationToken,
    commands: UnboundedSender<PowerCommand>,
    tasks: Vec<JoinHandle<()>>,
}

impl Simulation {
    /// Spawn the power task and one telemetry task per configured device.
    ///
    /// Must be called inside a tokio runtime. The returned receiver is the
    /// only consumer of the events.
    pub fn spawn(cfg: &Config) -> (Self, UnboundedReceiver<SimulationEvent>) {
        Self::spawn_with(cfg, PowerTask::from_config(cfg))
    }

    /// Like [`Self::spawn`] but with a caller-built power task.
    pub fn spawn_with(cfg: &Config, power: PowerTask) -> (Self, UnboundedReceiver<SimulationEvent>) {
        let token = CancellationToken::new();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let interval = TickInterval::from_millis(cfg.simulation.tick_min_ms, cfg.simulation.tick_max_ms);

        let mut tasks = Vec::with_capacity(cfg.telemetry.devices.len() + 1);
        tasks.push(tokio::spawn(power.run(
            interval,
            command_rx,
            event_tx.clone(),
            token.clone(),
        )));

        let generators = TelemetryGenerator::new(&cfg.telemetry, cfg.simulation.seed).split_per_device();
        for generator in generators {
            tasks.push(tokio::spawn(generator.run(interval, event_tx.clone(), token.clone())));
        }

        info!(
            devices = cfg.telemetry.devices.len(),
            tick_min_ms = cfg.simulation.tick_min_ms,
            tick_max_ms = cfg.simulation.tick_max_ms,
            "simulation started"
        );

        (
            Self {
                token,
                commands: command_tx,
                tasks,
            },
            event_rx,
        )
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn recharge_battery(&self, amount_percent: f64) -> Result<(), SimulationError> {
        self.send(PowerCommand::RechargeBattery(amount_percent))
    }

    pub fn refuel_generator(&self, amount_percent: f64) -> Result<(), SimulationError> {
        self.send(PowerCommand::RefuelGenerator(amount_percent))
    }

    pub fn set_mains_available(&self, available: bool) -> Result<(), SimulationError> {
        self.send(PowerCommand::SetMainsAvailable(available))
    }

    fn send(&self, command: PowerCommand) -> Result<(), SimulationError> {
        self.commands
            .send(command)
            .map_err(|_| SimulationError::PowerTaskStopped)
    }

    /// Cancel every producer and wait for them to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "simulation task ended abnormally");
            }
        }
        info!("simulation stopped");
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_tick_interval_in_range() {
        let interval = TickInterval::from_millis(100, 300);
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let d = interval.sample(&mut rng);
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(300));
        }
    }

    #[test]
    fn test_tick_interval_normalizes_order() {
        let interval = TickInterval::from_millis(500, 200);
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let d = interval.sample(&mut rng);
        assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(500));
    }

    #[test]
    fn test_fixed_interval() {
        let interval = TickInterval::from_millis(250, 250);
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        assert_eq!(interval.sample(&mut rng), Duration::from_millis(250));
    }
}
