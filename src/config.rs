use anyhow::{ensure, Result};
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::path::Path;

use crate::domain::ClassificationThresholds;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub load: LoadConfig,
    pub mains: MainsConfig,
    pub battery: BatteryConfig,
    pub generator: GeneratorConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Producers sleep a uniformly random interval in this range between ticks
    pub tick_min_ms: u64,
    pub tick_max_ms: u64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    pub report_seconds: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_min_ms: 1000,
            tick_max_ms: 3000,
            seed: None,
            report_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub min_w: f64,
    pub max_w: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self { min_w: 100.0, max_w: 1500.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MainsConfig {
    pub rated_output_w: f64,
    pub initially_available: bool,
    /// Chance per power tick that a live grid drops out
    pub outage_probability: f64,
    /// Chance per power tick that a dead grid comes back
    pub restore_probability: f64,
    pub nominal_voltage_v: f64,
    pub line_resistance_ohm: f64,
}

impl Default for MainsConfig {
    fn default() -> Self {
        Self {
            rated_output_w: 5000.0,
            initially_available: true,
            outage_probability: 0.1,
            restore_probability: 0.3,
            nominal_voltage_v: 230.0,
            line_resistance_ohm: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    pub capacity_wh: f64,
    pub initial_charge_percent: f64,
    pub rated_output_w: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_wh: 2400.0,
            initial_charge_percent: 100.0,
            rated_output_w: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub initial_fuel_percent: f64,
    pub rated_output_w: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            initial_fuel_percent: 100.0,
            rated_output_w: 4000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub devices: Vec<String>,
    pub voltage_min_v: f64,
    pub voltage_max_v: f64,
    pub current_min_a: f64,
    pub current_max_a: f64,
    pub temperature_min_c: f64,
    pub temperature_max_c: f64,
    pub thresholds: ClassificationThresholds,
    pub history_capacity: usize,
    pub event_log_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            devices: vec![
                "mains-feed".to_string(),
                "battery-bank".to_string(),
                "generator-1".to_string(),
                "ups-a".to_string(),
            ],
            voltage_min_v: 210.0,
            voltage_max_v: 250.0,
            current_min_a: 0.0,
            current_max_a: 15.0,
            temperature_min_c: 20.0,
            temperature_max_c: 60.0,
            thresholds: ClassificationThresholds::default(),
            history_capacity: 100,
            event_log_capacity: 100,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Missing files are skipped; `EPS__SECTION__KEY` variables override.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("EPS__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        ensure!(sim.tick_min_ms > 0, "simulation.tick_min_ms must be positive");
        ensure!(
            sim.tick_min_ms <= sim.tick_max_ms,
            "simulation tick range is inverted ({} > {})",
            sim.tick_min_ms,
            sim.tick_max_ms
        );

        ensure!(
            self.load.min_w >= 0.0 && self.load.min_w <= self.load.max_w,
            "load range must satisfy 0 <= min_w <= max_w"
        );

        let mains = &self.mains;
        ensure!(mains.rated_output_w >= 0.0, "mains.rated_output_w must not be negative");
        ensure!(is_probability(mains.outage_probability), "mains.outage_probability must be in [0, 1]");
        ensure!(is_probability(mains.restore_probability), "mains.restore_probability must be in [0, 1]");
        ensure!(mains.nominal_voltage_v > 0.0, "mains.nominal_voltage_v must be positive");

        ensure!(self.battery.capacity_wh > 0.0, "battery.capacity_wh must be positive");
        ensure!(is_percent(self.battery.initial_charge_percent), "battery.initial_charge_percent must be in [0, 100]");
        ensure!(self.battery.rated_output_w >= 0.0, "battery.rated_output_w must not be negative");

        ensure!(is_percent(self.generator.initial_fuel_percent), "generator.initial_fuel_percent must be in [0, 100]");
        ensure!(self.generator.rated_output_w >= 0.0, "generator.rated_output_w must not be negative");

        let tel = &self.telemetry;
        ensure!(!tel.devices.is_empty(), "telemetry.devices must list at least one device");
        ensure!(tel.voltage_min_v <= tel.voltage_max_v, "telemetry voltage range is inverted");
        ensure!(tel.current_min_a <= tel.current_max_a, "telemetry current range is inverted");
        ensure!(tel.temperature_min_c <= tel.temperature_max_c, "telemetry temperature range is inverted");
        ensure!(tel.history_capacity > 0, "telemetry.history_capacity must be positive");
        ensure!(tel.event_log_capacity > 0, "telemetry.event_log_capacity must be positive");
        Ok(())
    }
}

fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}

fn is_percent(p: f64) -> bool {
    (0.0..=100.0).contains(&p)
}
