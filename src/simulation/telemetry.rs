//! # Telemetry Generation
//!
//! Produces uniformly random voltage/current/temperature readings for the
//! simulated devices and classifies each one as it is built.

use chrono::Utc;
use futures::Stream;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{SimulationEvent, TickInterval};
use crate::config::TelemetryConfig;
use crate::domain::{ClassificationThresholds, TelemetryReading};

/// Uniform sample in `[min, max]`, collapsing to `min` for an empty range.
pub(crate) fn sample_range(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Random reading source for a fixed set of devices
#[derive(Debug, Clone)]
pub struct TelemetryGenerator {
    devices: Vec<String>,
    voltage_v: (f64, f64),
    current_a: (f64, f64),
    temperature_c: (f64, f64),
    thresholds: ClassificationThresholds,
    seed: Option<u64>,
    rng: StdRng,
}

impl TelemetryGenerator {
    pub fn new(config: &TelemetryConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            devices: config.devices.clone(),
            voltage_v: (config.voltage_min_v, config.voltage_max_v),
            current_a: (config.current_min_a, config.current_max_a),
            temperature_c: (config.temperature_min_c, config.temperature_max_c),
            thresholds: config.thresholds,
            seed,
            rng,
        }
    }

    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    pub fn thresholds(&self) -> &ClassificationThresholds {
        &self.thresholds
    }

    pub fn generate_for(&mut self, device_id: &str) -> TelemetryReading {
        let voltage = sample_range(&mut self.rng, self.voltage_v.0, self.voltage_v.1);
        let current = sample_range(&mut self.rng, self.current_a.0, self.current_a.1);
        let temperature = sample_range(&mut self.rng, self.temperature_c.0, self.temperature_c.1);
        TelemetryReading::new(
            device_id,
            Utc::now(),
            voltage,
            current,
            temperature,
            &self.thresholds,
        )
    }

    /// One reading per known device, in device order.
    pub fn generate_once(&mut self) -> Vec<TelemetryReading> {
        let devices = self.devices.clone();
        devices.iter().map(|id| self.generate_for(id)).collect()
    }

    /// Split into one single-device generator per device.
    ///
    /// Seeded generators hand each device a distinct derived seed so runs
    /// stay reproducible.
    pub fn split_per_device(self) -> Vec<TelemetryGenerator> {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, device)| {
                let seed = self.seed.map(|s| s.wrapping_add(i as u64 + 1));
                let rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                TelemetryGenerator {
                    devices: vec![device.clone()],
                    seed,
                    rng,
                    ..self.clone()
                }
            })
            .collect()
    }

    /// Endless batches of readings, one batch per random interval, until
    /// `token` is cancelled.
    pub fn into_stream(
        self,
        interval: TickInterval,
        token: CancellationToken,
    ) -> impl Stream<Item = Vec<TelemetryReading>> {
        futures::stream::unfold(self, move |mut generator| {
            let token = token.clone();
            async move {
                let delay = interval.sample(&mut generator.rng);
                tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    _ = tokio::time::sleep(delay) => {
                        let batch = generator.generate_once();
                        Some((batch, generator))
                    }
                }
            }
        })
    }

    /// Producer loop: publish readings until cancelled or the consumer is gone.
    pub async fn run(
        mut self,
        interval: TickInterval,
        events: UnboundedSender<SimulationEvent>,
        token: CancellationToken,
    ) {
        debug!(devices = ?self.devices, "telemetry producer started");
        loop {
            let delay = interval.sample(&mut self.rng);
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            for reading in self.generate_once() {
                if !reading.status.is_normal() {
                    debug!(
                        device = %reading.device_id,
                        status = %reading.status,
                        voltage_v = reading.voltage_v,
                        current_a = reading.current_a,
                        "abnormal reading"
                    );
                }
                if events.send(SimulationEvent::Reading(reading)).is_err() {
                    debug!("event consumer dropped, telemetry producer exiting");
                    return;
                }
            }
        }
        debug!(devices = ?self.devices, "telemetry producer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    fn config() -> TelemetryConfig {
        TelemetryConfig {
            devices: vec!["mains-feed".into(), "ups-a".into()],
            ..TelemetryConfig::default()
        }
    }

    #[test]
    fn test_generate_once_covers_every_device_in_range() {
        let mut generator = TelemetryGenerator::new(&config(), Some(7));
        for _ in 0..50 {
            let batch = generator.generate_once();
            let ids: Vec<_> = batch.iter().map(|r| r.device_id.as_str()).collect();
            assert_eq!(ids, vec!["mains-feed", "ups-a"]);
            for reading in batch {
                assert!((210.0..=250.0).contains(&reading.voltage_v));
                assert!((0.0..=15.0).contains(&reading.current_a));
                assert!((20.0..=60.0).contains(&reading.temperature_c));
            }
        }
    }

    #[test]
    fn test_status_matches_classifier() {
        let mut generator = TelemetryGenerator::new(&config(), Some(11));
        let limits = *generator.thresholds();
        for reading in (0..20).flat_map(|_| generator.generate_once()) {
            let expected = crate::domain::classify(reading.voltage_v, reading.current_a, &limits);
            assert_eq!(reading.status, expected);
        }
    }

    #[test]
    fn test_seeded_generators_repeat() {
        let mut a = TelemetryGenerator::new(&config(), Some(42));
        let mut b = TelemetryGenerator::new(&config(), Some(42));
        let va: Vec<_> = a.generate_once().into_iter().map(|r| r.voltage_v).collect();
        let vb: Vec<_> = b.generate_once().into_iter().map(|r| r.voltage_v).collect();
        assert_eq!(va, vb);
    }

    #[test]
    fn test_fixed_range_collapses() {
        let cfg = TelemetryConfig {
            voltage_min_v: 230.0,
            voltage_max_v: 230.0,
            current_min_a: 5.0,
            current_max_a: 5.0,
            ..config()
        };
        let mut generator = TelemetryGenerator::new(&cfg, None);
        let reading = generator.generate_for("ups-a");
        assert_eq!(reading.voltage_v, 230.0);
        assert_eq!(reading.current_a, 5.0);
    }

    #[test]
    fn test_split_per_device() {
        let parts = TelemetryGenerator::new(&config(), Some(1)).split_per_device();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].devices(), ["mains-feed".to_string()]);
        assert_eq!(parts[1].devices(), ["ups-a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_on_cancel() {
        let token = CancellationToken::new();
        let interval = TickInterval::new(Duration::from_millis(100), Duration::from_millis(200));
        let stream = TelemetryGenerator::new(&config(), Some(3)).into_stream(interval, token.clone());
        tokio::pin!(stream);

        let first = stream.next().await.unwrap();
        assert_eq!(first.len(), 2);
        let second = stream.next().await.unwrap();
        assert_eq!(second.len(), 2);

        token.cancel();
        assert!(stream.next().await.is_none());
    }
}
