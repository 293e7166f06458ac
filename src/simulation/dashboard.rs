use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use super::SimulationEvent;
use crate::config::TelemetryConfig;
use crate::controller::{FailoverState, PowerSnapshot};
use crate::domain::{ReadingStatus, TelemetryReading};
use crate::utils::BoundedHistory;

/// Consumer-side view of the simulation
#[derive(Debug, Clone)]
pub struct Dashboard {
    /// Chronological, oldest evicted first
    readings: BoundedHistory<TelemetryReading>,
    /// Non-normal readings, most recent first
    event_log: BoundedHistory<TelemetryReading>,
    power: Option<PowerSnapshot>,
    readings_seen: u64,
}

/// Compact report of the dashboard, suitable for logging
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub state: Option<FailoverState>,
    pub status: Option<String>,
    pub load_w: Option<f64>,
    pub readings_seen: u64,
    pub readings_held: usize,
    pub warnings_held: usize,
    pub criticals_held: usize,
    pub latest_event: Option<String>,
}

impl Dashboard {
    pub fn new(history_capacity: usize, event_log_capacity: usize) -> Self {
        Self {
            readings: BoundedHistory::new(history_capacity),
            event_log: BoundedHistory::new(event_log_capacity),
            power: None,
            readings_seen: 0,
        }
    }

    pub fn from_config(cfg: &TelemetryConfig) -> Self {
        Self::new(cfg.history_capacity, cfg.event_log_capacity)
    }

    pub fn apply(&mut self, event: SimulationEvent) {
        match event {
            SimulationEvent::Reading(reading) => {
                self.readings_seen += 1;
                if !reading.status.is_normal() {
                    self.event_log.push_front(reading.clone());
                }
                self.readings.push_back(reading);
            }
            SimulationEvent::Power(snapshot) => self.power = Some(snapshot),
        }
    }

    pub fn readings(&self) -> &BoundedHistory<TelemetryReading> {
        &self.readings
    }

    pub fn event_log(&self) -> &BoundedHistory<TelemetryReading> {
        &self.event_log
    }

    pub fn power(&self) -> Option<&PowerSnapshot> {
        self.power.as_ref()
    }

    pub fn summary(&self) -> DashboardSummary {
        let count = |status: ReadingStatus| self.event_log.iter().filter(|r| r.status == status).count();
        DashboardSummary {
            state: self.power.as_ref().map(|p| p.state),
            status: self.power.as_ref().map(|p| p.status.clone()),
            load_w: self.power.as_ref().map(|p| p.load_w),
            readings_seen: self.readings_seen,
            readings_held: self.readings.len(),
            warnings_held: count(ReadingStatus::Warning),
            criticals_held: count(ReadingStatus::Critical),
            latest_event: self
                .event_log
                .latest()
                .map(|r| format!("{} {} ({:.1} V, {:.1} A)", r.device_id, r.status, r.voltage_v, r.current_a)),
        }
    }
}

/// Shared read access to the dashboard; only [`run_consumer`] writes.
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    inner: Arc<RwLock<Dashboard>>,
}

impl DashboardHandle {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            inner: Arc::new(RwLock::new(dashboard)),
        }
    }

    pub fn apply(&self, event: SimulationEvent) {
        self.inner.write().apply(event);
    }

    pub fn summary(&self) -> DashboardSummary {
        self.inner.read().summary()
    }

    /// Clone of the current dashboard state.
    pub fn snapshot(&self) -> Dashboard {
        self.inner.read().clone()
    }
}

/// Drain events in order until every producer has dropped its sender.
/// Returns the number of events applied.
pub async fn run_consumer(mut events: UnboundedReceiver<SimulationEvent>, dashboard: DashboardHandle) -> u64 {
    let mut applied = 0;
    while let Some(event) = events.recv().await {
        dashboard.apply(event);
        applied += 1;
    }
    debug!(applied, "event consumer finished");
    applied
}
