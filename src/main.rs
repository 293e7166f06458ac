use anyhow::Result;
use emergency_power_supply::simulation::{run_consumer, Dashboard, DashboardHandle, Simulation};
use emergency_power_supply::{config, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    if cfg.simulation.seed.is_some() {
        info!(seed = ?cfg.simulation.seed, "running with fixed seed");
    }

    let (simulation, events) = Simulation::spawn(&cfg);
    let dashboard = DashboardHandle::new(Dashboard::from_config(&cfg.telemetry));
    let consumer = tokio::spawn(run_consumer(events, dashboard.clone()));

    let token = simulation.token();
    let reporter_dashboard = dashboard.clone();
    let report_every = std::time::Duration::from_secs(cfg.simulation.report_seconds.max(1));
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval(report_every);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    let summary = reporter_dashboard.summary();
                    match serde_json::to_string(&summary) {
                        Ok(json) => info!(dashboard = %json, "dashboard report"),
                        Err(e) => warn!(error = %e, "failed to encode dashboard report"),
                    }
                }
            }
        }
    });

    telemetry::shutdown_signal().await;

    simulation.shutdown().await;
    reporter.await?;
    let applied = consumer.await?;

    let summary = dashboard.summary();
    info!(
        events = applied,
        state = ?summary.state,
        status = ?summary.status,
        "shutdown complete"
    );
    Ok(())
}
