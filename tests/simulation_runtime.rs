//! Simulation Runtime Tests
//!
//! Runs the producer tasks on paused tokio time so random sleeps resolve
//! instantly.

use emergency_power_supply::config::Config;
use emergency_power_supply::controller::FailoverState;
use emergency_power_supply::simulation::{
    run_consumer, Dashboard, DashboardHandle, Simulation, SimulationError, SimulationEvent,
};

fn seeded_config() -> Config {
    let mut cfg = Config::default();
    cfg.simulation.seed = Some(1234);
    cfg.simulation.tick_min_ms = 100;
    cfg.simulation.tick_max_ms = 300;
    cfg.telemetry.devices = vec!["mains-feed".into(), "ups-a".into()];
    cfg.telemetry.history_capacity = 10;
    cfg.telemetry.event_log_capacity = 5;
    cfg
}

#[tokio::test(start_paused = true)]
async fn produces_readings_and_power_snapshots() {
    let cfg = seeded_config();
    let (simulation, mut events) = Simulation::spawn(&cfg);

    let mut readings = 0;
    let mut snapshots = 0;
    while readings < 20 || snapshots < 5 {
        match events.recv().await.expect("producers alive") {
            SimulationEvent::Reading(reading) => {
                assert!(cfg.telemetry.devices.contains(&reading.device_id));
                readings += 1;
            }
            SimulationEvent::Power(snapshot) => {
                assert!(snapshot.load_w >= cfg.load.min_w && snapshot.load_w <= cfg.load.max_w);
                snapshots += 1;
            }
        }
    }

    simulation.shutdown().await;
    // Every sender is gone once the producers have exited
    while events.recv().await.is_some() {}
}

#[tokio::test(start_paused = true)]
async fn generator_scenario_through_the_power_task() {
    let mut cfg = seeded_config();
    cfg.load.min_w = 300.0;
    cfg.load.max_w = 300.0;
    cfg.mains.initially_available = false;
    cfg.mains.restore_probability = 0.0;
    cfg.battery.initial_charge_percent = 0.0;
    cfg.generator.initial_fuel_percent = 50.0;

    let (simulation, mut events) = Simulation::spawn(&cfg);

    let snapshot = loop {
        if let Some(SimulationEvent::Power(snapshot)) = events.recv().await {
            break snapshot;
        }
    };
    assert_eq!(snapshot.state, FailoverState::OnGenerator);
    assert!((snapshot.generator_fuel_percent - 47.0).abs() < 1e-9);
    assert!(snapshot.status.contains("Generator"));
    assert_eq!(snapshot.line_loss_w, 0.0);

    simulation.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn recharge_command_moves_load_to_battery() {
    let mut cfg = seeded_config();
    cfg.load.min_w = 200.0;
    cfg.load.max_w = 200.0;
    cfg.mains.initially_available = false;
    cfg.mains.restore_probability = 0.0;
    cfg.battery.initial_charge_percent = 0.0;
    cfg.generator.initial_fuel_percent = 0.0;

    let (simulation, mut events) = Simulation::spawn(&cfg);

    let first = loop {
        if let Some(SimulationEvent::Power(snapshot)) = events.recv().await {
            break snapshot;
        }
    };
    assert_eq!(first.state, FailoverState::Blackout);
    assert!(first.ledger.unserved_kwh > 0.0);

    simulation.recharge_battery(50.0).unwrap();

    let next = loop {
        if let Some(SimulationEvent::Power(snapshot)) = events.recv().await {
            break snapshot;
        }
    };
    assert_eq!(next.state, FailoverState::OnBattery);
    assert!((next.battery_charge_percent - 49.0).abs() < 1e-9);

    simulation.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dashboard_consumer_caps_history() {
    let cfg = seeded_config();
    let (simulation, events) = Simulation::spawn(&cfg);
    let dashboard = DashboardHandle::new(Dashboard::from_config(&cfg.telemetry));
    let consumer = tokio::spawn(run_consumer(events, dashboard.clone()));

    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    simulation.shutdown().await;
    let applied = consumer.await.unwrap();

    let state = dashboard.snapshot();
    assert!(applied > 10);
    assert_eq!(state.readings().len(), 10);
    assert!(state.event_log().len() <= 5);
    assert!(state.event_log().iter().all(|r| !r.status.is_normal()));
    assert!(state.power().is_some());
}

#[tokio::test(start_paused = true)]
async fn commands_fail_after_shutdown() {
    let cfg = seeded_config();
    let (simulation, _events) = Simulation::spawn(&cfg);
    let token = simulation.token();
    token.cancel();

    // Give the power task a chance to observe cancellation and drop its receiver
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(matches!(
        simulation.refuel_generator(10.0),
        Err(SimulationError::PowerTaskStopped)
    ));
    simulation.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_producers() {
    let cfg = seeded_config();
    let (simulation, mut events) = Simulation::spawn(&cfg);
    let token = simulation.token();
    assert!(events.recv().await.is_some());

    drop(simulation);
    assert!(token.is_cancelled());

    // Drain whatever was queued before cancellation, then the channel closes
    let drained = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while events.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok(), "producers kept running after the handle was dropped");
}
