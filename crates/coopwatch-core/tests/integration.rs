//! Integration tests for coopwatch-core
//!
//! Exercises the full in-process stack: store session, typed farm client,
//! subscriptions, and the background simulator, wired together the way the
//! dashboard wires them.

use std::time::Duration;

use futures::StreamExt;
use tokio::time::timeout;

use coopwatch_core::farm::{self, FarmClient};
use coopwatch_core::simulator::{Simulator, SimulatorOptions};
use coopwatch_core::store::Store;
use coopwatch_core::types::{AlertSeverity, EquipmentStatus};
use coopwatch_core::Error;

/// Upper bound for receiving a snapshot that should already be in flight.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn seeded_store_serves_all_four_subscriptions() {
    let client = FarmClient::new(Store::new());
    client.seed_defaults().await.unwrap();

    let mut sensor = client.subscribe_sensor().await.unwrap();
    let mut gas = client.subscribe_gas().await.unwrap();
    let mut equipment = client.subscribe_equipment().await.unwrap();
    let mut alerts = client.subscribe_alerts().await.unwrap();

    let sample = timeout(RECV_TIMEOUT, sensor.next()).await.unwrap().unwrap();
    assert!((sample.temperature - 24.5).abs() < f32::EPSILON);

    let gas_sample = timeout(RECV_TIMEOUT, gas.next()).await.unwrap().unwrap();
    assert!((gas_sample.co2 - 650.0).abs() < f32::EPSILON);

    let units = timeout(RECV_TIMEOUT, equipment.next()).await.unwrap().unwrap();
    assert_eq!(units.len(), 4);

    let events = timeout(RECV_TIMEOUT, alerts.next()).await.unwrap().unwrap();
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn night_mode_reaches_equipment_subscribers() {
    let client = FarmClient::new(Store::new());
    client.seed_defaults().await.unwrap();

    let mut equipment = client.subscribe_equipment().await.unwrap();
    // Initial snapshot.
    timeout(RECV_TIMEOUT, equipment.next()).await.unwrap().unwrap();

    client.set_night_mode().await.unwrap();

    // The preset lands as several writes; wait until the last one (heating
    // power 70) is visible.
    let units = loop {
        let units = timeout(RECV_TIMEOUT, equipment.next()).await.unwrap().unwrap();
        let heating = units
            .iter()
            .find(|u| u.id == farm::HEATING_UNIT)
            .unwrap()
            .clone();
        if heating.power == 70 {
            break units;
        }
    };

    let lighting = units.iter().find(|u| u.id == farm::LIGHTING_UNIT).unwrap();
    assert_eq!(lighting.status, EquipmentStatus::Inactive);
    assert_eq!(lighting.power, 0);
    let ventilation = units
        .iter()
        .find(|u| u.id == farm::VENTILATION_UNIT)
        .unwrap();
    assert_eq!(ventilation.power, 50);
}

#[tokio::test]
async fn alert_lifecycle_push_observe_dismiss() {
    let client = FarmClient::new(Store::new());
    client.seed_defaults().await.unwrap();

    let mut alerts = client.subscribe_alerts().await.unwrap();
    assert_eq!(
        timeout(RECV_TIMEOUT, alerts.next()).await.unwrap().unwrap().len(),
        2
    );

    let key = client
        .push_alert(AlertSeverity::Error, "Drinker line pressure lost", "Building C")
        .await
        .unwrap();
    let snapshot = timeout(RECV_TIMEOUT, alerts.next()).await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[0].id, key);
    assert_eq!(snapshot[0].severity, AlertSeverity::Error);

    client.remove_alert(&key).await.unwrap();
    let snapshot = timeout(RECV_TIMEOUT, alerts.next()).await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|a| a.id != key));
}

#[tokio::test]
async fn one_listener_per_path_across_clients() {
    let store = Store::new();
    let a = FarmClient::new(store.clone());
    let b = FarmClient::new(store);
    a.seed_defaults().await.unwrap();

    let sub = a.subscribe_sensor().await.unwrap();
    // A second client on the same session contends for the same path.
    assert!(matches!(
        b.subscribe_sensor().await,
        Err(Error::ListenerActive { .. })
    ));

    drop(sub);
    b.subscribe_sensor().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn seeded_simulator_drives_the_dashboard_paths() {
    let client = FarmClient::new(Store::new());
    client.seed_defaults().await.unwrap();

    let mut sensor = client.subscribe_sensor().await.unwrap();
    let mut gas = client.subscribe_gas().await.unwrap();
    // Drain the seeded snapshots.
    sensor.next().await.unwrap();
    gas.next().await.unwrap();

    let options = SimulatorOptions::default()
        .with_seed(1234)
        .with_tick_interval(Duration::from_secs(5))
        .with_alert_probability(0.0);
    let handle = Simulator::new(client.clone(), options).unwrap().spawn();

    let mut temperatures = Vec::new();
    for _ in 0..3 {
        let sample = sensor.next().await.unwrap();
        assert!((23.5..=25.5).contains(&sample.temperature));
        temperatures.push(sample.temperature);

        let gas_sample = gas.next().await.unwrap();
        assert!(gas_sample.co >= 0.0);
    }
    // Ticks produce fresh draws, not a frozen value.
    assert!(temperatures.windows(2).any(|w| w[0] != w[1]));

    handle.stop();
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(!handle.is_running());
}
