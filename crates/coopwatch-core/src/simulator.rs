//! Background sensor simulator.
//!
//! Generates plausible farm telemetry when no hardware is attached: on each
//! tick it writes a perturbed environmental sample and gas sample through the
//! [`FarmClient`], and occasionally raises a random alert. Perturbation is
//! uniform around fixed baselines with clamping, not a random walk, so
//! readings never drift away from the plausible band no matter how long the
//! simulator runs.
//!
//! The generator functions are pure over an [`rand::Rng`], and the RNG can
//! be seeded through [`SimulatorOptions::seed`] for reproducible runs.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use coopwatch_types::{AlertEvent, AlertSeverity, GasSample, SensorSample};

use crate::error::{Error, Result};
use crate::farm::FarmClient;

/// Simulated alert messages, paired with plausible severities at draw time.
const ALERT_MESSAGES: [&str; 5] = [
    "Temperature above threshold",
    "High humidity detected",
    "Sudden drop in activity",
    "Ventilation running at full power",
    "Water level low in drinker line",
];

/// Buildings alerts are attributed to.
const BUILDINGS: [&str; 3] = ["Building A", "Building B", "Building C"];

const SEVERITIES: [AlertSeverity; 3] = [
    AlertSeverity::Info,
    AlertSeverity::Warning,
    AlertSeverity::Error,
];

/// Configuration for the background simulator.
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    /// How often new samples are written.
    pub tick_interval: Duration,
    /// Per-tick probability of raising a random alert.
    pub alert_probability: f64,
    /// RNG seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            alert_probability: 0.1,
            seed: None,
        }
    }
}

impl SimulatorOptions {
    /// Set the tick interval.
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Set the per-tick alert probability.
    #[must_use]
    pub fn with_alert_probability(mut self, alert_probability: f64) -> Self {
        self.alert_probability = alert_probability;
        self
    }

    /// Seed the RNG for a reproducible run.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(Error::invalid_config("tick interval must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.alert_probability) {
            return Err(Error::invalid_config(
                "alert probability must be within 0.0..=1.0",
            ));
        }
        Ok(())
    }
}

/// Draw the next environmental sample around the baseline values.
pub fn next_sensor_sample<R: Rng>(rng: &mut R, now: OffsetDateTime) -> SensorSample {
    let base = SensorSample::default();
    SensorSample {
        temperature: jitter(rng, base.temperature, 1.0),
        humidity: jitter(rng, base.humidity, 5.0).clamp(0.0, 100.0),
        air_quality: jitter(rng, base.air_quality, 7.5).clamp(0.0, 100.0),
        light_level: jitter(rng, base.light_level, 15.0).max(0.0),
        bird_count: base.bird_count,
        activity_level: jitter(rng, base.activity_level, 10.0).clamp(0.0, 100.0),
        timestamp: now,
    }
}

/// Draw the next gas sample around the baseline concentrations.
///
/// Concentrations are clamped at zero; the spreads are wide enough that the
/// occasional draw crosses a warning threshold, which is intentional.
pub fn next_gas_sample<R: Rng>(rng: &mut R, now: OffsetDateTime) -> GasSample {
    let base = GasSample::default();
    GasSample {
        co: jitter(rng, base.co, 1.0).max(0.0),
        co2: jitter(rng, base.co2, 120.0).max(0.0),
        nh3: jitter(rng, base.nh3, 3.0).max(0.0),
        h2s: jitter(rng, base.h2s, 0.3).max(0.0),
        timestamp: now,
    }
}

/// Draw a random alert event.
pub fn draw_alert<R: Rng>(rng: &mut R, now: OffsetDateTime) -> AlertEvent {
    let message = ALERT_MESSAGES[rng.random_range(0..ALERT_MESSAGES.len())];
    let building = BUILDINGS[rng.random_range(0..BUILDINGS.len())];
    let severity = SEVERITIES[rng.random_range(0..SEVERITIES.len())];
    AlertEvent::new(severity, message, building, now)
}

/// Uniform perturbation of `base` within `±spread`.
fn jitter<R: Rng>(rng: &mut R, base: f32, spread: f32) -> f32 {
    base + rng.random_range(-spread..=spread)
}

/// A configured simulator, ready to spawn.
#[derive(Debug)]
pub struct Simulator {
    client: FarmClient,
    options: SimulatorOptions,
}

impl Simulator {
    /// Create a simulator over a farm client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the options are out of range.
    pub fn new(client: FarmClient, options: SimulatorOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { client, options })
    }

    /// Spawn the background tick loop.
    ///
    /// The loop runs until the returned handle is stopped or dropped. Write
    /// failures are logged and the loop keeps ticking.
    pub fn spawn(self) -> SimulatorHandle {
        let cancel = CancellationToken::new();
        let task_token = cancel.clone();
        let Simulator { client, options } = self;

        let handle = tokio::spawn(async move {
            let mut rng = match options.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let mut ticks = tokio::time::interval(options.tick_interval);
            // The first tick fires immediately so the dashboard has fresh
            // data as soon as the simulator starts.
            info!(
                interval_secs = options.tick_interval.as_secs_f64(),
                alert_probability = options.alert_probability,
                "simulator started"
            );
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticks.tick() => {}
                }
                let now = OffsetDateTime::now_utc();

                let sensor = next_sensor_sample(&mut rng, now);
                if let Err(error) = client.update_sensor(sensor).await {
                    warn!(%error, "failed to write simulated sensor sample");
                }
                let gas = next_gas_sample(&mut rng, now);
                if let Err(error) = client.update_gas(gas).await {
                    warn!(%error, "failed to write simulated gas sample");
                }

                if rng.random::<f64>() < options.alert_probability {
                    let alert = draw_alert(&mut rng, now);
                    debug!(message = %alert.message, "simulated alert drawn");
                    if let Err(error) = client
                        .push_alert(alert.severity, alert.message, alert.building)
                        .await
                    {
                        warn!(%error, "failed to push simulated alert");
                    }
                }
            }
            info!("simulator stopped");
        });

        SimulatorHandle {
            handle,
            cancel,
        }
    }
}

/// Handle to a running simulator task.
///
/// Dropping the handle stops the simulator.
#[derive(Debug)]
pub struct SimulatorHandle {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl SimulatorHandle {
    /// Request the tick loop to stop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the tick loop is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use futures::StreamExt;

    #[test]
    fn seeded_rng_is_reproducible() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(next_sensor_sample(&mut a, now), next_sensor_sample(&mut b, now));
        assert_eq!(next_gas_sample(&mut a, now), next_gas_sample(&mut b, now));
        assert_eq!(draw_alert(&mut a, now), draw_alert(&mut b, now));
    }

    #[test]
    fn samples_stay_in_plausible_bands() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let sensor = next_sensor_sample(&mut rng, now);
            assert!((23.5..=25.5).contains(&sensor.temperature));
            assert!((0.0..=100.0).contains(&sensor.humidity));
            assert!((0.0..=100.0).contains(&sensor.air_quality));
            assert!(sensor.light_level >= 0.0);
            assert!((0.0..=100.0).contains(&sensor.activity_level));
            assert_eq!(sensor.bird_count, 2847);

            let gas = next_gas_sample(&mut rng, now);
            assert!(gas.co >= 0.0 && gas.co <= 3.0);
            assert!(gas.co2 >= 0.0);
            assert!(gas.nh3 >= 0.0);
            assert!(gas.h2s >= 0.0);
        }
    }

    #[test]
    fn drawn_alerts_use_known_catalog() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let alert = draw_alert(&mut rng, now);
            assert!(ALERT_MESSAGES.contains(&alert.message.as_str()));
            assert!(BUILDINGS.contains(&alert.building.as_str()));
        }
    }

    #[test]
    fn options_are_validated() {
        assert!(SimulatorOptions::default().validate().is_ok());
        assert!(
            SimulatorOptions::default()
                .with_tick_interval(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            SimulatorOptions::default()
                .with_alert_probability(1.5)
                .validate()
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn simulator_writes_samples_each_tick() {
        let client = FarmClient::new(Store::new());
        client.seed_defaults().await.unwrap();
        let mut sensor = client.subscribe_sensor().await.unwrap();
        // Drain the seeded snapshot.
        sensor.next().await.unwrap();

        let options = SimulatorOptions::default()
            .with_seed(1)
            .with_alert_probability(0.0);
        let handle = Simulator::new(client, options).unwrap().spawn();

        // First tick fires immediately, the next after the interval.
        let first = sensor.next().await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        let second = sensor.next().await.unwrap();
        assert_ne!(first.temperature, second.temperature);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn certain_alert_probability_raises_alert() {
        let client = FarmClient::new(Store::new());
        let mut alerts = client.subscribe_alerts().await.unwrap();

        let options = SimulatorOptions::default().with_seed(9).with_alert_probability(1.0);
        let handle = Simulator::new(client, options).unwrap().spawn();

        let snapshot = alerts.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(ALERT_MESSAGES.contains(&snapshot[0].message.as_str()));

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_simulator_finishes() {
        let client = FarmClient::new(Store::new());
        let handle = Simulator::new(client, SimulatorOptions::default())
            .unwrap()
            .spawn();
        assert!(handle.is_running());
        handle.stop();
        tokio::task::yield_now().await;
        // The task observes cancellation on its next poll.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!handle.is_running());
    }
}
