//! Core library for coopwatch: a real-time poultry-house monitoring stack.
//!
//! This crate provides everything above the record types and below the UI:
//!
//! - [`store`]: an in-process, path-addressed real-time store session with
//!   per-path change notification.
//! - [`subscription`]: typed snapshot streams over store paths, with
//!   cancellation and an at-most-one-listener-per-path invariant.
//! - [`farm`]: a typed client exposing the dashboard's operations (seeding,
//!   equipment control, day/night presets, alerts).
//! - [`thresholds`]: pure evaluation of environmental ranges and gas limits.
//! - [`simulator`]: a background task generating plausible telemetry when no
//!   hardware is attached.
//!
//! # Example
//!
//! ```no_run
//! use coopwatch_core::farm::FarmClient;
//! use coopwatch_core::simulator::{Simulator, SimulatorOptions};
//! use coopwatch_core::store::Store;
//! use futures::StreamExt;
//!
//! # async fn run() -> coopwatch_core::Result<()> {
//! let client = FarmClient::new(Store::new());
//! client.seed_defaults().await?;
//!
//! let simulator = Simulator::new(client.clone(), SimulatorOptions::default())?.spawn();
//! let mut readings = client.subscribe_sensor().await?;
//! while let Some(sample) = readings.next().await {
//!     println!("{:.1} C", sample.temperature);
//! }
//! simulator.stop();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod farm;
pub mod paths;
pub mod simulator;
pub mod store;
pub mod subscription;
pub mod thresholds;

pub use error::{Error, Result};
pub use farm::FarmClient;
pub use simulator::{Simulator, SimulatorHandle, SimulatorOptions};
pub use store::Store;
pub use subscription::Subscription;
pub use thresholds::{AlertThresholds, GasStatus, GasThreshold, MetricStatus, RangeThreshold};

// Re-export the record types so downstream crates only need one dependency.
pub use coopwatch_types as types;
