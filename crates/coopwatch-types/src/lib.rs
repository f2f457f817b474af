//! Shared data model for the coopwatch poultry-house monitor.
//!
//! This crate holds the plain record types exchanged through the real-time
//! store: environmental sensor samples, gas concentration samples, equipment
//! units, and alert events. All records are serde-serializable with the
//! field names used by the store (camelCase keys, RFC 3339 timestamps).
//!
//! # Example
//!
//! ```
//! use coopwatch_types::{EquipmentStatus, SensorSample};
//!
//! let sample = SensorSample::default();
//! assert_eq!(sample.bird_count, 2847);
//!
//! let status = EquipmentStatus::Active;
//! assert_eq!(status.toggled(), EquipmentStatus::Inactive);
//! ```

pub mod error;
pub mod types;

pub use error::ParseError;
pub use types::{
    AlertEvent, AlertSeverity, EquipmentKind, EquipmentStatus, EquipmentUnit, GasSample,
    SensorSample,
};
