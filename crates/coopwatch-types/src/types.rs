//! Core record types for the poultry-house real-time store.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// Current environmental reading for the house.
///
/// The store keeps a single current record under `sensorData`; no history is
/// persisted. Field names follow the store's camelCase keys and the
/// timestamp is serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSample {
    /// Air temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity percentage (0-100).
    pub humidity: f32,
    /// Composite air quality score (0-100, higher is better).
    pub air_quality: f32,
    /// Light level in lux.
    pub light_level: f32,
    /// Bird headcount for the house.
    pub bird_count: u32,
    /// Flock activity level percentage (0-100).
    pub activity_level: f32,
    /// When the sample was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Default for SensorSample {
    /// Baseline house conditions, used as the pre-subscription display state
    /// and as the center values the simulator perturbs.
    fn default() -> Self {
        Self {
            temperature: 24.5,
            humidity: 65.0,
            air_quality: 85.0,
            light_level: 45.0,
            bird_count: 2847,
            activity_level: 72.0,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

impl SensorSample {
    /// Return the sample with its timestamp set to `now`.
    #[must_use]
    pub fn stamped(mut self, now: OffsetDateTime) -> Self {
        self.timestamp = now;
        self
    }
}

/// Current gas concentration reading for the house.
///
/// Single current record under `gasData`, same model as [`SensorSample`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasSample {
    /// Carbon monoxide concentration in ppm.
    pub co: f32,
    /// Carbon dioxide concentration in ppm.
    pub co2: f32,
    /// Ammonia concentration in ppm.
    pub nh3: f32,
    /// Hydrogen sulfide concentration in ppm.
    pub h2s: f32,
    /// When the sample was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Default for GasSample {
    fn default() -> Self {
        Self {
            co: 2.0,
            co2: 650.0,
            nh3: 8.0,
            h2s: 0.4,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

impl GasSample {
    /// Return the sample with its timestamp set to `now`.
    #[must_use]
    pub fn stamped(mut self, now: OffsetDateTime) -> Self {
        self.timestamp = now;
        self
    }
}

/// Category of a controllable equipment unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentKind {
    /// Fans and air exchangers.
    Ventilation,
    /// Heaters.
    Heating,
    /// LED and incandescent lighting.
    Lighting,
    /// Drinker lines and pumps.
    Watering,
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipmentKind::Ventilation => write!(f, "ventilation"),
            EquipmentKind::Heating => write!(f, "heating"),
            EquipmentKind::Lighting => write!(f, "lighting"),
            EquipmentKind::Watering => write!(f, "watering"),
        }
    }
}

impl FromStr for EquipmentKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ventilation" => Ok(EquipmentKind::Ventilation),
            "heating" => Ok(EquipmentKind::Heating),
            "lighting" => Ok(EquipmentKind::Lighting),
            "watering" => Ok(EquipmentKind::Watering),
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }
}

/// Operating status of an equipment unit.
///
/// Transitions: [`toggled`](Self::toggled) flips between `Active` and
/// `Inactive`; `Auto` is only entered through an explicit set-auto action.
/// Toggling a unit that is in `Auto` takes it to manual `Active` (a second
/// toggle then turns it off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentStatus {
    /// Manually switched on.
    Active,
    /// Manually switched off.
    Inactive,
    /// Controlled by the automatic regulation loop.
    Auto,
}

impl EquipmentStatus {
    /// The status reached by a manual toggle from this one.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            EquipmentStatus::Active => EquipmentStatus::Inactive,
            EquipmentStatus::Inactive | EquipmentStatus::Auto => EquipmentStatus::Active,
        }
    }

    /// Whether the unit is under manual control.
    pub fn is_manual(self) -> bool {
        !matches!(self, EquipmentStatus::Auto)
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipmentStatus::Active => write!(f, "active"),
            EquipmentStatus::Inactive => write!(f, "inactive"),
            EquipmentStatus::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for EquipmentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EquipmentStatus::Active),
            "inactive" => Ok(EquipmentStatus::Inactive),
            "auto" => Ok(EquipmentStatus::Auto),
            other => Err(ParseError::UnknownStatus(other.to_string())),
        }
    }
}

/// A controllable actuator: fan, heater, light, or drinker pump.
///
/// Units live in the `equipment` collection keyed by id; the record stored
/// under the key does not repeat the id, so `id` is filled in from the key
/// when a collection snapshot is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentUnit {
    /// Store key of the unit (not part of the stored record).
    #[serde(skip)]
    pub id: String,
    /// Operator-facing name.
    pub name: String,
    /// Category of the unit. Stored under the `type` key.
    #[serde(rename = "type")]
    pub kind: EquipmentKind,
    /// Current operating status.
    pub status: EquipmentStatus,
    /// Output level in percent (0-100).
    pub power: u8,
}

impl EquipmentUnit {
    /// Create a unit record.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: EquipmentKind,
        status: EquipmentStatus,
        power: u8,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            status,
            power,
        }
    }
}

/// Severity of an alert event.
///
/// Ordered by urgency: `Info < Warning < Error`, which allows filters like
/// `severity >= AlertSeverity::Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational notice.
    Info,
    /// Abnormal condition that needs attention.
    Warning,
    /// Failure or dangerous condition.
    Error,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Error => write!(f, "error"),
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(AlertSeverity::Info),
            "warning" => Ok(AlertSeverity::Warning),
            "error" => Ok(AlertSeverity::Error),
            other => Err(ParseError::UnknownSeverity(other.to_string())),
        }
    }
}

/// A discrete, dismissible event signaling an abnormal condition.
///
/// Alerts live in the `alerts` collection keyed by id; like equipment, the
/// id is the store key and is filled in on decode. Alerts are never mutated
/// in place, only created and deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Store key of the alert (not part of the stored record).
    #[serde(skip)]
    pub id: String,
    /// Severity of the event. Stored under the `type` key.
    #[serde(rename = "type")]
    pub severity: AlertSeverity,
    /// Operator-facing message.
    pub message: String,
    /// Building label the event originated from.
    pub building: String,
    /// When the event was raised.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl AlertEvent {
    /// Create an alert event. The id is assigned by the store on push.
    pub fn new(
        severity: AlertSeverity,
        message: impl Into<String>,
        building: impl Into<String>,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            id: String::new(),
            severity,
            message: message.into(),
            building: building.into(),
            timestamp,
        }
    }
}
