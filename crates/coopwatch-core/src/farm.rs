//! Typed client over the farm's real-time store.
//!
//! [`FarmClient`] wraps a [`Store`] session with the operations the
//! dashboard needs: seeding the well-known default records, subscribing to
//! the four top-level paths as typed streams, manual equipment control, the
//! day/night mode bundles, and alert creation and dismissal.
//!
//! Collection snapshots arrive as whole JSON objects; the client decodes
//! them into sorted vectors and fills each record's `id` from its store key.
//! Entries that do not decode are skipped rather than failing the whole
//! snapshot.

use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info};

use coopwatch_types::{
    AlertEvent, AlertSeverity, EquipmentKind, EquipmentStatus, EquipmentUnit, GasSample,
    SensorSample,
};

use crate::error::{Error, Result};
use crate::paths;
use crate::store::Store;
use crate::subscription::Subscription;

/// Store key of the zone A ventilation unit.
pub const VENTILATION_UNIT: &str = "ventilation-zone-a";
/// Store key of the main heating unit.
pub const HEATING_UNIT: &str = "heating-main";
/// Store key of the LED lighting unit.
pub const LIGHTING_UNIT: &str = "lighting-led";
/// Store key of the watering system unit.
pub const WATERING_UNIT: &str = "watering-system";

/// Typed access to the farm's store paths.
///
/// Cheap to clone; all clones share the underlying store session.
#[derive(Debug, Clone)]
pub struct FarmClient {
    store: Store,
}

impl FarmClient {
    /// Create a client over an existing store session.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Seed the store with baseline records if it is empty.
    ///
    /// Writes the default sensor and gas samples, the four well-known
    /// equipment units, and two starter alerts. Idempotent: if the
    /// `equipment` collection already holds data, nothing is written, so
    /// reconnecting to a live store never clobbers operator changes.
    pub async fn seed_defaults(&self) -> Result<()> {
        if self.store.get(paths::EQUIPMENT).await.is_some() {
            debug!("store already seeded, skipping defaults");
            return Ok(());
        }
        info!("seeding store with baseline farm data");

        let now = OffsetDateTime::now_utc();
        self.store
            .write_record(paths::SENSOR_DATA, &SensorSample::default().stamped(now))
            .await?;
        self.store
            .write_record(paths::GAS_DATA, &GasSample::default().stamped(now))
            .await?;

        let units = [
            EquipmentUnit::new(
                VENTILATION_UNIT,
                "Ventilation Zone A",
                EquipmentKind::Ventilation,
                EquipmentStatus::Auto,
                75,
            ),
            EquipmentUnit::new(
                HEATING_UNIT,
                "Main Heating",
                EquipmentKind::Heating,
                EquipmentStatus::Active,
                60,
            ),
            EquipmentUnit::new(
                LIGHTING_UNIT,
                "LED Lighting",
                EquipmentKind::Lighting,
                EquipmentStatus::Active,
                85,
            ),
            EquipmentUnit::new(
                WATERING_UNIT,
                "Watering System",
                EquipmentKind::Watering,
                EquipmentStatus::Auto,
                100,
            ),
        ];
        for unit in &units {
            self.store
                .write_record(&paths::equipment_unit(&unit.id), unit)
                .await?;
        }

        let alerts = [
            (
                "alert-1",
                AlertEvent::new(
                    AlertSeverity::Warning,
                    "High humidity detected",
                    "Building A",
                    now,
                ),
            ),
            (
                "alert-2",
                AlertEvent::new(
                    AlertSeverity::Info,
                    "Automatic ventilation engaged",
                    "Building B",
                    now,
                ),
            ),
        ];
        for (id, alert) in &alerts {
            self.store.write_record(&paths::alert(id), alert).await?;
        }
        Ok(())
    }

    /// Replace the current environmental reading, stamped with the current
    /// time.
    pub async fn update_sensor(&self, sample: SensorSample) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        self.store
            .write_record(paths::SENSOR_DATA, &sample.stamped(now))
            .await
    }

    /// Replace the current gas reading, stamped with the current time.
    pub async fn update_gas(&self, sample: GasSample) -> Result<()> {
        let now = OffsetDateTime::now_utc();
        self.store
            .write_record(paths::GAS_DATA, &sample.stamped(now))
            .await
    }

    /// Subscribe to the current environmental reading.
    pub async fn subscribe_sensor(&self) -> Result<Subscription<SensorSample>> {
        self.store
            .subscribe(paths::SENSOR_DATA, |value| {
                serde_json::from_value(value.clone()).ok()
            })
            .await
    }

    /// Subscribe to the current gas reading.
    pub async fn subscribe_gas(&self) -> Result<Subscription<GasSample>> {
        self.store
            .subscribe(paths::GAS_DATA, |value| {
                serde_json::from_value(value.clone()).ok()
            })
            .await
    }

    /// Subscribe to the equipment collection, sorted by unit id.
    pub async fn subscribe_equipment(&self) -> Result<Subscription<Vec<EquipmentUnit>>> {
        self.store.subscribe(paths::EQUIPMENT, decode_units).await
    }

    /// Subscribe to the alert collection, newest first.
    pub async fn subscribe_alerts(&self) -> Result<Subscription<Vec<AlertEvent>>> {
        self.store.subscribe(paths::ALERTS, decode_alerts).await
    }

    /// Manually toggle a unit and return the status it reached.
    ///
    /// `active` becomes `inactive` and back; a unit in `auto` leaves
    /// automatic regulation and becomes manually `active`.
    pub async fn toggle(&self, id: &str) -> Result<EquipmentStatus> {
        let current = self.unit_status(id).await?;
        let next = current.toggled();
        self.store
            .write_record(&paths::equipment_field(id, "status"), &next)
            .await?;
        info!(unit = id, from = %current, to = %next, "equipment toggled");
        Ok(next)
    }

    /// Hand a unit back to automatic regulation.
    pub async fn set_auto(&self, id: &str) -> Result<()> {
        self.set_status(id, EquipmentStatus::Auto).await
    }

    /// Set a unit's operating status directly.
    pub async fn set_status(&self, id: &str, status: EquipmentStatus) -> Result<()> {
        self.unit_status(id).await?;
        self.store
            .write_record(&paths::equipment_field(id, "status"), &status)
            .await?;
        info!(unit = id, status = %status, "equipment status set");
        Ok(())
    }

    /// Set a unit's output level in percent (clamped to 100).
    pub async fn set_power(&self, id: &str, power: u8) -> Result<()> {
        self.unit_status(id).await?;
        let power = power.min(100);
        self.store
            .write(
                &paths::equipment_field(id, "power"),
                Value::from(u64::from(power)),
            )
            .await?;
        info!(unit = id, power, "equipment power set");
        Ok(())
    }

    /// Apply the daytime preset: lighting on at 85%, ventilation at 75%,
    /// heating down to 40%.
    ///
    /// Writes are sequential; each lands as its own snapshot for
    /// subscribers, there is no transactional grouping.
    pub async fn set_day_mode(&self) -> Result<()> {
        info!("applying day mode preset");
        self.set_status(LIGHTING_UNIT, EquipmentStatus::Active).await?;
        self.set_power(LIGHTING_UNIT, 85).await?;
        self.set_power(VENTILATION_UNIT, 75).await?;
        self.set_power(HEATING_UNIT, 40).await?;
        Ok(())
    }

    /// Apply the nighttime preset: lighting off, ventilation at 50%,
    /// heating up to 70%.
    pub async fn set_night_mode(&self) -> Result<()> {
        info!("applying night mode preset");
        self.set_status(LIGHTING_UNIT, EquipmentStatus::Inactive).await?;
        self.set_power(LIGHTING_UNIT, 0).await?;
        self.set_power(VENTILATION_UNIT, 50).await?;
        self.set_power(HEATING_UNIT, 70).await?;
        Ok(())
    }

    /// Raise a new alert, stamped with the current time.
    ///
    /// Returns the store key assigned to the alert.
    pub async fn push_alert(
        &self,
        severity: AlertSeverity,
        message: impl Into<String>,
        building: impl Into<String>,
    ) -> Result<String> {
        let alert = AlertEvent::new(severity, message, building, OffsetDateTime::now_utc());
        let key = self
            .store
            .push(paths::ALERTS, serde_json::to_value(&alert)?)
            .await?;
        info!(alert = %key, severity = %severity, "alert raised");
        Ok(key)
    }

    /// Dismiss an alert by deleting its record.
    ///
    /// Dismissing an alert that does not exist is a no-op.
    pub async fn remove_alert(&self, id: &str) -> Result<()> {
        self.store.write(&paths::alert(id), Value::Null).await?;
        info!(alert = id, "alert dismissed");
        Ok(())
    }

    /// Read and parse a unit's current status.
    async fn unit_status(&self, id: &str) -> Result<EquipmentStatus> {
        let path = paths::equipment_field(id, "status");
        let value = self
            .store
            .get(&path)
            .await
            .ok_or_else(|| Error::UnitNotFound(id.to_string()))?;
        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::invalid_record(path, "status is not a known state"))
    }
}

/// Decode an equipment collection snapshot into units sorted by id.
fn decode_units(value: &Value) -> Option<Vec<EquipmentUnit>> {
    let map = value.as_object()?;
    let mut units: Vec<EquipmentUnit> = map
        .iter()
        .filter_map(|(id, record)| {
            let mut unit: EquipmentUnit = serde_json::from_value(record.clone()).ok()?;
            unit.id = id.clone();
            Some(unit)
        })
        .collect();
    units.sort_by(|a, b| a.id.cmp(&b.id));
    Some(units)
}

/// Decode an alert collection snapshot, newest first (id breaks ties).
fn decode_alerts(value: &Value) -> Option<Vec<AlertEvent>> {
    let map = value.as_object()?;
    let mut alerts: Vec<AlertEvent> = map
        .iter()
        .filter_map(|(id, record)| {
            let mut alert: AlertEvent = serde_json::from_value(record.clone()).ok()?;
            alert.id = id.clone();
            Some(alert)
        })
        .collect();
    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    Some(alerts)
}
