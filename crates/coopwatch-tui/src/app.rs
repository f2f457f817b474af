//! Application state and key handling.
//!
//! [`App`] holds everything the dashboard renders: the latest samples, a
//! bounded history ring for the chart, the decoded equipment and alert
//! collections, focus and cursors, and the optional settings overlay.
//! Key handling is pure: it mutates local UI state and returns a
//! [`Command`] when the key maps to a store operation, which the event loop
//! then dispatches through the farm client. That split keeps key handling
//! testable without a terminal or a runtime.

use std::collections::VecDeque;

use crossterm::event::KeyCode;

use coopwatch_types::{AlertEvent, AlertSeverity, EquipmentUnit, GasSample, SensorSample};

use crate::config::Settings;

/// Samples kept for the trend chart: one hour at the default 5s tick.
pub const HISTORY_CAP: usize = 720;

/// Which panel list navigation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Equipment,
    Alerts,
}

/// A store operation requested by a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Manually toggle the unit with this id.
    Toggle(String),
    /// Hand the unit with this id back to automatic regulation.
    SetAuto(String),
    /// Apply the daytime equipment preset.
    DayMode,
    /// Apply the nighttime equipment preset.
    NightMode,
    /// Dismiss the alert with this id.
    DismissAlert(String),
    /// Persist the edited settings.
    SaveSettings(Settings),
}

/// Settings editing overlay state.
#[derive(Debug, Clone)]
pub struct SettingsOverlay {
    /// Edited copy; applied on Enter, discarded on Esc.
    pub draft: Settings,
    /// Selected row index into [`ROW_LABELS`].
    pub cursor: usize,
}

/// Labels of the editable settings rows, in display order. The first twelve
/// are numeric thresholds, the rest notification flags.
pub const ROW_LABELS: [&str; 17] = [
    "Temperature min (C)",
    "Temperature max (C)",
    "Humidity min (%)",
    "Humidity max (%)",
    "Air quality min",
    "Air quality max",
    "Light level min (%)",
    "Light level max (%)",
    "CO limit (ppm)",
    "CO2 limit (ppm)",
    "NH3 limit (ppm)",
    "H2S limit (ppm)",
    "Email notifications",
    "SMS notifications",
    "Push notifications",
    "Alert sound",
    "Critical only",
];

/// Number of numeric rows at the top of [`ROW_LABELS`].
const NUMERIC_ROWS: usize = 12;

/// First gas-limit row. Gas limits stay non-negative; range bounds may go
/// below zero (a freezing temperature minimum is a valid configuration).
const FIRST_GAS_ROW: usize = 8;

/// Displayed value of one settings row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowValue {
    Number(f32),
    Flag(bool),
}

impl SettingsOverlay {
    /// Open the overlay over a copy of the current settings.
    pub fn new(draft: Settings) -> Self {
        Self { draft, cursor: 0 }
    }

    /// Move the cursor down, wrapping.
    pub fn next(&mut self) {
        self.cursor = (self.cursor + 1) % ROW_LABELS.len();
    }

    /// Move the cursor up, wrapping.
    pub fn previous(&mut self) {
        self.cursor = (self.cursor + ROW_LABELS.len() - 1) % ROW_LABELS.len();
    }

    /// Current value of a row.
    pub fn value(&self, row: usize) -> RowValue {
        let t = &self.draft.thresholds;
        let n = &self.draft.notifications;
        match row {
            0 => RowValue::Number(t.temperature.min),
            1 => RowValue::Number(t.temperature.max),
            2 => RowValue::Number(t.humidity.min),
            3 => RowValue::Number(t.humidity.max),
            4 => RowValue::Number(t.air_quality.min),
            5 => RowValue::Number(t.air_quality.max),
            6 => RowValue::Number(t.light_level.min),
            7 => RowValue::Number(t.light_level.max),
            8 => RowValue::Number(t.co.max),
            9 => RowValue::Number(t.co2.max),
            10 => RowValue::Number(t.nh3.max),
            11 => RowValue::Number(t.h2s.max),
            12 => RowValue::Flag(n.email_enabled),
            13 => RowValue::Flag(n.sms_enabled),
            14 => RowValue::Flag(n.push_enabled),
            15 => RowValue::Flag(n.sound_enabled),
            _ => RowValue::Flag(n.critical_only),
        }
    }

    /// Nudge a numeric row up or down by its step (gas limits floored at
    /// zero), or flip a flag row.
    pub fn adjust(&mut self, direction: f32) {
        let row = self.cursor;
        if row < NUMERIC_ROWS {
            let (field, step) = self.field_mut(row);
            *field += direction * step;
            if row >= FIRST_GAS_ROW {
                *field = field.max(0.0);
            }
        } else {
            let flag = self.flag_mut(row);
            *flag = !*flag;
        }
    }

    fn field_mut(&mut self, row: usize) -> (&mut f32, f32) {
        let t = &mut self.draft.thresholds;
        match row {
            0 => (&mut t.temperature.min, 0.5),
            1 => (&mut t.temperature.max, 0.5),
            2 => (&mut t.humidity.min, 1.0),
            3 => (&mut t.humidity.max, 1.0),
            4 => (&mut t.air_quality.min, 1.0),
            5 => (&mut t.air_quality.max, 1.0),
            6 => (&mut t.light_level.min, 1.0),
            7 => (&mut t.light_level.max, 1.0),
            8 => (&mut t.co.max, 0.5),
            9 => (&mut t.co2.max, 25.0),
            10 => (&mut t.nh3.max, 0.5),
            _ => (&mut t.h2s.max, 0.1),
        }
    }

    fn flag_mut(&mut self, row: usize) -> &mut bool {
        let n = &mut self.draft.notifications;
        match row {
            12 => &mut n.email_enabled,
            13 => &mut n.sms_enabled,
            14 => &mut n.push_enabled,
            15 => &mut n.sound_enabled,
            _ => &mut n.critical_only,
        }
    }
}

/// Application state for the dashboard.
pub struct App {
    /// Latest environmental reading.
    pub sensor: SensorSample,
    /// Latest gas reading.
    pub gas: GasSample,
    /// Equipment units, sorted by id.
    pub equipment: Vec<EquipmentUnit>,
    /// Alerts, newest first.
    pub alerts: Vec<AlertEvent>,
    /// Recent sensor samples for the trend chart.
    pub history: VecDeque<SensorSample>,
    /// Active settings.
    pub settings: Settings,
    /// Focused panel.
    pub focus: Focus,
    /// Selected equipment row.
    pub equipment_cursor: usize,
    /// Selected alert row.
    pub alert_cursor: usize,
    /// Settings overlay, when open.
    pub overlay: Option<SettingsOverlay>,
    should_quit: bool,
}

impl App {
    /// Create the initial state with baseline readings.
    pub fn new(settings: Settings) -> Self {
        Self {
            sensor: SensorSample::default(),
            gas: GasSample::default(),
            equipment: Vec::new(),
            alerts: Vec::new(),
            history: VecDeque::with_capacity(HISTORY_CAP),
            settings,
            focus: Focus::Equipment,
            equipment_cursor: 0,
            alert_cursor: 0,
            overlay: None,
            should_quit: false,
        }
    }

    /// Check if the app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Record a new environmental reading.
    pub fn on_sensor(&mut self, sample: SensorSample) {
        self.sensor = sample;
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(sample);
    }

    /// Record a new gas reading.
    pub fn on_gas(&mut self, sample: GasSample) {
        self.gas = sample;
    }

    /// Replace the equipment snapshot.
    pub fn on_equipment(&mut self, units: Vec<EquipmentUnit>) {
        self.equipment = units;
        self.equipment_cursor = clamp_cursor(self.equipment_cursor, self.equipment.len());
    }

    /// Replace the alert snapshot.
    pub fn on_alerts(&mut self, alerts: Vec<AlertEvent>) {
        self.alerts = alerts;
        self.alert_cursor = clamp_cursor(self.alert_cursor, self.visible_alerts().len());
    }

    /// Alerts shown in the panel, honoring the critical-only preference.
    pub fn visible_alerts(&self) -> Vec<&AlertEvent> {
        if self.settings.notifications.critical_only {
            self.alerts
                .iter()
                .filter(|alert| alert.severity == AlertSeverity::Error)
                .collect()
        } else {
            self.alerts.iter().collect()
        }
    }

    /// Handle a key press event.
    ///
    /// Returns the store operation the key maps to, if any.
    pub fn handle_key(&mut self, key: KeyCode) -> Option<Command> {
        if self.overlay.is_some() {
            return self.handle_overlay_key(key);
        }
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('s') => {
                self.overlay = Some(SettingsOverlay::new(self.settings.clone()));
                None
            }
            KeyCode::Char('d') => Some(Command::DayMode),
            KeyCode::Char('n') => Some(Command::NightMode),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Equipment => Focus::Alerts,
                    Focus::Alerts => Focus::Equipment,
                };
                None
            }
            KeyCode::Up => {
                self.move_cursor(-1);
                None
            }
            KeyCode::Down => {
                self.move_cursor(1);
                None
            }
            KeyCode::Char('t') | KeyCode::Char(' ') | KeyCode::Enter
                if self.focus == Focus::Equipment =>
            {
                self.selected_unit().map(|unit| Command::Toggle(unit.id.clone()))
            }
            KeyCode::Char('a') if self.focus == Focus::Equipment => {
                self.selected_unit().map(|unit| Command::SetAuto(unit.id.clone()))
            }
            KeyCode::Char('x') | KeyCode::Delete if self.focus == Focus::Alerts => {
                self.selected_alert().map(|alert| Command::DismissAlert(alert.id.clone()))
            }
            _ => None,
        }
    }

    fn handle_overlay_key(&mut self, key: KeyCode) -> Option<Command> {
        match key {
            KeyCode::Esc => {
                self.overlay = None;
                None
            }
            KeyCode::Enter => {
                let overlay = self.overlay.take()?;
                self.settings = overlay.draft.clone();
                self.alert_cursor = clamp_cursor(self.alert_cursor, self.visible_alerts().len());
                Some(Command::SaveSettings(overlay.draft))
            }
            KeyCode::Up => {
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.previous();
                }
                None
            }
            KeyCode::Down => {
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.next();
                }
                None
            }
            KeyCode::Left | KeyCode::Char('-') => {
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.adjust(-1.0);
                }
                None
            }
            KeyCode::Right | KeyCode::Char('+') => {
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.adjust(1.0);
                }
                None
            }
            _ => None,
        }
    }

    /// The equipment unit under the cursor, if any.
    pub fn selected_unit(&self) -> Option<&EquipmentUnit> {
        self.equipment.get(self.equipment_cursor)
    }

    /// The alert under the cursor, if any.
    pub fn selected_alert(&self) -> Option<&AlertEvent> {
        self.visible_alerts().get(self.alert_cursor).copied()
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = match self.focus {
            Focus::Equipment => self.equipment.len(),
            Focus::Alerts => self.visible_alerts().len(),
        };
        let cursor = match self.focus {
            Focus::Equipment => &mut self.equipment_cursor,
            Focus::Alerts => &mut self.alert_cursor,
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        let moved = cursor.saturating_add_signed(delta);
        *cursor = moved.min(len - 1);
    }
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    if len == 0 { 0 } else { cursor.min(len - 1) }
}
