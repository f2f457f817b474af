//! Settings file management.
//!
//! Operator-adjustable settings live in a TOML file under the platform
//! config directory (`coopwatch/settings.toml`). The file holds the alert
//! thresholds and notification toggles; everything else about the dashboard
//! is runtime state.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use coopwatch_core::AlertThresholds;

/// Settings file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Alert thresholds for environmental metrics and gases
    #[serde(default)]
    pub thresholds: AlertThresholds,

    /// Which alert categories the dashboard surfaces
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Notification channel toggles.
///
/// Persisted operator preferences; the dashboard itself only uses
/// `critical_only` (to filter the alert list) and `sound_enabled`, the
/// delivery channels are carried for the external notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Send alert emails
    #[serde(default = "default_true")]
    pub email_enabled: bool,

    /// Send alert SMS messages
    #[serde(default)]
    pub sms_enabled: bool,

    /// Show push notifications
    #[serde(default = "default_true")]
    pub push_enabled: bool,

    /// Play a sound on new alerts
    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    /// Only notify for error-severity alerts
    #[serde(default)]
    pub critical_only: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            sms_enabled: false,
            push_enabled: true,
            sound_enabled: true,
            critical_only: false,
        }
    }
}

impl Settings {
    /// Get the default settings file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coopwatch")
            .join("settings.toml")
    }

    /// Load settings from file, or return defaults if not found
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse settings: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read settings: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save settings to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_recommended_thresholds() {
        let settings = Settings::default();
        assert_eq!(settings.thresholds, AlertThresholds::default());
        assert!(settings.notifications.push_enabled);
        assert!(!settings.notifications.critical_only);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.thresholds.co.max = 7.5;
        settings.thresholds.temperature.max = 28.0;
        settings.notifications.sound_enabled = false;
        settings.notifications.critical_only = true;

        settings.save(&path).unwrap();
        let loaded = Settings::load(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load(&dir.path().join("absent.toml"));
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[thresholds.co]\nmax = 9.0\n").unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.thresholds.co.max, 9.0);
        assert_eq!(loaded.thresholds.co2.max, 1000.0);
        assert!(loaded.notifications.email_enabled);
        assert!(!loaded.notifications.sms_enabled);
    }
}
