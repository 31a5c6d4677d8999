//! Analysis settings persistence.
//!
//! Holds the controller name, heater list and the hardware constants the
//! builders scale against. Settings are stored as JSON in the user config
//! directory and fall back to defaults when missing or unreadable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::parsers::DEFAULT_MCU;

/// Settings file version for migration support
const SETTINGS_VERSION: u32 = 1;

/// Analysis parameters that persist across runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Name of the primary controller, whose keys are stored unprefixed
    #[serde(default = "default_mcu")]
    pub mcu: String,
    /// Comma separated heater names for the temperature chart
    #[serde(default = "default_heaters")]
    pub heaters: String,
    /// Serial bandwidth of the controller link, bytes per second
    #[serde(default = "default_max_bandwidth")]
    pub max_bandwidth: f64,
    /// Host buffer length considered full, seconds
    #[serde(default = "default_max_buffer")]
    pub max_buffer: f64,
    /// Scheduler task time considered 100% load, seconds
    #[serde(default = "default_task_max")]
    pub task_max: f64,
    /// Interval between stats lines, seconds
    #[serde(default = "default_stats_interval")]
    pub stats_interval: f64,
    /// Scheduler load is reported as 0 for this long after the first sample
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: f64,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_mcu() -> String {
    DEFAULT_MCU.to_string()
}

fn default_heaters() -> String {
    "heater_bed,extruder".to_string()
}

fn default_max_bandwidth() -> f64 {
    25000.0
}

fn default_max_buffer() -> f64 {
    2.0
}

fn default_task_max() -> f64 {
    0.0025
}

fn default_stats_interval() -> f64 {
    5.0
}

fn default_warmup_secs() -> f64 {
    15.0
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            mcu: default_mcu(),
            heaters: default_heaters(),
            max_bandwidth: default_max_bandwidth(),
            max_buffer: default_max_buffer(),
            task_max: default_task_max(),
            stats_interval: default_stats_interval(),
            warmup_secs: default_warmup_secs(),
        }
    }
}

impl AnalysisSettings {
    /// Get the config directory path for klipstats
    pub fn get_config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::data_dir().map(|p| p.join("klipstats"))
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs::config_dir().map(|p| p.join("klipstats"))
        }
    }

    /// Get the path to the settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the user config directory
    pub fn load() -> Self {
        match Self::get_settings_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config directory, using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Settings file {:?} not found, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::error!("Failed to parse settings file {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!("Failed to read settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save settings to the user config directory
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = Self::get_settings_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Check that every constant is usable as a divisor or threshold
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.mcu.trim().is_empty(), "mcu must be non-empty");
        anyhow::ensure!(
            !self.mcu.contains(char::is_whitespace),
            "mcu must not contain whitespace, got {:?}",
            self.mcu
        );
        for (name, value) in [
            ("max_bandwidth", self.max_bandwidth),
            ("max_buffer", self.max_buffer),
            ("task_max", self.task_max),
            ("stats_interval", self.stats_interval),
        ] {
            anyhow::ensure!(
                value > 0.0 && value.is_finite(),
                "{} must be > 0, got {}",
                name,
                value
            );
        }
        anyhow::ensure!(
            self.warmup_secs >= 0.0 && self.warmup_secs.is_finite(),
            "warmup_secs must be >= 0, got {}",
            self.warmup_secs
        );
        Ok(())
    }
}

/// Split a comma separated heater list
pub fn split_heaters(heaters: &str) -> Vec<String> {
    heaters
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}
