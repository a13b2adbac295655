//! Settings for the scanner bridge and its reader
//!
//! Settings are grouped into sections:
//! - Bridge settings (event channel and deferred-operation capacities)
//! - Reader settings (driver selection, region, antenna power, beeper)
//! - Logging settings (level filter, JSON output)
//!
//! Files are JSON or TOML, picked by extension. The default location is
//! `<config dir>/rfidkit/config.toml`.

use crate::error::{SettingsError, SettingsResult};
use rfidkit_core::{BeeperVolume, BridgeOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "rfidkit";
/// Settings file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Highest antenna power index a reader accepts
pub const MAX_ANTENNA_POWER: u16 = 300;

/// Bridge settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Capacity of the broadcast channel feeding async receivers
    pub event_channel_capacity: usize,
    /// Read/write operations held while the reader is not open
    pub pending_capacity: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        let options = BridgeOptions::default();
        Self {
            event_channel_capacity: options.event_channel_capacity,
            pending_capacity: options.pending_capacity,
        }
    }
}

impl From<&BridgeSettings> for BridgeOptions {
    fn from(settings: &BridgeSettings) -> Self {
        BridgeOptions {
            event_channel_capacity: settings.event_channel_capacity,
            pending_capacity: settings.pending_capacity,
        }
    }
}

/// Which driver backs the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// In-memory reader with simulated tags
    #[default]
    Simulated,
    /// Accepts every call, emits nothing
    NoOp,
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulated => write!(f, "simulated"),
            Self::NoOp => write!(f, "noop"),
        }
    }
}

/// Reader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub driver: DriverKind,
    /// Regulatory region code
    pub region: String,
    /// Antenna power index applied after the reader opens
    pub antenna_power: u16,
    pub beeper_volume: BeeperVolume,
    /// Timeout for a single tag access operation
    pub access_timeout_ms: u64,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            driver: DriverKind::default(),
            region: "HKG".to_string(),
            antenna_power: 240,
            beeper_volume: BeeperVolume::default(),
            access_timeout_ms: 1000,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bridge: BridgeSettings,
    pub reader: ReaderSettings,
    pub logging: LoggingSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Settings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings file location
    pub fn default_path() -> SettingsResult<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no config or home directory".to_string())
            })?;
        path.push(CONFIG_DIR_NAME);
        path.push(CONFIG_FILE_NAME);
        Ok(path)
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let settings: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`, or defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let format = format_of(path)?;

        let content = match format {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        if self.bridge.event_channel_capacity == 0 {
            return Err(SettingsError::invalid(
                "bridge.event_channel_capacity",
                "must be > 0",
            ));
        }

        if self.bridge.pending_capacity == 0 {
            return Err(SettingsError::invalid(
                "bridge.pending_capacity",
                "must be > 0",
            ));
        }

        if self.reader.antenna_power > MAX_ANTENNA_POWER {
            return Err(SettingsError::invalid(
                "reader.antenna_power",
                format!("must be at most {}", MAX_ANTENNA_POWER),
            ));
        }

        if self.reader.region.trim().is_empty() {
            return Err(SettingsError::invalid("reader.region", "must not be empty"));
        }

        if self.reader.access_timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "reader.access_timeout_ms",
                "must be > 0",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::invalid("logging.level", "must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::new();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.reader.driver, DriverKind::Simulated);
        assert_eq!(settings.reader.antenna_power, 240);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_bridge_options_conversion() {
        let settings = BridgeSettings {
            event_channel_capacity: 16,
            pending_capacity: 2,
        };
        let options = BridgeOptions::from(&settings);
        assert_eq!(options.event_channel_capacity, 16);
        assert_eq!(options.pending_capacity, 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::new();
        settings.reader.antenna_power = 301;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidSetting { ref key, .. }) if key == "reader.antenna_power"
        ));

        let mut settings = Settings::new();
        settings.bridge.pending_capacity = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::new();
        settings.reader.region = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [reader]
            driver = "noop"
            beeper_volume = "quiet"
            "#,
        )
        .unwrap();
        assert_eq!(settings.reader.driver, DriverKind::NoOp);
        assert_eq!(settings.reader.beeper_volume, BeeperVolume::Quiet);
        assert_eq!(settings.reader.region, "HKG");
        assert_eq!(settings.bridge, BridgeSettings::default());
    }

    #[test]
    fn test_default_path_ends_with_file_name() {
        if let Ok(path) = Settings::default_path() {
            assert!(path.ends_with(Path::new(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)));
        }
    }
}
