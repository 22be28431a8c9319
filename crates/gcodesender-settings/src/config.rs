//! Configuration and settings management for GCodeSender
//!
//! Supports JSON and TOML files. Configuration is organized into sections:
//! - Workspace (table dimensions)
//! - Connection (port, baud rate)
//! - Jog (feed rate, rapid)
//! - Program (preamble and postamble sent around every program)
//! - Console (transcript scrollback)
//!
//! Missing keys take their defaults, so partial files are valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, SettingsError, SettingsResult};

const CONFIG_DIR_NAME: &str = "gcodesender";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Machine table dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Size along X
    pub width_mm: f64,
    /// Size along Y
    pub depth_mm: f64,
    /// Size along Z
    pub height_mm: f64,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            width_mm: 150.0,
            depth_mm: 150.0,
            height_mm: 50.0,
        }
    }
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Last used port
    pub port: String,
    pub baud_rate: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 9600,
        }
    }
}

/// Jog preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JogSettings {
    /// Feed rate for G1 jogs; 0 means no `F` word
    pub feedrate: f64,
    /// Jog with G0
    pub rapid: bool,
}

/// Text sent before and after every program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSettings {
    pub preamble: String,
    pub postamble: String,
}

/// Console transcript preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Entries kept in the transcript
    pub scrollback: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self { scrollback: 120 }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workspace: WorkspaceSettings,
    pub connection: ConnectionSettings,
    pub jog: JogSettings,
    pub program: ProgramSettings,
    pub console: ConsoleSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or_default().to_string()).into()),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config location, e.g. `~/.config/gcodesender/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        debug!("loaded settings from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!("no settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        debug!("saved settings to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let positive = |key: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SettingsError::invalid(key, "must be > 0"))
            }
        };
        positive("workspace.width_mm", self.workspace.width_mm)?;
        positive("workspace.depth_mm", self.workspace.depth_mm)?;
        positive("workspace.height_mm", self.workspace.height_mm)?;

        if self.connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }

        if !self.jog.feedrate.is_finite() || self.jog.feedrate < 0.0 {
            return Err(SettingsError::invalid("jog.feedrate", "must be >= 0"));
        }

        if self.console.scrollback == 0 {
            return Err(SettingsError::invalid("console.scrollback", "must be > 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.workspace.width_mm, 150.0);
        assert_eq!(config.workspace.height_mm, 50.0);
        assert_eq!(config.connection.baud_rate, 9600);
        assert_eq!(config.jog.feedrate, 0.0);
        assert!(!config.jog.rapid);
        assert!(config.program.preamble.is_empty());
        assert_eq!(config.console.scrollback, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::new();
        config.workspace.depth_mm = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.connection.baud_rate = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("connection.baud_rate"));

        let mut config = Config::new();
        config.console.scrollback = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.jog.feedrate = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config: Config = toml::from_str("[connection]\nport = \"COM3\"\n").unwrap();
        assert_eq!(config.connection.port, "COM3");
        assert_eq!(config.connection.baud_rate, 9600);
        assert_eq!(config.workspace, WorkspaceSettings::default());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config: Config =
            toml::from_str("[workspace]\nwidth_mm = 300.0\nshow_estop = true\n").unwrap();
        assert_eq!(config.workspace.width_mm, 300.0);
        assert_eq!(config.workspace.depth_mm, 150.0);
    }

    #[test]
    fn test_unsupported_format() {
        let err = Config::new()
            .save_to_file(Path::new("settings.yaml"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Config(_)));
    }
}
