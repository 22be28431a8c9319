//! GCodeSender Settings Crate
//!
//! Handles application configuration and its persistence.

pub mod config;
pub mod error;

pub use config::{
    Config, ConnectionSettings, ConsoleSettings, JogSettings, ProgramSettings, WorkspaceSettings,
};
pub use error::{ConfigError, SettingsError, SettingsResult};
