//! # GCodeSender
//!
//! A G-code sender for CNC machines:
//! - Program tokenizing, analysis (bounds, estimated time, warnings) and
//!   toolpath generation for preview
//! - Ack-gated streaming to the machine over a serial port
//! - Bounded console transcript, jogging and emergency stop
//!
//! ## Architecture
//!
//! GCodeSender is organized as a workspace with multiple crates:
//!
//! 1. **gcodesender-core** - Errors, geometry, units, warning log
//! 2. **gcodesender-visualizer** - Tokenizer, interpreter, analyzer, toolpath builder
//! 3. **gcodesender-communication** - Serial transport, dispatch queue, transcript, session
//! 4. **gcodesender-settings** - Configuration files
//! 5. **gcodesender** - Command line binary that integrates all crates

pub mod report;

pub use gcodesender_communication::{
    list_ports, MachineSession, SerialTransport, SessionHandle, PUMP_INTERVAL,
};
pub use gcodesender_core::{Error, Result};
pub use gcodesender_settings::Config;
pub use gcodesender_visualizer::{analyze, build_toolpath, load_program, Program};

use gcodesender_communication::{ConnectionParams, JogOptions};
use gcodesender_settings::{ConnectionSettings, JogSettings, WorkspaceSettings};
use gcodesender_visualizer::Workspace;

/// Version and build date (set at compile time), shown by `--version`
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ")"
);

/// Initialize logging
///
/// Sets up structured logging with:
/// - Pretty formatted output on stderr, leaving stdout for command output
/// - RUST_LOG environment variable support
/// - `verbose` lowers the default level from INFO to DEBUG
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Workspace grid dimensions from settings
pub fn workspace_from_settings(settings: &WorkspaceSettings) -> Workspace {
    Workspace::new(settings.width_mm, settings.depth_mm)
}

/// Jog options from settings
pub fn jog_options_from_settings(settings: &JogSettings) -> JogOptions {
    JogOptions {
        feedrate: settings.feedrate,
        rapid: settings.rapid,
    }
}

/// Serial parameters from settings, with optional overrides
pub fn connection_params(
    settings: &ConnectionSettings,
    port: Option<&str>,
    baud_rate: Option<u32>,
) -> ConnectionParams {
    ConnectionParams::serial(
        port.unwrap_or(&settings.port),
        baud_rate.unwrap_or(settings.baud_rate),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_version() {
        assert!(LONG_VERSION.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(LONG_VERSION.contains(" (built "));
        assert!(LONG_VERSION.ends_with(" UTC)"));
    }

    #[test]
    fn test_settings_conversions() {
        let config = Config::default();
        let workspace = workspace_from_settings(&config.workspace);
        assert_eq!(workspace, Workspace::new(150.0, 150.0));

        let jog = jog_options_from_settings(&config.jog);
        assert_eq!(jog, JogOptions::default());
    }

    #[test]
    fn test_connection_overrides() {
        let mut settings = ConnectionSettings::default();
        settings.port = "/dev/ttyUSB0".to_string();

        let params = connection_params(&settings, None, None);
        assert_eq!(params.port, "/dev/ttyUSB0");
        assert_eq!(params.baud_rate, 9600);

        let params = connection_params(&settings, Some("COM4"), Some(115200));
        assert_eq!(params.port, "COM4");
        assert_eq!(params.baud_rate, 115200);
    }
}
