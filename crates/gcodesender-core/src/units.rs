//! Unit handling
//!
//! Machine positions are kept in millimeters. Programs may declare inches
//! (G20), in which case raw values are scaled by [`MM_PER_INCH`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Programming units declared by a program or tracked for a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimeters (G21)
    #[default]
    Millimeters,
    /// Inches (G20)
    Inches,
}

impl Units {
    /// Unit label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Millimeters => "mm",
            Self::Inches => "in",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millimeters => write!(f, "Millimeters"),
            Self::Inches => write!(f, "Inches"),
        }
    }
}

fn plural(value: u64, unit: &str) -> String {
    if value > 1 {
        format!("{} {}s", value, unit)
    } else {
        format!("{} {}", value, unit)
    }
}

/// Format an estimated duration given in minutes for display
///
/// Hours and minutes are only shown when non-zero; seconds are always shown,
/// e.g. `"1 hour, 2 minutes, 3 seconds"` or `"0 second"`.
pub fn format_duration_minutes(minutes: f64) -> String {
    let total_ms = if minutes.is_finite() && minutes > 0.0 {
        (minutes * 60.0 * 1000.0).round() as u64
    } else {
        0
    };
    let total_seconds = total_ms / 1000;
    let hours = total_seconds / 3600;
    let mins = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if mins > 0 {
        parts.push(plural(mins, "minute"));
    }
    parts.push(plural(seconds, "second"));
    parts.join(", ")
}
