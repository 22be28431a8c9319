//! Jog command building

use std::fmt;
use std::str::FromStr;

use gcodesender_visualizer::Command;
use serde::{Deserialize, Serialize};

/// Smallest step exponent (0.1 mm)
pub const MIN_STEP_EXPONENT: i32 = -1;
/// Largest step exponent (100 mm)
pub const MAX_STEP_EXPONENT: i32 = 2;

/// Direction of a jog move, written the way it appears in the move word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JogAxis {
    XPlus,
    XMinus,
    YPlus,
    YMinus,
    ZPlus,
    ZMinus,
}

impl JogAxis {
    /// Axis prefix of the move word, e.g. `"X-"`
    pub fn word(&self) -> &'static str {
        match self {
            JogAxis::XPlus => "X",
            JogAxis::XMinus => "X-",
            JogAxis::YPlus => "Y",
            JogAxis::YMinus => "Y-",
            JogAxis::ZPlus => "Z",
            JogAxis::ZMinus => "Z-",
        }
    }
}

impl fmt::Display for JogAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

impl FromStr for JogAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "X" | "X+" => Ok(JogAxis::XPlus),
            "X-" => Ok(JogAxis::XMinus),
            "Y" | "Y+" => Ok(JogAxis::YPlus),
            "Y-" => Ok(JogAxis::YMinus),
            "Z" | "Z+" => Ok(JogAxis::ZPlus),
            "Z-" => Ok(JogAxis::ZMinus),
            other => Err(format!("unknown jog axis: {}", other)),
        }
    }
}

/// Jog step size as a power of ten in millimeters; defaults to 1 mm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSize {
    exponent: i32,
}

impl StepSize {
    /// Step of `10^exponent` mm, clamped to 0.1..=100
    pub fn new(exponent: i32) -> Self {
        Self {
            exponent: exponent.clamp(MIN_STEP_EXPONENT, MAX_STEP_EXPONENT),
        }
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Step in millimeters
    pub fn millimeters(&self) -> f64 {
        10f64.powi(self.exponent)
    }

    /// Grow or shrink by `amount` decades, staying in range
    pub fn increment(&mut self, amount: i32) {
        *self = Self::new(self.exponent.saturating_add(amount));
    }
}

/// Jog preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JogOptions {
    /// Feed rate for G1 jogs; 0 leaves the machine's current feed
    pub feedrate: f64,
    /// Jog with G0 instead of G1
    pub rapid: bool,
}

/// Commands for one relative jog
///
/// Switches the machine to relative millimeters first unless the sent
/// commands already put it there.
pub fn build_jog(
    axis: JogAxis,
    step: StepSize,
    options: &JogOptions,
    is_relative: bool,
    is_mm: bool,
) -> Vec<Command> {
    let mut commands = Vec::with_capacity(3);
    if !is_relative {
        commands.push("G91".to_string());
    }
    if !is_mm {
        commands.push("G21".to_string());
    }

    let mut motion = if options.rapid {
        "G0".to_string()
    } else if options.feedrate > 0.0 {
        format!("G1 F{}", options.feedrate)
    } else {
        "G1".to_string()
    };
    motion.push_str(&format!(" {}{}", axis.word(), step.millimeters()));
    commands.push(motion);
    commands
}
