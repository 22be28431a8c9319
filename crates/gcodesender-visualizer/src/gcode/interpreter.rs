//! Modal interpreter
//!
//! One interpreter loop serves every consumer of a program. It owns the
//! modal rules (distance mode, units, homing, arcs) and reports what happens
//! to an [`InterpreterSink`]; the analyzer and the toolpath builder are two
//! sinks over the same loop, so they can never disagree about where the tool
//! is.

use std::collections::BTreeMap;

use gcodesender_core::{Point3, Units, MM_PER_INCH};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::command::{ParameterSet, ParsedCommand};

/// Feed rate in effect before any `F` word, in mm/min
///
/// Large enough that a first move without `F` contributes ~0 time.
pub const DEFAULT_FEEDRATE: f64 = 1_000_000_000.0;

/// Arc length over chord length for a 120 degree arc (2*pi*sqrt(3)/9)
///
/// Used as a worst-case stand-in for the real arc length.
pub const ARC_LENGTH_FACTOR: f64 = 1.209;

/// M-codes that are known to be safe to ignore
pub const IGNORED_MCODES: &[i64] = &[
    0,   // compulsory stop
    1,   // optional stop
    2,   // end of program
    3,   // spindle on clockwise
    4,   // spindle on counterclockwise
    5,   // spindle stop
    6,   // tool change
    7,   // mist coolant on
    8,   // flood coolant on
    9,   // coolant off
    30,  // end of program with return to top
    40,  // reprap eject
    82,  // reprap extruder absolute mode
    83,  // reprap extruder relative mode
    84,  // reprap stop idle hold
    104, // reprap set extruder temperature
    105, // reprap get extruder temperature
    106, // reprap fan on
    107, // reprap fan off
    108, // reprap set extruder speed
    109, // reprap set extruder temperature and wait
    140, // reprap set bed temperature
    141, // reprap set chamber temperature
    143, // reprap set maximum hot-end temperature
    190, // reprap wait for bed temperature
];

pub const G92_WARNING: &str = "coordinate system offset (G92) not implemented.";
pub const ARC_IJ_WARNING: &str = "implementation only supports specification of both I and J";

/// Machine state for one interpretation pass
///
/// Each pass owns its own state; it is never shared between consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachineState {
    /// Tool position in millimeters
    pub position: Point3,
    /// Distance mode: G91 when true, G90 when false
    pub is_relative: bool,
    /// Units mode: G20 when true, G21 when false
    pub is_inches: bool,
    /// Raw program units to millimeters
    pub unit_scale: f64,
    /// Last commanded feed rate in mm/min
    pub feedrate: f64,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            is_relative: false,
            is_inches: false,
            unit_scale: 1.0,
            feedrate: DEFAULT_FEEDRATE,
        }
    }
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> Units {
        if self.is_inches {
            Units::Inches
        } else {
            Units::Millimeters
        }
    }

    fn resolve_axis(&self, current: f64, value: Option<f64>) -> f64 {
        match value {
            None => current,
            Some(v) if self.is_relative => current + v * self.unit_scale,
            Some(v) => v * self.unit_scale,
        }
    }

    /// Target of a motion command: absolute axes are set, relative axes are
    /// offset, absent axes keep their value
    pub fn resolve_endpoint(&self, params: &ParameterSet) -> Point3 {
        Point3::new(
            self.resolve_axis(self.position.x, params.get('X')),
            self.resolve_axis(self.position.y, params.get('Y')),
            self.resolve_axis(self.position.z, params.get('Z')),
        )
    }

    fn update_feedrate(&mut self, params: &ParameterSet) {
        if let Some(f) = params.get('F') {
            self.feedrate = f * self.unit_scale;
        }
    }
}

/// A motion reported by the interpreter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// G0 (rapid) or G1 (feed)
    Linear { from: Point3, to: Point3, rapid: bool },
    /// G2 (clockwise) or G3 (counter-clockwise) in the XY plane
    Arc {
        from: Point3,
        to: Point3,
        center: Point3,
        clockwise: bool,
    },
}

impl Motion {
    pub fn from(&self) -> Point3 {
        match self {
            Motion::Linear { from, .. } | Motion::Arc { from, .. } => *from,
        }
    }

    pub fn to(&self) -> Point3 {
        match self {
            Motion::Linear { to, .. } | Motion::Arc { to, .. } => *to,
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, Motion::Arc { .. })
    }

    /// Straight-line distance between start and end
    pub fn chord_length(&self) -> f64 {
        self.from().distance_to(&self.to())
    }
}

/// Receiver of everything the interpreter does
///
/// The interpreter performs no I/O itself; all output flows through here.
pub trait InterpreterSink {
    /// A move was made; `state` already holds the new position and feed rate
    fn on_motion(&mut self, motion: &Motion, state: &MachineState);

    /// A dwell of the given length, in minutes
    fn on_dwell(&mut self, _minutes: f64) {}

    /// A semantic warning; never aborts interpretation
    fn on_warning(&mut self, message: String);

    /// The command about to run cannot join a drawn path (anything but
    /// G1/G2/G3)
    fn on_path_break(&mut self) {}

    /// Called after every command with the resulting state
    fn on_command_complete(&mut self, _state: &MachineState) {}
}

/// Warning messages with occurrence counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarningTally {
    counts: BTreeMap<String, u32>,
}

impl WarningTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `message`
    pub fn record(&mut self, message: impl Into<String>) {
        *self.counts.entry(message.into()).or_insert(0) += 1;
    }

    /// Occurrences of an exact message
    pub fn count(&self, message: &str) -> u32 {
        self.counts.get(message).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(m, c)| (m.as_str(), *c))
    }

    /// Distinct messages
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Run `commands` against `state`, reporting to `sink`
pub fn interpret<I, S>(commands: I, state: &mut MachineState, sink: &mut S)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    S: InterpreterSink + ?Sized,
{
    for command in commands {
        step(command.as_ref(), state, sink);
    }
}

/// Interpret a single command
pub fn step<S>(command: &str, state: &mut MachineState, sink: &mut S)
where
    S: InterpreterSink + ?Sized,
{
    let Some(cmd) = ParsedCommand::parse(command) else {
        return;
    };
    trace!("interpreting {}", command);

    let joins_path = cmd.letter == 'G' && matches!(cmd.number, Some(1..=3));
    if !joins_path {
        sink.on_path_break();
    }

    let params = &cmd.params;
    match (cmd.letter, cmd.number) {
        ('G', Some(n @ (0 | 1))) => {
            let from = state.position;
            let to = state.resolve_endpoint(params);
            state.update_feedrate(params);
            state.position = to;
            sink.on_motion(&Motion::Linear { from, to, rapid: n == 0 }, state);
        }
        ('G', Some(n @ (2 | 3))) => {
            let (Some(i), Some(j)) = (params.get('I'), params.get('J')) else {
                sink.on_warning(format!("{}: {}", ARC_IJ_WARNING, command));
                return;
            };
            let from = state.position;
            let to = state.resolve_endpoint(params);
            let center = Point3::new(
                from.x + i * state.unit_scale,
                from.y + j * state.unit_scale,
                from.z,
            );
            state.update_feedrate(params);
            state.position = to;
            let motion = Motion::Arc {
                from,
                to,
                center,
                clockwise: n == 2,
            };
            sink.on_motion(&motion, state);
        }
        ('G', Some(4)) => {
            let seconds = params.get('U').unwrap_or(0.0);
            let millis = params.get('P').unwrap_or(0.0);
            sink.on_dwell(seconds / 60.0 + millis / 60_000.0);
        }
        // XY plane selection; the only plane supported
        ('G', Some(17)) => {}
        ('G', Some(20)) => {
            if !state.is_inches {
                state.unit_scale *= MM_PER_INCH;
            }
            state.is_inches = true;
        }
        ('G', Some(21)) => {
            if state.is_inches {
                state.unit_scale /= MM_PER_INCH;
            }
            state.is_inches = false;
        }
        ('G', Some(28)) => {
            if params.contains('X') {
                state.position.x = 0.0;
            }
            if params.contains('Y') {
                state.position.y = 0.0;
            }
            if params.contains('Z') {
                state.position.z = 0.0;
            }
        }
        // tool radius compensation off; compensation is never applied
        ('G', Some(40)) => {}
        ('G', Some(90)) => state.is_relative = false,
        ('G', Some(91)) => state.is_relative = true,
        ('G', Some(92)) => {
            if params.contains_any(&['X', 'Y', 'Z']) {
                sink.on_warning(G92_WARNING.to_string());
            }
        }
        ('M', Some(n)) if IGNORED_MCODES.contains(&n) => {}
        ('M', _) => sink.on_warning(format!("unimplemented gcode command: {}", cmd.tag)),
        _ => sink.on_warning(format!("unknown gcode command: {}", cmd.tag)),
    }

    sink.on_command_complete(state);
}
