//! Program analysis: bounds and estimated execution time

use gcodesender_core::{format_duration_minutes, Point3, Units};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gcode::{
    interpret, InterpreterSink, MachineState, Motion, WarningTally, ARC_LENGTH_FACTOR,
};

/// Result of analyzing a program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Component-wise minimum position reached, origin included
    pub min_position: Point3,
    /// Component-wise maximum position reached, origin included
    pub max_position: Point3,
    /// Estimated time ignoring acceleration
    pub estimated_time_minutes: f64,
    /// Programming units in effect at the end of the program
    pub units: Units,
    pub warnings: WarningTally,
}

impl AnalysisResult {
    /// Estimated time for display, e.g. `"2 minutes, 30 seconds"`
    pub fn formatted_duration(&self) -> String {
        format_duration_minutes(self.estimated_time_minutes)
    }

    /// Size of the bounding box
    pub fn extent(&self) -> Point3 {
        Point3::new(
            self.max_position.x - self.min_position.x,
            self.max_position.y - self.min_position.y,
            self.max_position.z - self.min_position.z,
        )
    }
}

/// Interpreter sink accumulating bounds, time and warnings
#[derive(Debug, Default)]
pub struct Analyzer {
    result: AnalysisResult,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> AnalysisResult {
        self.result
    }
}

impl InterpreterSink for Analyzer {
    fn on_motion(&mut self, motion: &Motion, state: &MachineState) {
        let distance = if motion.is_arc() {
            ARC_LENGTH_FACTOR * motion.chord_length()
        } else {
            motion.chord_length()
        };
        self.result.estimated_time_minutes += distance / state.feedrate;
    }

    fn on_dwell(&mut self, minutes: f64) {
        self.result.estimated_time_minutes += minutes;
    }

    fn on_warning(&mut self, message: String) {
        self.result.warnings.record(message);
    }

    fn on_command_complete(&mut self, state: &MachineState) {
        self.result.min_position = self.result.min_position.min(&state.position);
        self.result.max_position = self.result.max_position.max(&state.position);
    }
}

/// Analyze a command sequence from a fresh machine state
pub fn analyze<I>(commands: I) -> AnalysisResult
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut state = MachineState::new();
    let mut analyzer = Analyzer::new();
    interpret(commands, &mut state, &mut analyzer);
    let mut result = analyzer.finish();
    result.units = state.units();
    debug!(
        "analysis: min {} max {} time {:.3} min, {} distinct warnings",
        result.min_position,
        result.max_position,
        result.estimated_time_minutes,
        result.warnings.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_include_origin() {
        let result = analyze(["G1 X10 Y10", "G1 X20 Y15"]);
        assert_eq!(result.min_position, Point3::origin());
        assert_eq!(result.max_position, Point3::new(20.0, 15.0, 0.0));
        assert_eq!(result.extent(), Point3::new(20.0, 15.0, 0.0));
    }

    #[test]
    fn test_negative_bounds() {
        let result = analyze(["G91", "G1 Z-2", "G1 X-5"]);
        assert_eq!(result.min_position, Point3::new(-5.0, 0.0, -2.0));
    }

    #[test]
    fn test_arc_time_uses_length_factor() {
        let result = analyze(["G2 X10 Y0 I5 J0 F10"]);
        assert!((result.estimated_time_minutes - 1.209).abs() < 1e-9);
    }

    #[test]
    fn test_dwell_adds_time() {
        let result = analyze(["G4 P60000"]);
        assert!((result.estimated_time_minutes - 1.0).abs() < 1e-12);
        assert_eq!(result.formatted_duration(), "1 minute, 0 second");
    }

    #[test]
    fn test_final_units() {
        assert_eq!(analyze(["G1 X1"]).units, Units::Millimeters);
        assert_eq!(analyze(["G21", "G20", "G1 X1"]).units, Units::Inches);
    }

    #[test]
    fn test_move_without_feed_is_near_instant() {
        let result = analyze(["G1 X100"]);
        assert!(result.estimated_time_minutes < 1e-6);
    }
}
