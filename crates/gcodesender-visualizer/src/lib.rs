//! # GCodeSender Visualizer
//!
//! G-code parsing and interpretation for GCodeSender.
//! Turns raw program text into normalized commands, then replays them through
//! a single modal interpreter to produce either an analysis (bounds, time
//! estimate, warnings) or a toolpath for a rendering collaborator.

pub mod gcode;
pub mod utils;
pub mod visualizer;

pub use gcode::{
    interpret, split, tokenize, Command, InterpreterSink, MachineState, Motion, ParameterSet,
    ParsedCommand, WarningTally,
};

pub use visualizer::{
    analyze, build_toolpath, fit_view, AnalysisResult, Analyzer, GridLine, PathBuilder,
    PathSegment, Toolpath, ViewFit, Workspace,
};

pub use utils::{load_program, FileEncoding, Program};
