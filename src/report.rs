//! Human and machine readable output of the command line tool

use std::fmt::Write;

use gcodesender_visualizer::{
    fit_view, AnalysisResult, GridLine, Program, Toolpath, ViewFit, Workspace,
};
use serde::Serialize;

/// Text summary of a program analysis
pub fn analysis_report(program: &Program, result: &AnalysisResult) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = writeln!(out, "program: {}", program.name);
    let _ = writeln!(out, "commands: {}", program.len());
    let _ = writeln!(out, "program units: {}", result.units.label());
    let _ = writeln!(out, "min: {}", result.min_position);
    let _ = writeln!(out, "max: {}", result.max_position);
    let _ = writeln!(
        out,
        "estimated execution time: {}",
        result.formatted_duration()
    );
    for (message, count) in result.warnings.iter() {
        if count > 1 {
            let _ = writeln!(out, "warning: {} (x{})", message, count);
        } else {
            let _ = writeln!(out, "warning: {}", message);
        }
    }
    out
}

/// Everything a renderer needs to draw a program over the workspace
#[derive(Debug, Clone, Serialize)]
pub struct ToolpathReport {
    pub workspace: Workspace,
    pub grid: Vec<GridLine>,
    pub view: ViewFit,
    pub toolpath: Toolpath,
}

impl ToolpathReport {
    pub fn new(workspace: Workspace, toolpath: Toolpath, view_width: f64, view_height: f64) -> Self {
        Self {
            workspace,
            grid: workspace.grid_lines(),
            view: fit_view(&workspace, &toolpath, view_width, view_height),
            toolpath,
        }
    }
}
