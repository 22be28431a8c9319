//! Program visualization
//!
//! This module provides:
//! - Program analysis (bounds, estimated time, warnings)
//! - Toolpath generation for rendering
//! - Workspace grid and view fitting

pub mod analyzer;
pub mod toolpath;
pub mod workspace;

pub use analyzer::{analyze, AnalysisResult, Analyzer};
pub use toolpath::{arc_through_point, build_toolpath, PathBuilder, PathSegment, Toolpath};
pub use workspace::{fit_view, GridLine, ViewFit, Workspace, GRID_SPACING_MM};
