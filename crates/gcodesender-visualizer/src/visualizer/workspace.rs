//! Workspace grid and view fitting

use gcodesender_core::Point3;
use serde::{Deserialize, Serialize};

use super::toolpath::Toolpath;

/// Spacing of the workspace grid lines
pub const GRID_SPACING_MM: f64 = 10.0;

/// Margin applied around the content when fitting the view
const VIEW_MARGIN: f64 = 1.1;

/// Half-size of the box always included in the fitted view
const MIN_VIEW_EXTENT: f64 = 0.01;

/// Machine table the program is drawn over
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Size along X
    pub width_mm: f64,
    /// Size along Y
    pub depth_mm: f64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            width_mm: 150.0,
            depth_mm: 150.0,
        }
    }
}

/// A line of the workspace grid, in machine XY coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub from: Point3,
    pub to: Point3,
    /// True for the two lines along the X and Y axes
    pub is_axis: bool,
}

impl Workspace {
    pub fn new(width_mm: f64, depth_mm: f64) -> Self {
        Self { width_mm, depth_mm }
    }

    /// The two axis lines followed by interior grid lines every
    /// [`GRID_SPACING_MM`]
    pub fn grid_lines(&self) -> Vec<GridLine> {
        let line = |x0, y0, x1, y1, is_axis| GridLine {
            from: Point3::new(x0, y0, 0.0),
            to: Point3::new(x1, y1, 0.0),
            is_axis,
        };

        let mut lines = vec![
            line(0.0, 0.0, self.width_mm, 0.0, true),
            line(0.0, 0.0, 0.0, self.depth_mm, true),
        ];

        let mut x = GRID_SPACING_MM;
        while x < self.width_mm {
            lines.push(line(x, 0.0, x, self.depth_mm, false));
            x += GRID_SPACING_MM;
        }
        let mut y = GRID_SPACING_MM;
        while y < self.depth_mm {
            lines.push(line(0.0, y, self.width_mm, y, false));
            y += GRID_SPACING_MM;
        }
        lines
    }
}

/// Center and zoom that fit the workspace and a toolpath into a view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewFit {
    /// View center in machine XY coordinates
    pub center_x: f64,
    pub center_y: f64,
    /// View pixels per millimeter
    pub zoom: f64,
}

/// Fit the grid and toolpath into a `view_width` by `view_height` view
/// with a 10% margin
pub fn fit_view(
    workspace: &Workspace,
    toolpath: &Toolpath,
    view_width: f64,
    view_height: f64,
) -> ViewFit {
    let mut min = Point3::new(-MIN_VIEW_EXTENT, -MIN_VIEW_EXTENT, 0.0);
    let mut max = Point3::new(MIN_VIEW_EXTENT, MIN_VIEW_EXTENT, 0.0);

    for line in workspace.grid_lines() {
        min = min.min(&line.from).min(&line.to);
        max = max.max(&line.from).max(&line.to);
    }
    if let Some((path_min, path_max)) = toolpath.bounds() {
        min = min.min(&path_min);
        max = max.max(&path_max);
    }

    let width = max.x - min.x;
    let height = max.y - min.y;
    let zoom_x = view_width / (width * VIEW_MARGIN);
    let zoom_y = view_height / (height * VIEW_MARGIN);

    ViewFit {
        center_x: min.x + width / 2.0,
        center_y: min.y + height / 2.0,
        zoom: zoom_x.min(zoom_y),
    }
}
