//! Toolpath generation
//!
//! Replays a program through the interpreter and records the geometry a
//! renderer needs. Consecutive feed moves and arcs join into one stroke;
//! rapids are always a stroke of their own since they are drawn in a
//! different style.

use std::ops::Range;

use gcodesender_core::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gcode::{interpret, InterpreterSink, MachineState, Motion, WarningTally};

/// One drawn segment of a toolpath
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathSegment {
    Line {
        from: Point3,
        to: Point3,
        is_rapid: bool,
    },
    Arc {
        from: Point3,
        to: Point3,
        center: Point3,
        /// A point on the arc between `from` and `to`, for three-point
        /// arc drawing
        through: Point3,
        clockwise: bool,
    },
}

impl PathSegment {
    pub fn from(&self) -> Point3 {
        match self {
            PathSegment::Line { from, .. } | PathSegment::Arc { from, .. } => *from,
        }
    }

    pub fn to(&self) -> Point3 {
        match self {
            PathSegment::Line { to, .. } | PathSegment::Arc { to, .. } => *to,
        }
    }

    pub fn is_rapid(&self) -> bool {
        matches!(self, PathSegment::Line { is_rapid: true, .. })
    }
}

/// Point on the circle around `center` through `from`, in the direction of
/// the bisector of `from` and `to` as seen from the center
pub fn arc_through_point(from: Point3, to: Point3, center: Point3) -> Point3 {
    let radius = ((from.x - center.x).powi(2) + (from.y - center.y).powi(2)).sqrt();
    let bx = (from.x - center.x) + (to.x - center.x);
    let by = (from.y - center.y) + (to.y - center.y);
    // atan2(0, 0) is 0, so a half circle bisects along +X
    let angle = by.atan2(bx);
    Point3::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
        (from.z + to.z) / 2.0,
    )
}

/// Segments of a program grouped into strokes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Toolpath {
    pub segments: Vec<PathSegment>,
    /// Index ranges into `segments`; each range is drawn as one path
    pub strokes: Vec<Range<usize>>,
    pub warnings: WarningTally,
}

impl Toolpath {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments of one stroke
    pub fn stroke(&self, index: usize) -> Option<&[PathSegment]> {
        let range = self.strokes.get(index)?.clone();
        self.segments.get(range)
    }

    /// True when the stroke is a rapid move
    pub fn stroke_is_rapid(&self, index: usize) -> bool {
        self.stroke(index)
            .and_then(|segments| segments.first())
            .is_some_and(PathSegment::is_rapid)
    }

    /// Bounding box of every drawn point, or `None` for an empty toolpath
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let mut points = self.segments.iter().flat_map(|segment| match segment {
            PathSegment::Line { from, to, .. } => vec![*from, *to],
            PathSegment::Arc {
                from, to, through, ..
            } => vec![*from, *through, *to],
        });
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(&p), max.max(&p))))
    }
}

/// Interpreter sink building a [`Toolpath`]
#[derive(Debug, Default)]
pub struct PathBuilder {
    toolpath: Toolpath,
    stroke_open: bool,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, segment: PathSegment, joinable: bool) {
        let index = self.toolpath.segments.len();
        self.toolpath.segments.push(segment);
        let open_stroke = if self.stroke_open {
            self.toolpath.strokes.last_mut()
        } else {
            None
        };
        match open_stroke {
            Some(stroke) => stroke.end = index + 1,
            None => self.toolpath.strokes.push(index..index + 1),
        }
        self.stroke_open = joinable;
    }

    pub fn finish(self) -> Toolpath {
        self.toolpath
    }
}

impl InterpreterSink for PathBuilder {
    fn on_motion(&mut self, motion: &Motion, _state: &MachineState) {
        match *motion {
            Motion::Linear { from, to, rapid } => {
                let segment = PathSegment::Line {
                    from,
                    to,
                    is_rapid: rapid,
                };
                self.push(segment, !rapid);
            }
            Motion::Arc {
                from,
                to,
                center,
                clockwise,
            } => {
                let segment = PathSegment::Arc {
                    from,
                    to,
                    center,
                    through: arc_through_point(from, to, center),
                    clockwise,
                };
                self.push(segment, true);
            }
        }
    }

    fn on_warning(&mut self, message: String) {
        self.toolpath.warnings.record(message);
    }

    fn on_path_break(&mut self) {
        self.stroke_open = false;
    }
}

/// Build the toolpath of a command sequence from a fresh machine state
pub fn build_toolpath<I>(commands: I) -> Toolpath
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut state = MachineState::new();
    let mut builder = PathBuilder::new();
    interpret(commands, &mut state, &mut builder);
    let toolpath = builder.finish();
    debug!(
        "toolpath: {} segments in {} strokes",
        toolpath.segments.len(),
        toolpath.strokes.len()
    );
    toolpath
}
