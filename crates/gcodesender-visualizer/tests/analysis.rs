use gcodesender_core::Point3;
use gcodesender_visualizer::{analyze, build_toolpath, tokenize, PathSegment};

#[test]
fn test_base_regression_case() {
    let result = analyze(["G21", "G90", "G0 X100 F10", "G1 Y100 F20"]);
    assert_eq!(result.max_position, Point3::new(100.0, 100.0, 0.0));
    assert_eq!(result.min_position, Point3::origin());
    assert!((result.estimated_time_minutes - 15.0).abs() < 1e-9);
    assert!(result.warnings.is_empty());
    assert_eq!(result.formatted_duration(), "15 minutes, 0 second");
}

#[test]
fn test_empty_program() {
    let result = analyze(Vec::<String>::new());
    assert_eq!(result.min_position, Point3::origin());
    assert_eq!(result.max_position, Point3::origin());
    assert_eq!(result.estimated_time_minutes, 0.0);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_arc_without_j_warns_once_and_does_not_move() {
    let result = analyze(["G1 X5 Y5", "G2 X10 Y10 I1"]);
    assert_eq!(result.warnings.len(), 1);
    let (message, count) = result.warnings.iter().next().unwrap();
    assert!(message.contains("only supports specification of both I and J"));
    assert_eq!(count, 1);
    assert_eq!(result.max_position, Point3::new(5.0, 5.0, 0.0));
}

#[test]
fn test_unknown_command_counted() {
    let result = analyze(["G999", "G999"]);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings.count("unknown gcode command: G999"), 2);
}

#[test]
fn test_inch_program() {
    let commands = tokenize("G20 G90\nG1 X1 Y2 F10\nG21 G1 X3");
    let result = analyze(&commands);
    assert!((result.max_position.x - 25.4).abs() < 1e-9);
    assert!((result.max_position.y - 50.8).abs() < 1e-9);
    // back in mm for the last move
    let toolpath = build_toolpath(&commands);
    assert_eq!(toolpath.segments.last().unwrap().to().x, 3.0);
}

#[test]
fn test_analysis_and_toolpath_agree() {
    let commands = tokenize(
        "G21 G90 G0 Z5 G0 X10 Y10 G1 Z-1 F100 G1 X20 G2 X30 Y10 I5 J0 G91 G1 Y5 G90 G0 Z5",
    );
    let result = analyze(&commands);
    let toolpath = build_toolpath(&commands);
    let end = toolpath.segments.last().unwrap().to();
    assert_eq!(end, Point3::new(30.0, 15.0, 5.0));
    assert_eq!(result.max_position.x, 30.0);
    assert!(matches!(toolpath.segments[4], PathSegment::Arc { clockwise: true, .. }));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_toolpath_serializes() {
    let toolpath = build_toolpath(["G0 X1", "G1 Y1"]);
    let json = serde_json::to_value(&toolpath).unwrap();
    assert_eq!(json["segments"][0]["kind"], "line");
    assert_eq!(json["segments"][0]["is_rapid"], true);
    assert_eq!(json["strokes"].as_array().unwrap().len(), 2);
}
