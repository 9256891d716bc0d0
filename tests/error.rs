//! Tests for error module

use traclus::error::{OptionExt, TraclusError};

#[test]
fn test_error_display() {
    let err = TraclusError::InsufficientPoints {
        trajectory_id: "elk-3".to_string(),
        point_count: 1,
        minimum_required: 2,
    };
    assert!(err.to_string().contains("elk-3"));
    assert!(err.to_string().contains("1 points"));

    let err = TraclusError::LabelCountMismatch {
        segments: 4,
        labels: 3,
    };
    assert_eq!(err.to_string(), "got 3 cluster labels for 4 segments");

    let err = TraclusError::Parse {
        line: 12,
        message: "missing point count".to_string(),
    };
    assert_eq!(err.to_string(), "line 12: missing point count");
}

#[test]
fn test_option_ext() {
    let none: Option<i32> = None;
    let result = none.ok_or_insufficient_points("test", 0, 2);
    assert!(matches!(
        result,
        Err(TraclusError::InsufficientPoints { .. })
    ));

    let none: Option<&str> = None;
    assert!(matches!(
        none.ok_or_parse(5, "missing id"),
        Err(TraclusError::Parse { line: 5, .. })
    ));

    assert_eq!(Some(3).ok_or_parse(1, "unused").unwrap(), 3);
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: TraclusError = io.into();
    assert!(matches!(err, TraclusError::Io(_)));
    assert_eq!(err.to_string(), "gone");
}
