use serde_json::json;
use vectrim::geometry::limits;
use vectrim::model::PathElement;
use vectrim::svg::parse_path_data;
use vectrim::{Document, PathDataError};

#[test]
fn json_caps_exceeded_elements() {
    let elements: Vec<_> = (0..limits::MAX_ELEMENTS + 1)
        .map(|i| json!({"type": "text", "id": format!("t{}", i)}))
        .collect();
    let err = Document::from_json_value(json!({"version": 1, "elements": elements})).unwrap_err();
    assert_eq!(err.code(), "caps_exceeded");
}

#[test]
fn json_invalid_numbers() {
    let v = json!({"version": 1, "elements": [{"type": "path", "id": "a", "d": "M0 0 L1e38 0"}]});
    assert_eq!(Document::from_json_value(v).unwrap_err().code(), "bad_path_data");
    // Relative steps can walk out of range without any single number doing so
    let steps = format!("M9000000 0{}", " l900000 0".repeat(20));
    let r = json!({"version": 1, "elements": [{"type": "path", "id": "a", "d": steps}]});
    assert_eq!(Document::from_json_value(r).unwrap_err().code(), "out_of_bounds");
    let w = json!({"version": 1, "elements": [{"type": "path", "id": "a", "d": "M0 0 L1 1", "style": {"stroke_width": 1e9}}]});
    assert_eq!(Document::from_json_value(w).unwrap_err().code(), "out_of_bounds");
}

#[test]
fn json_future_version_rejected() {
    let v = json!({"version": 99, "elements": []});
    assert_eq!(Document::from_json_value(v).unwrap_err().code(), "invalid_structure");
}

#[test]
fn json_from_str_reports_syntax_errors() {
    assert_eq!(Document::from_json_str("{ not json").unwrap_err().code(), "invalid_json");
    let doc = Document::from_json_str(r#"{"elements":[{"type":"path","id":"a","d":"M0 0 L5 5"}]}"#).unwrap();
    assert_eq!(doc.len(), 1);
}

#[test]
fn svg_overlong_d_is_rejected() {
    let long = "M 0 0 L 1 1 ".repeat(400_000);
    assert!(long.len() > limits::MAX_PATH_DATA_LEN);
    assert!(matches!(parse_path_data(&long), Err(PathDataError::TooLong(_))));
    assert!(PathElement::from_path_data("p", &long).subpaths.is_empty());
}

#[test]
fn svg_too_many_commands() {
    let many = format!("M0 0{}", " L1 1".repeat(limits::MAX_PATH_COMMANDS));
    assert!(matches!(parse_path_data(&many), Err(PathDataError::TooManyCommands)));
}

#[test]
fn svg_garbage_never_panics() {
    for d in ["", "Z", "M", "M 1", "M0 0 L", "M0 0 C 1 2 3", "M0 0 X 1 1", "M0 0 L nan 1", "M 1e400 0", "m0,0l.5.5-.5.5z"] {
        let _ = parse_path_data(d);
        let _ = PathElement::from_path_data("p", d);
    }
}
