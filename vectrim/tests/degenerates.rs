use std::collections::HashSet;

use vectrim::algorithms::adapter::GeometryPath;
use vectrim::algorithms::reconstruct::reconstruct_paths;
use vectrim::algorithms::split::compute_split;
use vectrim::geometry::tolerance::CURVE_ACCURACY;
use vectrim::model::{Element, PathElement};
use vectrim::{Document, TrimOptions, TrimTool};

#[test]
fn zero_length_curves_are_skipped() {
    let g = GeometryPath::from_path_data("M10 10 L10 10 C 10 10 10 10 10 10 L20 10");
    assert_eq!(g.curves.len(), 1);
    assert_eq!(g.subpaths[0].curve_count, 1);
}

#[test]
fn malformed_path_contributes_nothing() {
    let bad = PathElement::from_path_data("bad", "L 5 5 nonsense");
    assert!(bad.subpaths.is_empty());
    let a = PathElement::from_path_data("a", "M0 0 L100 100");
    let b = PathElement::from_path_data("b", "M0 100 L100 0");
    let r = compute_split(&[&a, &bad, &b], CURVE_ACCURACY);
    assert_eq!(r.intersections.len(), 1);
    assert_eq!(r.segments_of("bad").count(), 0);
    assert!(r.original_paths.contains_key("bad"));
    // Nothing to rebuild for the empty path
    let out = reconstruct_paths(&r, &HashSet::new());
    assert!(out.iter().all(|p| p.source_path_id != "bad"));
}

#[test]
fn move_only_paths_are_selectable_but_inert() {
    let doc = Document::from_elements(vec![
        Element::Path(PathElement::from_path_data("m1", "M0 0")),
        Element::Path(PathElement::from_path_data("m2", "M5 5 M6 6")),
    ]);
    let mut tool = TrimTool::new(TrimOptions::default());
    tool.select(&doc, &["m1".to_string(), "m2".to_string()]).unwrap();
    let s = tool.session().unwrap();
    assert!(s.split_result().segments.is_empty());
    assert!(s.split_result().intersections.is_empty());
}

#[test]
fn identical_overlapping_lines_do_not_explode() {
    // Collinear overlaps are not crossings
    let a = PathElement::from_path_data("a", "M0 0 L100 0");
    let b = PathElement::from_path_data("b", "M0 0 L100 0");
    let r = compute_split(&[&a, &b], CURVE_ACCURACY);
    assert!(r.intersections.is_empty());
    assert_eq!(r.segments.len(), 2);
}

#[test]
fn coincident_cubics_do_not_cross() {
    let d = "M0 0 C 30 60 70 60 100 0";
    let a = PathElement::from_path_data("a", d);
    let b = PathElement::from_path_data("b", d);
    let r = compute_split(&[&a, &b], CURVE_ACCURACY);
    assert!(r.intersections.is_empty(), "got {} intersections", r.intersections.len());
    assert_eq!(r.segments.len(), 2);
}

#[test]
fn tangent_arches_touch_at_most_once() {
    let a = PathElement::from_path_data("a", "M0 0 C 0 100 100 100 100 0");
    let b = PathElement::from_path_data("b", "M0 150 C 0 50 100 50 100 150");
    let r = compute_split(&[&a, &b], CURVE_ACCURACY);
    assert!(r.intersections.len() <= 1, "got {} intersections", r.intersections.len());
    assert!(r.segments.len() <= 4);
}

#[test]
fn tangent_circles_touch_at_most_once() {
    let left = "M50 0 C50 27.614 27.614 50 0 50 C-27.614 50 -50 27.614 -50 0 \
                C-50 -27.614 -27.614 -50 0 -50 C27.614 -50 50 -27.614 50 0 Z";
    let right = "M150 0 C150 27.614 127.614 50 100 50 C72.386 50 50 27.614 50 0 \
                 C50 -27.614 72.386 -50 100 -50 C127.614 -50 150 -27.614 150 0 Z";
    let a = PathElement::from_path_data("a", left);
    let b = PathElement::from_path_data("b", right);
    let r = compute_split(&[&a, &b], CURVE_ACCURACY);
    assert!(r.intersections.len() <= 1, "got {} intersections", r.intersections.len());
    for ix in &r.intersections {
        assert!(ix.point.close_to(vectrim::Vec2::new(50.0, 0.0), 0.05));
    }
    assert!(r.segments.len() <= 2);
}
