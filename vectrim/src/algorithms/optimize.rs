//! Segment Optimizer: joins neighbouring segments that meet without an
//! intersection between them. Cut points are never merged away.

use crate::geometry::tolerance::MERGE_TOL;
use crate::model::TrimSegment;
use crate::svg::curves_to_path_data;

/// `a` runs straight into `b` and neither declares a cut where they meet.
pub fn can_merge(a: &TrimSegment, b: &TrimSegment) -> bool {
    a.path_id == b.path_id
        && a.subpath_index == b.subpath_index
        && a.end_point.close_to(b.start_point, MERGE_TOL)
        && a.end_intersection.is_none()
        && b.start_intersection.is_none()
}

/// Concatenation of `a` then `b`. Keeps `a`'s id and the outer boundaries.
pub fn merge_pair(mut a: TrimSegment, b: TrimSegment) -> TrimSegment {
    for i in b.curve_indices {
        if !a.curve_indices.contains(&i) {
            a.curve_indices.push(i);
        }
    }
    a.bounds = a.bounds.union(&b.bounds);
    a.end_intersection = b.end_intersection;
    a.end_point = b.end_point;
    a.curves.extend(b.curves);
    a.path_data = curves_to_path_data(&a.curves, false);
    a
}

/// Merge runs of consecutive segments in order; never wraps around.
pub fn merge_consecutive(segments: Vec<TrimSegment>) -> Vec<TrimSegment> {
    let before = segments.len();
    let mut out: Vec<TrimSegment> = Vec::with_capacity(before);
    for seg in segments {
        match out.pop() {
            Some(prev) if can_merge(&prev, &seg) => out.push(merge_pair(prev, seg)),
            Some(prev) => {
                out.push(prev);
                out.push(seg);
            }
            None => out.push(seg),
        }
    }
    if out.len() != before {
        tracing::debug!(before, after = out.len(), "segments merged");
    }
    out
}
