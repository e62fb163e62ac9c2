use serde::{Deserialize, Serialize};

use crate::geometry::bounds::Bounds;
use crate::geometry::curve::Curve;
use crate::geometry::intersect::intersect_curves;
use crate::geometry::tolerance::{CURVE_ACCURACY, EPS_POS};
use crate::model::{SplitPathResult, TrimSegment, Vec2};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentPick {
    pub segment_id: String,
    /// Index into the segment's curves
    pub curve: usize,
    pub t: f64,
    pub dist: f64,
}

// Closest curve of one segment within tol: (curve, t, dist)
fn nearest_on(seg: &TrimSegment, p: Vec2, tol: f64) -> Option<(usize, f64, f64)> {
    if !seg.bounds.inflate(tol).contains_point(p) { return None; }
    let mut best: Option<(usize, f64, f64)> = None;
    for (i, c) in seg.curves.iter().enumerate() {
        if !c.control_bounds().inflate(tol).contains_point(p) { continue; }
        let (d, t) = c.nearest(p);
        if d <= tol && best.map_or(true, |(_, _, bd)| d < bd) { best = Some((i, t, d)); }
    }
    best
}

/// Nearest segment within `tol` of `p`. Ties keep the earlier segment.
pub fn pick_segment(r: &SplitPathResult, p: Vec2, tol: f64) -> Option<SegmentPick> {
    let mut best: Option<SegmentPick> = None;
    for seg in &r.segments {
        if let Some((curve, t, dist)) = nearest_on(seg, p, tol) {
            if best.as_ref().map_or(true, |b| dist < b.dist) {
                best = Some(SegmentPick { segment_id: seg.id.clone(), curve, t, dist });
            }
        }
    }
    best
}

/// Ids of every segment the cursor step `from -> to` crosses, or that the
/// cursor passes within `tol` of, in segment order.
pub fn segments_crossed(r: &SplitPathResult, from: Vec2, to: Vec2, tol: f64) -> Vec<String> {
    let still = from.close_to(to, EPS_POS);
    let step = Curve::line(from, to);
    let reach = Bounds::from_points(from, to).inflate(tol);
    let mut out = Vec::new();
    for seg in &r.segments {
        if !seg.bounds.overlaps(&reach) { continue; }
        let crossed = !still && seg.curves.iter().any(|c| {
            c.control_bounds().overlaps(&reach) && !intersect_curves(c, &step, CURVE_ACCURACY).is_empty()
        });
        if crossed || nearest_on(seg, to, tol).is_some() || nearest_on(seg, from, tol).is_some() {
            out.push(seg.id.clone());
        }
    }
    out
}
