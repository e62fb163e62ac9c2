//! Intersection Finder: self-intersections of every selected path, then
//! crossings between every unordered pair of paths.

use crate::algorithms::adapter::GeometryPath;
use crate::geometry::intersect::{intersect_curves, self_intersection};
use crate::geometry::tolerance::{HIT_DEDUP_POS, PAIR_BBOX_MARGIN, SELF_ENDPOINT_ARTIFACT};
use crate::model::{PathElement, TrimIntersection, Vec2};

#[derive(Clone, Copy, Debug)]
struct Hit {
    point: Vec2,
    curve_a: usize,
    curve_b: usize,
    t_a: f64,
    t_b: f64,
}

fn push_unique(hits: &mut Vec<Hit>, hit: Hit) {
    if !hits.iter().any(|h| h.point.close_to(hit.point, HIT_DEDUP_POS)) {
        hits.push(hit);
    }
}

/// Crossings of a path with itself, across all of its subpaths.
///
/// Anchors shared by neighbouring curves are not crossings, and hits near
/// the path's first or last anchor are open-end artifacts.
fn self_hits(g: &GeometryPath, accuracy: f64) -> Vec<Hit> {
    let mut hits = Vec::new();
    for (i, ci) in g.curves.iter().enumerate() {
        if let Some((t1, t2)) = self_intersection(&ci.curve, accuracy) {
            push_unique(&mut hits, Hit { point: ci.curve.eval(t1), curve_a: i, curve_b: i, t_a: t1, t_b: t2 });
        }
        let bi = ci.curve.control_bounds().inflate(accuracy);
        for (j, cj) in g.curves.iter().enumerate().skip(i + 1) {
            if !bi.overlaps(&cj.curve.control_bounds()) {
                continue;
            }
            let anchors = g.shared_anchors(i, j);
            for (t_a, t_b) in intersect_curves(&ci.curve, &cj.curve, accuracy) {
                let point = ci.curve.eval(t_a);
                if anchors.iter().any(|a| a.close_to(point, HIT_DEDUP_POS)) {
                    continue;
                }
                push_unique(&mut hits, Hit { point, curve_a: i, curve_b: j, t_a, t_b });
            }
        }
    }
    let ends: Vec<Vec2> = g.start_point().into_iter().chain(g.end_point()).collect();
    hits.retain(|h| !ends.iter().any(|e| e.close_to(h.point, SELF_ENDPOINT_ARTIFACT)));
    hits
}

fn pair_hits(a: &GeometryPath, b: &GeometryPath, accuracy: f64) -> Vec<Hit> {
    let mut hits = Vec::new();
    let (Some(ba), Some(bb)) = (a.bounds(), b.bounds()) else { return hits; };
    if !ba.inflate(PAIR_BBOX_MARGIN).overlaps(&bb) {
        return hits;
    }
    for (i, ci) in a.curves.iter().enumerate() {
        let bi = ci.curve.control_bounds().inflate(accuracy);
        for (j, cj) in b.curves.iter().enumerate() {
            if !bi.overlaps(&cj.curve.control_bounds()) {
                continue;
            }
            for (t_a, t_b) in intersect_curves(&ci.curve, &cj.curve, accuracy) {
                push_unique(&mut hits, Hit { point: ci.curve.eval(t_a), curve_a: i, curve_b: j, t_a, t_b });
            }
        }
    }
    hits
}

/// All intersections among `paths`, self-intersections first. Ids are
/// `ix-<n>` in discovery order; each unordered pair is visited once.
pub fn find_intersections_in(paths: &[(&str, &GeometryPath)], accuracy: f64) -> Vec<TrimIntersection> {
    let mut out = Vec::new();
    let mut emit = |out: &mut Vec<TrimIntersection>, pa: &str, pb: &str, h: Hit| {
        let id = format!("ix-{}", out.len());
        out.push(TrimIntersection {
            id,
            point: h.point,
            path_a: pa.to_string(),
            path_b: pb.to_string(),
            curve_a: h.curve_a,
            curve_b: h.curve_b,
            t_a: h.t_a,
            t_b: h.t_b,
        });
    };
    for (id, g) in paths {
        for h in self_hits(g, accuracy) {
            emit(&mut out, id, id, h);
        }
    }
    for (i, (id_a, ga)) in paths.iter().enumerate() {
        for (id_b, gb) in paths.iter().skip(i + 1) {
            for h in pair_hits(ga, gb, accuracy) {
                emit(&mut out, id_a, id_b, h);
            }
        }
    }
    tracing::debug!(paths = paths.len(), intersections = out.len(), "intersections found");
    out
}

pub fn find_intersections(paths: &[&PathElement], accuracy: f64) -> Vec<TrimIntersection> {
    let geoms: Vec<GeometryPath> = paths.iter().map(|p| GeometryPath::from_element(p)).collect();
    let named: Vec<(&str, &GeometryPath)> = paths.iter().map(|p| p.id.as_str()).zip(geoms.iter()).collect();
    find_intersections_in(&named, accuracy)
}
