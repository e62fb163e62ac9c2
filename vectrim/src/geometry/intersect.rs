// Curve/curve intersection for the trim pipeline.
//
// Lines use the robust segment classifier below, line/cubic pairs use
// kurbo's exact curve/line solver, and cubic pairs use recursive
// bounding-box subdivision that finishes on the chords of the two pieces.
// Touching subdivision leaves are grouped so that one crossing or one
// tangent contact yields one hit, and a shared run yields none.

use std::collections::HashMap;

use crate::geometry::curve::Curve;
use crate::geometry::tolerance::{
    EPS_DENOM, EPS_POS, HIT_DEDUP_POS, MAX_SUBDIVISION_DEPTH, OVERLAP_SAMPLES, OVERLAP_SPAN_CELLS,
};
use crate::model::Vec2;
use kurbo::{CubicBez, ParamCurve, ParamCurveExtrema, PathSeg};

// Upper bound on subdivision steps for one curve pair. Coincident curves
// would otherwise subdivide forever.
const MAX_SUBDIVISION_STEPS: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegIntersection {
    None,
    // Proper interior intersection (not at endpoints within tolerance)
    Proper { t: f64, u: f64, x: f64, y: f64 },
    // Touch at endpoints (may be both endpoints). t/u may be 0 or 1 within tolerance
    Touch { t: f64, u: f64, x: f64, y: f64 },
    // Collinear overlapping span: parameter ranges on each segment (inclusive, ordered)
    CollinearOverlap { t0: f64, t1: f64, u0: f64, u1: f64 },
}

#[inline]
fn orient(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[inline]
fn within_eps(x: f64, eps: f64) -> bool { x.abs() <= eps }

#[inline]
fn clamp01f64(x: f64) -> f64 { if x < 0.0 { 0.0 } else if x > 1.0 { 1.0 } else { x } }

// Project AB and CD onto the dominant axis of AB and intersect the parameter ranges.
fn collinear_overlap(a: Vec2, b: Vec2, c: Vec2, d: Vec2, eps: f64) -> SegIntersection {
    let horizontal = (b.x - a.x).abs() >= (b.y - a.y).abs();
    let (pa1, pa2, pc1, pc2) = if horizontal { (a.x, b.x, c.x, d.x) } else { (a.y, b.y, c.y, d.y) };
    let len_ab = pa2 - pa1;
    let len_cd = pc2 - pc1;
    if within_eps(len_ab, eps) {
        // AB is a point: touch if it projects onto CD
        let u = if within_eps(len_cd, eps) { 0.0 } else { (pa1 - pc1) / len_cd };
        if u < -eps || u > 1.0 + eps { return SegIntersection::None; }
        return SegIntersection::Touch { t: 0.0, u: clamp01f64(u), x: a.x, y: a.y };
    }
    let t_c1 = (pc1 - pa1) / len_ab;
    let t_c2 = (pc2 - pa1) / len_ab;
    let lo = t_c1.min(t_c2);
    let hi = t_c1.max(t_c2);
    if hi < -eps || lo > 1.0 + eps { return SegIntersection::None; }
    let lo = lo.max(0.0);
    let hi = hi.min(1.0);
    if hi < lo { return SegIntersection::None; }
    let u0 = if within_eps(len_cd, eps) { 0.0 } else { (pa1 + lo * len_ab - pc1) / len_cd };
    let u1 = if within_eps(len_cd, eps) { 0.0 } else { (pa1 + hi * len_ab - pc1) / len_cd };
    let (u0, u1) = if u0 <= u1 { (u0, u1) } else { (u1, u0) };
    SegIntersection::CollinearOverlap { t0: lo, t1: hi, u0, u1 }
}

pub fn intersect_segments(a: Vec2, b: Vec2, c: Vec2, d: Vec2, eps_pos: f64, eps_denom: f64) -> SegIntersection {
    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);

    if within_eps(o1, eps_pos) && within_eps(o2, eps_pos) && within_eps(o3, eps_pos) && within_eps(o4, eps_pos) {
        return collinear_overlap(a, b, c, d, eps_pos);
    }

    let inter1 = (o1 > 0.0 && o2 < 0.0) || (o1 < 0.0 && o2 > 0.0) || within_eps(o1, eps_pos) || within_eps(o2, eps_pos);
    let inter2 = (o3 > 0.0 && o4 < 0.0) || (o3 < 0.0 && o4 > 0.0) || within_eps(o3, eps_pos) || within_eps(o4, eps_pos);
    if !(inter1 && inter2) {
        return SegIntersection::None;
    }

    let Some((t, u)) = line_params(a, b, c, d, eps_denom) else {
        // Parallel but not collinear
        return SegIntersection::None;
    };
    let x = a.x + t * (b.x - a.x);
    let y = a.y + t * (b.y - a.y);

    let is_touch = within_eps(t, eps_pos) || within_eps(1.0 - t, eps_pos) || within_eps(u, eps_pos) || within_eps(1.0 - u, eps_pos);

    if is_touch {
        SegIntersection::Touch { t: clamp01f64(t), u: clamp01f64(u), x, y }
    } else if t >= -eps_pos && t <= 1.0 + eps_pos && u >= -eps_pos && u <= 1.0 + eps_pos {
        SegIntersection::Proper { t, u, x, y }
    } else {
        SegIntersection::None
    }
}

/// Parameters of the crossing of the infinite lines AB and CD.
fn line_params(a: Vec2, b: Vec2, c: Vec2, d: Vec2, eps_denom: f64) -> Option<(f64, f64)> {
    let (rx, ry) = (b.x - a.x, b.y - a.y);
    let (sx, sy) = (d.x - c.x, d.y - c.y);
    let rxs = rx * sy - ry * sx;
    if within_eps(rxs, eps_denom) {
        return None;
    }
    let (qx, qy) = (c.x - a.x, c.y - a.y);
    Some(((qx * sy - qy * sx) / rxs, (qx * ry - qy * rx) / rxs))
}

/// Parameter pairs `(t_a, t_b)` where two curves cross, sorted by `t_a`.
pub fn intersect_curves(a: &Curve, b: &Curve, accuracy: f64) -> Vec<(f64, f64)> {
    let hits = match (a.to_seg(), b.to_seg()) {
        (PathSeg::Line(la), PathSeg::Line(lb)) => {
            match intersect_segments(la.p0.into(), la.p1.into(), lb.p0.into(), lb.p1.into(), EPS_POS, EPS_DENOM) {
                SegIntersection::Proper { t, u, .. } | SegIntersection::Touch { t, u, .. } => vec![(t, u)],
                // Overlapping collinear runs are not crossings
                SegIntersection::CollinearOverlap { .. } | SegIntersection::None => Vec::new(),
            }
        }
        (PathSeg::Line(la), seg_b) => seg_b
            .intersect_line(la)
            .iter()
            .map(|hit| (hit.line_t, hit.segment_t))
            .collect(),
        (seg_a, PathSeg::Line(lb)) => seg_a
            .intersect_line(lb)
            .iter()
            .map(|hit| (hit.segment_t, hit.line_t))
            .collect(),
        (seg_a, seg_b) => {
            if covers(a, b, accuracy) || covers(b, a, accuracy) {
                return Vec::new();
            }
            let mut cells = Vec::new();
            let mut steps = 0usize;
            subdivide_pair(
                as_cubic(seg_a), (0.0, 1.0),
                as_cubic(seg_b), (0.0, 1.0),
                accuracy, 0, &mut steps, &mut cells,
            );
            if steps >= MAX_SUBDIVISION_STEPS {
                tracing::warn!(cells = cells.len(), "curve intersection hit the subdivision budget");
            }
            resolve_cells(a, b, cells, accuracy)
        }
    };
    dedup_hits(a, hits)
}

fn as_cubic(seg: PathSeg) -> CubicBez {
    match seg {
        PathSeg::Line(l) => CubicBez::new(l.p0, l.p0.lerp(l.p1, 1.0 / 3.0), l.p0.lerp(l.p1, 2.0 / 3.0), l.p1),
        PathSeg::Quad(q) => q.raise(),
        PathSeg::Cubic(c) => c,
    }
}

fn hull(c: &CubicBez) -> (f64, f64, f64, f64) {
    let xs = [c.p0.x, c.p1.x, c.p2.x, c.p3.x];
    let ys = [c.p0.y, c.p1.y, c.p2.y, c.p3.y];
    let fold = |v: [f64; 4]| v.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    let (x0, x1) = fold(xs);
    let (y0, y1) = fold(ys);
    (x0, y0, x1, y1)
}

#[allow(clippy::too_many_arguments)]
fn subdivide_pair(
    a: CubicBez, ra: (f64, f64),
    b: CubicBez, rb: (f64, f64),
    accuracy: f64, depth: u32, steps: &mut usize, out: &mut Vec<Cell>,
) {
    *steps += 1;
    if *steps > MAX_SUBDIVISION_STEPS {
        return;
    }
    let (ax0, ay0, ax1, ay1) = hull(&a);
    let (bx0, by0, bx1, by1) = hull(&b);
    let slack = accuracy * 0.5;
    if ax0 > bx1 + slack || bx0 > ax1 + slack || ay0 > by1 + slack || by0 > ay1 + slack {
        return;
    }
    let size_a = (ax1 - ax0).max(ay1 - ay0);
    let size_b = (bx1 - bx0).max(by1 - by0);
    if (size_a <= accuracy && size_b <= accuracy) || depth >= MAX_SUBDIVISION_DEPTH {
        // Both pieces are effectively straight; finish on their chords
        let (t, u) = line_params(a.p0.into(), a.p3.into(), b.p0.into(), b.p3.into(), EPS_DENOM)
            .map(|(t, u)| (t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
            .unwrap_or((0.5, 0.5));
        out.push(Cell { ra, rb, t: ra.0 + t * (ra.1 - ra.0), u: rb.0 + u * (rb.1 - rb.0) });
        return;
    }
    if size_a >= size_b {
        let (a0, a1) = a.subdivide();
        let mid = 0.5 * (ra.0 + ra.1);
        subdivide_pair(a0, (ra.0, mid), b, rb, accuracy, depth + 1, steps, out);
        subdivide_pair(a1, (mid, ra.1), b, rb, accuracy, depth + 1, steps, out);
    } else {
        let (b0, b1) = b.subdivide();
        let mid = 0.5 * (rb.0 + rb.1);
        subdivide_pair(a, ra, b0, (rb.0, mid), accuracy, depth + 1, steps, out);
        subdivide_pair(a, ra, b1, (mid, rb.1), accuracy, depth + 1, steps, out);
    }
}

// One subdivision leaf: the parameter ranges of both pieces and the
// crossing of their chords.
#[derive(Clone, Copy, Debug)]
struct Cell {
    ra: (f64, f64),
    rb: (f64, f64),
    t: f64,
    u: f64,
}

// Bisection endpoints are exact dyadics, so neighbours share bounds.
const CELL_SLACK: f64 = 1e-12;

impl Cell {
    fn touches(&self, other: &Cell) -> bool {
        let meet = |p: (f64, f64), q: (f64, f64)| p.0 <= q.1 + CELL_SLACK && q.0 <= p.1 + CELL_SLACK;
        meet(self.ra, other.ra) && meet(self.rb, other.rb)
    }
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Connected runs of cells that touch in both parameter ranges.
fn group_cells(mut cells: Vec<Cell>) -> Vec<Vec<Cell>> {
    cells.sort_by(|x, y| x.ra.0.total_cmp(&y.ra.0));
    let n = cells.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if cells[j].ra.0 > cells[i].ra.1 + CELL_SLACK {
                break;
            }
            if cells[i].touches(&cells[j]) {
                let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }
    let mut groups: Vec<Vec<Cell>> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let root = find_root(&mut parent, i);
        let g = *slot.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(*cell);
    }
    groups
}

/// One hit per run of touching cells, at the cell where the curves come
/// closest. A run longer than `OVERLAP_SPAN_CELLS * accuracy` on both
/// curves is a shared stretch, not a crossing.
fn resolve_cells(a: &Curve, b: &Curve, cells: Vec<Cell>, accuracy: f64) -> Vec<(f64, f64)> {
    let span_limit = accuracy * OVERLAP_SPAN_CELLS;
    group_cells(cells)
        .into_iter()
        .filter_map(|group| {
            let (mut ta, mut tb) = ((1.0f64, 0.0f64), (1.0f64, 0.0f64));
            for c in &group {
                ta = (ta.0.min(c.ra.0), ta.1.max(c.ra.1));
                tb = (tb.0.min(c.rb.0), tb.1.max(c.rb.1));
            }
            let span_a = a.eval(ta.0).distance(a.eval(ta.1));
            let span_b = b.eval(tb.0).distance(b.eval(tb.1));
            if span_a > span_limit && span_b > span_limit {
                tracing::debug!(span_a, span_b, "overlapping curve run skipped");
                return None;
            }
            group
                .iter()
                .map(|c| (c.t, c.u, a.eval(c.t).distance(b.eval(c.u))))
                .min_by(|x, y| x.2.total_cmp(&y.2))
                .map(|(t, u, _)| (t, u))
        })
        .collect()
}

// Every sample of `other`, ends included, lies on `host`.
fn covers(host: &Curve, other: &Curve, tol: f64) -> bool {
    (0..=OVERLAP_SAMPLES).all(|k| host.nearest(other.eval(k as f64 / OVERLAP_SAMPLES as f64)).0 <= tol)
}

// Neighbouring subdivision cells report the same crossing; keep one per point.
fn dedup_hits(a: &Curve, mut hits: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    hits.sort_by(|x, y| x.0.total_cmp(&y.0));
    let mut kept: Vec<(f64, f64)> = Vec::with_capacity(hits.len());
    let mut kept_points: Vec<Vec2> = Vec::with_capacity(hits.len());
    for (t, u) in hits {
        if !(t.is_finite() && u.is_finite()) {
            continue;
        }
        let p = a.eval(t);
        if kept_points.iter().any(|q| q.close_to(p, HIT_DEDUP_POS)) {
            continue;
        }
        kept.push((t, u));
        kept_points.push(p);
    }
    kept
}

/// Parameters `(t1, t2)`, `t1 < t2`, where a cubic crosses itself.
///
/// The curve is cut at its x/y extrema into monotone pieces, which cannot
/// cross themselves, and the pieces are intersected pairwise.
pub fn self_intersection(curve: &Curve, accuracy: f64) -> Option<(f64, f64)> {
    let Curve::Cubic { .. } = curve else { return None; };
    let seg = curve.to_seg();
    let mut cuts: Vec<f64> = seg.extrema().iter().copied().filter(|t| *t > 0.0 && *t < 1.0).collect();
    cuts.sort_by(|a, b| a.total_cmp(b));
    cuts.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    if cuts.is_empty() {
        return None;
    }
    let mut ranges = Vec::with_capacity(cuts.len() + 1);
    let mut prev = 0.0;
    for &c in cuts.iter().chain(std::iter::once(&1.0)) {
        ranges.push((prev, c));
        prev = c;
    }
    let pieces: Vec<Curve> = ranges.iter().map(|&(t0, t1)| curve.subsegment(t0, t1)).collect();
    for i in 0..pieces.len() {
        for j in (i + 1)..pieces.len() {
            for (ti, tj) in intersect_curves(&pieces[i], &pieces[j], accuracy) {
                let p = pieces[i].eval(ti);
                if j == i + 1 && p.close_to(pieces[i].end(), HIT_DEDUP_POS) {
                    continue;
                }
                let (ri, rj) = (ranges[i], ranges[j]);
                let t1 = ri.0 + ti * (ri.1 - ri.0);
                let t2 = rj.0 + tj * (rj.1 - rj.0);
                if (t2 - t1).abs() > 1e-4 {
                    return Some((t1.min(t2), t1.max(t2)));
                }
            }
        }
    }
    None
}
