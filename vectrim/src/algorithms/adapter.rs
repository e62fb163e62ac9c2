//! Curve/Path Adapter: flattens a compound path into one list of curves.
//!
//! Intersections are reported against global curve indices while splitting
//! works per subpath, so every curve keeps `(subpath, local)` alongside its
//! global position.

use crate::geometry::bounds::Bounds;
use crate::geometry::curve::Curve;
use crate::model::{Command, PathElement, SubPath, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveRef {
    pub curve: Curve,
    pub subpath: usize,
    pub local: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubpathInfo {
    pub start: Vec2,
    pub closed: bool,
    /// Global index of the first curve
    pub first_curve: usize,
    pub curve_count: usize,
}

impl SubpathInfo {
    pub fn curve_range(&self) -> std::ops::Range<usize> {
        self.first_curve..self.first_curve + self.curve_count
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryPath {
    pub curves: Vec<CurveRef>,
    /// One entry per source subpath, including empty ones, so that
    /// subpath indices line up with the element.
    pub subpaths: Vec<SubpathInfo>,
}

impl GeometryPath {
    pub fn from_subpaths(subpaths: &[SubPath]) -> Self {
        let mut g = GeometryPath::default();
        for (si, sp) in subpaths.iter().enumerate() {
            let first_curve = g.curves.len();
            let mut start: Option<Vec2> = None;
            let mut cur = Vec2::default();
            let mut closed = false;
            let mut local = 0usize;
            let push = |g: &mut GeometryPath, curve: Curve, local: &mut usize| {
                // Zero-length curves carry no geometry to trim
                if curve.is_degenerate() || !curve.start().is_finite() || !curve.end().is_finite() {
                    return;
                }
                g.curves.push(CurveRef { curve, subpath: si, local: *local });
                *local += 1;
            };
            for cmd in &sp.commands {
                match *cmd {
                    Command::MoveTo { x, y } => {
                        // A second move-to inside one subpath is malformed; keep the first
                        if start.is_none() {
                            start = Some(Vec2::new(x, y));
                            cur = Vec2::new(x, y);
                        }
                    }
                    Command::LineTo { x, y } => {
                        if start.is_none() { break; }
                        let to = Vec2::new(x, y);
                        push(&mut g, Curve::line(cur, to), &mut local);
                        cur = to;
                    }
                    Command::CurveTo { x1, y1, x2, y2, x, y } => {
                        if start.is_none() { break; }
                        let to = Vec2::new(x, y);
                        push(&mut g, Curve::cubic(cur, Vec2::new(x1, y1), Vec2::new(x2, y2), to), &mut local);
                        cur = to;
                    }
                    Command::Close => {
                        if let Some(s) = start {
                            if cur != s {
                                push(&mut g, Curve::line(cur, s), &mut local);
                            }
                            cur = s;
                            closed = true;
                        }
                        break;
                    }
                }
            }
            g.subpaths.push(SubpathInfo {
                start: start.unwrap_or_default(),
                closed,
                first_curve,
                curve_count: g.curves.len() - first_curve,
            });
        }
        g
    }

    pub fn from_element(el: &PathElement) -> Self {
        GeometryPath::from_subpaths(&el.subpaths)
    }

    /// Malformed data produces an empty geometry path.
    pub fn from_path_data(d: &str) -> Self {
        match crate::svg::parse_path_data(d) {
            Ok(sp) => GeometryPath::from_subpaths(&sp),
            Err(e) => {
                tracing::warn!(error = %e, "path data could not be converted to geometry");
                GeometryPath::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn curve(&self, global: usize) -> Option<&CurveRef> {
        self.curves.get(global)
    }

    pub fn global_index(&self, subpath: usize, local: usize) -> Option<usize> {
        let info = self.subpaths.get(subpath)?;
        (local < info.curve_count).then(|| info.first_curve + local)
    }

    pub fn locate(&self, global: usize) -> Option<(usize, usize)> {
        self.curves.get(global).map(|c| (c.subpath, c.local))
    }

    pub fn subpath_curves(&self, subpath: usize) -> &[CurveRef] {
        match self.subpaths.get(subpath) {
            Some(info) => &self.curves[info.curve_range()],
            None => &[],
        }
    }

    /// Anchors two curves share: consecutive in one subpath, or the last
    /// and first curve of a closed subpath (both, for a two-curve loop).
    pub fn shared_anchors(&self, a: usize, b: usize) -> Vec<Vec2> {
        let mut out = Vec::new();
        let (Some(ca), Some(cb)) = (self.curves.get(a), self.curves.get(b)) else { return out; };
        if ca.subpath != cb.subpath || a == b {
            return out;
        }
        let (lo, hi) = if a < b { (ca, cb) } else { (cb, ca) };
        let info = self.subpaths[lo.subpath];
        if hi.local == lo.local + 1 {
            out.push(lo.curve.end());
        }
        if info.closed && lo.local == 0 && hi.local + 1 == info.curve_count {
            out.push(lo.curve.start());
        }
        out
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let mut it = self.curves.iter();
        let first = it.next()?.curve.bounds();
        Some(it.fold(first, |acc, c| acc.union(&c.curve.bounds())))
    }

    /// First anchor of the path.
    pub fn start_point(&self) -> Option<Vec2> {
        self.curves.first().map(|c| c.curve.start())
    }

    /// Last anchor of the path.
    pub fn end_point(&self) -> Option<Vec2> {
        self.curves.last().map(|c| c.curve.end())
    }

    pub fn to_subpaths(&self) -> Vec<SubPath> {
        self.subpaths
            .iter()
            .enumerate()
            .filter(|(_, info)| info.curve_count > 0)
            .map(|(si, info)| {
                let curves: Vec<Curve> = self.subpath_curves(si).iter().map(|c| c.curve).collect();
                crate::svg::curves_to_subpath(&curves, info.closed)
            })
            .collect()
    }

    pub fn to_path_data(&self) -> String {
        crate::svg::to_path_data(&self.to_subpaths())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_path_keeps_subpath_mapping() {
        let g = GeometryPath::from_path_data("M0 0 L10 0 L10 10 Z M20 20 C 25 20 30 25 30 30");
        assert_eq!(g.subpaths.len(), 2);
        // Z adds the closing edge back to the start
        assert_eq!(g.subpaths[0].curve_count, 3);
        assert!(g.subpaths[0].closed);
        assert_eq!(g.subpaths[1].first_curve, 3);
        assert_eq!(g.locate(3), Some((1, 0)));
        assert_eq!(g.global_index(1, 0), Some(3));
        assert_eq!(g.global_index(1, 1), None);
    }

    #[test]
    fn shared_anchor_includes_the_seam() {
        let g = GeometryPath::from_path_data("M0 0 L10 0 L10 10 Z");
        assert_eq!(g.shared_anchors(0, 1), vec![Vec2::new(10.0, 0.0)]);
        assert_eq!(g.shared_anchors(2, 0), vec![Vec2::new(0.0, 0.0)]);
        let open = GeometryPath::from_path_data("M0 0 L10 0 L10 10 L0 10");
        assert!(open.shared_anchors(0, 2).is_empty());
        let lens = GeometryPath::from_path_data("M0 0 C 0 10 10 10 10 0 C 10 -10 0 -10 0 0 Z");
        assert_eq!(lens.shared_anchors(0, 1).len(), 2);
    }

    #[test]
    fn malformed_data_is_empty_geometry() {
        assert!(GeometryPath::from_path_data("L 5 5").is_empty());
        assert!(GeometryPath::from_path_data("").is_empty());
    }

    #[test]
    fn round_trips_closed_curves() {
        let d = "M 0 0 C 0 50 50 100 100 100 C 150 100 100 0 0 0 Z";
        assert_eq!(GeometryPath::from_path_data(d).to_path_data(), d);
    }
}
