//! Single drawing curves (one line or cubic between two anchors) and their
//! bridge to the kurbo geometry kernel.
//!
//! Curves are stored with their original control points. Every operation
//! that cuts a curve pins the shared cut point so neighbouring pieces meet
//! exactly, and never resamples a piece it does not cut.

use crate::geometry::bounds::Bounds;
use crate::geometry::tolerance::{ARCLEN_ACCURACY, EPS_POS};
use crate::model::Vec2;
use kurbo::{
    CubicBez, Line, ParamCurve, ParamCurveArclen, ParamCurveExtrema, ParamCurveNearest, PathSeg,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Curve {
    Line { from: Vec2, to: Vec2 },
    Cubic { from: Vec2, c1: Vec2, c2: Vec2, to: Vec2 },
}

impl Curve {
    pub fn line(from: Vec2, to: Vec2) -> Self {
        Curve::Line { from, to }
    }

    pub fn cubic(from: Vec2, c1: Vec2, c2: Vec2, to: Vec2) -> Self {
        Curve::Cubic { from, c1, c2, to }
    }

    pub fn start(&self) -> Vec2 {
        match *self {
            Curve::Line { from, .. } | Curve::Cubic { from, .. } => from,
        }
    }

    pub fn end(&self) -> Vec2 {
        match *self {
            Curve::Line { to, .. } | Curve::Cubic { to, .. } => to,
        }
    }

    pub fn to_seg(&self) -> PathSeg {
        match *self {
            Curve::Line { from, to } => PathSeg::Line(Line::new(from, to)),
            Curve::Cubic { from, c1, c2, to } => PathSeg::Cubic(CubicBez::new(from, c1, c2, to)),
        }
    }

    /// Quadratics are raised to cubics; the curve itself is unchanged.
    pub fn from_seg(seg: PathSeg) -> Self {
        match seg {
            PathSeg::Line(l) => Curve::line(l.p0.into(), l.p1.into()),
            PathSeg::Quad(q) => Curve::from_seg(PathSeg::Cubic(q.raise())),
            PathSeg::Cubic(c) => Curve::cubic(c.p0.into(), c.p1.into(), c.p2.into(), c.p3.into()),
        }
    }

    pub fn eval(&self, t: f64) -> Vec2 {
        match *self {
            Curve::Line { from, to } => from.lerp(to, t),
            _ => self.to_seg().eval(t).into(),
        }
    }

    fn with_endpoints(self, from: Vec2, to: Vec2) -> Self {
        match self {
            Curve::Line { .. } => Curve::Line { from, to },
            Curve::Cubic { c1, c2, .. } => Curve::Cubic { from, c1, c2, to },
        }
    }

    /// Portion of the curve between `t0` and `t1`.
    pub fn subsegment(&self, t0: f64, t1: f64) -> Curve {
        if t0 <= 0.0 && t1 >= 1.0 {
            return *self;
        }
        let from = if t0 <= 0.0 { self.start() } else { self.eval(t0) };
        let to = if t1 >= 1.0 { self.end() } else { self.eval(t1) };
        match self {
            Curve::Line { .. } => Curve::line(from, to),
            Curve::Cubic { .. } => Curve::from_seg(self.to_seg().subsegment(t0..t1)).with_endpoints(from, to),
        }
    }

    /// Cut the curve at ascending interior offsets. `offsets.len() + 1`
    /// pieces are returned and consecutive pieces share their cut point.
    pub fn split_at(&self, offsets: &[f64]) -> Vec<Curve> {
        let mut bounds = Vec::with_capacity(offsets.len() + 2);
        bounds.push(0.0);
        bounds.extend_from_slice(offsets);
        bounds.push(1.0);
        bounds
            .windows(2)
            .map(|w| self.subsegment(w[0], w[1]))
            .collect()
    }

    /// Exact axis-aligned bounds of the curve.
    pub fn bounds(&self) -> Bounds {
        self.to_seg().bounding_box().into()
    }

    /// Bounds of the control polygon; cheaper and always encloses the curve.
    pub fn control_bounds(&self) -> Bounds {
        match *self {
            Curve::Line { from, to } => Bounds::from_points(from, to),
            Curve::Cubic { from, c1, c2, to } => {
                Bounds::from_points(from, to).union(&Bounds::from_points(c1, c2))
            }
        }
    }

    pub fn arclen(&self) -> f64 {
        match *self {
            Curve::Line { from, to } => from.distance(to),
            _ => self.to_seg().arclen(ARCLEN_ACCURACY),
        }
    }

    /// Distance from `p` to the curve and the parameter of the closest point.
    pub fn nearest(&self, p: Vec2) -> (f64, f64) {
        let n = self.to_seg().nearest(p.into(), ARCLEN_ACCURACY);
        (n.distance_sq.max(0.0).sqrt(), n.t)
    }

    /// All control points coincide with the start.
    pub fn is_degenerate(&self) -> bool {
        let s = self.start();
        match *self {
            Curve::Line { to, .. } => s.close_to(to, EPS_POS),
            Curve::Cubic { c1, c2, to, .. } => {
                s.close_to(c1, EPS_POS) && s.close_to(c2, EPS_POS) && s.close_to(to, EPS_POS)
            }
        }
    }

    pub fn points(&self) -> Vec<Vec2> {
        match *self {
            Curve::Line { from, to } => vec![from, to],
            Curve::Cubic { from, c1, c2, to } => vec![from, c1, c2, to],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test]
    fn split_pieces_share_cut_points() {
        let c = Curve::cubic(v(0.0, 0.0), v(0.0, 50.0), v(100.0, 50.0), v(100.0, 0.0));
        let pieces = c.split_at(&[0.25, 0.5, 0.8]);
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces[0].start(), c.start());
        assert_eq!(pieces[3].end(), c.end());
        for w in pieces.windows(2) {
            assert_eq!(w[0].end(), w[1].start());
        }
        let total: f64 = pieces.iter().map(|p| p.arclen()).sum();
        assert!((total - c.arclen()).abs() < 1e-2);
    }

    #[test]
    fn unsplit_curve_is_verbatim() {
        let c = Curve::cubic(v(1.0, 2.0), v(3.0, 4.0), v(5.0, 6.0), v(7.0, 8.0));
        assert_eq!(c.subsegment(0.0, 1.0), c);
        assert_eq!(c.split_at(&[]), vec![c]);
    }

    #[test]
    fn line_bounds_and_nearest() {
        let c = Curve::line(v(0.0, 0.0), v(10.0, 0.0));
        let b = c.bounds();
        assert_eq!((b.min_x, b.max_x), (0.0, 10.0));
        let (d, t) = c.nearest(v(4.0, 3.0));
        assert!((d - 3.0).abs() < 1e-6);
        assert!((t - 0.4).abs() < 1e-6);
    }

    #[test]
    fn degenerate_detection() {
        assert!(Curve::line(v(1.0, 1.0), v(1.0, 1.0)).is_degenerate());
        assert!(!Curve::line(v(1.0, 1.0), v(1.0, 2.0)).is_degenerate());
    }
}
