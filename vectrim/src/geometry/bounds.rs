use crate::model::Vec2;
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in document units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        Bounds {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 { self.max_x - self.min_x }
    pub fn height(&self) -> f64 { self.max_y - self.min_y }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn inflate(&self, margin: f64) -> Bounds {
        Bounds {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// True when `other` lies entirely inside (or on the edge of) `self`.
    pub fn contains(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Union of an iterator of boxes; `None` when it is empty.
    pub fn union_all<'a>(boxes: impl IntoIterator<Item = &'a Bounds>) -> Option<Bounds> {
        boxes.into_iter().fold(None, |acc, b| match acc {
            None => Some(*b),
            Some(a) => Some(a.union(b)),
        })
    }
}

impl From<Rect> for Bounds {
    fn from(r: Rect) -> Self {
        let r = r.abs();
        Bounds { min_x: r.x0, min_y: r.y0, max_x: r.x1, max_y: r.y1 }
    }
}

impl From<Bounds> for Rect {
    fn from(b: Bounds) -> Self {
        Rect::new(b.min_x, b.min_y, b.max_x, b.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_inclusive() {
        let outer = Bounds { min_x: 0.0, min_y: 0.0, max_x: 10.0, max_y: 10.0 };
        let inner = Bounds { min_x: 0.0, min_y: 2.0, max_x: 5.0, max_y: 10.0 };
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&inner));
    }

    #[test]
    fn inflate_makes_touching_boxes_overlap() {
        let a = Bounds { min_x: 0.0, min_y: 0.0, max_x: 1.0, max_y: 1.0 };
        let b = Bounds { min_x: 5.0, min_y: 0.0, max_x: 6.0, max_y: 1.0 };
        assert!(!a.overlaps(&b));
        assert!(a.inflate(2.0).overlaps(&b.inflate(2.0)));
    }
}
