//! Curve Splitter: cuts every subpath at the intersections that reference
//! it and emits one `TrimSegment` per fragment.

use std::collections::HashMap;
use std::fmt;

use crate::algorithms::adapter::{CurveRef, GeometryPath, SubpathInfo};
use crate::algorithms::intersections::find_intersections_in;
use crate::algorithms::optimize::merge_consecutive;
use crate::geometry::curve::Curve;
use crate::geometry::tolerance::{EPS_LEN, EPS_PARAM};
use crate::model::{PathElement, SegmentHeader, SplitPathResult, StrokeStyle, TrimIntersection, TrimSegment};

#[derive(Clone, Debug, PartialEq)]
pub enum SplitError {
    NonFiniteOffset { curve: usize },
    OffsetOutOfRange { curve: usize, t: f64 },
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitError::NonFiniteOffset { curve } => write!(f, "non-finite split offset on curve {}", curve),
            SplitError::OffsetOutOfRange { curve, t } => write!(f, "split offset {} outside [0, 1] on curve {}", t, curve),
        }
    }
}

impl std::error::Error for SplitError {}

/// Hands out segment ids, `<path id>:seg-<n>`.
#[derive(Debug, Default)]
pub struct IdGen {
    next: usize,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(&mut self, path_id: &str) -> String {
        let id = format!("{}:seg-{}", path_id, self.next);
        self.next += 1;
        id
    }
}

/// Sort offsets ascending and collapse any closer than `EPS_PARAM` to the
/// previous survivor, keeping the first. The result is strictly increasing.
pub fn dedup_offsets<T>(mut cuts: Vec<(f64, T)>) -> Vec<(f64, T)> {
    cuts.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut out: Vec<(f64, T)> = Vec::with_capacity(cuts.len());
    for cut in cuts {
        match out.last() {
            Some(prev) if cut.0 - prev.0 < EPS_PARAM => {}
            _ => out.push(cut),
        }
    }
    out
}

#[derive(Clone, Debug)]
struct Fragment {
    curves: Vec<Curve>,
    indices: Vec<usize>,
    start: Option<String>,
    end: Option<String>,
}

impl Fragment {
    fn whole(c: &CurveRef, global: usize) -> Self {
        Fragment { curves: vec![c.curve], indices: vec![global], start: None, end: None }
    }

    fn length(&self) -> f64 {
        self.curves.iter().map(|c| c.arclen()).sum()
    }
}

/// Fragments of one curve. Offsets on an anchor become boundary ids of the
/// neighbouring fragments instead of zero-length pieces.
fn split_curve(c: &CurveRef, global: usize, cuts: Vec<(f64, &str)>) -> Result<Vec<Fragment>, SplitError> {
    for &(t, _) in &cuts {
        if !t.is_finite() {
            return Err(SplitError::NonFiniteOffset { curve: global });
        }
        if !(-EPS_PARAM..=1.0 + EPS_PARAM).contains(&t) {
            return Err(SplitError::OffsetOutOfRange { curve: global, t });
        }
    }
    let mut start_id = None;
    let mut end_id = None;
    let mut interior: Vec<(f64, &str)> = Vec::new();
    for (t, id) in dedup_offsets(cuts) {
        if t <= EPS_PARAM {
            start_id.get_or_insert(id);
        } else if t >= 1.0 - EPS_PARAM {
            end_id.get_or_insert(id);
        } else {
            interior.push((t, id));
        }
    }
    let ts: Vec<f64> = interior.iter().map(|(t, _)| *t).collect();
    let pieces = c.curve.split_at(&ts);
    let n = pieces.len();
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(k, curve)| Fragment {
            curves: vec![curve],
            indices: vec![global],
            start: (if k == 0 { start_id } else { Some(interior[k - 1].1) }).map(str::to_string),
            end: (if k + 1 == n { end_id } else { Some(interior[k].1) }).map(str::to_string),
        })
        .collect())
}

/// A cut on the shared anchor of two fragments bounds both of them.
fn propagate_boundaries(frags: &mut [Fragment], closed: bool) {
    let n = frags.len();
    if n < 2 {
        return;
    }
    let pairs = if closed { n } else { n - 1 };
    for i in 0..pairs {
        let j = (i + 1) % n;
        let id = frags[i].end.clone().or_else(|| frags[j].start.clone());
        if let Some(id) = id {
            frags[i].end.get_or_insert_with(|| id.clone());
            frags[j].start.get_or_insert(id);
        }
    }
}

/// Fragments before the first cut on a closed subpath continue the last
/// fragment across the seam, so they are appended to it.
fn merge_seam(frags: &mut Vec<Fragment>) {
    if frags.len() < 2 {
        return;
    }
    let Some(k) = frags.iter().position(|f| f.start.is_some()) else {
        // No cut survived: the whole loop is one piece
        let all: Vec<Fragment> = std::mem::take(frags);
        let mut all = all.into_iter();
        if let Some(mut first) = all.next() {
            for f in all {
                first.curves.extend(f.curves);
                first.indices.extend(f.indices);
            }
            frags.push(first);
        }
        return;
    };
    if k == 0 {
        return;
    }
    let lead: Vec<Fragment> = frags.drain(..k).collect();
    if let Some(last) = frags.last_mut() {
        for f in lead {
            last.curves.extend(f.curves);
            last.indices.extend(f.indices);
            last.end = f.end;
        }
    }
}

fn subpath_fragments(
    path_id: &str,
    g: &GeometryPath,
    subpath: usize,
    info: &SubpathInfo,
    cuts: &HashMap<usize, Vec<(f64, &str)>>,
) -> Vec<Fragment> {
    let curves = g.subpath_curves(subpath);
    if !info.curve_range().any(|gi| cuts.contains_key(&gi)) {
        return vec![Fragment {
            curves: curves.iter().map(|c| c.curve).collect(),
            indices: info.curve_range().collect(),
            start: None,
            end: None,
        }];
    }
    let mut frags = Vec::new();
    for (c, global) in curves.iter().zip(info.curve_range()) {
        let Some(on_curve) = cuts.get(&global) else {
            frags.push(Fragment::whole(c, global));
            continue;
        };
        match split_curve(c, global, on_curve.clone()) {
            Ok(pieces) => frags.extend(pieces),
            Err(e) => {
                tracing::warn!(path = path_id, curve = global, error = %e, "curve left unsplit");
                frags.push(Fragment::whole(c, global));
            }
        }
    }
    propagate_boundaries(&mut frags, info.closed);
    frags.retain(|f| f.curves.iter().any(|c| !c.is_degenerate()) && f.length() > EPS_LEN);
    if info.closed {
        merge_seam(&mut frags);
    }
    frags
}

/// Segments of one path, in subpath then curve order.
pub fn split_path(
    el: &PathElement,
    g: &GeometryPath,
    intersections: &[TrimIntersection],
    ids: &mut IdGen,
) -> Vec<TrimSegment> {
    let mut cuts: HashMap<usize, Vec<(f64, &str)>> = HashMap::new();
    for ix in intersections {
        if ix.path_a == el.id {
            cuts.entry(ix.curve_a).or_default().push((ix.t_a, ix.id.as_str()));
        }
        if ix.path_b == el.id {
            cuts.entry(ix.curve_b).or_default().push((ix.t_b, ix.id.as_str()));
        }
    }
    let stroke: StrokeStyle = el.style.stroke_style();
    let mut out = Vec::new();
    for (si, info) in g.subpaths.iter().enumerate() {
        if info.curve_count == 0 {
            continue;
        }
        for f in subpath_fragments(&el.id, g, si, info, &cuts) {
            let header = SegmentHeader {
                id: ids.segment(&el.id),
                path_id: el.id.clone(),
                subpath_index: si,
                start_intersection: f.start,
                end_intersection: f.end,
                curve_indices: f.indices,
                stroke: stroke.clone(),
            };
            out.extend(TrimSegment::from_curves(header, f.curves));
        }
    }
    out
}

/// Adapter, finder, splitter and optimizer over one selection.
pub fn compute_split(paths: &[&PathElement], accuracy: f64) -> SplitPathResult {
    let geoms: Vec<GeometryPath> = paths.iter().map(|p| GeometryPath::from_element(p)).collect();
    let named: Vec<(&str, &GeometryPath)> = paths.iter().map(|p| p.id.as_str()).zip(geoms.iter()).collect();
    let intersections = find_intersections_in(&named, accuracy);
    let mut ids = IdGen::new();
    let mut segments = Vec::new();
    for (el, g) in paths.iter().zip(&geoms) {
        if g.is_empty() {
            tracing::debug!(path = %el.id, "path has no geometry");
            continue;
        }
        let raw = split_path(el, g, &intersections, &mut ids);
        segments.extend(merge_consecutive(raw));
    }
    tracing::debug!(
        paths = paths.len(),
        intersections = intersections.len(),
        segments = segments.len(),
        "split computed"
    );
    SplitPathResult {
        intersections,
        segments,
        original_paths: paths.iter().map(|p| (p.id.clone(), (*p).clone())).collect(),
        path_order: paths.iter().map(|p| p.id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tolerance::CURVE_ACCURACY;
    use crate::model::Vec2;

    fn ix(id: &str, path: &str, curve: usize, t: f64) -> TrimIntersection {
        TrimIntersection {
            id: id.to_string(),
            point: Vec2::default(),
            path_a: path.to_string(),
            path_b: "other".to_string(),
            curve_a: curve,
            curve_b: 0,
            t_a: t,
            t_b: 0.0,
        }
    }

    fn split(d: &str, ixs: &[TrimIntersection]) -> Vec<TrimSegment> {
        let el = PathElement::from_path_data("p", d);
        let g = GeometryPath::from_element(&el);
        split_path(&el, &g, ixs, &mut IdGen::new())
    }

    #[test]
    fn uncut_subpath_is_one_segment() {
        let segs = split("M0 0 L10 0 L10 10", &[]);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].curve_indices, vec![0, 1]);
        assert!(segs[0].start_intersection.is_none() && segs[0].end_intersection.is_none());
        assert_eq!(segs[0].id, "p:seg-0");
    }

    #[test]
    fn open_curve_with_two_cuts_gives_three_pieces() {
        let segs = split("M0 0 L100 0", &[ix("ix-1", "p", 0, 0.75), ix("ix-0", "p", 0, 0.25)]);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].end_intersection.as_deref(), Some("ix-0"));
        assert_eq!(segs[1].start_intersection.as_deref(), Some("ix-0"));
        assert_eq!(segs[1].end_intersection.as_deref(), Some("ix-1"));
        assert!(segs[1].start_point.close_to(Vec2::new(25.0, 0.0), 1e-9));
        assert!(segs[2].end_intersection.is_none());
    }

    #[test]
    fn near_duplicate_offsets_collapse() {
        let segs = split("M0 0 L100 0", &[ix("ix-0", "p", 0, 0.5), ix("ix-1", "p", 0, 0.50005)]);
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn cut_on_anchor_marks_both_neighbours() {
        let segs = split("M0 0 L10 0 L20 0", &[ix("ix-0", "p", 0, 1.0)]);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].end_intersection.as_deref(), Some("ix-0"));
        assert_eq!(segs[1].start_intersection.as_deref(), Some("ix-0"));
    }

    #[test]
    fn closed_single_curve_wraps_into_n_pieces() {
        let d = "M0 0 C 100 100 -100 100 0 0 Z";
        let ixs = [ix("ix-0", "p", 0, 0.3), ix("ix-1", "p", 0, 0.6)];
        let segs = split(d, &ixs);
        assert_eq!(segs.len(), 2);
        // The seam piece starts at the last cut and ends at the first
        assert_eq!(segs[1].start_intersection.as_deref(), Some("ix-1"));
        assert_eq!(segs[1].end_intersection.as_deref(), Some("ix-0"));
        assert_eq!(segs[1].curves.len(), 2);
        assert!(segs[1].curves[0].end().close_to(segs[1].curves[1].start(), 1e-9));
    }

    #[test]
    fn one_cut_on_a_square_keeps_the_loop_in_one_run() {
        let ixs = [ix("ix-0", "p", 2, 0.5)];
        let segs = merge_consecutive(split("M0 0 L100 0 L100 100 L0 100 Z", &ixs));
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start_intersection.as_deref(), Some("ix-0"));
        assert_eq!(segs[0].end_intersection.as_deref(), Some("ix-0"));
        assert_eq!(segs[0].curves.len(), 5);
    }

    #[test]
    fn bad_offset_leaves_curve_whole() {
        let segs = split("M0 0 L100 0", &[ix("ix-0", "p", 0, f64::NAN)]);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].curves.len(), 1);
    }

    #[test]
    fn compute_split_on_crossing_lines() {
        let a = PathElement::from_path_data("a", "M0 0 L100 100");
        let b = PathElement::from_path_data("b", "M0 100 L100 0");
        let r = compute_split(&[&a, &b], CURVE_ACCURACY);
        assert_eq!(r.intersections.len(), 1);
        assert_eq!(r.segments.len(), 4);
        assert_eq!(r.path_order, vec!["a".to_string(), "b".to_string()]);
        for s in &r.segments {
            assert!(s.endpoints_consistent(1e-4));
        }
    }
}
