//! Sanitation pass over reconstructed paths: drops degenerate results,
//! exact duplicates and tiny fragments lying inside a larger result.

use std::collections::HashSet;

use crate::geometry::tolerance::{CONTAINED_LENGTH_RATIO, MIN_PATH_LENGTH, SIGNATURE_SCALE};
use crate::model::{Command, ReconstructedPath};

/// Anchor points of the rebuilt outline: every move, line and curve end.
pub fn anchor_count(p: &ReconstructedPath) -> usize {
    p.subpaths
        .iter()
        .flat_map(|sp| sp.commands.iter())
        .filter(|c| !matches!(c, Command::Close))
        .count()
}

/// Fewer than two anchors, or too short to see.
pub fn is_degenerate(p: &ReconstructedPath) -> bool {
    anchor_count(p) < 2 || p.length() < MIN_PATH_LENGTH
}

/// Every control point on a 1/SIGNATURE_SCALE grid, in drawing order.
pub fn geometry_signature(p: &ReconstructedPath) -> Vec<(i64, i64)> {
    p.segments
        .iter()
        .flat_map(|s| s.curves.iter())
        .flat_map(|c| c.points())
        .map(|v| ((v.x * SIGNATURE_SCALE).round() as i64, (v.y * SIGNATURE_SCALE).round() as i64))
        .collect()
}

pub fn sanitize(paths: Vec<ReconstructedPath>) -> Vec<ReconstructedPath> {
    let total = paths.len();
    let mut seen: HashSet<Vec<(i64, i64)>> = HashSet::new();
    let mut candidates: Vec<(usize, f64, ReconstructedPath)> = Vec::with_capacity(total);
    for (i, p) in paths.into_iter().enumerate() {
        if is_degenerate(&p) {
            tracing::debug!(path = %p.id, "dropping degenerate path");
            continue;
        }
        if !seen.insert(geometry_signature(&p)) {
            tracing::debug!(path = %p.id, "dropping duplicate path");
            continue;
        }
        let len = p.length();
        candidates.push((i, len, p));
    }

    // Longest first, so a fragment is only ever measured against a kept path
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut kept: Vec<(usize, f64, ReconstructedPath)> = Vec::with_capacity(candidates.len());
    for (i, len, p) in candidates {
        let contained = p.bounds().map_or(false, |bb| {
            kept.iter().any(|(_, klen, k)| {
                k.bounds().map_or(false, |kb| kb.contains(&bb)) && len < CONTAINED_LENGTH_RATIO * klen
            })
        });
        if contained {
            tracing::debug!(path = %p.id, "dropping contained fragment");
            continue;
        }
        kept.push((i, len, p));
    }
    kept.sort_by_key(|(i, _, _)| *i);
    if kept.len() != total {
        tracing::debug!(before = total, after = kept.len(), "sanitation removed paths");
    }
    kept.into_iter().map(|(_, _, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::curve::Curve;
    use crate::model::{PathStyle, SegmentHeader, TrimSegment, Vec2};

    fn path(id: &str, pts: &[(f64, f64)]) -> ReconstructedPath {
        let curves: Vec<Curve> = pts
            .windows(2)
            .map(|w| Curve::line(Vec2::new(w[0].0, w[0].1), Vec2::new(w[1].0, w[1].1)))
            .collect();
        let header = SegmentHeader {
            id: format!("{}:seg", id),
            path_id: id.to_string(),
            subpath_index: 0,
            start_intersection: None,
            end_intersection: None,
            curve_indices: vec![0],
            stroke: Default::default(),
        };
        let segments: Vec<TrimSegment> = TrimSegment::from_curves(header, curves).into_iter().collect();
        let subpaths = vec![crate::svg::curves_to_subpath(
            &segments.iter().flat_map(|s| s.curves.clone()).collect::<Vec<_>>(),
            false,
        )];
        ReconstructedPath {
            id: id.to_string(),
            path_data: crate::svg::to_path_data(&subpaths),
            subpaths,
            style: PathStyle::default(),
            is_closed: false,
            source_path_id: id.to_string(),
            segment_ids: segments.iter().map(|s| s.id.clone()).collect(),
            segments,
            transform: None,
        }
    }

    #[test]
    fn drops_degenerate_and_duplicates() {
        let out = sanitize(vec![
            path("a", &[(0.0, 0.0), (100.0, 0.0)]),
            path("b", &[(0.0, 0.0), (0.001, 0.0)]),
            path("c", &[(0.0, 0.0), (100.001, 0.0)]),
            path("d", &[(5.0, 0.0)]),
        ]);
        let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn contained_short_fragment_is_removed() {
        let big = path("big", &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        let tiny = path("tiny", &[(10.0, 10.0), (15.0, 10.0)]);
        let out = sanitize(vec![tiny, big]);
        let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["big"]);
    }

    #[test]
    fn contained_but_long_enough_is_kept() {
        let big = path("big", &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        let mid = path("mid", &[(10.0, 10.0), (90.0, 10.0)]);
        let out = sanitize(vec![mid, big]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "mid");
    }

    #[test]
    fn short_but_outside_is_kept() {
        let big = path("big", &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)]);
        let tiny = path("tiny", &[(200.0, 10.0), (205.0, 10.0)]);
        assert_eq!(sanitize(vec![big, tiny]).len(), 2);
    }

    #[test]
    fn single_anchor_outline_is_degenerate() {
        let mut p = path("p", &[(0.0, 0.0), (100.0, 0.0)]);
        assert_eq!(anchor_count(&p), 2);
        assert!(!is_degenerate(&p));
        // Long segment geometry does not rescue an outline with one anchor
        p.subpaths = vec![crate::model::SubPath { commands: vec![Command::MoveTo { x: 0.0, y: 0.0 }] }];
        assert_eq!(anchor_count(&p), 1);
        assert!(is_degenerate(&p));
    }
}
