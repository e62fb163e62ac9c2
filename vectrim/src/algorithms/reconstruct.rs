//! Path Reconstructor: rebuilds paths from the segments that survive a
//! trim. Chains never cross subpath boundaries.

use std::collections::HashSet;
use std::fmt;

use crate::algorithms::optimize::merge_consecutive;
use crate::algorithms::sanitize::sanitize;
use crate::geometry::tolerance::{CHAIN_TOL, ENDPOINT_MATCH_TOL};
use crate::model::{PathElement, ReconstructedPath, SplitPathResult, SubPath, TrimSegment};
use crate::svg::{curves_to_subpath, to_path_data};

#[derive(Clone, Debug, PartialEq)]
pub enum ReconstructError {
    MissingSource { path_id: String },
    NonFinite { segment_id: String },
    EndpointMismatch { segment_id: String },
}

impl fmt::Display for ReconstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconstructError::MissingSource { path_id } => write!(f, "no source path '{}' in the split result", path_id),
            ReconstructError::NonFinite { segment_id } => write!(f, "segment '{}' has non-finite geometry", segment_id),
            ReconstructError::EndpointMismatch { segment_id } => {
                write!(f, "segment '{}' endpoints do not match its geometry", segment_id)
            }
        }
    }
}

impl std::error::Error for ReconstructError {}

/// Which source paths to rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Every path with at least one surviving segment.
    All,
    /// Only paths that lost at least one segment.
    Touched,
}

/// `source~n` with the smallest `n` that is not taken. An existing `~n`
/// suffix on the source is bumped rather than stacked.
pub fn derive_path_id(source: &str, taken: &dyn Fn(&str) -> bool) -> String {
    let (base, mut n) = match source.rsplit_once('~') {
        Some((base, num)) if !base.is_empty() => match num.parse::<u32>() {
            Ok(k) => (base, k + 1),
            Err(_) => (source, 1),
        },
        _ => (source, 1),
    };
    loop {
        let id = format!("{}~{}", base, n);
        if !taken(&id) {
            return id;
        }
        n += 1;
    }
}

fn check_segment(seg: &TrimSegment) -> Result<(), ReconstructError> {
    if seg.curves.iter().flat_map(|c| c.points()).any(|p| !p.is_finite()) {
        return Err(ReconstructError::NonFinite { segment_id: seg.id.clone() });
    }
    if !seg.endpoints_consistent(ENDPOINT_MATCH_TOL) {
        return Err(ReconstructError::EndpointMismatch { segment_id: seg.id.clone() });
    }
    Ok(())
}

/// Maximal runs of segments that continue one another, in input order.
/// A run that ends where the first run starts is joined onto it.
fn build_chains(group: Vec<&TrimSegment>) -> Vec<Vec<TrimSegment>> {
    let mut chains: Vec<Vec<TrimSegment>> = Vec::new();
    for seg in group {
        match chains.last_mut() {
            Some(chain) if chain.last().map_or(false, |l| l.end_point.close_to(seg.start_point, CHAIN_TOL)) => {
                chain.push(seg.clone())
            }
            _ => chains.push(vec![seg.clone()]),
        }
    }
    if chains.len() > 1 {
        let joins = match (chains.first(), chains.last()) {
            (Some(first), Some(last)) => match (first.first(), last.last()) {
                (Some(head), Some(tail)) => tail.end_point.close_to(head.start_point, CHAIN_TOL),
                _ => false,
            },
            _ => false,
        };
        if joins {
            if let Some(mut wrapped) = chains.pop() {
                wrapped.append(&mut chains[0]);
                chains[0] = wrapped;
            }
        }
    }
    chains
}

fn chain_subpath(chain: &[TrimSegment]) -> Option<(SubPath, bool)> {
    let head = chain.first()?;
    let tail = chain.last()?;
    let closed = head.start_point.close_to(tail.end_point, CHAIN_TOL);
    let curves: Vec<_> = chain.iter().flat_map(|s| s.curves.iter().copied()).collect();
    Some((curves_to_subpath(&curves, closed), closed))
}

fn rebuild_path(
    source: &PathElement,
    survivors: &[&TrimSegment],
    taken: &dyn Fn(&str) -> bool,
) -> Option<ReconstructedPath> {
    let mut subpath_ids: Vec<usize> = survivors.iter().map(|s| s.subpath_index).collect();
    subpath_ids.sort_unstable();
    subpath_ids.dedup();

    let mut subpaths = Vec::new();
    let mut segments = Vec::new();
    let mut is_closed = false;
    for si in subpath_ids {
        let group: Vec<&TrimSegment> = survivors.iter().copied().filter(|s| s.subpath_index == si).collect();
        for chain in build_chains(group) {
            let chain = merge_consecutive(chain);
            if let Some((sp, closed)) = chain_subpath(&chain) {
                // Any closed subpath marks the whole path closed
                is_closed |= closed;
                subpaths.push(sp);
                segments.extend(chain);
            }
        }
    }
    if subpaths.is_empty() {
        return None;
    }
    Some(ReconstructedPath {
        id: derive_path_id(&source.id, taken),
        path_data: to_path_data(&subpaths),
        subpaths,
        style: source.style.for_trimmed(is_closed),
        is_closed,
        source_path_id: source.id.clone(),
        segment_ids: survivors.iter().map(|s| s.id.clone()).collect(),
        segments,
        transform: source.transform,
    })
}

/// Reconstruction without the sanitation pass. The first inconsistency
/// aborts the whole call so that nothing is half-applied.
pub fn try_reconstruct(
    result: &SplitPathResult,
    removed: &HashSet<String>,
    scope: Scope,
    taken: &dyn Fn(&str) -> bool,
) -> Result<Vec<ReconstructedPath>, ReconstructError> {
    for seg in &result.segments {
        if !result.original_paths.contains_key(&seg.path_id) {
            return Err(ReconstructError::MissingSource { path_id: seg.path_id.clone() });
        }
    }
    let mut out = Vec::new();
    for path_id in &result.path_order {
        let source = result
            .original_paths
            .get(path_id)
            .ok_or_else(|| ReconstructError::MissingSource { path_id: path_id.clone() })?;
        let all: Vec<&TrimSegment> = result.segments_of(path_id).collect();
        let survivors: Vec<&TrimSegment> = all.iter().copied().filter(|s| !removed.contains(&s.id)).collect();
        if scope == Scope::Touched && survivors.len() == all.len() {
            continue;
        }
        for seg in &survivors {
            check_segment(seg)?;
        }
        let produced: Vec<String> = out.iter().map(|p: &ReconstructedPath| p.id.clone()).collect();
        let taken_here = |id: &str| {
            taken(id) || result.original_paths.contains_key(id) || produced.iter().any(|p| p == id)
        };
        if let Some(path) = rebuild_path(source, &survivors, &taken_here) {
            out.push(path);
        }
    }
    Ok(out)
}

/// Rebuild every path with surviving segments and sanitise the result.
/// Any failure yields an empty list and leaves the caller's document as is.
pub fn reconstruct_paths(result: &SplitPathResult, removed: &HashSet<String>) -> Vec<ReconstructedPath> {
    reconstruct_scoped(result, removed, Scope::All, &|_: &str| false)
}

pub fn reconstruct_scoped(
    result: &SplitPathResult,
    removed: &HashSet<String>,
    scope: Scope,
    taken: &dyn Fn(&str) -> bool,
) -> Vec<ReconstructedPath> {
    match try_reconstruct(result, removed, scope, taken) {
        Ok(paths) => {
            let built = paths.len();
            let kept = sanitize(paths);
            tracing::debug!(built, kept = kept.len(), removed = removed.len(), "paths reconstructed");
            kept
        }
        Err(e) => {
            tracing::error!(error = %e, "reconstruction failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::split::compute_split;
    use crate::geometry::tolerance::CURVE_ACCURACY;
    use crate::model::{PathStyle, Vec2};

    fn filled(id: &str, d: &str) -> PathElement {
        let style = PathStyle { fill: Some("#f00".into()), fill_opacity: 0.5, ..PathStyle::default() };
        PathElement::from_path_data(id, d).with_style(style)
    }

    #[test]
    fn derive_id_bumps_suffix() {
        assert_eq!(derive_path_id("p", &|_: &str| false), "p~1");
        assert_eq!(derive_path_id("p~1", &|_: &str| false), "p~2");
        assert_eq!(derive_path_id("p", &|id: &str| id == "p~1"), "p~2");
        assert_eq!(derive_path_id("~3", &|_: &str| false), "~3~1");
    }

    #[test]
    fn no_removal_round_trips_a_closed_square() {
        let sq = filled("sq", "M0 0 L100 0 L100 100 L0 100 Z");
        let line = PathElement::from_path_data("l", "M500 500 L600 500");
        let r = compute_split(&[&sq, &line], CURVE_ACCURACY);
        let out = reconstruct_paths(&r, &HashSet::new());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].path_data, "M 0 0 L 100 0 L 100 100 L 0 100 Z");
        assert!(out[0].is_closed);
        assert_eq!(out[0].style.fill.as_deref(), Some("#f00"));
        assert_eq!(out[0].id, "sq~1");
    }

    #[test]
    fn trimming_a_closed_square_opens_it_and_drops_fill() {
        let sq = filled("sq", "M0 0 L100 0 L100 100 L0 100 Z");
        let cut = PathElement::from_path_data("cut", "M50 -20 L50 120");
        let r = compute_split(&[&sq, &cut], CURVE_ACCURACY);
        assert_eq!(r.intersections.len(), 2);
        let left = r
            .segments_of("sq")
            .find(|s| s.bounds.max_x <= 50.0 + 1e-9)
            .expect("left half")
            .id
            .clone();
        let removed: HashSet<String> = [left].into_iter().collect();
        let out = try_reconstruct(&r, &removed, Scope::Touched, &|_: &str| false).unwrap();
        assert_eq!(out.len(), 1);
        let p = &out[0];
        assert_eq!(p.source_path_id, "sq");
        assert!(!p.is_closed);
        assert_eq!(p.style.fill, None);
        assert_eq!(p.style.fill_opacity, 0.0);
        let first = p.segments.first().unwrap().start_point;
        let last = p.segments.last().unwrap().end_point;
        assert!(first.close_to(Vec2::new(50.0, 0.0), 1e-6) || first.close_to(Vec2::new(50.0, 100.0), 1e-6));
        assert!(last.close_to(Vec2::new(50.0, 0.0), 1e-6) || last.close_to(Vec2::new(50.0, 100.0), 1e-6));
    }

    #[test]
    fn removing_everything_deletes_the_source() {
        let a = PathElement::from_path_data("a", "M0 0 L100 100");
        let b = PathElement::from_path_data("b", "M0 100 L100 0");
        let r = compute_split(&[&a, &b], CURVE_ACCURACY);
        let removed: HashSet<String> = r.segments_of("a").map(|s| s.id.clone()).collect();
        let out = try_reconstruct(&r, &removed, Scope::Touched, &|_: &str| false).unwrap();
        assert!(out.iter().all(|p| p.source_path_id != "a"));
    }

    #[test]
    fn missing_source_fails_the_whole_call() {
        let a = PathElement::from_path_data("a", "M0 0 L100 100");
        let b = PathElement::from_path_data("b", "M0 100 L100 0");
        let mut r = compute_split(&[&a, &b], CURVE_ACCURACY);
        r.original_paths.remove("b");
        assert!(matches!(
            try_reconstruct(&r, &HashSet::new(), Scope::All, &|_: &str| false),
            Err(ReconstructError::MissingSource { .. })
        ));
        assert!(reconstruct_paths(&r, &HashSet::new()).is_empty());
    }

    #[test]
    fn wrap_chain_joins_across_the_seam() {
        let a = TrimSegment::from_curves(
            crate::model::SegmentHeader {
                id: "s0".into(),
                path_id: "p".into(),
                subpath_index: 0,
                start_intersection: None,
                end_intersection: Some("ix-0".into()),
                curve_indices: vec![0],
                stroke: Default::default(),
            },
            vec![crate::geometry::curve::Curve::line(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0))],
        )
        .unwrap();
        let mut b = a.clone();
        b.id = "s1".into();
        b.curves = vec![crate::geometry::curve::Curve::line(Vec2::new(20.0, 0.0), Vec2::new(0.0, 0.0))];
        b.start_point = Vec2::new(20.0, 0.0);
        b.end_point = Vec2::new(0.0, 0.0);
        let chains = build_chains(vec![&a, &b]);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0][0].id, "s1");
    }
}
