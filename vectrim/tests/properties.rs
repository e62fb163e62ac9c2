use proptest::prelude::*;
use std::collections::BTreeSet;

use vectrim::algorithms::adapter::GeometryPath;
use vectrim::algorithms::optimize::merge_consecutive;
use vectrim::algorithms::split::{dedup_offsets, split_path, IdGen};
use vectrim::geometry::curve::Curve;
use vectrim::geometry::tolerance::EPS_PARAM;
use vectrim::model::{PathElement, SegmentHeader, TrimIntersection, TrimSegment, Vec2};

fn cuts_on(path: &str, curve: usize, offsets: &[f64]) -> Vec<TrimIntersection> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, &t)| TrimIntersection {
            id: format!("ix-{}", i),
            point: Vec2::default(),
            path_a: path.to_string(),
            path_b: "other".to_string(),
            curve_a: curve,
            curve_b: 0,
            t_a: t,
            t_b: 0.0,
        })
        .collect()
}

fn surviving(offsets: &[f64]) -> usize {
    dedup_offsets(offsets.iter().map(|&t| (t, ())).collect()).len()
}

proptest! {
    #[test]
    fn dedup_offsets_strictly_increase(offsets in prop::collection::vec(0.0f64..=1.0, 0..40)) {
        let out = dedup_offsets(offsets.iter().map(|&t| (t, ())).collect());
        for w in out.windows(2) {
            prop_assert!(w[1].0 > w[0].0);
            prop_assert!(w[1].0 - w[0].0 >= EPS_PARAM);
        }
        prop_assert!(out.len() <= offsets.len());
    }

    #[test]
    fn open_curve_splits_into_n_plus_one(offsets in prop::collection::vec(0.01f64..0.99, 1..12)) {
        let el = PathElement::from_path_data("p", "M0 0 C 30 60 70 -60 100 0");
        let g = GeometryPath::from_element(&el);
        let segs = split_path(&el, &g, &cuts_on("p", 0, &offsets), &mut IdGen::new());
        prop_assert_eq!(segs.len(), surviving(&offsets) + 1);
        for w in segs.windows(2) {
            prop_assert!(w[0].end_point.close_to(w[1].start_point, 1e-9));
            prop_assert_eq!(&w[0].end_intersection, &w[1].start_intersection);
        }
        prop_assert!(segs.first().unwrap().start_intersection.is_none());
        prop_assert!(segs.last().unwrap().end_intersection.is_none());
    }

    #[test]
    fn closed_single_curve_splits_into_n(offsets in prop::collection::vec(0.01f64..0.99, 1..12)) {
        let el = PathElement::from_path_data("loop", "M0 0 C 100 100 -100 100 0 0 Z");
        let g = GeometryPath::from_element(&el);
        let segs = split_path(&el, &g, &cuts_on("loop", 0, &offsets), &mut IdGen::new());
        prop_assert_eq!(segs.len(), surviving(&offsets));
        for s in &segs {
            prop_assert!(s.start_intersection.is_some() && s.end_intersection.is_some());
            prop_assert!(s.endpoints_consistent(1e-9));
        }
    }

    #[test]
    fn merging_keeps_every_cut(cuts in prop::collection::vec(any::<bool>(), 1..30)) {
        // Unit steps along x; a true entry puts a cut at that interior anchor
        let n = cuts.len() + 1;
        let segs: Vec<TrimSegment> = (0..n)
            .map(|i| {
                let header = SegmentHeader {
                    id: format!("s{}", i),
                    path_id: "p".into(),
                    subpath_index: 0,
                    start_intersection: (i > 0 && cuts[i - 1]).then(|| format!("ix-{}", i)),
                    end_intersection: (i + 1 < n && cuts[i]).then(|| format!("ix-{}", i + 1)),
                    curve_indices: vec![i],
                    stroke: Default::default(),
                };
                let curve = Curve::line(Vec2::new(i as f64, 0.0), Vec2::new(i as f64 + 1.0, 0.0));
                TrimSegment::from_curves(header, vec![curve]).unwrap()
            })
            .collect();
        let ids = |v: &[TrimSegment]| -> BTreeSet<String> {
            v.iter().flat_map(|s| s.start_intersection.iter().chain(s.end_intersection.iter()).cloned()).collect()
        };
        let before = ids(&segs);
        let merged = merge_consecutive(segs);
        prop_assert_eq!(ids(&merged), before);
        prop_assert_eq!(merged.len(), cuts.iter().filter(|c| **c).count() + 1);
        let covered: usize = merged.iter().map(|s| s.curve_indices.len()).sum();
        prop_assert_eq!(covered, n);
    }
}
