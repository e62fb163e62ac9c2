//! Human-readable dump of the trim tool for development. The layout is
//! not a stable format.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::session::{ToolState, TrimTool};

pub fn debug_report(tool: &TrimTool) -> String {
    let mut out = String::new();
    let session = match tool.state() {
        ToolState::Idle => {
            let _ = writeln!(out, "trim tool: idle");
            return out;
        }
        ToolState::Active(s) => s,
    };
    let r = session.split_result();
    let opts = session.options();
    let _ = writeln!(out, "trim tool: active");
    let _ = writeln!(
        out,
        "  options: hit {} drag {} accuracy {}",
        opts.hit_tolerance, opts.drag_tolerance, opts.curve_accuracy
    );
    let _ = writeln!(
        out,
        "  marked {} / hovered {} / dragging {}",
        session.marked().len(),
        session.hovered().unwrap_or("-"),
        session.is_dragging()
    );

    let _ = writeln!(out, "selected paths ({}):", r.path_order.len());
    for id in &r.path_order {
        match r.original_paths.get(id) {
            Some(p) => {
                let _ = writeln!(out, "  {} subpaths={} d=\"{}\"", id, p.subpaths.len(), p.path_data());
            }
            None => {
                let _ = writeln!(out, "  {} (missing)", id);
            }
        }
    }

    let _ = writeln!(out, "intersections ({}):", r.intersections.len());
    for id in &r.path_order {
        // curve index -> (intersection id, t on that curve)
        let mut by_curve: BTreeMap<usize, Vec<(&str, f64)>> = BTreeMap::new();
        for ix in r.intersections_of(id) {
            if &ix.path_a == id {
                by_curve.entry(ix.curve_a).or_default().push((ix.id.as_str(), ix.t_a));
            }
            if &ix.path_b == id {
                by_curve.entry(ix.curve_b).or_default().push((ix.id.as_str(), ix.t_b));
            }
        }
        if by_curve.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  path {}", id);
        for (curve, hits) in by_curve {
            let list: Vec<String> = hits.iter().map(|(ix, t)| format!("{}@{:.4}", ix, t)).collect();
            let _ = writeln!(out, "    curve {}: {}", curve, list.join(", "));
        }
    }

    let _ = writeln!(out, "segments ({}):", r.segments.len());
    for id in &r.path_order {
        let _ = writeln!(out, "  path {}", id);
        for s in r.segments_of(id) {
            let mut flags = String::new();
            if session.marked().contains(&s.id) {
                flags.push_str(" [marked]");
            }
            if session.hovered() == Some(s.id.as_str()) {
                flags.push_str(" [hovered]");
            }
            let _ = writeln!(
                out,
                "    {} sub={} {} -> {} curves={:?} len={:.2}{}",
                s.id,
                s.subpath_index,
                s.start_intersection.as_deref().unwrap_or("start"),
                s.end_intersection.as_deref().unwrap_or("end"),
                s.curve_indices,
                s.length(),
                flags
            );
        }
    }
    out
}
