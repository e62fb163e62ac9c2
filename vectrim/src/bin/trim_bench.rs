use std::time::Instant;
use vectrim::model::{Element, PathElement};
use vectrim::{Document, TrimOptions, TrimTool};

// Overlapping circles on a row, each drawn as four cubics
fn build_circles(count: usize, r: f64) -> Document {
    const K: f64 = 0.552_284_749_8;
    let mut els = Vec::with_capacity(count);
    for i in 0..count {
        let cx = i as f64 * r * 1.2; let cy = (i % 3) as f64 * r * 0.5; let k = K * r;
        let d = format!(
            "M{} {} C{} {} {} {} {} {} C{} {} {} {} {} {} C{} {} {} {} {} {} C{} {} {} {} {} {} Z",
            cx + r, cy,
            cx + r, cy + k, cx + k, cy + r, cx, cy + r,
            cx - k, cy + r, cx - r, cy + k, cx - r, cy,
            cx - r, cy - k, cx - k, cy - r, cx, cy - r,
            cx + k, cy - r, cx + r, cy - k, cx + r, cy,
        );
        els.push(Element::Path(PathElement::from_path_data(format!("c{}", i), &d)));
    }
    Document::from_elements(els)
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() { return 0.0; }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len()-1)]
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut paths = 20usize;
    let mut rounds = 20usize;
    let mut radius = 50.0f64;
    let mut assert_ms: Option<f64> = None;
    for a in &args[1..] {
        if let Some(val)=a.strip_prefix("--paths=") { if let Ok(v)=val.parse() { paths=v; } }
        else if let Some(val)=a.strip_prefix("--rounds=") { if let Ok(v)=val.parse() { rounds=v; } }
        else if let Some(val)=a.strip_prefix("--radius=") { if let Ok(v)=val.parse() { radius=v; } }
        else if let Some(val)=a.strip_prefix("--assert-ms=") { if let Ok(v)=val.parse() { assert_ms=Some(v); } }
    }

    let base = build_circles(paths.clamp(2, vectrim::geometry::limits::MAX_PATHS), radius);
    let selection: Vec<String> = base.elements.iter().map(|e| e.id().to_string()).collect();

    let mut activate_ms: Vec<f64> = Vec::with_capacity(rounds);
    let mut apply_ms: Vec<f64> = Vec::with_capacity(rounds);
    let mut intersections = 0usize; let mut segments = 0usize; let mut created = 0usize;
    for _ in 0..rounds {
        let mut doc = base.clone();
        let mut tool = TrimTool::new(TrimOptions::default());
        let t0 = Instant::now();
        if tool.select(&doc, &selection).is_err() { eprintln!("selection rejected"); std::process::exit(2); }
        activate_ms.push(t0.elapsed().as_secs_f64() * 1000.0);
        let Some(session) = tool.session_mut() else { continue };
        let r = session.result();
        intersections = r.intersections.len(); segments = r.segments.len();
        // Remove every other segment
        let ids: Vec<&str> = r.segments.iter().step_by(2).map(|s| s.id.as_str()).collect();
        session.mark_for_removal(ids);
        let t1 = Instant::now();
        if let Some(out) = tool.apply(&mut doc) { created = out.created.len(); }
        apply_ms.push(t1.elapsed().as_secs_f64() * 1000.0);
    }
    activate_ms.sort_by(|a,b| a.total_cmp(b));
    apply_ms.sort_by(|a,b| a.total_cmp(b));
    let med = percentile(&activate_ms, 0.5);
    println!("paths={} rounds={} intersections={} segments={} created={} activate_median_ms={:.3} activate_p90_ms={:.3} apply_median_ms={:.3} apply_p90_ms={:.3}",
        paths, rounds, intersections, segments, created, med, percentile(&activate_ms, 0.9), percentile(&apply_ms, 0.5), percentile(&apply_ms, 0.9));
    if let Some(th) = assert_ms { if med > th { eprintln!("FAIL: activate median {:.3} ms > threshold {:.3} ms", med, th); std::process::exit(1); } }
}
