// Centralized tolerances for the trim pipeline. Units are document units
// unless the name says otherwise.

// Curve-local parameter slack: offsets closer than this are one cut, and
// offsets this close to 0 or 1 land on the curve's anchor.
pub const EPS_PARAM: f64 = 1e-4;
pub const EPS_POS: f64 = 1e-4;            // strict point coincidence
pub const EPS_LEN: f64 = 1e-6;            // zero-length vector threshold
pub const EPS_DENOM: f64 = 1e-12;         // denominator guard

// Segment Optimizer: end of segment i vs start of segment i+1.
pub const MERGE_TOL: f64 = 0.01;
// Path Reconstructor: chain continuity and closure detection.
pub const CHAIN_TOL: f64 = 0.1;
// Loosest acceptable mismatch between a segment's recorded endpoints and
// its geometry (after splitting and concatenation).
pub const ENDPOINT_MATCH_TOL: f64 = 0.5;

// Intersection Finder.
pub const PAIR_BBOX_MARGIN: f64 = 10.0;   // path pair pre-check inflation
pub const SELF_ENDPOINT_ARTIFACT: f64 = 1.0;
pub const CURVE_ACCURACY: f64 = 1e-3;     // bbox subdivision stop size
pub const MAX_SUBDIVISION_DEPTH: u32 = 48;
pub const HIT_DEDUP_POS: f64 = 1e-2;      // same crossing reported by two cells
// A run of touching subdivision cells longer than this many accuracy units
// on both curves is a shared stretch rather than a crossing.
pub const OVERLAP_SPAN_CELLS: f64 = 1000.0;
pub const OVERLAP_SAMPLES: usize = 8;     // coincidence check, samples per curve

// Sanitation pass.
pub const MIN_PATH_LENGTH: f64 = 1e-2;
pub const CONTAINED_LENGTH_RATIO: f64 = 0.1;
pub const SIGNATURE_SCALE: f64 = 100.0;   // rounding grid 0.01

pub const ARCLEN_ACCURACY: f64 = 1e-3;

#[inline] pub fn clamp01(x: f64) -> f64 { x.max(0.0).min(1.0) }
#[inline] pub fn near_zero(x: f64, eps: f64) -> bool { x.abs() <= eps }
#[inline] pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool { (a - b).abs() <= eps }

#[inline]
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den.abs() <= EPS_DENOM { fallback } else { num / den }
}
