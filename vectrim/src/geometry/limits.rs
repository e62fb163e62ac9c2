// Centralized caps to harden against oversized selections and untrusted input

// Selection
pub const MIN_PATHS: usize = 2;
pub const MAX_PATHS: usize = 100;

// Document ingestion (JSON)
pub const MAX_ELEMENTS: usize = 50_000;

// Path data caps
pub const MAX_PATH_DATA_LEN: usize = 4 * 1024 * 1024; // characters in the 'd' string
pub const MAX_PATH_COMMANDS: usize = 200_000;
pub const MAX_SUBPATHS: usize = 10_000;

// Numeric bounds
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 =  10_000_000.0;
pub const WIDTH_MAX: f64 = 10_000.0;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

#[inline]
pub fn in_width_bounds(w: f64) -> bool { w.is_finite() && w >= 0.0 && w <= WIDTH_MAX }
