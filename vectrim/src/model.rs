use crate::geometry::bounds::Bounds;
use crate::geometry::curve::Curve;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn close_to(self, other: Vec2, eps: f64) -> bool {
        self.distance(other) <= eps
    }

    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        Vec2 { x: self.x + (other.x - self.x) * t, y: self.y + (other.y - self.y) * t }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<kurbo::Point> for Vec2 {
    fn from(p: kurbo::Point) -> Self {
        Vec2 { x: p.x, y: p.y }
    }
}

impl From<Vec2> for kurbo::Point {
    fn from(v: Vec2) -> Self {
        kurbo::Point::new(v.x, v.y)
    }
}

/// One drawing command of a subpath, in absolute coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    CurveTo { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    Close,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SubPath {
    pub commands: Vec<Command>,
}

impl SubPath {
    pub fn is_closed(&self) -> bool {
        matches!(self.commands.last(), Some(Command::Close))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// Presentation attributes of a path element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
    pub stroke_linecap: LineCap,
    pub stroke_linejoin: LineJoin,
    pub stroke_dasharray: Vec<f64>,
    pub fill: Option<String>,
    pub fill_opacity: f64,
    pub fill_rule: FillRule,
}

impl Default for PathStyle {
    fn default() -> Self {
        PathStyle {
            stroke: Some("#000000".to_string()),
            stroke_width: 1.0,
            stroke_opacity: 1.0,
            stroke_linecap: LineCap::Butt,
            stroke_linejoin: LineJoin::Miter,
            stroke_dasharray: Vec::new(),
            fill: None,
            fill_opacity: 1.0,
            fill_rule: FillRule::NonZero,
        }
    }
}

impl PathStyle {
    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.stroke.clone(),
            width: self.stroke_width,
            opacity: self.stroke_opacity,
            linecap: self.stroke_linecap,
            linejoin: self.stroke_linejoin,
            dasharray: self.stroke_dasharray.clone(),
        }
    }

    /// Style for a trimmed result: an open shape cannot keep its fill.
    pub fn for_trimmed(&self, closed: bool) -> PathStyle {
        let mut style = self.clone();
        if !closed {
            style.fill = None;
            style.fill_opacity = 0.0;
        }
        style
    }
}

/// Stroke attributes a segment inherits for highlighting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Option<String>,
    pub width: f64,
    pub opacity: f64,
    pub linecap: LineCap,
    pub linejoin: LineJoin,
    pub dasharray: Vec<f64>,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        PathStyle::default().stroke_style()
    }
}

/// Affine matrix `[a, b, c, d, e, f]`, inherited verbatim by trimmed paths.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform(pub [f64; 6]);

impl Transform {
    pub const IDENTITY: Transform = Transform([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn is_identity(&self) -> bool {
        *self == Transform::IDENTITY
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathElement {
    pub id: String,
    pub subpaths: Vec<SubPath>,
    #[serde(default)]
    pub style: PathStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

impl PathElement {
    pub fn new(id: impl Into<String>, subpaths: Vec<SubPath>) -> Self {
        PathElement { id: id.into(), subpaths, style: PathStyle::default(), transform: None }
    }

    /// Build from SVG path data. Malformed data yields an element without subpaths.
    pub fn from_path_data(id: impl Into<String>, d: &str) -> Self {
        let subpaths = crate::svg::parse_path_data(d).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding malformed path data");
            Vec::new()
        });
        PathElement::new(id, subpaths)
    }

    pub fn with_style(mut self, style: PathStyle) -> Self {
        self.style = style;
        self
    }

    pub fn path_data(&self) -> String {
        crate::svg::to_path_data(&self.subpaths)
    }
}

/// A document entity. Everything that is not a path only matters to
/// selection validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Path(PathElement),
    Other { id: String, kind: String },
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Path(p) => &p.id,
            Element::Other { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Element::Path(_) => "path",
            Element::Other { kind, .. } => kind,
        }
    }

    pub fn as_path(&self) -> Option<&PathElement> {
        match self {
            Element::Path(p) => Some(p),
            Element::Other { .. } => None,
        }
    }
}

/// A crossing between two curves. Curve indices are global across all
/// subpaths of their path; `path_a == path_b` for self-intersections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimIntersection {
    pub id: String,
    pub point: Vec2,
    pub path_a: String,
    pub path_b: String,
    pub curve_a: usize,
    pub curve_b: usize,
    pub t_a: f64,
    pub t_b: f64,
}

impl TrimIntersection {
    pub fn is_self(&self) -> bool {
        self.path_a == self.path_b
    }
}

/// A trimmable run of geometry bounded by intersections or path endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimSegment {
    pub id: String,
    pub path_id: String,
    pub subpath_index: usize,
    pub start_intersection: Option<String>,
    pub end_intersection: Option<String>,
    pub start_point: Vec2,
    pub end_point: Vec2,
    pub curves: Vec<Curve>,
    pub path_data: String,
    pub bounds: Bounds,
    pub curve_indices: Vec<usize>,
    pub stroke: StrokeStyle,
}

/// Everything about a segment except its geometry.
#[derive(Clone, Debug)]
pub struct SegmentHeader {
    pub id: String,
    pub path_id: String,
    pub subpath_index: usize,
    pub start_intersection: Option<String>,
    pub end_intersection: Option<String>,
    pub curve_indices: Vec<usize>,
    pub stroke: StrokeStyle,
}

impl TrimSegment {
    /// Assemble a segment; endpoints, bounds and path data are derived from
    /// the curves. `None` when there is no geometry.
    pub fn from_curves(header: SegmentHeader, curves: Vec<Curve>) -> Option<TrimSegment> {
        let first = curves.first()?;
        let last = curves.last()?;
        let bounds = curves.iter().skip(1).fold(first.bounds(), |acc, c| acc.union(&c.bounds()));
        Some(TrimSegment {
            id: header.id,
            path_id: header.path_id,
            subpath_index: header.subpath_index,
            start_intersection: header.start_intersection,
            end_intersection: header.end_intersection,
            start_point: first.start(),
            end_point: last.end(),
            path_data: crate::svg::curves_to_path_data(&curves, false),
            bounds,
            curve_indices: header.curve_indices,
            stroke: header.stroke,
            curves,
        })
    }

    pub fn length(&self) -> f64 {
        self.curves.iter().map(|c| c.arclen()).sum()
    }

    /// Recorded endpoints agree with the geometry within `tol`.
    pub fn endpoints_consistent(&self, tol: f64) -> bool {
        match (self.curves.first(), self.curves.last()) {
            (Some(first), Some(last)) => {
                first.start().close_to(self.start_point, tol) && last.end().close_to(self.end_point, tol)
            }
            _ => false,
        }
    }
}

/// Output of one tool activation: intersections, segments and a snapshot
/// of the source paths.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitPathResult {
    pub intersections: Vec<TrimIntersection>,
    pub segments: Vec<TrimSegment>,
    pub original_paths: HashMap<String, PathElement>,
    /// Selection order of `original_paths`.
    pub path_order: Vec<String>,
}

impl SplitPathResult {
    pub fn segment(&self, id: &str) -> Option<&TrimSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn segments_of<'a>(&'a self, path_id: &'a str) -> impl Iterator<Item = &'a TrimSegment> + 'a {
        self.segments.iter().filter(move |s| s.path_id == path_id)
    }

    pub fn intersections_of<'a>(&'a self, path_id: &'a str) -> impl Iterator<Item = &'a TrimIntersection> + 'a {
        self.intersections
            .iter()
            .filter(move |ix| ix.path_a == path_id || ix.path_b == path_id)
    }
}

/// A path rebuilt from surviving segments, ready to replace its source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedPath {
    pub id: String,
    pub path_data: String,
    pub subpaths: Vec<SubPath>,
    pub style: PathStyle,
    pub is_closed: bool,
    pub source_path_id: String,
    pub segment_ids: Vec<String>,
    pub segments: Vec<TrimSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
}

impl ReconstructedPath {
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|s| s.length()).sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::union_all(self.segments.iter().map(|s| &s.bounds))
    }

    pub fn to_element(&self) -> PathElement {
        PathElement {
            id: self.id.clone(),
            subpaths: self.subpaths.clone(),
            style: self.style.clone(),
            transform: self.transform,
        }
    }
}
