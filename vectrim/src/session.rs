//! Selection validation and the trim tool's state machine.
//!
//! A `TrimSession` owns everything an activation needs: the validated
//! selection, the cached `SplitPathResult`, hover and drag state, and the
//! set of segments marked for removal. The cached result is shared with
//! renderers through an `Rc` and is replaced wholesale on every recompute.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::algorithms::picking::{pick_segment, segments_crossed};
use crate::algorithms::reconstruct::{try_reconstruct, Scope};
use crate::algorithms::sanitize::sanitize;
use crate::algorithms::split::compute_split;
use crate::geometry::limits::{MAX_PATHS, MIN_PATHS};
use crate::geometry::tolerance::CURVE_ACCURACY;
use crate::model::{PathElement, SplitPathResult, Vec2};
use crate::Document;

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionError {
    NotEnoughPaths { count: usize },
    TooManyPaths { count: usize },
    NonPathElement { id: String, kind: String },
    UnknownElement { id: String },
}

impl SelectionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            SelectionError::NotEnoughPaths { .. } => "not_enough_paths",
            SelectionError::TooManyPaths { .. } => "too_many_paths",
            SelectionError::NonPathElement { .. } => "non_path_element",
            SelectionError::UnknownElement { .. } => "unknown_element",
        }
    }
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NotEnoughPaths { count } => {
                write!(f, "Not enough paths to trim: select at least {} paths ({} selected)", MIN_PATHS, count)
            }
            SelectionError::TooManyPaths { count } => {
                write!(f, "Too many paths to trim: at most {} paths ({} selected)", MAX_PATHS, count)
            }
            SelectionError::NonPathElement { id, kind } => {
                write!(f, "Only paths can be trimmed: '{}' is a {} element", id, kind)
            }
            SelectionError::UnknownElement { id } => write!(f, "No element with id '{}'", id),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Resolve `selection` to path elements in selection order. Repeated ids
/// count once.
pub fn validate_selection<'a>(doc: &'a Document, selection: &[String]) -> Result<Vec<&'a PathElement>, SelectionError> {
    let mut seen = HashSet::new();
    let mut paths = Vec::with_capacity(selection.len());
    for id in selection {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let el = doc.get(id).ok_or_else(|| SelectionError::UnknownElement { id: id.clone() })?;
        match el.as_path() {
            Some(p) => paths.push(p),
            None => return Err(SelectionError::NonPathElement { id: id.clone(), kind: el.kind().to_string() }),
        }
    }
    if paths.len() < MIN_PATHS {
        return Err(SelectionError::NotEnoughPaths { count: paths.len() });
    }
    if paths.len() > MAX_PATHS {
        return Err(SelectionError::TooManyPaths { count: paths.len() });
    }
    Ok(paths)
}

/// Runtime knobs of the tool, in document units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimOptions {
    /// Hover pick radius
    pub hit_tolerance: f64,
    /// How close a drag has to pass to mark a segment
    pub drag_tolerance: f64,
    /// Curve/curve intersection accuracy
    pub curve_accuracy: f64,
}

impl Default for TrimOptions {
    fn default() -> Self {
        TrimOptions { hit_tolerance: 4.0, drag_tolerance: 2.0, curve_accuracy: CURVE_ACCURACY }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// False when nothing was marked or reconstruction failed; the
    /// document is untouched then.
    pub applied: bool,
    /// Source element ids that were replaced or deleted
    pub removed: Vec<String>,
    /// Ids of inserted elements, in document order per source
    pub created: Vec<String>,
    /// Selection after the apply
    pub selection: Vec<String>,
    /// Why the session could not continue on the new selection
    #[serde(skip)]
    pub reselect_error: Option<SelectionError>,
}

#[derive(Debug)]
pub struct TrimSession {
    selection: Vec<String>,
    options: TrimOptions,
    result: Rc<SplitPathResult>,
    marked: BTreeSet<String>,
    hovered: Option<String>,
    drag: Option<Vec<Vec2>>,
}

impl TrimSession {
    pub fn activate(doc: &Document, selection: &[String], options: TrimOptions) -> Result<Self, SelectionError> {
        let paths = validate_selection(doc, selection)?;
        let result = Rc::new(compute_split(&paths, options.curve_accuracy));
        Ok(TrimSession {
            selection: selection.to_vec(),
            options,
            result,
            marked: BTreeSet::new(),
            hovered: None,
            drag: None,
        })
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn options(&self) -> TrimOptions {
        self.options
    }

    /// Shared handle on the current split result.
    pub fn result(&self) -> Rc<SplitPathResult> {
        Rc::clone(&self.result)
    }

    pub fn split_result(&self) -> &SplitPathResult {
        &self.result
    }

    pub fn marked(&self) -> &BTreeSet<String> {
        &self.marked
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_path(&self) -> &[Vec2] {
        self.drag.as_deref().unwrap_or(&[])
    }

    fn reset_interaction(&mut self) {
        self.marked.clear();
        self.hovered = None;
        self.drag = None;
    }

    /// Recompute for a new selection. Returns `Ok(false)` without doing any
    /// work when the selected ids are unchanged.
    pub fn refresh(&mut self, doc: &Document, selection: &[String]) -> Result<bool, SelectionError> {
        if self.selection.as_slice() == selection {
            return Ok(false);
        }
        let paths = validate_selection(doc, selection)?;
        self.result = Rc::new(compute_split(&paths, self.options.curve_accuracy));
        self.selection = selection.to_vec();
        self.reset_interaction();
        Ok(true)
    }

    /// Recompute against the current document regardless of the cache.
    pub fn recompute(&mut self, doc: &Document) -> Result<(), SelectionError> {
        let paths = validate_selection(doc, &self.selection)?;
        self.result = Rc::new(compute_split(&paths, self.options.curve_accuracy));
        self.reset_interaction();
        Ok(())
    }

    /// Update the hovered segment for a pointer position.
    pub fn hover(&mut self, p: Vec2) -> Option<&str> {
        self.hovered = pick_segment(&self.result, p, self.options.hit_tolerance).map(|pick| pick.segment_id);
        self.hovered.as_deref()
    }

    pub fn begin_drag(&mut self, p: Vec2) -> Vec<String> {
        self.drag = Some(vec![p]);
        let hit: Vec<String> = pick_segment(&self.result, p, self.options.drag_tolerance)
            .map(|pick| pick.segment_id)
            .into_iter()
            .collect();
        self.mark_ids(hit)
    }

    /// Extend the cursor path. Returns the ids newly marked by this step.
    pub fn drag_to(&mut self, p: Vec2) -> Vec<String> {
        let Some(path) = self.drag.as_mut() else { return Vec::new(); };
        let from = path.last().copied().unwrap_or(p);
        path.push(p);
        let hit = segments_crossed(&self.result, from, p, self.options.drag_tolerance);
        self.mark_ids(hit)
    }

    /// Finish the drag and hand back the cursor path.
    pub fn end_drag(&mut self) -> Vec<Vec2> {
        self.drag.take().unwrap_or_default()
    }

    fn mark_ids(&mut self, ids: Vec<String>) -> Vec<String> {
        ids.into_iter().filter(|id| self.marked.insert(id.clone())).collect()
    }

    /// Flip one segment's mark. Unknown ids are ignored. Returns whether the
    /// segment is marked afterwards.
    pub fn toggle_mark(&mut self, id: &str) -> bool {
        if self.result.segment(id).is_none() {
            return false;
        }
        if !self.marked.remove(id) {
            self.marked.insert(id.to_string());
            return true;
        }
        false
    }

    /// Mark known segment ids. Returns how many were newly marked.
    pub fn mark_for_removal<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        let known: Vec<String> = ids
            .into_iter()
            .filter(|id| self.result.segment(id).is_some())
            .map(str::to_string)
            .collect();
        self.mark_ids(known).len()
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    /// Replace every path that lost a segment with its reconstruction, then
    /// recompute for the derived selection.
    pub fn apply(&mut self, doc: &mut Document) -> ApplyOutcome {
        if self.marked.is_empty() {
            return ApplyOutcome { selection: self.selection.clone(), ..ApplyOutcome::default() };
        }
        let removed_ids: HashSet<String> = self.marked.iter().cloned().collect();
        let rebuilt = match try_reconstruct(&self.result, &removed_ids, Scope::Touched, &|id: &str| doc.contains(id)) {
            Ok(paths) => sanitize(paths),
            Err(e) => {
                tracing::error!(error = %e, "reconstruction failed, document left unchanged");
                return ApplyOutcome { selection: self.selection.clone(), ..ApplyOutcome::default() };
            }
        };
        let touched: Vec<String> = self
            .result
            .path_order
            .iter()
            .filter(|pid| self.result.segments_of(pid).any(|s| removed_ids.contains(&s.id)))
            .cloned()
            .collect();

        let mut created = Vec::new();
        let replacements: Vec<(String, Vec<PathElement>)> = touched
            .iter()
            .map(|source| {
                let els: Vec<PathElement> = rebuilt
                    .iter()
                    .filter(|p| &p.source_path_id == source)
                    .map(|p| p.to_element())
                    .collect();
                created.extend(els.iter().map(|e| e.id.clone()));
                (source.clone(), els)
            })
            .collect();
        doc.replace_paths(&replacements);

        let mut selection = Vec::with_capacity(self.selection.len());
        for id in &self.selection {
            match replacements.iter().find(|(source, _)| source == id) {
                Some((_, els)) => selection.extend(els.iter().map(|e| e.id.clone())),
                None => selection.push(id.clone()),
            }
        }
        tracing::debug!(removed = touched.len(), created = created.len(), "trim applied");

        self.selection = selection.clone();
        let reselect_error = match self.recompute(doc) {
            Ok(()) => None,
            Err(e) => {
                tracing::debug!(error = %e, "selection after apply is not trimmable");
                self.result = Rc::new(SplitPathResult::default());
                self.reset_interaction();
                Some(e)
            }
        };
        ApplyOutcome { applied: true, removed: touched, created, selection, reselect_error }
    }

    /// End the activation, releasing the cached result.
    pub fn deactivate(self) -> Vec<String> {
        self.selection
    }
}

#[derive(Debug, Default)]
pub enum ToolState {
    #[default]
    Idle,
    Active(TrimSession),
}

/// The trim tool: idle, or active over a validated selection.
#[derive(Debug, Default)]
pub struct TrimTool {
    state: ToolState,
    options: TrimOptions,
}

impl TrimTool {
    pub fn new(options: TrimOptions) -> Self {
        TrimTool { state: ToolState::Idle, options }
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub fn options(&self) -> TrimOptions {
        self.options
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Active(_))
    }

    pub fn session(&self) -> Option<&TrimSession> {
        match &self.state {
            ToolState::Active(s) => Some(s),
            ToolState::Idle => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut TrimSession> {
        match &mut self.state {
            ToolState::Active(s) => Some(s),
            ToolState::Idle => None,
        }
    }

    /// Follow a selection change. An invalid selection leaves the tool idle.
    pub fn select(&mut self, doc: &Document, selection: &[String]) -> Result<(), SelectionError> {
        let outcome = match &mut self.state {
            ToolState::Active(session) => session.refresh(doc, selection).map(|_| ()),
            ToolState::Idle => TrimSession::activate(doc, selection, self.options).map(|s| {
                self.state = ToolState::Active(s);
            }),
        };
        if let Err(e) = &outcome {
            tracing::debug!(error = %e, "trim tool idle");
            self.state = ToolState::Idle;
        }
        outcome
    }

    /// `None` while idle.
    pub fn apply(&mut self, doc: &mut Document) -> Option<ApplyOutcome> {
        let outcome = self.session_mut()?.apply(doc);
        if outcome.reselect_error.is_some() {
            self.state = ToolState::Idle;
        }
        Some(outcome)
    }

    pub fn deactivate(&mut self) {
        if let ToolState::Active(session) = std::mem::take(&mut self.state) {
            session.deactivate();
        }
    }
}
