pub mod model;
pub mod geometry {
    pub mod bounds;
    pub mod curve;
    pub mod intersect;
    pub mod limits;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod adapter;
    pub mod intersections;
    pub mod optimize;
    pub mod picking;
    pub mod reconstruct;
    pub mod sanitize;
    pub mod split;
}
pub mod debug;
pub mod json;
pub mod session;
pub mod svg;

use model::{Element, PathElement};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use algorithms::picking::SegmentPick;
pub use algorithms::reconstruct::ReconstructError;
pub use algorithms::split::SplitError;
pub use debug::debug_report;
pub use json::DocumentError;
pub use model::{ReconstructedPath, SplitPathResult, TrimIntersection, TrimSegment, Vec2};
pub use session::{validate_selection, ApplyOutcome, SelectionError, ToolState, TrimOptions, TrimSession, TrimTool};
pub use svg::PathDataError;

/// The element collection the trim tool reads from and writes back to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub elements: Vec<Element>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Element>) -> Self {
        Document { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn path(&self, id: &str) -> Option<&PathElement> {
        self.get(id).and_then(Element::as_path)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn push(&mut self, el: Element) {
        self.elements.push(el);
    }

    /// Swap each source element for its replacements at the source's
    /// position. An empty replacement list deletes the source; unknown
    /// sources are skipped.
    pub fn replace_paths(&mut self, replacements: &[(String, Vec<PathElement>)]) {
        for (source, paths) in replacements {
            let Some(at) = self.index_of(source) else {
                tracing::warn!(source = %source, "replacement target no longer in document");
                continue;
            };
            let new_els = paths.iter().cloned().map(Element::Path);
            self.elements.splice(at..=at, new_els);
        }
    }

    pub fn to_json_value(&self) -> Value {
        json::to_json_impl(self)
    }

    pub fn from_json_value(v: Value) -> Result<Document, DocumentError> {
        json::from_json_impl(v)
    }

    pub fn from_json_str(s: &str) -> Result<Document, DocumentError> {
        let v: Value = serde_json::from_str(s).map_err(|e| DocumentError::InvalidJson(e.to_string()))?;
        Self::from_json_value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_keeps_position() {
        let mut d = Document::from_elements(vec![
            Element::Other { id: "x".into(), kind: "image".into() },
            Element::Path(PathElement::from_path_data("a", "M0 0 L1 1")),
            Element::Path(PathElement::from_path_data("b", "M0 0 L1 1")),
        ]);
        d.replace_paths(&[
            (
                "a".to_string(),
                vec![PathElement::from_path_data("a~1", "M0 0 L1 0"), PathElement::from_path_data("a~2", "M0 0 L0 1")],
            ),
            ("b".to_string(), Vec::new()),
        ]);
        let ids: Vec<&str> = d.elements.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["x", "a~1", "a~2"]);
    }
}
