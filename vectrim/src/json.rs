use std::collections::HashSet;
use std::fmt;

use crate::geometry::limits;
use crate::model::{Command, Element, PathElement, PathStyle, SubPath, Transform};
use crate::svg::{parse_path_data, to_path_data};
use crate::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq)]
pub enum DocumentError {
    InvalidJson(String),
    CapsExceeded(String),
    OutOfBounds(String),
    InvalidStructure(String),
    BadPathData { id: String, message: String },
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::InvalidJson(_) => "invalid_json",
            DocumentError::CapsExceeded(_) => "caps_exceeded",
            DocumentError::OutOfBounds(_) => "out_of_bounds",
            DocumentError::InvalidStructure(_) => "invalid_structure",
            DocumentError::BadPathData { .. } => "bad_path_data",
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::InvalidJson(m) => write!(f, "invalid document json: {}", m),
            DocumentError::CapsExceeded(m) => write!(f, "document too large: {}", m),
            DocumentError::OutOfBounds(m) => write!(f, "value out of bounds: {}", m),
            DocumentError::InvalidStructure(m) => write!(f, "invalid document: {}", m),
            DocumentError::BadPathData { id, message } => write!(f, "path '{}': {}", id, message),
        }
    }
}

impl std::error::Error for DocumentError {}

pub fn to_json_impl(doc: &Document) -> Value {
    #[derive(Serialize)]
    #[serde(untagged)]
    enum ElementSer<'a> {
        Path {
            #[serde(rename = "type")]
            kind: &'static str,
            id: &'a str,
            d: String,
            style: &'a PathStyle,
            #[serde(skip_serializing_if = "Option::is_none")]
            transform: Option<Transform>,
        },
        Other {
            #[serde(rename = "type")]
            kind: &'a str,
            id: &'a str,
        },
    }
    #[derive(Serialize)]
    struct DocSer<'a> {
        version: u32,
        elements: Vec<ElementSer<'a>>,
    }
    let elements = doc
        .elements
        .iter()
        .map(|el| match el {
            Element::Path(p) => ElementSer::Path {
                kind: "path",
                id: &p.id,
                d: to_path_data(&p.subpaths),
                style: &p.style,
                transform: p.transform,
            },
            Element::Other { id, kind } => ElementSer::Other { kind, id },
        })
        .collect();
    serde_json::to_value(DocSer { version: FORMAT_VERSION, elements }).unwrap_or(Value::Null)
}

fn check_subpaths(id: &str, subpaths: &[SubPath]) -> Result<(), DocumentError> {
    if subpaths.len() > limits::MAX_SUBPATHS {
        return Err(DocumentError::CapsExceeded(format!("subpaths>{} in '{}'", limits::MAX_SUBPATHS, id)));
    }
    let commands: usize = subpaths.iter().map(|s| s.commands.len()).sum();
    if commands > limits::MAX_PATH_COMMANDS {
        return Err(DocumentError::CapsExceeded(format!("commands>{} in '{}'", limits::MAX_PATH_COMMANDS, id)));
    }
    let in_bounds = |x: f64, y: f64| limits::in_coord_bounds(x) && limits::in_coord_bounds(y);
    for cmd in subpaths.iter().flat_map(|s| s.commands.iter()) {
        let ok = match *cmd {
            Command::MoveTo { x, y } | Command::LineTo { x, y } => in_bounds(x, y),
            Command::CurveTo { x1, y1, x2, y2, x, y } => in_bounds(x1, y1) && in_bounds(x2, y2) && in_bounds(x, y),
            Command::Close => true,
        };
        if !ok {
            return Err(DocumentError::OutOfBounds(format!("coordinate in '{}'", id)));
        }
    }
    Ok(())
}

pub fn from_json_impl(v: Value) -> Result<Document, DocumentError> {
    #[derive(Deserialize)]
    struct ElementDe {
        #[serde(rename = "type")]
        kind: String,
        id: String,
        d: Option<String>,
        subpaths: Option<Vec<SubPath>>,
        style: Option<PathStyle>,
        transform: Option<Transform>,
    }
    #[derive(Deserialize)]
    struct DocDe {
        version: Option<u32>,
        elements: Vec<ElementDe>,
    }
    let doc: DocDe = serde_json::from_value(v).map_err(|e| DocumentError::InvalidJson(e.to_string()))?;
    if let Some(ver) = doc.version {
        if ver > FORMAT_VERSION {
            return Err(DocumentError::InvalidStructure(format!("unsupported version {}", ver)));
        }
    }
    if doc.elements.len() > limits::MAX_ELEMENTS {
        return Err(DocumentError::CapsExceeded(format!("elements>{}", limits::MAX_ELEMENTS)));
    }
    let mut ids = HashSet::new();
    let mut elements = Vec::with_capacity(doc.elements.len());
    for e in doc.elements {
        if !ids.insert(e.id.clone()) {
            return Err(DocumentError::InvalidStructure(format!("duplicate id '{}'", e.id)));
        }
        if e.kind != "path" {
            elements.push(Element::Other { id: e.id, kind: e.kind });
            continue;
        }
        let subpaths = match (e.d, e.subpaths) {
            (Some(d), _) => parse_path_data(&d)
                .map_err(|err| DocumentError::BadPathData { id: e.id.clone(), message: err.to_string() })?,
            (None, Some(sp)) => sp,
            (None, None) => Vec::new(),
        };
        check_subpaths(&e.id, &subpaths)?;
        let style = e.style.unwrap_or_default();
        if !limits::in_width_bounds(style.stroke_width) {
            return Err(DocumentError::OutOfBounds(format!("stroke width of '{}'", e.id)));
        }
        if let Some(t) = e.transform {
            if t.0.iter().any(|c| !c.is_finite()) {
                return Err(DocumentError::OutOfBounds(format!("transform of '{}'", e.id)));
            }
        }
        elements.push(Element::Path(PathElement { id: e.id, subpaths, style, transform: e.transform }));
    }
    Ok(Document { elements })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_paths_and_other_elements() {
        let doc = from_json_impl(json!({
            "elements": [
                { "type": "path", "id": "a", "d": "M0 0 L10 10", "style": { "stroke": "#f00", "stroke_width": 2.0 } },
                { "type": "text", "id": "t" },
                { "type": "path", "id": "b", "subpaths": [ { "commands": [ { "cmd": "move_to", "x": 0.0, "y": 0.0 }, { "cmd": "line_to", "x": 5.0, "y": 5.0 } ] } ] }
            ]
        }))
        .unwrap();
        assert_eq!(doc.elements.len(), 3);
        assert_eq!(doc.elements[1].kind(), "text");
        let a = doc.elements[0].as_path().unwrap();
        assert_eq!(a.style.stroke_width, 2.0);
        assert_eq!(a.style.stroke_opacity, 1.0);
        assert_eq!(doc.elements[2].as_path().unwrap().path_data(), "M 0 0 L 5 5");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(from_json_impl(json!({ "nope": 1 })).unwrap_err().code(), "invalid_json");
        let dup = json!({ "elements": [ { "type": "path", "id": "a" }, { "type": "path", "id": "a" } ] });
        assert_eq!(from_json_impl(dup).unwrap_err().code(), "invalid_structure");
        let far = json!({ "elements": [ { "type": "path", "id": "a", "subpaths": [ { "commands": [ { "cmd": "move_to", "x": 1e9, "y": 0.0 } ] } ] } ] });
        assert_eq!(from_json_impl(far).unwrap_err().code(), "out_of_bounds");
        // Out-of-range numbers inside path data fail to parse
        let far_d = json!({ "elements": [ { "type": "path", "id": "a", "d": "M0 0 L1e9 0" } ] });
        assert_eq!(from_json_impl(far_d).unwrap_err().code(), "bad_path_data");
        let junk = json!({ "elements": [ { "type": "path", "id": "a", "d": "L0 0" } ] });
        assert_eq!(from_json_impl(junk).unwrap_err().code(), "bad_path_data");
    }

    #[test]
    fn writes_path_data() {
        let doc = Document::from_elements(vec![Element::Path(PathElement::from_path_data("a", "M0 0 L10 0 Z"))]);
        let v = to_json_impl(&doc);
        assert_eq!(v["version"], 1);
        assert_eq!(v["elements"][0]["type"], "path");
        assert_eq!(v["elements"][0]["d"], "M 0 0 L 10 0 Z");
        let back = from_json_impl(v).unwrap();
        assert_eq!(back, doc);
    }
}
