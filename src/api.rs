use crate::interop::{arr_f64, arr_str, new_obj, set_kv, to_js};
use crate::{error, TrimEditor};
use js_sys::Float64Array;
use vectrim::{Document, DocumentError, TrimOptions, Vec2};
use wasm_bindgen::prelude::*;
type JsValue = wasm_bindgen::JsValue;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn point(x: f64, y: f64) -> Result<Vec2, JsValue> {
    if !x.is_finite() {
        return Err(error::non_finite("x"));
    }
    if !y.is_finite() {
        return Err(error::non_finite("y"));
    }
    Ok(Vec2::new(x, y))
}

fn serialized<T: serde::Serialize + ?Sized>(v: &T) -> JsValue {
    match to_js(v) {
        Ok(js) => error::ok(js),
        Err(e) => error::err("serialize", e.to_string(), None),
    }
}

impl TrimEditor {
    // A new document always ends the current activation
    fn install(&mut self, loaded: Result<Document, DocumentError>) -> JsValue {
        match loaded {
            Ok(doc) => {
                self.tool.deactivate();
                let n = doc.len();
                self.doc = doc;
                error::ok(JsValue::from_f64(n as f64))
            }
            Err(e) => error::document(&e),
        }
    }
}

#[wasm_bindgen]
impl TrimEditor {
    /// `options` may be undefined or a partial `{ hit_tolerance, drag_tolerance, curve_accuracy }`.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<TrimEditor, JsValue> {
        let opts = if options.is_undefined() || options.is_null() {
            TrimOptions::default()
        } else {
            serde_wasm_bindgen::from_value::<TrimOptions>(options).map_err(|e| error::invalid_json("options", e))?
        };
        for (name, v) in [
            ("hit_tolerance", opts.hit_tolerance),
            ("drag_tolerance", opts.drag_tolerance),
            ("curve_accuracy", opts.curve_accuracy),
        ] {
            if !v.is_finite() {
                return Err(error::non_finite(name));
            }
        }
        Ok(TrimEditor::rs_new(opts))
    }

    // Document
    pub fn load_document_res(&mut self, json: &str) -> JsValue {
        self.install(Document::from_json_str(json))
    }
    /// Same as `load_document_res` for an already-parsed JS object.
    pub fn load_document_value_res(&mut self, v: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<serde_json::Value>(v) {
            Ok(val) => self.install(Document::from_json_value(val)),
            Err(e) => error::invalid_json("document", e),
        }
    }
    pub fn document_json(&self) -> String {
        self.doc.to_json_value().to_string()
    }
    pub fn document_value(&self) -> JsValue {
        serialized(&self.doc.to_json_value())
    }
    pub fn element_count(&self) -> u32 {
        self.doc.len() as u32
    }

    // Activation
    pub fn select_res(&mut self, ids: JsValue) -> JsValue {
        let ids: Vec<String> = match serde_wasm_bindgen::from_value(ids) {
            Ok(v) => v,
            Err(e) => return error::invalid_json("ids", e),
        };
        match self.tool.select(&self.doc, &ids) {
            Ok(()) => error::ok(JsValue::from_bool(true)),
            Err(e) => error::selection(&e),
        }
    }
    pub fn is_active(&self) -> bool {
        self.tool.is_active()
    }
    pub fn deactivate(&mut self) {
        self.tool.deactivate();
    }

    // Overlay data
    pub fn split_result_res(&self) -> JsValue {
        match self.tool.session() {
            Some(s) => serialized(s.split_result()),
            None => error::inactive(),
        }
    }
    /// Flat `[x0, y0, x1, y1, ...]` of intersection markers; empty while idle.
    pub fn intersection_points(&self) -> Float64Array {
        let pts: Vec<f64> = self
            .tool
            .session()
            .map(|s| s.split_result().intersections.iter().flat_map(|ix| [ix.point.x, ix.point.y]).collect())
            .unwrap_or_default();
        arr_f64(&pts)
    }
    pub fn marked_ids(&self) -> js_sys::Array {
        let ids: Vec<&str> = self
            .tool
            .session()
            .map(|s| s.marked().iter().map(String::as_str).collect())
            .unwrap_or_default();
        arr_str(&ids)
    }
    pub fn hovered_id(&self) -> Option<String> {
        self.tool.session().and_then(|s| s.hovered().map(str::to_string))
    }

    // Pointer interaction
    pub fn hover_res(&mut self, x: f64, y: f64) -> JsValue {
        let p = match point(x, y) { Ok(p) => p, Err(e) => return e };
        match self.tool.session_mut() {
            Some(s) => error::ok(s.hover(p).map_or(JsValue::NULL, JsValue::from_str)),
            None => error::inactive(),
        }
    }
    pub fn begin_drag_res(&mut self, x: f64, y: f64) -> JsValue {
        let p = match point(x, y) { Ok(p) => p, Err(e) => return e };
        match self.tool.session_mut() {
            Some(s) => error::ok(arr_str(&s.begin_drag(p)).into()),
            None => error::inactive(),
        }
    }
    pub fn drag_to_res(&mut self, x: f64, y: f64) -> JsValue {
        let p = match point(x, y) { Ok(p) => p, Err(e) => return e };
        match self.tool.session_mut() {
            Some(s) => error::ok(arr_str(&s.drag_to(p)).into()),
            None => error::inactive(),
        }
    }
    pub fn end_drag_res(&mut self) -> JsValue {
        match self.tool.session_mut() {
            Some(s) => error::ok(JsValue::from_f64(s.end_drag().len() as f64)),
            None => error::inactive(),
        }
    }
    pub fn toggle_mark_res(&mut self, segment_id: &str) -> JsValue {
        match self.tool.session_mut() {
            Some(s) => error::ok(JsValue::from_bool(s.toggle_mark(segment_id))),
            None => error::inactive(),
        }
    }
    pub fn clear_marks(&mut self) {
        if let Some(s) = self.tool.session_mut() {
            s.clear_marks();
        }
    }

    pub fn apply_res(&mut self) -> JsValue {
        let Some(out) = self.tool.apply(&mut self.doc) else { return error::inactive(); };
        let o = new_obj();
        set_kv(&o, "applied", &JsValue::from_bool(out.applied));
        set_kv(&o, "removed", &arr_str(&out.removed).into());
        set_kv(&o, "created", &arr_str(&out.created).into());
        set_kv(&o, "selection", &arr_str(&out.selection).into());
        set_kv(&o, "active", &JsValue::from_bool(self.tool.is_active()));
        if let Some(e) = &out.reselect_error {
            set_kv(&o, "reason", &JsValue::from_str(&e.to_string()));
        }
        error::ok(o.into())
    }

    /// Grouped text report, also written to the browser console.
    pub fn debug_dump(&self) -> String {
        let report = vectrim::debug_report(&self.tool);
        web_sys::console::log_1(&JsValue::from_str(&report));
        report
    }
}
