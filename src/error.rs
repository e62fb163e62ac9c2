use wasm_bindgen::prelude::*;
use js_sys::{Object, Reflect};
use vectrim::{DocumentError, SelectionError};

fn set_kv(obj: &Object, k: &str, v: &JsValue) { let _ = Reflect::set(obj, &JsValue::from_str(k), v); }

fn new_obj() -> Object { Object::new() }

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data { set_kv(&e, "data", &d); }
    set_kv(&root, "error", &e.into());
    root.into()
}

#[inline]
pub fn non_finite(param: &str) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(param));
    err("non_finite", format!("parameter '{}' must be finite", param), Some(d.into()))
}

#[inline]
pub fn inactive() -> JsValue {
    err("inactive", "trim tool is not active; select at least two paths first", None)
}

#[inline]
pub fn invalid_json(what: &str, e: impl std::fmt::Display) -> JsValue {
    let d = new_obj(); set_kv(&d, "param", &JsValue::from_str(what));
    err("invalid_json", format!("could not read '{}': {}", what, e), Some(d.into()))
}

pub fn selection(e: &SelectionError) -> JsValue {
    let d = new_obj();
    match e {
        SelectionError::NotEnoughPaths { count } | SelectionError::TooManyPaths { count } => {
            set_kv(&d, "count", &JsValue::from_f64(*count as f64));
        }
        SelectionError::NonPathElement { id, kind } => {
            set_kv(&d, "id", &JsValue::from_str(id));
            set_kv(&d, "kind", &JsValue::from_str(kind));
        }
        SelectionError::UnknownElement { id } => set_kv(&d, "id", &JsValue::from_str(id)),
    }
    err(e.code(), e.to_string(), Some(d.into()))
}

pub fn document(e: &DocumentError) -> JsValue {
    err(e.code(), e.to_string(), None)
}
