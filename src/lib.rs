use wasm_bindgen::prelude::*;
mod api;
pub mod error;
mod interop;

pub use api::set_panic_hook;

/// Browser-facing trim tool: a document plus the tool state machine.
#[wasm_bindgen]
pub struct TrimEditor {
    pub(crate) doc: vectrim::Document,
    pub(crate) tool: vectrim::TrimTool,
}

impl TrimEditor {
    pub fn rs_new(options: vectrim::TrimOptions) -> TrimEditor {
        TrimEditor { doc: vectrim::Document::new(), tool: vectrim::TrimTool::new(options) }
    }
    pub fn rs_document(&self) -> &vectrim::Document { &self.doc }
    pub fn rs_tool(&self) -> &vectrim::TrimTool { &self.tool }
}

#[wasm_bindgen(start)]
pub fn init() {
    set_panic_hook();
    tracing_wasm::set_as_global_default();
    tracing::debug!("vectrim wasm initialized");
}
