// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use richdoc::{
    editor_state_to_html, export_markdown, import_html, import_markdown,
    sanitize, serialize, ImportOptions, Registry,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Stored editor state to sanitized HTML. Unreadable documents give an
/// empty string.
#[wasm_bindgen(js_name = editorStateToHtml)]
pub fn editor_state_to_html_js(editor_state: &str) -> String {
    editor_state_to_html(editor_state)
}

#[wasm_bindgen(js_name = sanitizeHtml)]
pub fn sanitize_html_js(html: &str) -> String {
    sanitize(html)
}

/// HTML to serialized editor state. Markup without a node equivalent is
/// dropped.
#[wasm_bindgen(js_name = htmlToEditorState)]
pub fn html_to_editor_state_js(html: &str) -> String {
    let imported = import_html(html, &ImportOptions::default());
    serialize(&imported.tree, Registry::standard()).to_json()
}

#[wasm_bindgen(js_name = markdownToEditorState)]
pub fn markdown_to_editor_state_js(markdown: &str) -> Result<String, JsValue> {
    let tree = import_markdown(markdown)
        .map_err(|e| JsValue::from_str(&format!("Markdown error: {e}")))?;
    Ok(serialize(&tree, Registry::standard()).to_json())
}

#[wasm_bindgen(js_name = editorStateToMarkdown)]
pub fn editor_state_to_markdown_js(
    editor_state: &str,
) -> Result<String, JsValue> {
    let deserialized = richdoc::deserialize(editor_state)
        .map_err(|e| JsValue::from_str(&format!("Editor state error: {e}")))?;
    Ok(export_markdown(&deserialized.tree))
}
