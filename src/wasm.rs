//! WASM bindings for the style guide indexer and applier.
//!
//! Exposes the crate's pure functions to JavaScript via wasm-bindgen.
//! Build with: `wasm-pack build --target web --features wasm`

use wasm_bindgen::prelude::*;

/// Index a style guide response body.
///
/// Returns `{ colors, typography, images }` keyed by normalized identifier,
/// or throws a JS error when the body is not a style guide.
#[wasm_bindgen(js_name = indexStyleGuide)]
pub fn index_style_guide(json: &str) -> Result<JsValue, JsError> {
    let data = crate::index_json(json).map_err(|e| JsError::new(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&data).map_err(|e| JsError::new(&e.to_string()))
}

/// Apply a style guide to an HTML string and return the styled HTML.
///
/// `root_id` restricts styling to the element with that id.
#[wasm_bindgen(js_name = styleHtml)]
pub fn style_html(html: &str, json: &str, root_id: Option<String>) -> Result<String, JsError> {
    let data = crate::index_json(json).map_err(|e| JsError::new(&e.to_string()))?;
    let (out, _) = crate::style_html_with(
        html,
        &data,
        root_id.as_deref(),
        &crate::apply::ApplyOptions::default(),
    )
    .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(out)
}

/// Normalize a display name or attribute reference to its lookup key.
#[wasm_bindgen(js_name = normalizeIdentifier)]
pub fn normalize_identifier(name: &str) -> Option<String> {
    crate::naming::normalize(name)
}

/// Check a style guide response body without applying it.
///
/// Returns a JSON object with:
/// - `valid`: boolean
/// - `error`: string (only if invalid)
/// - `colors`, `typography`, `images`: number of indexed entries (only if valid)
#[wasm_bindgen(js_name = validateStyleGuide)]
pub fn validate_style_guide(json: &str) -> JsValue {
    let obj = js_sys::Object::new();
    match crate::index_json(json) {
        Ok(data) => {
            let _ = js_sys::Reflect::set(&obj, &"valid".into(), &JsValue::TRUE);
            for (key, count) in [
                ("colors", data.colors.len()),
                ("typography", data.typography.len()),
                ("images", data.images.len()),
            ] {
                let _ = js_sys::Reflect::set(&obj, &key.into(), &JsValue::from_f64(count as f64));
            }
        }
        Err(e) => {
            let _ = js_sys::Reflect::set(&obj, &"valid".into(), &JsValue::FALSE);
            let _ = js_sys::Reflect::set(&obj, &"error".into(), &JsValue::from_str(&e.to_string()));
        }
    }
    obj.into()
}
