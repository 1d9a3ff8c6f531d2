pub mod apply;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod guide;
pub mod index;
pub mod lexer;
pub mod naming;
pub mod parser;
pub mod plugin;
pub mod render;
pub mod token;

#[cfg(not(target_arch = "wasm32"))]
pub mod server;

#[cfg(feature = "wasm")]
pub mod wasm;

use apply::{ApplyOptions, ApplyStats};
use dom::Dom;
use error::{BrandError, Result};
use index::StyleDataMap;

pub use plugin::{DocsPlugin, LoadOutcome, PluginOptions, RefreshOptions};

/// Index a style guide response body. Empty and `null` bodies give empty
/// tables.
pub fn index_json(body: &str) -> Result<StyleDataMap> {
    let guide = guide::parse(body)?.unwrap_or_default();
    Ok(StyleDataMap::from_guide(&guide))
}

/// Apply lookup tables to an HTML document and serialize the result.
///
/// `root_id` selects the subtree to style; without it the body is used.
pub fn style_html_with(
    html: &str,
    data: &StyleDataMap,
    root_id: Option<&str>,
    options: &ApplyOptions,
) -> Result<(String, ApplyStats)> {
    let mut doc = parser::parse_html(html)?;
    let root = match root_id {
        Some(id) => doc
            .element_by_id(id)
            .ok_or_else(|| BrandError::message(&format!("no element with id '{id}'")))?,
        None => doc.body(),
    };
    let stats = apply::apply_styles(&mut doc, root, data, options);
    Ok((render::to_html(&doc), stats))
}

/// Style an HTML document's body with a style guide response body.
pub fn style_html(html: &str, guide_json: &str) -> Result<String> {
    let data = index_json(guide_json)?;
    let (out, _) = style_html_with(html, &data, None, &ApplyOptions::default())?;
    Ok(out)
}
