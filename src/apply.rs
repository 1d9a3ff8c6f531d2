//! Depth-first application of a [`StyleDataMap`] to a DOM subtree.
//!
//! Each element may carry up to five style references:
//!
//! | attribute               | table      | effect                                   |
//! |-------------------------|------------|------------------------------------------|
//! | `data-background-color` | colors     | `background-color`                       |
//! | `data-color`            | colors     | `color`                                  |
//! | `data-typography`       | typography | text color, background, font, alignment  |
//! | `data-image-src`        | images     | element `src`                            |
//! | `data-background-image` | images     | `background-image: url(...)`             |
//!
//! References are normalized before lookup. A reference that is not in the
//! table leaves the element untouched.

use crate::dom::{Dom, NodeKind, StyleProperty};
use crate::guide::{Scalar, TypeStyle};
use crate::index::StyleDataMap;
use crate::naming;

/// The data attributes the applier reads, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAttribute {
    BackgroundColor,
    Color,
    Typography,
    ImageSrc,
    BackgroundImage,
}

impl DataAttribute {
    pub const ALL: [DataAttribute; 5] = [
        DataAttribute::BackgroundColor,
        DataAttribute::Color,
        DataAttribute::Typography,
        DataAttribute::ImageSrc,
        DataAttribute::BackgroundImage,
    ];

    /// Attribute name without the `data-` prefix.
    pub fn name(self) -> &'static str {
        match self {
            DataAttribute::BackgroundColor => "background-color",
            DataAttribute::Color => "color",
            DataAttribute::Typography => "typography",
            DataAttribute::ImageSrc => "image-src",
            DataAttribute::BackgroundImage => "background-image",
        }
    }
}

/// Which nodes receive styles. Descent into children is never filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeFilter {
    /// Every element.
    #[default]
    Elements,
    /// Only elements with one of these (lowercase) tag names.
    Tags(Vec<String>),
}

impl NodeFilter {
    fn accepts<D: Dom>(&self, dom: &D, node: D::Node) -> bool {
        if dom.kind(node) != NodeKind::Element {
            return false;
        }
        match self {
            NodeFilter::Elements => true,
            NodeFilter::Tags(tags) => dom
                .tag_name(node)
                .is_some_and(|t| tags.iter().any(|want| want.eq_ignore_ascii_case(&t))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    pub filter: NodeFilter,
}

/// Counters from one application pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Nodes visited, including text and comments.
    pub visited: usize,
    /// Elements that received at least one value.
    pub styled: usize,
    /// References naming an identifier missing from its table.
    pub unresolved: usize,
}

/// Walk `root` and its descendants depth-first, applying every resolvable
/// style reference.
pub fn apply_styles<D: Dom>(
    dom: &mut D,
    root: D::Node,
    data: &StyleDataMap,
    options: &ApplyOptions,
) -> ApplyStats {
    let mut stats = ApplyStats::default();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        stats.visited += 1;
        if options.filter.accepts(dom, node) && style_node(dom, node, data, &mut stats) {
            stats.styled += 1;
        }
        stack.extend(dom.children(node).into_iter().rev());
    }
    stats
}

/// Returns whether anything was written.
fn style_node<D: Dom>(dom: &mut D, node: D::Node, data: &StyleDataMap, stats: &mut ApplyStats) -> bool {
    let mut wrote = false;

    for attr in DataAttribute::ALL {
        let Some(raw) = dom.data_attribute(node, attr.name()) else {
            continue;
        };
        let Some(key) = naming::normalize(&raw) else {
            continue;
        };

        let resolved = match attr {
            DataAttribute::BackgroundColor | DataAttribute::Color => {
                data.color(&key).map(|color| {
                    let property = if attr == DataAttribute::Color {
                        StyleProperty::Color
                    } else {
                        StyleProperty::BackgroundColor
                    };
                    if let Some(value) = &color.value {
                        dom.set_style(node, property, value);
                        wrote = true;
                    }
                })
            }
            DataAttribute::Typography => data.type_style(&key).map(|style| {
                wrote |= apply_type_style(dom, node, style);
            }),
            DataAttribute::ImageSrc => data.image(&key).map(|image| {
                if let Some(url) = &image.url {
                    dom.set_src(node, url);
                    wrote = true;
                }
            }),
            DataAttribute::BackgroundImage => data.image(&key).map(|image| {
                if let Some(url) = &image.url {
                    dom.set_style(node, StyleProperty::BackgroundImage, &format!("url({url})"));
                    wrote = true;
                }
            }),
        };

        if resolved.is_none() {
            stats.unresolved += 1;
            tracing::debug!("no {} named {key:?} in style guide", attr.name());
        }
    }

    wrote
}

fn apply_type_style<D: Dom>(dom: &mut D, node: D::Node, style: &TypeStyle) -> bool {
    let mut decls: Vec<(StyleProperty, String)> = Vec::new();

    if let Some(v) = &style.text_color {
        decls.push((StyleProperty::Color, v.clone()));
    }
    if let Some(v) = &style.background_color {
        decls.push((StyleProperty::BackgroundColor, v.clone()));
    }
    if let Some(v) = &style.font_family {
        decls.push((StyleProperty::FontFamily, v.clone()));
    }
    if let Some(v) = &style.font_size {
        decls.push((StyleProperty::FontSize, pixels(v)));
    }
    if let Some(v) = &style.font_style {
        decls.push((StyleProperty::FontStyle, v.clone()));
    }
    if let Some(v) = &style.font_weight {
        decls.push((StyleProperty::FontWeight, v.to_string()));
    }
    if let Some(v) = style.line_height.as_ref().filter(|v| v.is_set()) {
        decls.push((StyleProperty::LineHeight, pixels(v)));
    }
    if let Some(v) = style.alignment.as_ref().filter(|v| !v.is_empty()) {
        decls.push((StyleProperty::TextAlign, v.clone()));
    }

    for (property, value) in &decls {
        dom.set_style(node, *property, value);
    }
    !decls.is_empty()
}

/// `14` becomes `14px`; text that already carries a unit passes through.
fn pixels(value: &Scalar) -> String {
    match value {
        Scalar::Text(s) if s.trim().parse::<f64>().is_err() => s.trim().to_string(),
        other => format!("{other}px"),
    }
}
