//! The DOM surface the applier writes to, and an in-memory document that
//! implements it.

use std::fmt;

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
};

use crate::error::{BrandError, Result};

/// Elements that never have children.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Node categories the applier distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype,
    Element,
    Text,
    Comment,
}

/// Inline style properties the applier assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Color,
    BackgroundColor,
    BackgroundImage,
    FontFamily,
    FontSize,
    FontStyle,
    FontWeight,
    LineHeight,
    TextAlign,
}

impl StyleProperty {
    /// CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            StyleProperty::Color => "color",
            StyleProperty::BackgroundColor => "background-color",
            StyleProperty::BackgroundImage => "background-image",
            StyleProperty::FontFamily => "font-family",
            StyleProperty::FontSize => "font-size",
            StyleProperty::FontStyle => "font-style",
            StyleProperty::FontWeight => "font-weight",
            StyleProperty::LineHeight => "line-height",
            StyleProperty::TextAlign => "text-align",
        }
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

/// A mutable document tree the style applier can walk.
///
/// `data_attribute("background-color")` reads `data-background-color`.
pub trait Dom {
    type Node: Copy + Eq + fmt::Debug;

    /// The default root for applying styles.
    fn body(&self) -> Self::Node;
    fn kind(&self, node: Self::Node) -> NodeKind;
    /// Lowercased tag name for elements.
    fn tag_name(&self, node: Self::Node) -> Option<String>;
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
    fn data_attribute(&self, node: Self::Node, name: &str) -> Option<String>;
    /// Set an inline style declaration; an empty value removes it.
    fn set_style(&mut self, node: Self::Node, property: StyleProperty, value: &str);
    fn set_src(&mut self, node: Self::Node, url: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Doctype(String),
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    /// Attributes in source order, excluding `style`.
    pub attrs: Vec<(String, String)>,
    /// Inline style declarations in insertion order.
    pub style: Vec<(String, String)>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "style" {
            self.style = parse_declarations(value);
            return;
        }
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    fn set_style(&mut self, property: &str, value: &str) {
        let existing = self.style.iter().position(|(p, _)| p == property);
        match (existing, value.is_empty()) {
            (Some(i), true) => {
                self.style.remove(i);
            }
            (Some(i), false) => self.style[i].1 = value.to_string(),
            (None, true) => {}
            (None, false) => self.style.push((property.to_string(), value.to_string())),
        }
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// The `style` attribute text for the current declarations.
    pub fn style_text(&self) -> String {
        self.style
            .iter()
            .map(|(p, v)| format!("{p}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Split an inline `style` attribute into declarations, keeping each value's
/// source text. Later duplicates replace earlier ones; invalid declarations
/// are skipped.
fn parse_declarations(text: &str) -> Vec<(String, String)> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut declarations = InlineDeclarations;

    let mut out: Vec<(String, String)> = Vec::new();
    for (prop, value) in RuleBodyParser::new(&mut parser, &mut declarations).flatten() {
        match out.iter_mut().find(|(p, _)| *p == prop) {
            Some((_, v)) => *v = value,
            None => out.push((prop, value)),
        }
    }
    out
}

struct InlineDeclarations;

impl<'i> DeclarationParser<'i> for InlineDeclarations {
    type Declaration = (String, String);
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> std::result::Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let value = input.slice_from(start).trim();
        if value.is_empty() {
            return Err(input.new_custom_error::<(), ()>(()));
        }
        Ok((name.to_ascii_lowercase(), value.to_string()))
    }
}

impl<'i> AtRuleParser<'i> for InlineDeclarations {
    type Prelude = ();
    type AtRule = (String, String);
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for InlineDeclarations {
    type Prelude = ();
    type QualifiedRule = (String, String);
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, (String, String), ()> for InlineDeclarations {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An arena-backed document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    pub fn create_doctype(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Doctype(text.to_string()))
    }

    /// Append text under `parent`, extending a trailing text node if present.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<()> {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last.0].data {
                existing.push_str(text);
                return Ok(());
            }
        }
        let node = self.create_text(text);
        self.append_child(parent, node)
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    ///
    /// Fails when `child` is `parent` itself or one of its ancestors, since
    /// the move would cut the subtree loose from the document.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.is_inclusive_ancestor(child, parent) {
            return Err(BrandError::hierarchy(child, parent));
        }
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Whether `ancestor` is `node` or lies on its parent chain.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes[n.0].parent;
        }
        false
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn child_nodes(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Set an attribute on an element. Setting `style` replaces the inline
    /// declarations. No-op for non-element nodes.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.set_attribute(name, value);
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attribute(&name.to_ascii_lowercase())
    }

    /// Current inline value of a CSS property.
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)?.style(property)
    }

    /// Depth-first pre-order iterator over `node` and its descendants.
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![node],
        }
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|n| self.attribute(*n, "id") == Some(id))
    }

    pub fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.descendants(self.root())
            .find(|n| self.element(*n).is_some_and(|el| el.tag == tag))
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.doc.child_nodes(node).iter().rev().copied());
        Some(node)
    }
}

impl Dom for Document {
    type Node = NodeId;

    /// The `<body>` element, or the document root when there is none.
    fn body(&self) -> NodeId {
        self.first_element_by_tag("body").unwrap_or(self.root())
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.data(node) {
            NodeData::Document => NodeKind::Document,
            NodeData::Doctype(_) => NodeKind::Doctype,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        }
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|el| el.tag.clone())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.child_nodes(node).to_vec()
    }

    fn data_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attribute(node, &format!("data-{name}"))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn set_style(&mut self, node: NodeId, property: StyleProperty, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.set_style(property.css_name(), value);
        }
    }

    fn set_src(&mut self, node: NodeId, url: &str) {
        self.set_attribute(node, "src", url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let html = doc.create_element("HTML");
        let body = doc.create_element("body");
        let div = doc.create_element("div");
        let text = doc.create_text("hello");
        let root = doc.root();
        doc.append_child(root, html).unwrap();
        doc.append_child(html, body).unwrap();
        doc.append_child(body, div).unwrap();
        doc.append_child(div, text).unwrap();
        (doc, body, div, text)
    }

    #[test]
    fn body_is_found() {
        let (doc, body, _, _) = sample();
        assert_eq!(doc.body(), body);
        assert_eq!(Document::new().body(), NodeId(0));
    }

    #[test]
    fn tags_are_lowercased() {
        let (doc, _, _, _) = sample();
        assert!(doc.first_element_by_tag("html").is_some());
    }

    #[test]
    fn data_attributes() {
        let (mut doc, _, div, text) = sample();
        doc.set_attribute(div, "data-color", "brand-1");
        doc.set_attribute(div, "data-typography", "");
        assert_eq!(doc.data_attribute(div, "color").as_deref(), Some("brand-1"));
        assert_eq!(doc.data_attribute(div, "typography"), None);
        assert_eq!(doc.data_attribute(text, "color"), None);
    }

    #[test]
    fn style_attribute_round_trips_through_declarations() {
        let (mut doc, _, div, _) = sample();
        doc.set_attribute(div, "style", "color: red; ; margin:0 ;background-image: url(http://x/y.png)");
        assert_eq!(doc.style(div, "color"), Some("red"));
        assert_eq!(doc.style(div, "background-image"), Some("url(http://x/y.png)"));

        doc.set_style(div, StyleProperty::Color, "blue");
        doc.set_style(div, StyleProperty::FontSize, "14px");
        assert_eq!(
            doc.element(div).unwrap().style_text(),
            "color: blue; margin: 0; background-image: url(http://x/y.png); font-size: 14px;"
        );

        doc.set_style(div, StyleProperty::Color, "");
        assert_eq!(doc.style(div, "color"), None);
    }

    #[test]
    fn set_src_writes_attribute() {
        let (mut doc, _, div, _) = sample();
        doc.set_src(div, "http://img/");
        assert_eq!(doc.attribute(div, "src"), Some("http://img/"));
    }

    #[test]
    fn append_moves_nodes() {
        let (mut doc, body, div, _) = sample();
        let other = doc.create_element("section");
        doc.append_child(body, other).unwrap();
        doc.append_child(other, div).unwrap();
        assert_eq!(doc.parent(div), Some(other));
        assert_eq!(doc.child_nodes(body), &[other]);
    }

    #[test]
    fn style_values_keep_semicolons_inside_urls_and_strings() {
        let (mut doc, _, div, _) = sample();
        doc.set_attribute(
            div,
            "style",
            "background-image: url(data:image/png;base64,AAAA); font-family: 'A;B', serif; COLOR: red",
        );
        assert_eq!(doc.style(div, "background-image"), Some("url(data:image/png;base64,AAAA)"));
        assert_eq!(doc.style(div, "font-family"), Some("'A;B', serif"));
        assert_eq!(doc.style(div, "color"), Some("red"));
    }

    #[test]
    fn invalid_declarations_are_skipped() {
        let (mut doc, _, div, _) = sample();
        doc.set_attribute(div, "style", "color; : red; margin: 0; width:; padding: 1px");
        assert_eq!(
            doc.element(div).unwrap().style_text(),
            "margin: 0; padding: 1px;"
        );
    }

    #[test]
    fn appending_an_ancestor_is_rejected() {
        let (mut doc, body, div, text) = sample();
        let err = doc.append_child(div, body).unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Hierarchy { .. }));
        assert!(doc.append_child(div, div).is_err());
        assert!(doc.append_child(text, body).is_err());

        assert_eq!(doc.parent(div), Some(body));
        assert_eq!(doc.child_nodes(div), &[text]);
        let order: Vec<_> = doc.descendants(doc.root()).collect();
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn element_lookup_by_id() {
        let (mut doc, _, div, _) = sample();
        doc.set_attribute(div, "id", "color1");
        assert_eq!(doc.element_by_id("color1"), Some(div));
        assert_eq!(doc.element_by_id("missing"), None);
    }

    #[test]
    fn descendants_are_pre_order() {
        let (doc, body, div, text) = sample();
        let order: Vec<_> = doc.descendants(body).collect();
        assert_eq!(order, vec![body, div, text]);
    }
}
