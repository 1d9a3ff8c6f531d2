use crate::dom::{Document, NodeId, VOID_ELEMENTS};
use crate::error::Result;
use crate::lexer;
use crate::token::{Spanned, Token};

/// Forgiving tree builder for HTML tokens.
///
/// Unmatched end tags are dropped, unclosed elements are closed at end of
/// input, and an end tag closes every element opened after its match.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|s| s.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    pub fn parse(mut self) -> Result<Document> {
        let mut doc = Document::new();
        let mut open: Vec<NodeId> = vec![doc.root()];

        while let Some(token) = self.advance() {
            let parent = *open.last().unwrap_or(&doc.root());
            match token {
                Token::Doctype(text) => {
                    let node = doc.create_doctype(&text);
                    doc.append_child(parent, node)?;
                }
                Token::Comment(text) => {
                    let node = doc.create_comment(&text);
                    doc.append_child(parent, node)?;
                }
                Token::Text(text) => doc.append_text(parent, &text)?,
                Token::Lt => doc.append_text(parent, "<")?,
                Token::StartTag(tag) => {
                    let node = doc.create_element(&tag.name);
                    for (name, value) in lexer::lex_attributes(&tag.attributes) {
                        doc.set_attribute(node, &name, &value);
                    }
                    doc.append_child(parent, node)?;
                    if !tag.self_closing && !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                        open.push(node);
                    }
                }
                Token::EndTag(name) => {
                    let matched = open.iter().rposition(|n| {
                        doc.element(*n).is_some_and(|el| el.tag == name)
                    });
                    match matched {
                        Some(i) if i > 0 => open.truncate(i),
                        _ => tracing::trace!("ignoring unmatched </{name}>"),
                    }
                }
            }
        }

        Ok(doc)
    }
}

/// Parse an HTML string into a [`Document`].
pub fn parse_html(source: &str) -> Result<Document> {
    let tokens = lexer::lex(source)?;
    Parser::new(tokens).parse()
}
