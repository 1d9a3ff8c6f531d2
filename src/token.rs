use logos::{Lexer, Logos};

/// Markup-level tokens produced by lexing an HTML document.
///
/// Tags are lexed whole; their attributes are split later by [`AttrToken`].
/// A `<` that does not open a tag, comment or doctype is lexed as [`Token::Lt`]
/// and treated as text by the parser.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    #[token("<!--", comment)]
    Comment(String),

    #[regex(r"<![a-zA-Z][^>]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].to_string()
    })]
    Doctype(String),

    #[regex(r#"<[a-zA-Z][a-zA-Z0-9:-]*([^>"']|"[^"]*"|'[^']*')*>"#, start_tag)]
    StartTag(StartTag),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:-]*[ \t\r\n]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim_end().to_ascii_lowercase()
    })]
    EndTag(String),

    #[regex(r"[^<]+", |lex| lex.slice().to_string())]
    Text(String),

    #[token("<")]
    Lt,
}

/// The pieces of an opening tag.
#[derive(Debug, Clone, PartialEq)]
pub struct StartTag {
    /// Lowercased tag name.
    pub name: String,
    /// Everything between the name and the closing `>` (or `/>`).
    pub attributes: String,
    pub self_closing: bool,
}

fn comment(lex: &mut Lexer<Token>) -> Option<String> {
    let rest = lex.remainder();
    let end = rest.find("-->")?;
    let body = rest[..end].to_string();
    lex.bump(end + 3);
    Some(body)
}

fn start_tag(lex: &mut Lexer<Token>) -> StartTag {
    let raw = lex.slice();
    let inner = &raw[1..raw.len() - 1];
    let name_end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(inner.len());
    let mut attributes = inner[name_end..].trim_end();
    let self_closing = attributes.ends_with('/');
    if self_closing {
        attributes = &attributes[..attributes.len() - 1];
    }
    StartTag {
        name: inner[..name_end].to_ascii_lowercase(),
        attributes: attributes.to_string(),
        self_closing,
    }
}

/// Tokens inside an opening tag's attribute list.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum AttrToken {
    #[regex(r#"[^ \t\r\n\f"'<>/=]+"#, |lex| lex.slice().to_string())]
    Name(String),

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r"'[^']*'", unquote)]
    Quoted(String),

    #[token("/")]
    Slash,
}

fn unquote(lex: &mut Lexer<AttrToken>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

/// A token with its source location (byte offset span).
#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}
