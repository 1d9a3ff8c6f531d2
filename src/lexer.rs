use logos::Logos;

use crate::error::{BrandError, Result};
use crate::token::{AttrToken, Spanned, Token};

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Tokenize an HTML string into a vector of spanned tokens.
pub fn lex(source: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => {
                let raw_text_from = match &token {
                    Token::StartTag(tag)
                        if !tag.self_closing && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) =>
                    {
                        Some(tag.name.clone())
                    }
                    _ => None,
                };
                tokens.push(Spanned { token, span });

                if let Some(name) = raw_text_from {
                    let rest = lexer.remainder();
                    let len = find_end_tag(rest, &name).unwrap_or(rest.len());
                    if len > 0 {
                        let start = lexer.span().end;
                        tokens.push(Spanned {
                            token: Token::Text(rest[..len].to_string()),
                            span: start..start + len,
                        });
                        lexer.bump(len);
                    }
                }
            }
            Err(()) => {
                let fragment = &source[span.clone()];
                return Err(BrandError::unrecognized_markup(fragment, span));
            }
        }
    }

    Ok(tokens)
}

/// Byte offset of `</name` (ASCII case-insensitive) in `rest`.
fn find_end_tag(rest: &str, name: &str) -> Option<usize> {
    let needle = format!("</{name}");
    let haystack = rest.as_bytes();
    haystack
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Split an attribute list into `(name, value)` pairs.
///
/// Names are lowercased. Valueless attributes get an empty value; stray
/// tokens the tokenizer cannot classify are skipped.
pub fn lex_attributes(source: &str) -> Vec<(String, String)> {
    let tokens: Vec<AttrToken> = AttrToken::lexer(source).filter_map(|t| t.ok()).collect();
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if let AttrToken::Name(name) = &tokens[i] {
            let name = name.to_ascii_lowercase();
            let value = match (tokens.get(i + 1), tokens.get(i + 2)) {
                (Some(AttrToken::Eq), Some(AttrToken::Quoted(v) | AttrToken::Name(v))) => {
                    i += 2;
                    v.clone()
                }
                (Some(AttrToken::Eq), _) => {
                    i += 1;
                    String::new()
                }
                _ => String::new(),
            };
            // First occurrence wins, as in browsers.
            if !attrs.iter().any(|(n, _)| *n == name) {
                attrs.push((name, value));
            }
        }
        i += 1;
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::StartTag;

    #[test]
    fn lex_small_document() {
        let source = r#"<!DOCTYPE html><body><div id="a" data-color='brand-1'>Hi</div><!-- note --></body>"#;
        let tokens = lex(source).expect("lexing should succeed");
        let kinds: Vec<_> = tokens.iter().map(|t| &t.token).collect();

        assert!(matches!(kinds[0], Token::Doctype(s) if s == "DOCTYPE html"));
        assert!(matches!(kinds[1], Token::StartTag(t) if t.name == "body"));
        assert!(matches!(kinds[2], Token::StartTag(t) if t.name == "div" && !t.self_closing));
        assert!(matches!(kinds[3], Token::Text(s) if s == "Hi"));
        assert_eq!(kinds[4], &Token::EndTag("div".into()));
        assert!(matches!(kinds[5], Token::Comment(s) if s == " note "));
        assert_eq!(kinds[6], &Token::EndTag("body".into()));
        assert_eq!(tokens.len(), 7);
    }

    #[test]
    fn quoted_gt_stays_inside_tag() {
        let tokens = lex(r#"<a title="x > y">link</a>"#).unwrap();
        match &tokens[0].token {
            Token::StartTag(StartTag { name, attributes, .. }) => {
                assert_eq!(name, "a");
                assert_eq!(attributes.trim(), r#"title="x > y""#);
            }
            other => panic!("expected start tag, got {other:?}"),
        }
        assert!(matches!(&tokens[1].token, Token::Text(s) if s == "link"));
    }

    #[test]
    fn self_closing_tag() {
        let tokens = lex("<img src=a.png/><br/>").unwrap();
        assert!(matches!(&tokens[0].token, Token::StartTag(t) if t.name == "img" && t.self_closing));
        assert!(matches!(&tokens[1].token, Token::StartTag(t) if t.name == "br" && t.self_closing));
    }

    #[test]
    fn stray_lt_is_its_own_token() {
        let tokens = lex("a < b").unwrap();
        assert!(matches!(&tokens[0].token, Token::Text(s) if s == "a "));
        assert_eq!(tokens[1].token, Token::Lt);
        assert!(matches!(&tokens[2].token, Token::Text(s) if s == " b"));
    }

    #[test]
    fn script_body_is_raw_text() {
        let tokens = lex("<script>if (a<b && c>d) {}</script><p>").unwrap();
        assert!(matches!(&tokens[0].token, Token::StartTag(t) if t.name == "script"));
        assert!(matches!(&tokens[1].token, Token::Text(s) if s == "if (a<b && c>d) {}"));
        assert_eq!(tokens[2].token, Token::EndTag("script".into()));
        assert!(matches!(&tokens[3].token, Token::StartTag(t) if t.name == "p"));
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let err = lex("<p><!-- never closed").unwrap_err();
        assert!(err.to_string().contains("unrecognized markup"));
        assert_eq!(err.span, Some(3..7));
    }

    #[test]
    fn attributes_split() {
        let attrs = lex_attributes(r#" id="x" data-Color='brand 1' hidden width=20 id="dup""#);
        assert_eq!(
            attrs,
            vec![
                ("id".to_string(), "x".to_string()),
                ("data-color".to_string(), "brand 1".to_string()),
                ("hidden".to_string(), String::new()),
                ("width".to_string(), "20".to_string()),
            ]
        );
    }
}
