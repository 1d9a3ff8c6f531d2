use std::fmt;
use std::ops::Range;

/// All errors produced while loading a style guide or reading markup.
#[derive(Debug)]
pub struct BrandError {
    pub kind: ErrorKind,
    pub span: Option<Range<usize>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The style guide endpoint answered with something other than 200.
    #[error("style guide request returned status {0}")]
    Status(u16),
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The response body is not a style guide document.
    #[error("invalid style guide JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The markup tokenizer hit a sequence it cannot classify.
    #[error("unrecognized markup: {0}")]
    UnrecognizedMarkup(String),
    /// A node move that would make an element its own descendant.
    #[error("cannot append {child} under {parent}: it is an ancestor")]
    Hierarchy { child: String, parent: String },
    /// General message.
    #[error("{0}")]
    Message(String),
}

impl fmt::Display for BrandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(span) = &self.span {
            write!(f, " (at byte {}..{})", span.start, span.end)?;
        }

        Ok(())
    }
}

impl std::error::Error for BrandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Json(e) => Some(e),
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ErrorKind> for BrandError {
    fn from(kind: ErrorKind) -> Self {
        Self { kind, span: None }
    }
}

impl From<serde_json::Error> for BrandError {
    fn from(e: serde_json::Error) -> Self {
        ErrorKind::Json(e).into()
    }
}

impl From<std::io::Error> for BrandError {
    fn from(e: std::io::Error) -> Self {
        ErrorKind::Io(e).into()
    }
}

pub type Result<T> = std::result::Result<T, BrandError>;

/// Shorthand constructors.
impl BrandError {
    pub fn status(code: u16) -> Self {
        ErrorKind::Status(code).into()
    }

    pub fn network(msg: impl fmt::Display) -> Self {
        ErrorKind::Network(msg.to_string()).into()
    }

    pub fn unrecognized_markup(fragment: &str, span: Range<usize>) -> Self {
        Self {
            kind: ErrorKind::UnrecognizedMarkup(fragment.to_string()),
            span: Some(span),
        }
    }

    pub fn hierarchy(child: impl fmt::Debug, parent: impl fmt::Debug) -> Self {
        ErrorKind::Hierarchy {
            child: format!("{child:?}"),
            parent: format!("{parent:?}"),
        }
        .into()
    }

    pub fn message(msg: &str) -> Self {
        ErrorKind::Message(msg.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_span() {
        let err = BrandError::unrecognized_markup("<", 4..5);
        assert_eq!(err.to_string(), "unrecognized markup: < (at byte 4..5)");
    }

    #[test]
    fn json_errors_convert() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: BrandError = parse.into();
        assert!(matches!(err.kind, ErrorKind::Json(_)));
        assert!(err.to_string().starts_with("invalid style guide JSON"));
    }

    #[test]
    fn status_message() {
        assert_eq!(
            BrandError::status(404).to_string(),
            "style guide request returned status 404"
        );
    }
}
