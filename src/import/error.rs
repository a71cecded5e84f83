//! `SourceError` are syntax and shape errors in serialised node trees
use codespan::{ByteIndex, Span};
use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files,
};
use thiserror::Error;

/// An error reading a node tree from input
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid json syntax {0}")]
    InvalidJson(String, usize, Span),
    #[error("malformed node at {1}: {0}")]
    MalformedNode(String, String, usize, Span),
    #[error("wrong number of children for {0} node at {1}")]
    BadArity(String, String, usize, Span),
    #[error("expected {0} at {1}")]
    BadAtom(String, String, usize, Span),
    #[error("unknown directive {0} at {1}")]
    UnknownDirective(String, String, usize, Span),
    #[error(transparent)]
    Files(#[from] files::Error),
}

impl SourceError {
    pub fn span(&self) -> Span {
        match *self {
            SourceError::InvalidJson(_, _, s) => s,
            SourceError::MalformedNode(_, _, _, s) => s,
            SourceError::BadArity(_, _, _, s) => s,
            SourceError::BadAtom(_, _, _, s) => s,
            SourceError::UnknownDirective(_, _, _, s) => s,
            SourceError::Files(_) => Span::default(),
        }
    }

    pub fn file_id(&self) -> Option<usize> {
        match *self {
            SourceError::InvalidJson(_, f, _) => Some(f),
            SourceError::MalformedNode(_, _, f, _) => Some(f),
            SourceError::BadArity(_, _, f, _) => Some(f),
            SourceError::BadAtom(_, _, f, _) => Some(f),
            SourceError::UnknownDirective(_, _, f, _) => Some(f),
            SourceError::Files(_) => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let diag = Diagnostic::error().with_message(format!("{self}"));
        match self.file_id() {
            Some(file_id) => diag.with_labels(vec![Label::primary(file_id, self.span())]),
            None => diag,
        }
    }
}

/// Byte span of a serde_json error position (1-based line and
/// column) in `text`
pub fn json_error_span(text: &str, error: &serde_json::Error) -> Span {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(error.line().saturating_sub(1))
        .map(str::len)
        .sum();
    let offset = (line_start + error.column().saturating_sub(1)).min(text.len());
    let index = ByteIndex(u32::try_from(offset).unwrap_or(u32::MAX));
    Span::new(index, index)
}
