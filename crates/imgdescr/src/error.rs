//! Error types for imgdescr

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self::new(pos, pos)
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.start.line == 0 && self.end.line == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source file missing, unreadable or unwritable
    DocumentAccess { path: PathBuf },
    /// XML failed to parse
    MalformedDocument,
    /// `inherit` without `path`, or the referenced file does not exist
    MissingAncestor { path: Option<PathBuf> },
    /// YAML payload of a `set` operation failed to parse
    AttributeSyntax,
    /// XPath expression of a `set` operation failed to parse
    InvalidXPath { expr: String },
    MaxDepthExceeded { max: u16 },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentAccess { path } => {
                write!(f, "unable to access \"{}\"", path.display())
            }
            Self::MalformedDocument => write!(f, "malformed document"),
            Self::MissingAncestor { path: Some(path) } => {
                write!(f, "unable to find inherited description \"{}\"", path.display())
            }
            Self::MissingAncestor { path: None } => {
                write!(f, "inherited element should contain \"path\" attribute")
            }
            Self::AttributeSyntax => write!(f, "invalid attribute set"),
            Self::InvalidXPath { expr } => write!(f, "invalid xpath: {expr}"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
        }
    }
}

/// Main error type for imgdescr
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a syntax error at a specific position
    pub fn malformed_at(pos: Pos, message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::MalformedDocument, Span::at(pos), message)
    }

    /// Wrap an I/O failure on `path`
    pub fn access(path: &Path, err: &std::io::Error) -> Self {
        let kind = ErrorKind::DocumentAccess {
            path: path.to_path_buf(),
        };
        let message = format!("{kind}: {err}");
        Self::with_message(kind, Span::empty(), message)
    }

    pub fn missing_ancestor(path: Option<&Path>) -> Self {
        Self::new(
            ErrorKind::MissingAncestor {
                path: path.map(Path::to_path_buf),
            },
            Span::empty(),
        )
    }

    /// Attach the file a parse error came from
    pub fn in_file(mut self, path: &Path) -> Self {
        if matches!(self.kind, ErrorKind::MalformedDocument) {
            self.message = format!("{}: {}", path.display(), self.message);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "error at {}: {}", self.span.start, self.message)
        }
    }
}

/// Result type alias for imgdescr
pub type Result<T> = std::result::Result<T, Error>;
