//! Error types for streamxml

use std::fmt;
use thiserror::Error as ThisError;

/// Position in the input stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pos {
    /// Byte offset from the start of the (UTF-8) input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in bytes)
    pub col: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: usize, col: usize) -> Self {
        Self { offset, line, col }
    }

    /// Position of the first byte of a document
    pub const fn start() -> Self {
        Self::new(0, 1, 1)
    }
}

/// Broad grouping of failures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Ill-formed markup: tags, quotes, comments, trailing content
    Structural,
    /// Size or allocation limits, and input failures
    Resource,
    /// Bad entity references, names or duplicate attributes
    Content,
}

/// Error kind for detailed categorization
#[derive(ThisError, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("document is empty")]
    EmptyDocument,
    #[error("character data outside of root element")]
    TextOutsideRoot,
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag { expected: String, found: String },
    #[error("closing tag </{0}> without an open element")]
    UnexpectedClosingTag(String),
    #[error("expected '=' after attribute name {0}")]
    MissingEquals(String),
    #[error("expected quoted value for attribute {0}")]
    ExpectedQuotedValue(String),
    #[error("mismatched quotes in attribute value")]
    MismatchedQuotes,
    #[error("illegal '<' in quoted string")]
    IllegalLtInQuotedString,
    #[error("unterminated quoted string")]
    UnterminatedQuotedString,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("'--' is not allowed inside a comment")]
    DoubleHyphenInComment,
    #[error("unterminated CDATA section")]
    UnterminatedCdata,
    #[error("CDATA section outside of root element")]
    CdataOutsideRoot,
    #[error("unterminated DOCTYPE declaration")]
    UnterminatedDoctype,
    #[error("DOCTYPE specified more than once")]
    DuplicateDoctype,
    #[error("DOCTYPE is only allowed before the root element")]
    MisplacedDoctype,
    #[error("unknown markup declaration <!{0}")]
    UnknownDeclaration(String),
    #[error("XML declaration is only allowed at the start of the document")]
    MisplacedXmlDeclaration,
    #[error("unterminated processing instruction")]
    UnterminatedProcessingInstruction,
    #[error("unterminated block <{0}>")]
    UnterminatedBlock(String),
    #[error("extra characters following root element")]
    ExtraContent,
    #[error("max depth exceeded: {max}")]
    MaxDepthExceeded { max: u16 },
    #[error("token exceeds maximum size of {max} bytes")]
    TokenTooLarge { max: usize },
    #[error("memory allocation failed")]
    AllocationFailed,
    #[error("read error: {0}")]
    Io(String),
    #[error("unknown entity &{0};")]
    UnknownEntity(String),
    #[error("invalid name {0}")]
    InvalidName(String),
    #[error("attribute {0} specified more than once")]
    DuplicateAttribute(String),
}

impl ErrorKind {
    pub const fn category(&self) -> Category {
        match self {
            Self::MaxDepthExceeded { .. }
            | Self::TokenTooLarge { .. }
            | Self::AllocationFailed
            | Self::Io(_) => Category::Resource,
            Self::UnknownEntity(_) | Self::InvalidName(_) | Self::DuplicateAttribute(_) => {
                Category::Content
            }
            _ => Category::Structural,
        }
    }
}

/// Main error type for streamxml
#[derive(ThisError, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    pos: Pos,
    message: String,
}

impl Error {
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        let message = kind.to_string();
        Self { kind, pos, message }
    }

    pub fn with_message(kind: ErrorKind, pos: Pos, message: impl Into<String>) -> Self {
        Self {
            kind,
            pos,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Where the offending construct began
    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn line(&self) -> usize {
        self.pos.line
    }

    pub fn column(&self) -> usize {
        self.pos.col
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at {}: {}", self.pos, self.message)
    }
}

/// Result type alias for streamxml
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "10:5");
    }

    #[test]
    fn test_error_accessors() {
        let err = Error::at(ErrorKind::ExtraContent, Pos::new(7, 2, 3));
        assert_eq!(err.kind(), &ErrorKind::ExtraContent);
        assert_eq!(err.line(), 2);
        assert_eq!(err.column(), 3);
        assert_eq!(err.message(), "extra characters following root element");
    }

    #[test]
    fn test_error_display() {
        let err = Error::at(ErrorKind::UnknownEntity("nbsp".into()), Pos::new(10, 2, 5));
        let display = err.to_string();
        assert_eq!(display, "error at 2:5: unknown entity &nbsp;");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ErrorKind::UnterminatedBlock("a".into()).category(),
            Category::Structural
        );
        assert_eq!(
            ErrorKind::TokenTooLarge { max: 1 }.category(),
            Category::Resource
        );
        assert_eq!(
            ErrorKind::DuplicateAttribute("b".into()).category(),
            Category::Content
        );
    }
}
