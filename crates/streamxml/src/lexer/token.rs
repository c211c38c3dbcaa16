//! Token types produced by the lexer

use crate::error::Pos;

/// Token categories. The token's bytes live in the lexer's buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Run of ordinary/joinable bytes: names, numbers, `foo-bar.baz`
    Word,
    /// Quoted string, quotes included, entities already decoded
    Quoted,
    /// Single punctuation or markup-start byte
    Punct(u8),
    /// Whitespace seen while whitespace is significant; nothing consumed
    Whitespace,
}

/// A token and where it started
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub const fn new(kind: TokenKind, pos: Pos) -> Self {
        Self { kind, pos }
    }

    pub const fn is_punct(&self, b: u8) -> bool {
        matches!(self.kind, TokenKind::Punct(p) if p == b)
    }

    /// Describe the token for error messages
    pub fn describe(&self, text: &[u8]) -> String {
        match self.kind {
            TokenKind::Word => format!("'{}'", String::from_utf8_lossy(text)),
            TokenKind::Quoted => "quoted string".to_string(),
            TokenKind::Punct(b) => format!("'{}'", char::from(b)),
            TokenKind::Whitespace => "whitespace".to_string(),
        }
    }
}
