//! Lexer module for tokenization

pub mod buffer;
pub mod class;
pub mod cursor;
pub mod entity;
pub mod token;

pub use buffer::TokenBuffer;
pub use class::{class_of, CharClass};
pub use cursor::Cursor;
pub use token::{Token, TokenKind};

use crate::error::{Error, ErrorKind, Pos, Result};
use crate::source::ByteSource;

/// Tokenizer over a byte source.
///
/// Every token is written into one reused [`TokenBuffer`]; the text of
/// the most recent token is available from [`Lexer::text`] until the
/// next call to [`Lexer::next_token`].
#[derive(Debug)]
pub struct Lexer<S> {
    cursor: Cursor<S>,
    buffer: TokenBuffer,
}

impl<S: ByteSource> Lexer<S> {
    pub fn new(source: S, max_token_size: usize) -> Self {
        Self {
            cursor: Cursor::new(source),
            buffer: TokenBuffer::new(max_token_size),
        }
    }

    /// Prime the cursor and allocate the token buffer
    pub fn start(&mut self) -> Result<()> {
        self.cursor.prime()?;
        self.buffer
            .allocate()
            .map_err(|kind| Error::at(kind, self.cursor.position()))
    }

    pub fn cursor(&mut self) -> &mut Cursor<S> {
        &mut self.cursor
    }

    pub const fn position(&self) -> Pos {
        self.cursor.position()
    }

    /// Bytes of the last token
    pub fn text(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn text_lossy(&self) -> String {
        self.buffer.to_string_lossy()
    }

    /// Read the next token.
    ///
    /// With `skip_whitespace` unset, a leading whitespace byte yields a
    /// [`TokenKind::Whitespace`] token and is left unconsumed.
    pub fn next_token(&mut self, skip_whitespace: bool) -> Result<Token> {
        if skip_whitespace {
            self.cursor.skip_whitespace()?;
        }
        self.buffer.clear();

        let pos = self.cursor.position();
        let Some(b) = self.cursor.current() else {
            return Err(Error::at(ErrorKind::UnexpectedEof, pos));
        };

        match class_of(b) {
            CharClass::Whitespace => Ok(Token::new(TokenKind::Whitespace, pos)),
            CharClass::Ordinary | CharClass::Joinable => {
                while let Some(b) = self.cursor.current() {
                    if !class_of(b).is_word() {
                        break;
                    }
                    self.push(b, pos)?;
                    self.cursor.advance()?;
                }
                Ok(Token::new(TokenKind::Word, pos))
            }
            _ if class::is_quote(b) => self.read_quoted(b, pos),
            _ => {
                self.push(b, pos)?;
                self.cursor.advance()?;
                Ok(Token::new(TokenKind::Punct(b), pos))
            }
        }
    }

    fn read_quoted(&mut self, quote: u8, pos: Pos) -> Result<Token> {
        self.push(quote, pos)?;
        self.cursor.advance()?;
        loop {
            match self.cursor.current() {
                None => return Err(Error::at(ErrorKind::UnterminatedQuotedString, pos)),
                Some(b'<') => {
                    return Err(Error::at(
                        ErrorKind::IllegalLtInQuotedString,
                        self.cursor.position(),
                    ))
                }
                Some(b'&') => {
                    let decoded = entity::decode_entity(&mut self.cursor)?;
                    self.buffer
                        .extend_from_slice(decoded.as_bytes())
                        .map_err(|kind| Error::at(kind, pos))?;
                }
                Some(b) => {
                    self.push(b, pos)?;
                    self.cursor.advance()?;
                    if b == quote {
                        return Ok(Token::new(TokenKind::Quoted, pos));
                    }
                }
            }
        }
    }

    fn push(&mut self, b: u8, pos: Pos) -> Result<()> {
        self.buffer.push(b).map_err(|kind| Error::at(kind, pos))
    }
}
