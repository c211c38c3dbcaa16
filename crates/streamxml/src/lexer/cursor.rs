//! Byte cursor over a refillable input window

use tracing::trace;

use crate::error::{Error, ErrorKind, Pos, Result};
use crate::lexer::class::is_whitespace;
use crate::source::ByteSource;

/// Cursor yielding one byte at a time with position tracking.
///
/// The cursor always holds one byte of lookahead (`current`). When its
/// window runs dry it asks the source for more; a zero-length refill is
/// permanent end of input.
#[derive(Debug)]
pub struct Cursor<S> {
    source: S,
    window: Vec<u8>,
    index: usize,
    current: Option<u8>,
    exhausted: bool,
    offset: usize,
    line: usize,
    col: usize,
}

impl<S: ByteSource> Cursor<S> {
    /// Create an unprimed cursor; call [`Cursor::prime`] before reading
    pub fn new(source: S) -> Self {
        Self {
            source,
            window: Vec::new(),
            index: 0,
            current: None,
            exhausted: false,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    /// Load the first byte of input
    pub fn prime(&mut self) -> Result<()> {
        self.current = self.fetch()?;
        Ok(())
    }

    /// Get current byte without consuming
    pub const fn current(&self) -> Option<u8> {
        self.current
    }

    /// Position of the current byte
    pub const fn position(&self) -> Pos {
        Pos::new(self.offset, self.line, self.col)
    }

    pub const fn is_eof(&self) -> bool {
        self.current.is_none()
    }

    /// Advance cursor by one byte
    pub fn advance(&mut self) -> Result<()> {
        if let Some(b) = self.current {
            self.offset += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.index += 1;
            self.current = self.fetch()?;
        }
        Ok(())
    }

    /// Consume the current byte and return it
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        let b = self.current;
        self.advance()?;
        Ok(b)
    }

    /// Consume byte if it matches
    pub fn consume(&mut self, expected: u8) -> Result<bool> {
        if self.current == Some(expected) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.current {
            if !is_whitespace(b) {
                break;
            }
            self.advance()?;
        }
        Ok(())
    }

    fn fetch(&mut self) -> Result<Option<u8>> {
        loop {
            if let Some(&b) = self.window.get(self.index) {
                return Ok(Some(b));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.window.clear();
            self.index = 0;
            let n = self
                .source
                .more_data(&mut self.window)
                .map_err(|e| Error::at(ErrorKind::Io(e.to_string()), self.position()))?;
            trace!(bytes = n, offset = self.offset, "refilled input window");
            if n == 0 {
                self.exhausted = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::source::SliceSource;

    fn cursor(input: &[u8]) -> Result<Cursor<SliceSource<'_>>> {
        let mut cursor = Cursor::new(SliceSource::new(input));
        cursor.prime()?;
        Ok(cursor)
    }

    #[test]
    fn test_cursor_basic() -> Result<()> {
        let mut cursor = cursor(b"hello")?;
        assert_eq!(cursor.current(), Some(b'h'));
        assert_eq!(cursor.next_byte()?, Some(b'h'));
        assert_eq!(cursor.current(), Some(b'e'));
        assert_eq!(cursor.position(), Pos::new(1, 1, 2));
        Ok(())
    }

    #[test]
    fn test_cursor_whitespace_and_lines() -> Result<()> {
        let mut cursor = cursor(b"  \t\nhello")?;
        cursor.skip_whitespace()?;
        assert_eq!(cursor.current(), Some(b'h'));
        assert_eq!(cursor.position().line, 2);
        assert_eq!(cursor.position().col, 1);
        Ok(())
    }

    #[test]
    fn test_cursor_consume() -> Result<()> {
        let mut cursor = cursor(b"abc")?;
        assert!(cursor.consume(b'a')?);
        assert!(!cursor.consume(b'z')?);
        assert_eq!(cursor.current(), Some(b'b'));
        Ok(())
    }

    #[test]
    fn test_cursor_eof() -> Result<()> {
        let mut cursor = cursor(b"")?;
        assert!(cursor.is_eof());
        assert_eq!(cursor.next_byte()?, None);
        Ok(())
    }

    #[test]
    fn test_cursor_refills_across_chunks() -> Result<()> {
        let mut cursor = Cursor::new(SliceSource::new(b"a\nbc").with_chunk_size(1));
        cursor.prime()?;
        let mut seen = Vec::new();
        while let Some(b) = cursor.next_byte()? {
            seen.push(b);
        }
        assert_eq!(seen, b"a\nbc");
        assert_eq!(cursor.position(), Pos::new(4, 2, 3));
        Ok(())
    }

    struct FailingSource;

    impl ByteSource for FailingSource {
        fn more_data(&mut self, _buf: &mut Vec<u8>) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn test_cursor_reports_io_error() {
        let mut cursor = Cursor::new(FailingSource);
        let err = cursor.prime().err();
        assert!(matches!(
            err.as_ref().map(Error::kind),
            Some(ErrorKind::Io(msg)) if msg.contains("disk on fire")
        ));
    }
}
