//! Input sources feeding UTF-8 bytes to the parser

use std::io::{self, Read};

use tracing::trace;

/// Default number of bytes pulled from a reader per refill
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Pull-based supplier of UTF-8 bytes.
///
/// The cursor hands over its emptied window on every refill. An
/// implementation appends the next run of bytes and returns how many it
/// wrote; returning `0` signals permanent end of input. Implementations
/// may block.
pub trait ByteSource {
    fn more_data(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn more_data(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        (**self).more_data(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn more_data(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        (**self).more_data(buf)
    }
}

/// Fixed in-memory input
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    remaining: &'a [u8],
    chunk_size: usize,
}

impl<'a> SliceSource<'a> {
    /// Deliver the whole slice in one refill
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            remaining: input,
            chunk_size: usize::MAX,
        }
    }

    /// Deliver at most `chunk_size` bytes per refill
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl ByteSource for SliceSource<'_> {
    fn more_data(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let n = self.remaining.len().min(self.chunk_size);
        let (head, tail) = self.remaining.split_at(n);
        buf.extend_from_slice(head);
        self.remaining = tail;
        Ok(n)
    }
}

/// Encoding selected from the byte-order mark
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Be,
    Utf16Le,
}

/// Reader-backed input that strips a BOM and transcodes UTF-16 to UTF-8
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    encoding: Option<Encoding>,
    chunk_size: usize,
    raw: Vec<u8>,
    /// Bytes read but not yet handed out (BOM sniffing leftovers, odd UTF-16 byte)
    pending: Vec<u8>,
    /// High surrogate waiting for its partner from the next read
    high_surrogate: Option<u16>,
    eof: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            encoding: None,
            chunk_size: chunk_size.max(4),
            raw: Vec::new(),
            pending: Vec::new(),
            high_surrogate: None,
            eof: false,
        }
    }

    /// Encoding detected so far, `None` before the first refill
    pub const fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    fn read_chunk(&mut self) -> io::Result<usize> {
        self.raw.resize(self.chunk_size, 0);
        let n = loop {
            match self.reader.read(&mut self.raw) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        self.raw.truncate(n);
        if n == 0 {
            self.eof = true;
        }
        Ok(n)
    }

    fn sniff(&mut self) -> io::Result<Encoding> {
        while self.pending.len() < 3 && !self.eof {
            self.read_chunk()?;
            self.pending.extend_from_slice(&self.raw);
        }
        let (encoding, bom_len) = match self.pending.as_slice() {
            [0xEF, 0xBB, 0xBF, ..] => (Encoding::Utf8, 3),
            [0xFE, 0xFF, ..] => (Encoding::Utf16Be, 2),
            [0xFF, 0xFE, ..] => (Encoding::Utf16Le, 2),
            _ => (Encoding::Utf8, 0),
        };
        self.pending.drain(..bom_len);
        trace!(?encoding, bom_len, "detected input encoding");
        Ok(encoding)
    }

    fn transcode_utf16(&mut self, big_endian: bool, out: &mut Vec<u8>) {
        let pending = std::mem::take(&mut self.pending);
        let mut pairs = pending.chunks_exact(2);
        for pair in pairs.by_ref() {
            let unit = match pair {
                [a, b] if big_endian => u16::from_be_bytes([*a, *b]),
                [a, b] => u16::from_le_bytes([*a, *b]),
                _ => continue,
            };
            self.push_unit(unit, out);
        }
        self.pending.extend_from_slice(pairs.remainder());
        if self.eof {
            if self.high_surrogate.take().is_some() {
                push_char(char::REPLACEMENT_CHARACTER, out);
            }
            if !self.pending.is_empty() {
                self.pending.clear();
                push_char(char::REPLACEMENT_CHARACTER, out);
            }
        }
    }

    fn push_unit(&mut self, unit: u16, out: &mut Vec<u8>) {
        match (self.high_surrogate.take(), unit) {
            (Some(high), 0xDC00..=0xDFFF) => {
                let c = char::decode_utf16([high, unit])
                    .next()
                    .and_then(|r| r.ok())
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                push_char(c, out);
            }
            (previous, _) => {
                if previous.is_some() {
                    push_char(char::REPLACEMENT_CHARACTER, out);
                }
                match unit {
                    0xD800..=0xDBFF => self.high_surrogate = Some(unit),
                    _ => {
                        let c = char::from_u32(u32::from(unit))
                            .unwrap_or(char::REPLACEMENT_CHARACTER);
                        push_char(c, out);
                    }
                }
            }
        }
    }
}

fn push_char(c: char, out: &mut Vec<u8>) {
    let mut utf8 = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn more_data(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let encoding = match self.encoding {
            Some(encoding) => encoding,
            None => {
                let encoding = self.sniff()?;
                self.encoding = Some(encoding);
                encoding
            }
        };
        let start = buf.len();
        // A UTF-16 read can yield nothing but a lone byte or surrogate, so
        // keep reading until output exists or the reader is exhausted.
        loop {
            match encoding {
                Encoding::Utf8 => buf.append(&mut self.pending),
                Encoding::Utf16Be => self.transcode_utf16(true, buf),
                Encoding::Utf16Le => self.transcode_utf16(false, buf),
            }
            if buf.len() > start || self.eof {
                break;
            }
            self.read_chunk()?;
            self.pending.extend_from_slice(&self.raw);
        }
        Ok(buf.len() - start)
    }
}
