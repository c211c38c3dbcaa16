//! Entity reference decoding
//!
//! Handles the five predefined entities (`&lt;` `&gt;` `&amp;` `&apos;`
//! `&quot;`) and numeric character references (`&#123;` `&#x7B;`).

use crate::error::{Error, ErrorKind, Result};
use crate::lexer::class::class_of;
use crate::lexer::cursor::Cursor;
use crate::source::ByteSource;

/// Longest entity name read before giving up
pub const MAX_ENTITY_NAME: usize = 31;

/// UTF-8 encoding of one decoded code point
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Utf8Char {
    bytes: [u8; 8],
    len: usize,
}

impl Utf8Char {
    const fn one(b: u8) -> Self {
        Self {
            bytes: [b, 0, 0, 0, 0, 0, 0, 0],
            len: 1,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or_default()
    }
}

fn low_byte(v: u32) -> u8 {
    let [b, _, _, _] = v.to_le_bytes();
    b
}

/// Encode a code point with the standard UTF-8 bit layout.
///
/// Surrogates are encoded like any other value; only values that need
/// more than four bytes are rejected.
pub fn encode_code_point(cp: u32) -> Option<Utf8Char> {
    let cont = |shift: u32| 0x80 | low_byte((cp >> shift) & 0x3F);
    let (bytes, len) = match cp {
        0..=0x7F => ([low_byte(cp), 0, 0, 0], 1),
        0x80..=0x7FF => ([0xC0 | low_byte(cp >> 6), cont(0), 0, 0], 2),
        0x800..=0xFFFF => ([0xE0 | low_byte(cp >> 12), cont(6), cont(0), 0], 3),
        0x1_0000..=0x1F_FFFF => (
            [0xF0 | low_byte(cp >> 18), cont(12), cont(6), cont(0)],
            4,
        ),
        _ => return None,
    };
    let [a, b, c, d] = bytes;
    Some(Utf8Char {
        bytes: [a, b, c, d, 0, 0, 0, 0],
        len,
    })
}

/// Resolve an entity name (the text between `&` and `;`)
pub fn resolve(name: &[u8]) -> Option<Utf8Char> {
    match name {
        b"lt" => Some(Utf8Char::one(b'<')),
        b"gt" => Some(Utf8Char::one(b'>')),
        b"amp" => Some(Utf8Char::one(b'&')),
        b"apos" => Some(Utf8Char::one(b'\'')),
        b"quot" => Some(Utf8Char::one(b'"')),
        [b'#', b'x', hex @ ..] => parse_radix(hex, 16).and_then(encode_code_point),
        [b'#', dec @ ..] => parse_radix(dec, 10).and_then(encode_code_point),
        _ => None,
    }
}

fn parse_radix(digits: &[u8], radix: u32) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u32, |acc, &b| {
        let digit = char::from(b).to_digit(radix)?;
        acc.checked_mul(radix)?.checked_add(digit)
    })
}

/// Decode the entity reference starting at the cursor's current `&`.
///
/// On failure the error points at the `&`.
pub fn decode_entity<S: ByteSource>(cursor: &mut Cursor<S>) -> Result<Utf8Char> {
    let start = cursor.position();
    cursor.advance()?;

    let mut name = [0u8; MAX_ENTITY_NAME];
    let mut len = 0;
    let unknown = |seen: &[u8]| {
        Error::at(
            ErrorKind::UnknownEntity(String::from_utf8_lossy(seen).into_owned()),
            start,
        )
    };

    loop {
        let filled = name.get(..len).unwrap_or_default();
        match cursor.current() {
            Some(b';') => {
                cursor.advance()?;
                return resolve(filled).ok_or_else(|| unknown(filled));
            }
            Some(b) if b == b'#' || class_of(b).is_word() => {
                if len == MAX_ENTITY_NAME {
                    return Err(unknown(filled));
                }
                if let Some(slot) = name.get_mut(len) {
                    *slot = b;
                }
                len += 1;
                cursor.advance()?;
            }
            _ => return Err(unknown(filled)),
        }
    }
}
