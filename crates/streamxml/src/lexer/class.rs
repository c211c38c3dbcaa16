//! Byte classification driving tokenization

/// Lexical class of a single input byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    /// Space, tab, CR, LF
    Whitespace,
    /// `<` and `&`
    MarkupStart,
    /// `-` and `.`: continue a word but may not start a name
    Joinable,
    /// Structural characters, each one a token by itself
    Punctuation,
    /// Everything else, including all bytes >= 0x80
    Ordinary,
}

impl CharClass {
    /// Whether a byte of this class extends a bare word
    pub const fn is_word(self) -> bool {
        matches!(self, Self::Ordinary | Self::Joinable)
    }
}

/// Classify a byte.
pub const fn class_of(b: u8) -> CharClass {
    match b {
        b' ' | b'\t' | b'\r' | b'\n' => CharClass::Whitespace,
        b'<' | b'&' => CharClass::MarkupStart,
        b'-' | b'.' => CharClass::Joinable,
        b'/' | b'!' | b'\\' | b'\'' | b'"' | b'#' | b'$' | b'%' | b'(' | b')' | b'*' | b'+'
        | b',' | b';' | b'=' | b'>' | b'?' | b'@' | b'[' | b']' | b'^' | b'`' | b'{' | b'|'
        | b'}' | b'~' => CharClass::Punctuation,
        _ => CharClass::Ordinary,
    }
}

pub const fn is_whitespace(b: u8) -> bool {
    matches!(class_of(b), CharClass::Whitespace)
}

pub const fn is_quote(b: u8) -> bool {
    matches!(b, b'"' | b'\'')
}

/// Names may not begin with `.`, `-` or a digit
pub fn is_valid_name(name: &[u8]) -> bool {
    match name.first() {
        None => false,
        Some(&first) => {
            !matches!(first, b'.' | b'-' | b'0'..=b'9')
                && name.iter().all(|&b| class_of(b).is_word())
        }
    }
}
