//! streamxml - single-pass streaming XML parser
//!
//! Consumes bytes from a [`ByteSource`] and builds a tree of
//! [`Element`]s with attributes and text, or fails with one [`Error`]
//! that records where the offending construct began.
//!
//! Not supported: namespaces, DTD validation, external entities and
//! error recovery.
//!
//! # Quick Start
//!
//! ```
//! use streamxml::parse_str;
//! # fn main() -> Result<(), streamxml::Error> {
//! let doc = parse_str(r#"<config version="2"><item>a &amp; b</item></config>"#)?;
//! assert_eq!(doc.root().attribute("version"), Some("2"));
//! assert_eq!(doc.root().find("item").map(|e| e.text()), Some("a & b"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, error, instrument};

pub mod error;
pub use error::{Category, Error, ErrorKind, Pos, Result};

pub mod source;
pub use source::{ByteSource, Encoding, ReaderSource, SliceSource};

pub mod lexer;
pub use lexer::{Token, TokenKind};

pub mod model;
pub use model::{AttributePolicy, Attributes, Document, Element};

pub mod parser;
pub use parser::{Config, Parser};

/// Parse XML from string
pub fn parse_str(s: &str) -> Result<Document> {
    parse_bytes(s.as_bytes())
}

/// Parse XML from UTF-8 bytes
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    Parser::from_slice(bytes).parse()
}

/// Parse with custom configuration
pub fn parse_bytes_with_config(bytes: &[u8], config: Config) -> Result<Document> {
    Parser::from_slice_with_config(bytes, config).parse()
}

/// Parse from a reader, honouring a UTF-8 or UTF-16 byte-order mark
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    parse_reader_with_config(reader, Config::default())
}

pub fn parse_reader_with_config<R: Read>(reader: R, config: Config) -> Result<Document> {
    let source = ReaderSource::with_chunk_size(reader, config.chunk_size);
    Parser::with_config(source, config).parse()
}

/// Parse a file from disk
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn parse_file(path: impl AsRef<Path>, config: Config) -> Result<Document> {
    let path = path.as_ref();
    debug!("opening file");

    let file = File::open(path).map_err(|e| {
        error!("failed to open file: {}", e);
        Error::with_message(
            ErrorKind::Io(e.to_string()),
            Pos::start(),
            format!("cannot read {}: {e}", path.display()),
        )
    })?;

    parse_reader_with_config(file, config)
}
