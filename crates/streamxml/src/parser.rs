//! XML parser implementation
//!
//! Grammar driver over the [`Lexer`]. Open elements live on an explicit
//! stack of frames, so nesting depth is bounded by [`Config::max_depth`]
//! and the heap rather than by the call stack.

pub mod config;

pub use config::{Config, DEFAULT_MAX_DEPTH};

use tracing::{debug, instrument, warn};

use crate::error::{Error, ErrorKind, Pos, Result};
use crate::lexer::class::{is_quote, is_valid_name};
use crate::lexer::{entity, Lexer, Token, TokenKind};
use crate::model::{AttributePolicy, Document, Element};
use crate::source::{ByteSource, SliceSource};

/// An element whose closing tag has not been seen yet
#[derive(Debug)]
struct Frame {
    element: Element,
    text: Vec<u8>,
}

impl Frame {
    const fn new(element: Element) -> Self {
        Self {
            element,
            text: Vec::new(),
        }
    }

    fn finish(self) -> Element {
        let mut element = self.element;
        element.text = String::from_utf8_lossy(&self.text).into_owned();
        element.closed_explicitly = true;
        element
    }
}

/// Single-use XML parser
#[derive(Debug)]
pub struct Parser<S> {
    lexer: Lexer<S>,
    config: Config,
    declaration: Option<Element>,
    doctype: Option<Vec<String>>,
    root: Option<Element>,
    seen_markup: bool,
    elements: usize,
}

impl<'a> Parser<SliceSource<'a>> {
    /// Parser over an in-memory buffer
    pub fn from_slice(input: &'a [u8]) -> Self {
        Self::new(SliceSource::new(input))
    }

    pub fn from_slice_with_config(input: &'a [u8], config: Config) -> Self {
        Self::with_config(SliceSource::new(input), config)
    }
}

impl<S: ByteSource> Parser<S> {
    /// Create a new parser with default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, Config::default())
    }

    /// Create a new parser with custom configuration
    pub fn with_config(source: S, config: Config) -> Self {
        Self {
            lexer: Lexer::new(source, config.max_token_size),
            config,
            declaration: None,
            doctype: None,
            root: None,
            seen_markup: false,
            elements: 0,
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Parse the whole input into a [`Document`].
    ///
    /// Parsing stops at the first ill-formed construct; the error carries
    /// the position where that construct began.
    #[instrument(skip_all)]
    pub fn parse(mut self) -> Result<Document> {
        debug!("parsing document");
        match self.parse_document() {
            Ok(document) => {
                debug!(
                    root = document.root().name(),
                    elements = self.elements,
                    "parsed document"
                );
                Ok(document)
            }
            Err(e) => {
                warn!(line = e.line(), column = e.column(), error = e.message(), "parse failed");
                Err(e)
            }
        }
    }

    fn parse_document(&mut self) -> Result<Document> {
        self.lexer.start()?;
        self.parse_body()?;

        let cursor = self.lexer.cursor();
        cursor.skip_whitespace()?;
        if !cursor.is_eof() {
            return Err(Error::at(ErrorKind::ExtraContent, cursor.position()));
        }

        let root = self
            .root
            .take()
            .ok_or_else(|| Error::at(ErrorKind::EmptyDocument, self.lexer.position()))?;
        Ok(Document {
            declaration: self.declaration.take(),
            doctype: self.doctype.take().unwrap_or_default(),
            root,
        })
    }

    /// Body grammar. Returns once the root element is complete.
    fn parse_body(&mut self) -> Result<()> {
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            let at_start = stack.is_empty() && !self.seen_markup;
            let lt = match stack.last_mut() {
                None => self.scan_prolog()?,
                Some(frame) => self.scan_text(frame)?,
            };
            if stack.is_empty() {
                self.seen_markup = true;
            }

            let token = self.lexer.next_token(false)?;
            match token.kind {
                TokenKind::Punct(b'!') => self.parse_declaration(lt, stack.last_mut())?,
                TokenKind::Punct(b'?') => self.parse_processing_instruction(lt, at_start)?,
                TokenKind::Punct(b'/') => {
                    let Some(frame) = stack.pop() else {
                        return Err(self.unexpected_close(lt));
                    };
                    self.parse_close_tag(lt, &frame)?;
                    if self.attach(&mut stack, frame.finish()) {
                        return Ok(());
                    }
                }
                TokenKind::Word => {
                    let depth = stack.len() + 1;
                    let (element, self_closing) = self.parse_start_tag(lt, token, depth)?;
                    if self_closing {
                        if self.attach(&mut stack, element) {
                            return Ok(());
                        }
                    } else {
                        stack.push(Frame::new(element));
                    }
                }
                _ => return Err(self.expected("element name", token)),
            }
        }
    }

    /// Add a finished element to its parent. Returns `true` for the root.
    fn attach(&mut self, stack: &mut [Frame], element: Element) -> bool {
        match stack.last_mut() {
            Some(parent) => {
                parent.element.children.push(element);
                false
            }
            None => {
                self.root = Some(element);
                true
            }
        }
    }

    /// Skip whitespace outside the root and consume the next `<`
    fn scan_prolog(&mut self) -> Result<Pos> {
        let cursor = self.lexer.cursor();
        cursor.skip_whitespace()?;
        let pos = cursor.position();
        match cursor.current() {
            Some(b'<') => {
                cursor.advance()?;
                Ok(pos)
            }
            Some(_) => Err(Error::at(ErrorKind::TextOutsideRoot, pos)),
            None => Err(Error::at(ErrorKind::EmptyDocument, pos)),
        }
    }

    /// Accumulate character data up to and including the next `<`
    fn scan_text(&mut self, frame: &mut Frame) -> Result<Pos> {
        let cursor = self.lexer.cursor();
        loop {
            match cursor.current() {
                None => {
                    return Err(Error::at(
                        ErrorKind::UnterminatedBlock(frame.element.name.clone()),
                        frame.element.pos,
                    ))
                }
                Some(b'<') => {
                    let pos = cursor.position();
                    cursor.advance()?;
                    return Ok(pos);
                }
                Some(b'&') => {
                    let decoded = entity::decode_entity(cursor)?;
                    frame.text.extend_from_slice(decoded.as_bytes());
                }
                Some(b) => {
                    frame.text.push(b);
                    cursor.advance()?;
                }
            }
        }
    }

    fn parse_start_tag(&mut self, lt: Pos, name: Token, depth: usize) -> Result<(Element, bool)> {
        if !is_valid_name(self.lexer.text()) {
            return Err(Error::at(
                ErrorKind::InvalidName(self.lexer.text_lossy()),
                name.pos,
            ));
        }
        if !self.config.allows_depth(depth) {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                lt,
            ));
        }

        let mut element = Element::new(self.lexer.text_lossy(), self.config.attribute_policy, lt);
        self.elements += 1;

        let end = self.parse_attributes(&mut element, false)?;
        if end.is_punct(b'/') {
            let close = self.lexer.next_token(false)?;
            if !close.is_punct(b'>') {
                return Err(self.expected("'>'", close));
            }
            return Ok((element, true));
        }
        Ok((element, false))
    }

    /// Read `name="value"` pairs until `/` or `>` (or `?` in a declaration)
    fn parse_attributes(&mut self, element: &mut Element, declaration: bool) -> Result<Token> {
        loop {
            let token = self.lexer.next_token(true)?;
            match token.kind {
                TokenKind::Punct(b'/' | b'>') if !declaration => return Ok(token),
                TokenKind::Punct(b'?') if declaration => return Ok(token),
                TokenKind::Word => {}
                _ => return Err(self.expected("attribute name", token)),
            }

            if !is_valid_name(self.lexer.text()) {
                return Err(Error::at(
                    ErrorKind::InvalidName(self.lexer.text_lossy()),
                    token.pos,
                ));
            }
            let key = self.lexer.text_lossy();
            if self.config.attribute_policy == AttributePolicy::Sorted
                && element.attributes.contains_key(&key)
            {
                return Err(Error::at(ErrorKind::DuplicateAttribute(key), token.pos));
            }

            let eq = self.lexer.next_token(true)?;
            if !eq.is_punct(b'=') {
                return Err(Error::at(ErrorKind::MissingEquals(key), eq.pos));
            }

            let quoted = self.lexer.next_token(true)?;
            if quoted.kind != TokenKind::Quoted {
                return Err(Error::at(ErrorKind::ExpectedQuotedValue(key), quoted.pos));
            }
            let value = strip_quotes(self.lexer.text())
                .ok_or_else(|| Error::at(ErrorKind::MismatchedQuotes, quoted.pos))?;

            element.attributes.insert(key, value);
        }
    }

    fn parse_close_tag(&mut self, lt: Pos, frame: &Frame) -> Result<()> {
        let name = self.lexer.next_token(false)?;
        let expected = frame.element.name();
        if name.kind != TokenKind::Word || self.lexer.text() != expected.as_bytes() {
            return Err(Error::at(
                ErrorKind::MismatchedClosingTag {
                    expected: expected.to_string(),
                    found: self.lexer.text_lossy(),
                },
                lt,
            ));
        }
        let end = self.lexer.next_token(true)?;
        if !end.is_punct(b'>') {
            return Err(self.expected("'>'", end));
        }
        Ok(())
    }

    fn unexpected_close(&mut self, lt: Pos) -> Error {
        let name = match self.lexer.next_token(false) {
            Ok(token) if token.kind == TokenKind::Word => self.lexer.text_lossy(),
            _ => String::new(),
        };
        Error::at(ErrorKind::UnexpectedClosingTag(name), lt)
    }

    /// `<!` constructs: comments, CDATA sections and DOCTYPE
    fn parse_declaration(&mut self, lt: Pos, frame: Option<&mut Frame>) -> Result<()> {
        let cursor = self.lexer.cursor();
        match cursor.current() {
            Some(b'-') => {
                cursor.advance()?;
                if !cursor.consume(b'-')? {
                    return Err(Error::at(
                        ErrorKind::UnknownDeclaration("-".to_string()),
                        lt,
                    ));
                }
                self.skip_comment(lt)
            }
            Some(b'[') => {
                cursor.advance()?;
                let Some(frame) = frame else {
                    return Err(Error::at(ErrorKind::CdataOutsideRoot, lt));
                };
                let keyword = self.lexer.next_token(false)?;
                if keyword.kind != TokenKind::Word
                    || self.lexer.text() != b"CDATA"
                    || !self.lexer.cursor().consume(b'[')?
                {
                    return Err(Error::at(
                        ErrorKind::UnknownDeclaration(format!("[{}", self.lexer.text_lossy())),
                        lt,
                    ));
                }
                self.copy_cdata(lt, &mut frame.text)
            }
            _ => {
                let keyword = self.lexer.next_token(false)?;
                if keyword.kind != TokenKind::Word || self.lexer.text() != b"DOCTYPE" {
                    return Err(Error::at(
                        ErrorKind::UnknownDeclaration(self.lexer.text_lossy()),
                        lt,
                    ));
                }
                if frame.is_some() {
                    return Err(Error::at(ErrorKind::MisplacedDoctype, lt));
                }
                if self.doctype.is_some() {
                    return Err(Error::at(ErrorKind::DuplicateDoctype, lt));
                }
                let tokens = self.collect_doctype(lt)?;
                self.doctype = Some(tokens);
                Ok(())
            }
        }
    }

    /// Skip comment content; the cursor is just past `<!--`
    fn skip_comment(&mut self, lt: Pos) -> Result<()> {
        let cursor = self.lexer.cursor();
        loop {
            let pos = cursor.position();
            match cursor.next_byte()? {
                None => return Err(Error::at(ErrorKind::UnterminatedComment, lt)),
                Some(b'-') if cursor.current() == Some(b'-') => {
                    cursor.advance()?;
                    if cursor.consume(b'>')? {
                        return Ok(());
                    }
                    if cursor.is_eof() {
                        return Err(Error::at(ErrorKind::UnterminatedComment, lt));
                    }
                    return Err(Error::at(ErrorKind::DoubleHyphenInComment, pos));
                }
                Some(_) => {}
            }
        }
    }

    /// Copy raw bytes up to `]]>`; the cursor is just past `<![CDATA[`
    fn copy_cdata(&mut self, lt: Pos, text: &mut Vec<u8>) -> Result<()> {
        let cursor = self.lexer.cursor();
        let start = text.len();
        loop {
            match cursor.next_byte()? {
                None => return Err(Error::at(ErrorKind::UnterminatedCdata, lt)),
                Some(b'>') if text.len() >= start + 2 && text.ends_with(b"]]") => {
                    text.truncate(text.len() - 2);
                    return Ok(());
                }
                Some(b) => text.push(b),
            }
        }
    }

    /// Raw tokens up to the closing `>`, honouring a `[...]` internal subset
    fn collect_doctype(&mut self, lt: Pos) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = match self.lexer.next_token(true) {
                Err(e) if *e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(Error::at(ErrorKind::UnterminatedDoctype, lt))
                }
                other => other?,
            };
            match token.kind {
                TokenKind::Punct(b'>') if depth == 0 => return Ok(tokens),
                TokenKind::Punct(b'[') => depth += 1,
                TokenKind::Punct(b']') => depth = depth.saturating_sub(1),
                _ => {}
            }
            tokens.push(self.lexer.text_lossy());
        }
    }

    /// `<?xml ...?>` is kept as the declaration; other targets are skipped
    fn parse_processing_instruction(&mut self, lt: Pos, at_start: bool) -> Result<()> {
        let target = self.lexer.next_token(false)?;
        if target.kind == TokenKind::Word && self.lexer.text() == b"xml" {
            if !at_start {
                return Err(Error::at(ErrorKind::MisplacedXmlDeclaration, lt));
            }
            let mut declaration = Element::new("xml", self.config.attribute_policy, lt);
            let end = self.parse_attributes(&mut declaration, true)?;
            if !self.lexer.cursor().consume(b'>')? {
                return Err(Error::at(
                    ErrorKind::Expected {
                        expected: "'?>'".to_string(),
                        found: "'?'".to_string(),
                    },
                    end.pos,
                ));
            }
            self.declaration = Some(declaration);
            return Ok(());
        }

        let cursor = self.lexer.cursor();
        if target.is_punct(b'?') && cursor.consume(b'>')? {
            return Ok(());
        }
        loop {
            match cursor.next_byte()? {
                None => return Err(Error::at(ErrorKind::UnterminatedProcessingInstruction, lt)),
                Some(b'?') if cursor.consume(b'>')? => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn expected(&self, expected: &str, found: Token) -> Error {
        Error::at(
            ErrorKind::Expected {
                expected: expected.to_string(),
                found: found.describe(self.lexer.text()),
            },
            found.pos,
        )
    }
}

/// Strip matching quotes from a quoted token
fn strip_quotes(token: &[u8]) -> Option<String> {
    match token {
        [open, inner @ .., close] if open == close && is_quote(*open) => {
            Some(String::from_utf8_lossy(inner).into_owned())
        }
        _ => None,
    }
}
