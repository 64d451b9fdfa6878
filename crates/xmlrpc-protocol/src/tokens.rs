//! Structural token source over a quick-xml reader.
//!
//! The decoder never sees raw XML events. It reads [`Token`]s, with comments,
//! processing instructions, declarations and doctypes already skipped, so every
//! read site gets the same "next significant token" behavior.

use std::fmt;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{DecodeError, DecodeResult};

/// A significant token of an XML-RPC document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Element open, carrying the local name.
    Open(String),
    /// Element close, carrying the local name.
    Close(String),
    /// Unescaped character data (text or CDATA).
    Text(String),
    /// End of document.
    Eof,
}

impl Token {
    /// Returns true if this opens the element `name` (case-insensitive).
    pub fn is_open(&self, name: &str) -> bool {
        matches!(self, Self::Open(n) if n.eq_ignore_ascii_case(name))
    }

    /// Returns true if this closes the element `name` (case-insensitive).
    pub fn is_close(&self, name: &str) -> bool {
        matches!(self, Self::Close(n) if n.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(name) => write!(f, "<{}>", name),
            Self::Close(name) => write!(f, "</{}>", name),
            Self::Text(text) if text.chars().count() > 32 => {
                let head: String = text.chars().take(32).collect();
                write!(f, "text {:?}...", head)
            }
            Self::Text(text) => write!(f, "text {:?}", text),
            Self::Eof => write!(f, "end of document"),
        }
    }
}

/// Pulls [`Token`]s out of an in-memory XML document.
pub struct TokenSource<'a> {
    reader: Reader<&'a [u8]>,
    buf: Vec<u8>,
    /// Close token owed for a self-closing element.
    pending_close: Option<String>,
}

impl<'a> TokenSource<'a> {
    /// Creates a token source over raw document bytes.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            pending_close: None,
        }
    }

    /// Creates a token source over a document held in a string.
    pub fn from_text(input: &'a str) -> Self {
        Self::new(input.as_bytes())
    }

    /// Returns the next token that is not a comment, processing
    /// instruction, declaration or doctype.
    ///
    /// Self-closing elements produce an `Open` immediately followed by a
    /// `Close`.
    pub fn next_significant(&mut self) -> DecodeResult<Token> {
        if let Some(name) = self.pending_close.take() {
            return Ok(Token::Close(name));
        }

        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| DecodeError::Xml(e.to_string()))?;

            let token = match event {
                Event::Start(e) => Token::Open(decode_utf8(e.local_name().as_ref())?),
                Event::Empty(e) => {
                    let name = decode_utf8(e.local_name().as_ref())?;
                    self.pending_close = Some(name.clone());
                    Token::Open(name)
                }
                Event::End(e) => Token::Close(decode_utf8(e.local_name().as_ref())?),
                Event::Text(e) => Token::Text(
                    e.unescape()
                        .map_err(|e| DecodeError::Xml(e.to_string()))?
                        .into_owned(),
                ),
                Event::CData(e) => Token::Text(decode_utf8(&e)?),
                Event::Eof => Token::Eof,
                Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {
                    continue;
                }
            };
            return Ok(token);
        }
    }

    /// Returns the next element token, skipping whitespace between elements.
    ///
    /// Non-whitespace text outside a leaf element is an error.
    pub fn next_structural(&mut self) -> DecodeResult<Token> {
        loop {
            match self.next_significant()? {
                Token::Text(text) if text.trim().is_empty() => continue,
                Token::Text(text) => {
                    return Err(DecodeError::unexpected("element", Token::Text(text)));
                }
                token => return Ok(token),
            }
        }
    }

    /// Consumes `<name>`.
    pub fn expect_open(&mut self, name: &str) -> DecodeResult<()> {
        let token = self.next_structural()?;
        if token.is_open(name) {
            Ok(())
        } else {
            Err(unexpected(format!("<{}>", name), token))
        }
    }

    /// Consumes `</name>`.
    pub fn expect_close(&mut self, name: &str) -> DecodeResult<()> {
        let token = self.next_structural()?;
        if token.is_close(name) {
            Ok(())
        } else {
            Err(unexpected(format!("</{}>", name), token))
        }
    }

    /// Consumes the rest of the document, which must hold no further elements.
    pub fn expect_eof(&mut self) -> DecodeResult<()> {
        match self.next_structural()? {
            Token::Eof => Ok(()),
            token => Err(DecodeError::unexpected("end of document", token)),
        }
    }

    /// Reads the text body of a leaf element up to and including `</name>`.
    ///
    /// The opening tag must already have been consumed.
    pub fn read_text(&mut self, name: &str) -> DecodeResult<String> {
        let mut body = String::new();
        loop {
            match self.next_significant()? {
                Token::Text(text) => body.push_str(&text),
                token if token.is_close(name) => return Ok(body),
                token => return Err(unexpected(format!("text or </{}>", name), token)),
            }
        }
    }
}

/// Maps a token that did not match `expected` to the right error.
pub(crate) fn unexpected(expected: String, found: Token) -> DecodeError {
    match found {
        Token::Eof => DecodeError::eof(expected),
        token => DecodeError::unexpected(expected, token),
    }
}

/// Decodes raw markup bytes, rejecting invalid UTF-8.
fn decode_utf8(raw: &[u8]) -> DecodeResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| DecodeError::Xml(e.to_string()))
}
