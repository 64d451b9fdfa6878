//! Value <-> XML-RPC markup.
//!
//! Encoding is total and writes canonical element names. Decoding is a
//! recursive descent over a [`TokenSource`]; element names are matched
//! case-insensitively and every failure is a [`DecodeError`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::escape::escape;
use tracing::trace;

use xmlrpc_core::{DATETIME_FORMAT, Fault, Members, Value, parse_datetime};

use crate::MAX_DEPTH;
use crate::error::{DecodeError, DecodeResult};
use crate::tokens::{Token, TokenSource, unexpected};

/// The element that introduces a value (or a fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Int,
    Bool,
    Str,
    Double,
    DateTime,
    Bytes,
    Struct,
    Array,
    Fault,
}

impl Tag {
    /// Maps an element name to its tag, ignoring ASCII case.
    pub fn lookup(name: &str) -> Option<Self> {
        let tag = match name.to_ascii_lowercase().as_str() {
            "int" | "i4" => Self::Int,
            "boolean" => Self::Bool,
            "string" => Self::Str,
            "double" => Self::Double,
            "datetime.iso8601" => Self::DateTime,
            "base64" => Self::Bytes,
            "struct" => Self::Struct,
            "array" => Self::Array,
            "fault" => Self::Fault,
            _ => return None,
        };
        Some(tag)
    }
}

/// Serialization to an XML-RPC wire fragment.
pub trait ToXml {
    /// Appends the wire fragment to `out`.
    fn write_xml(&self, out: &mut String);

    /// Returns the wire fragment.
    fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }
}

impl ToXml for Value {
    fn write_xml(&self, out: &mut String) {
        match self {
            Value::Int(i) => {
                out.push_str("<int>");
                out.push_str(&i.to_string());
                out.push_str("</int>");
            }
            Value::Bool(b) => {
                out.push_str(if *b {
                    "<boolean>1</boolean>"
                } else {
                    "<boolean>0</boolean>"
                });
            }
            Value::Str(s) => {
                out.push_str("<string>");
                out.push_str(&escape(s.as_str()));
                out.push_str("</string>");
            }
            Value::Double(d) => {
                out.push_str("<double>");
                out.push_str(&d.to_string());
                out.push_str("</double>");
            }
            Value::DateTime(dt) => {
                out.push_str("<dateTime.iso8601>");
                out.push_str(&dt.format(DATETIME_FORMAT).to_string());
                out.push_str("</dateTime.iso8601>");
            }
            Value::Bytes(bytes) => {
                out.push_str("<base64>");
                out.push_str(&STANDARD.encode(bytes));
                out.push_str("</base64>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, member) in members {
                    out.push_str("<member><name>");
                    out.push_str(&escape(name.as_str()));
                    out.push_str("</name><value>");
                    member.write_xml(out);
                    out.push_str("</value></member>");
                }
                out.push_str("</struct>");
            }
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    out.push_str("<value>");
                    item.write_xml(out);
                    out.push_str("</value>");
                }
                out.push_str("</data></array>");
            }
        }
    }
}

impl ToXml for Fault {
    fn write_xml(&self, out: &mut String) {
        self.to_value().write_xml(out);
    }
}

/// Encodes a value as a wire fragment without envelope.
pub fn encode(value: &Value) -> String {
    value.to_xml()
}

/// Decodes the next typed value element from `tokens`.
pub fn decode(tokens: &mut TokenSource<'_>) -> DecodeResult<Value> {
    decode_at(tokens, 0)
}

/// Decodes a document holding exactly one typed value element.
pub fn decode_str(input: &str) -> DecodeResult<Value> {
    let mut tokens = TokenSource::from_text(input);
    let value = decode(&mut tokens)?;
    tokens.expect_eof()?;
    Ok(value)
}

fn decode_at(tokens: &mut TokenSource<'_>, depth: usize) -> DecodeResult<Value> {
    let name = match tokens.next_structural()? {
        Token::Open(name) => name,
        token => return Err(unexpected("value element".to_string(), token)),
    };
    decode_tagged(tokens, &name, depth)
}

/// Decodes the body of the already opened element `name`.
fn decode_tagged(tokens: &mut TokenSource<'_>, name: &str, depth: usize) -> DecodeResult<Value> {
    let Some(tag) = Tag::lookup(name) else {
        trace!(element = %name, "unknown value element");
        return Err(DecodeError::UnknownType(name.to_string()));
    };

    match tag {
        Tag::Int => {
            let text = tokens.read_text(name)?;
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| DecodeError::InvalidInt(text))
        }
        Tag::Bool => {
            let text = tokens.read_text(name)?;
            let parsed = match text.trim() {
                "0" => Some(false),
                "1" => Some(true),
                _ => None,
            };
            parsed
                .map(Value::Bool)
                .ok_or(DecodeError::InvalidBoolean(text))
        }
        Tag::Str => tokens.read_text(name).map(Value::Str),
        Tag::Double => {
            let text = tokens.read_text(name)?;
            text.trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| DecodeError::InvalidDouble(text))
        }
        Tag::DateTime => {
            let text = tokens.read_text(name)?;
            parse_datetime(text.trim())
                .map(Value::DateTime)
                .ok_or(DecodeError::InvalidDateTime(text))
        }
        Tag::Bytes => {
            let text = tokens.read_text(name)?;
            let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map(Value::Bytes)
                .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
        }
        Tag::Struct => decode_struct(tokens, depth + 1),
        Tag::Array => decode_array(tokens, depth + 1),
        Tag::Fault => Err(DecodeError::UnexpectedFault),
    }
}

/// Decodes the content of a `<value>` element up to and including
/// `</value>`.
///
/// A value without a type element is a string.
pub(crate) fn decode_value_body(tokens: &mut TokenSource<'_>, depth: usize) -> DecodeResult<Value> {
    let mut text = String::new();
    loop {
        match tokens.next_significant()? {
            Token::Text(chunk) => text.push_str(&chunk),
            Token::Open(name) => {
                if !text.trim().is_empty() {
                    return Err(DecodeError::unexpected("value element", Token::Text(text)));
                }
                let value = decode_tagged(tokens, &name, depth)?;
                tokens.expect_close("value")?;
                return Ok(value);
            }
            token if token.is_close("value") => return Ok(Value::Str(text)),
            token => return Err(unexpected("value content".to_string(), token)),
        }
    }
}

fn decode_struct(tokens: &mut TokenSource<'_>, depth: usize) -> DecodeResult<Value> {
    check_depth(depth)?;
    let mut members = Members::new();
    loop {
        let token = tokens.next_structural()?;
        if token.is_close("struct") {
            return Ok(Value::Struct(members));
        }
        if !token.is_open("member") {
            return Err(unexpected("<member> or </struct>".to_string(), token));
        }
        let (name, value) = decode_member(tokens, depth)?;
        members.insert(name, value);
    }
}

fn decode_member(tokens: &mut TokenSource<'_>, depth: usize) -> DecodeResult<(String, Value)> {
    let mut name = None;
    let mut value = None;
    loop {
        let token = tokens.next_structural()?;
        if token.is_open("name") {
            if name.is_some() {
                return Err(DecodeError::DuplicateMemberPart("name"));
            }
            name = Some(tokens.read_text("name")?);
        } else if token.is_open("value") {
            if value.is_some() {
                return Err(DecodeError::DuplicateMemberPart("value"));
            }
            value = Some(decode_value_body(tokens, depth)?);
        } else if token.is_close("member") {
            break;
        } else {
            return Err(unexpected("<name>, <value> or </member>".to_string(), token));
        }
    }
    let name = name.ok_or(DecodeError::IncompleteMember("name"))?;
    let value = value.ok_or(DecodeError::IncompleteMember("value"))?;
    Ok((name, value))
}

fn decode_array(tokens: &mut TokenSource<'_>, depth: usize) -> DecodeResult<Value> {
    check_depth(depth)?;
    tokens.expect_open("data")?;

    let mut items = Vec::with_capacity(2);
    loop {
        let token = tokens.next_structural()?;
        if token.is_close("data") {
            break;
        }
        if !token.is_open("value") {
            return Err(unexpected("<value> or </data>".to_string(), token));
        }
        // Grow by doubling.
        if items.len() == items.capacity() {
            items.reserve_exact(items.len());
        }
        items.push(decode_value_body(tokens, depth)?);
    }
    tokens.expect_close("array")?;

    items.shrink_to_fit();
    Ok(Value::Array(items))
}

/// Decodes the body of an opened `<fault>` up to and including `</fault>`.
pub(crate) fn decode_fault(tokens: &mut TokenSource<'_>) -> DecodeResult<Fault> {
    tokens.expect_open("value")?;
    let value = decode_value_body(tokens, 0)?;
    tokens.expect_close("fault")?;
    Fault::from_value(&value).ok_or_else(|| DecodeError::InvalidFault(Fault::describe_invalid(&value)))
}

fn check_depth(depth: usize) -> DecodeResult<()> {
    if depth > MAX_DEPTH {
        Err(DecodeError::TooDeep(MAX_DEPTH))
    } else {
        Ok(())
    }
}
