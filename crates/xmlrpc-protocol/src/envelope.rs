//! `methodCall` / `methodResponse` framing.

use quick_xml::escape::escape;
use tracing::debug;

use xmlrpc_core::{Fault, Value};

use crate::codec::{ToXml, decode_fault, decode_value_body};
use crate::error::{DecodeError, DecodeResult};
use crate::tokens::{Token, TokenSource, unexpected};

/// XML declaration written at the top of every document.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>\n";

/// A method call: a method name and positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Name of the remote method.
    pub method_name: String,
    /// Positional parameters, in call order.
    pub params: Vec<Value>,
}

impl Request {
    /// Creates a new request.
    pub fn new(method_name: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method_name: method_name.into(),
            params,
        }
    }

    /// Serializes the request as a complete `methodCall` document.
    pub fn to_xml(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        out.push_str("<methodCall><methodName>");
        out.push_str(&escape(self.method_name.as_str()));
        out.push_str("</methodName><params>");
        for param in &self.params {
            out.push_str("<param><value>");
            param.write_xml(&mut out);
            out.push_str("</value></param>");
        }
        out.push_str("</params></methodCall>");
        out
    }

    /// Serializes the request as request body bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }

    /// Parses a `methodCall` document.
    ///
    /// The `<params>` element may be omitted for calls without arguments.
    pub fn from_xml(input: &[u8]) -> DecodeResult<Self> {
        let mut tokens = TokenSource::new(input);

        let token = tokens.next_structural()?;
        if !token.is_open("methodCall") {
            return Err(DecodeError::InvalidRequest(format!(
                "expected <methodCall>, found {}",
                token
            )));
        }

        tokens.expect_open("methodName")?;
        let method_name = tokens.read_text("methodName")?.trim().to_string();

        let mut params = Vec::new();
        let token = tokens.next_structural()?;
        if token.is_open("params") {
            loop {
                let token = tokens.next_structural()?;
                if token.is_close("params") {
                    break;
                }
                if !token.is_open("param") {
                    return Err(unexpected("<param> or </params>".to_string(), token));
                }
                tokens.expect_open("value")?;
                params.push(decode_value_body(&mut tokens, 0)?);
                tokens.expect_close("param")?;
            }
            tokens.expect_close("methodCall")?;
        } else if !token.is_close("methodCall") {
            return Err(unexpected("<params> or </methodCall>".to_string(), token));
        }
        tokens.expect_eof()?;

        Ok(Self::new(method_name, params))
    }
}

/// The outcome of a call: a value or a fault, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// The call returned a value.
    Success(Value),
    /// The server rejected the call.
    Fault(Fault),
}

impl MethodResponse {
    /// Returns true for the fault variant.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    /// Converts into a `Result`, with the fault as error.
    pub fn into_result(self) -> Result<Value, Fault> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Fault(fault) => Err(fault),
        }
    }

    /// Serializes the response as a complete `methodResponse` document.
    pub fn to_xml(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        out.push_str("<methodResponse>");
        match self {
            Self::Success(value) => {
                out.push_str("<params><param><value>");
                value.write_xml(&mut out);
                out.push_str("</value></param></params>");
            }
            Self::Fault(fault) => {
                out.push_str("<fault><value>");
                fault.write_xml(&mut out);
                out.push_str("</value></fault>");
            }
        }
        out.push_str("</methodResponse>");
        out
    }

    /// Serializes the response as body bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }
}

impl From<Value> for MethodResponse {
    fn from(value: Value) -> Self {
        Self::Success(value)
    }
}

impl From<Fault> for MethodResponse {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

/// Parses a `methodResponse` document.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidResponse`] if the document is not a
/// `methodResponse` holding `<params>` or `<fault>`, and the usual decode
/// errors for malformed content.
pub fn read_response(input: &[u8]) -> DecodeResult<MethodResponse> {
    let mut tokens = TokenSource::new(input);

    let token = tokens.next_structural()?;
    if !token.is_open("methodResponse") {
        return Err(invalid_response("<methodResponse>", token));
    }

    let response = match tokens.next_structural()? {
        token if token.is_open("fault") => {
            let fault = decode_fault(&mut tokens)?;
            debug!(code = fault.code, message = %fault.message, "decoded fault response");
            MethodResponse::Fault(fault)
        }
        token if token.is_open("params") => {
            tokens.expect_open("param")?;
            tokens.expect_open("value")?;
            let value = decode_value_body(&mut tokens, 0)?;
            tokens.expect_close("param")?;
            tokens.expect_close("params")?;
            debug!(kind = %value.kind(), "decoded value response");
            MethodResponse::Success(value)
        }
        token => return Err(invalid_response("<params> or <fault>", token)),
    };

    tokens.expect_close("methodResponse")?;
    tokens.expect_eof()?;
    Ok(response)
}

fn invalid_response(expected: &str, found: Token) -> DecodeError {
    DecodeError::InvalidResponse(format!("expected {}, found {}", expected, found))
}
