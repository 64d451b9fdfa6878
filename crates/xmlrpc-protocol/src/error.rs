//! Decode error types.

use thiserror::Error;

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding XML-RPC markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The tokenizer rejected the document.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// A token appeared where the grammar does not allow it.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// The document ended early.
    #[error("unexpected end of document while reading {context}")]
    UnexpectedEof { context: String },

    /// A value element with an unrecognized name.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// `<fault>` found where a value was expected.
    #[error("fault not allowed in value position")]
    UnexpectedFault,

    /// Body of `<int>`/`<i4>` is not an integer.
    #[error("invalid int: {0:?}")]
    InvalidInt(String),

    /// Body of `<boolean>` is not `0` or `1`.
    #[error("unrecognized boolean: {0:?}")]
    InvalidBoolean(String),

    /// Body of `<double>` is not a number.
    #[error("invalid double: {0:?}")]
    InvalidDouble(String),

    /// Body of `<base64>` does not decode.
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// Body of `<dateTime.iso8601>` is not a supported timestamp.
    #[error("invalid dateTime.iso8601: {0:?}")]
    InvalidDateTime(String),

    /// A struct member without its name or value.
    #[error("struct member without <{0}>")]
    IncompleteMember(&'static str),

    /// A struct member repeating its name or value.
    #[error("struct member with more than one <{0}>")]
    DuplicateMemberPart(&'static str),

    /// Containers nested deeper than [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("values nested deeper than {0} levels")]
    TooDeep(usize),

    /// A fault whose struct lacks a valid `faultCode` or `faultString`.
    #[error("invalid fault response: {0}")]
    InvalidFault(String),

    /// The `methodResponse` envelope is malformed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The `methodCall` envelope is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl DecodeError {
    /// Creates an unexpected token error.
    pub fn unexpected(expected: impl Into<String>, found: impl ToString) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Creates an unexpected end of document error.
    pub fn eof(context: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            context: context.into(),
        }
    }
}
