//! Client error types.

use thiserror::Error;

use xmlrpc_core::{Fault, TypeError};
use xmlrpc_protocol::DecodeError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for argument conversions.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Errors raised while converting call arguments into values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// An integer outside the range of an XML-RPC int.
    #[error("integer {value} does not fit in an XML-RPC int")]
    OutOfRange { value: String },

    /// A value the conversion refuses to represent.
    #[error("cannot convert {type_name}: {reason}")]
    Unsupported {
        type_name: &'static str,
        reason: String,
    },

    /// A struct field failed to convert.
    #[error("field {field} of {type_name}: {source}")]
    Field {
        type_name: &'static str,
        field: String,
        source: Box<ConversionError>,
    },
}

impl ConversionError {
    /// Creates an unsupported-value error for type `T`.
    pub fn unsupported<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(value: impl ToString) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
        }
    }
}

/// Errors that can occur while calling a remote method.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection failure or non-2xx HTTP status.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// The response body is not a valid `methodResponse`.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The server answered with a fault.
    #[error("remote fault: {0}")]
    Fault(#[from] Fault),

    /// The result has a different type than requested.
    #[error("unexpected result: {0}")]
    TypeMismatch(#[from] TypeError),

    /// A call argument could not be converted.
    #[error("argument {index}: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: ConversionError,
    },

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Creates a transport error without HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a transport error for a non-2xx HTTP status.
    pub fn http_status(status: u16, reason: Option<&str>) -> Self {
        let message = match reason {
            Some(reason) => format!("HTTP {} {}", status, reason),
            None => format!("HTTP {}", status),
        };
        Self::Transport {
            message,
            status: Some(status),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if the server rejected the call with a fault.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    /// Returns the remote fault, if this is one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns true if the server could not be reached or answered non-2xx.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns the HTTP status of a transport error, if known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}
