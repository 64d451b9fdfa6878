//! Remote faults.

use thiserror::Error;

use crate::value::{Value, ValueKind};

/// Member name carrying the fault code.
pub const FAULT_CODE: &str = "faultCode";
/// Member name carrying the fault message.
pub const FAULT_STRING: &str = "faultString";

/// An error reported by the remote server.
///
/// A fault is not a [`Value`]; a response carries either a value or a fault.
/// On the wire it travels as a struct with `faultCode` and `faultString`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct Fault {
    /// Application-defined fault code.
    pub code: i64,
    /// Human-readable fault description.
    pub message: String,
}

impl Fault {
    /// Creates a new fault.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns the struct value this fault is transmitted as.
    pub fn to_value(&self) -> Value {
        Value::structure([
            (FAULT_CODE, Value::Int(self.code)),
            (FAULT_STRING, Value::Str(self.message.clone())),
        ])
    }

    /// Reads a fault from its struct form.
    ///
    /// Returns `None` unless `faultCode` is an int and `faultString` is a
    /// string. Extra members are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let code = value.get(FAULT_CODE)?.as_int()?;
        let message = value.get(FAULT_STRING)?.as_str()?;
        Some(Self::new(code, message))
    }

    /// Describes why `value` is not a valid fault struct.
    pub fn describe_invalid(value: &Value) -> String {
        if value.kind() != ValueKind::Struct {
            return format!("expected struct, found {}", value.kind());
        }
        match (value.get(FAULT_CODE), value.get(FAULT_STRING)) {
            (None, _) => format!("missing {}", FAULT_CODE),
            (_, None) => format!("missing {}", FAULT_STRING),
            (Some(code), _) if code.kind() != ValueKind::Int => {
                format!("{} must be int, found {}", FAULT_CODE, code.kind())
            }
            (_, Some(message)) => {
                format!("{} must be string, found {}", FAULT_STRING, message.kind())
            }
        }
    }
}
