//! Core types: XML-RPC values, faults, tracing

pub mod fault;
pub mod tracing;
pub mod value;

pub use fault::{FAULT_CODE, FAULT_STRING, Fault};
pub use crate::tracing::{TracingConfig, TracingError, init_tracing};
pub use value::{
    Binary, DATETIME_FORMAT, DATETIME_INPUT_FORMATS, FromValue, Members, TypeError, Value, ValueKind,
    parse_datetime,
};
