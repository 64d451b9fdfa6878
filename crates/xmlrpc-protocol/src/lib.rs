//! XML-RPC wire codec and envelopes.
//!
//! - [`encode`] / [`decode`] map between a [`Value`](xmlrpc_core::Value) and
//!   its wire fragment (`<int>4</int>`, `<struct>...</struct>`, ...).
//! - [`Request`] and [`MethodResponse`] add the `methodCall` and
//!   `methodResponse` framing; [`read_response`] parses a server reply.
//!
//! # Example
//!
//! ```rust
//! use xmlrpc_core::Value;
//! use xmlrpc_protocol::{MethodResponse, read_response};
//!
//! let body = MethodResponse::Success(Value::from("South Dakota")).to_bytes();
//! let response = read_response(&body).unwrap();
//! assert_eq!(response, MethodResponse::Success(Value::from("South Dakota")));
//! ```

mod codec;
mod envelope;
mod error;
mod tokens;

pub use codec::{Tag, ToXml, decode, decode_str, encode};
pub use envelope::{MethodResponse, Request, XML_DECLARATION, read_response};
pub use error::{DecodeError, DecodeResult};
pub use tokens::{Token, TokenSource};

/// Maximum nesting of struct/array containers accepted by the decoder.
pub const MAX_DEPTH: usize = 128;

/// Content type of request and response bodies.
pub const CONTENT_TYPE: &str = "text/xml";
