//! XML-RPC client over HTTP.
//!
//! This crate provides [`Client`], argument conversion through [`ToValue`],
//! and the `xmlrpc` command-line interface.
//!
//! ```no_run
//! use xmlrpc_client::{Client, ClientConfig};
//!
//! # async fn run() -> xmlrpc_client::ClientResult<()> {
//! let config = ClientConfig::new("http://betty.userland.com/RPC2")
//!     .map_err(|e| xmlrpc_client::ClientError::config(e.to_string()))?;
//! let client = Client::new(config)?;
//! let state = client.call_string("examples.getStateName", &[&41]).await?;
//! println!("{}", state);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod settings;
pub mod transport;

pub use adapter::{FieldMaps, StructBuilder, ToValue, to_params};
pub use client::{CallState, Client, RemoteMethod};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ConversionError, ConversionResult};
pub use transport::{BoxFuture, HttpReply, HttpTransport, Transport};
pub use xmlrpc_core::{Binary, Fault, FromValue, Value};
