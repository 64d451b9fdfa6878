//! The XML-RPC client.
//!
//! Every call follows the same lifecycle:
//!
//! ```text
//! Idle -> InFlight -> Completed
//!                  -> Failed
//! ```
//!
//! A call is `Failed` on a transport error, a non-2xx status, an undecodable
//! body or a fault reply. Calls share no mutable state, so one [`Client`]
//! can be used from many tasks at once.

use std::fmt;
use std::time::Instant;

use chrono::NaiveDateTime;
use tracing::{debug, trace, warn};

use xmlrpc_core::{Binary, FromValue, Members, Value};
use xmlrpc_protocol::{CONTENT_TYPE, MethodResponse, Request, read_response};

use crate::adapter::{ToValue, to_params};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpTransport, Transport};

/// Lifecycle state of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Request built, nothing sent yet.
    Idle,
    /// Request sent, waiting for the reply.
    InFlight,
    /// A value was returned.
    Completed,
    /// The call ended with an error or fault.
    Failed,
}

impl CallState {
    /// Returns true if `next` is a legal successor of this state.
    pub fn can_advance_to(self, next: CallState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::InFlight)
                | (Self::InFlight, Self::Completed)
                | (Self::InFlight, Self::Failed)
        )
    }

    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

struct CallTracker<'a> {
    method: &'a str,
    state: CallState,
    started: Instant,
}

impl<'a> CallTracker<'a> {
    fn new(method: &'a str) -> Self {
        Self {
            method,
            state: CallState::Idle,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: CallState) {
        if !self.state.can_advance_to(next) {
            warn!(method = %self.method, from = ?self.state, to = ?next, "illegal call state transition");
            return;
        }
        trace!(method = %self.method, from = ?self.state, to = ?next, "call state");
        self.state = next;
    }

    fn finish<T>(&mut self, result: &ClientResult<T>) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        match result {
            Ok(_) => {
                self.advance(CallState::Completed);
                debug!(method = %self.method, elapsed_ms, "call completed");
            }
            Err(e) => {
                self.advance(CallState::Failed);
                debug!(method = %self.method, elapsed_ms, error = %e, "call failed");
            }
        }
    }
}

/// Client for one XML-RPC endpoint.
pub struct Client {
    config: ClientConfig,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.config.endpoint_str())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client that talks HTTP to the configured endpoint.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the endpoint URL as a string.
    pub fn endpoint(&self) -> &str {
        self.config.endpoint_str()
    }

    /// Returns a handle for one remote method.
    pub fn method(&self, name: impl Into<String>) -> RemoteMethod<'_> {
        RemoteMethod {
            client: self,
            name: name.into(),
            base_params: Vec::new(),
        }
    }

    /// Calls `method` with positional arguments and returns its value.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Conversion`] if an argument cannot be converted
    /// - [`ClientError::Transport`] on connection failure or non-2xx status
    /// - [`ClientError::Decode`] if the reply is not a valid `methodResponse`
    /// - [`ClientError::Fault`] if the server returned a fault
    pub async fn call(
        &self,
        method: &str,
        args: &[&(dyn ToValue + Sync)],
    ) -> ClientResult<Value> {
        let params = to_params(args, &self.config.field_maps)?;
        self.call_values(method, params).await
    }

    /// Calls `method` with already converted parameters.
    pub async fn call_values(&self, method: &str, params: Vec<Value>) -> ClientResult<Value> {
        self.call_request(&Request::new(method, params)).await
    }

    /// Sends a prepared request.
    pub async fn call_request(&self, request: &Request) -> ClientResult<Value> {
        let mut tracker = CallTracker::new(&request.method_name);
        tracker.advance(CallState::InFlight);
        let result = self.exchange(request).await;
        tracker.finish(&result);
        result
    }

    /// Calls `method` and converts the result to `T`.
    pub async fn call_as<T: FromValue>(
        &self,
        method: &str,
        args: &[&(dyn ToValue + Sync)],
    ) -> ClientResult<T> {
        Ok(self.call(method, args).await?.into_typed()?)
    }

    async fn exchange(&self, request: &Request) -> ClientResult<Value> {
        debug!(
            method = %request.method_name,
            params = request.params.len(),
            endpoint = %self.config.endpoint,
            "calling remote method"
        );

        let reply = self
            .transport
            .post(&self.config.endpoint, CONTENT_TYPE, request.to_bytes())
            .await?;

        if !reply.is_success() {
            warn!(status = reply.status, method = %request.method_name, "non-success HTTP status");
            return Err(ClientError::http_status(
                reply.status,
                reply.reason.as_deref(),
            ));
        }

        match read_response(&reply.body)? {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault(fault) => Err(fault.into()),
        }
    }
}

/// A remote method bound to a client, with optional leading parameters.
///
/// Base parameters are sent before the per-call arguments on every call,
/// which suits APIs that take a session key or credentials first.
#[derive(Debug, Clone)]
pub struct RemoteMethod<'c> {
    client: &'c Client,
    name: String,
    base_params: Vec<Value>,
}

impl RemoteMethod<'_> {
    /// Sets the parameters sent ahead of every call's arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Conversion`] if a parameter cannot be
    /// converted.
    pub fn with_base_params(mut self, params: &[&(dyn ToValue + Sync)]) -> ClientResult<Self> {
        self.base_params = to_params(params, &self.client.config.field_maps)?;
        Ok(self)
    }

    /// Returns the method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the base parameters.
    pub fn base_params(&self) -> &[Value] {
        &self.base_params
    }

    /// Calls the method with the base parameters followed by `args`.
    pub async fn call(&self, args: &[&(dyn ToValue + Sync)]) -> ClientResult<Value> {
        let offset = self.base_params.len();
        let extra = to_params(args, &self.client.config.field_maps).map_err(|e| match e {
            ClientError::Conversion { index, source } => ClientError::Conversion {
                index: index + offset,
                source,
            },
            other => other,
        })?;

        let mut params = Vec::with_capacity(offset + extra.len());
        params.extend(self.base_params.iter().cloned());
        params.extend(extra);
        self.client.call_values(&self.name, params).await
    }

    /// Calls the method and converts the result to `T`.
    pub async fn call_as<T: FromValue>(&self, args: &[&(dyn ToValue + Sync)]) -> ClientResult<T> {
        Ok(self.call(args).await?.into_typed()?)
    }
}

macro_rules! typed_calls {
    ($($(#[$doc:meta])* $name:ident -> $ty:ty;)*) => {
        impl Client {
            $(
                $(#[$doc])*
                pub async fn $name(
                    &self,
                    method: &str,
                    args: &[&(dyn ToValue + Sync)],
                ) -> ClientResult<$ty> {
                    self.call_as::<$ty>(method, args).await
                }
            )*
        }

        impl RemoteMethod<'_> {
            $(
                $(#[$doc])*
                pub async fn $name(&self, args: &[&(dyn ToValue + Sync)]) -> ClientResult<$ty> {
                    self.call_as::<$ty>(args).await
                }
            )*
        }
    };
}

typed_calls! {
    /// Calls and expects an `<int>`.
    call_int -> i64;
    /// Calls and expects a `<boolean>`.
    call_bool -> bool;
    /// Calls and expects a `<string>`.
    call_string -> String;
    /// Calls and expects a `<double>`.
    call_double -> f64;
    /// Calls and expects a `<dateTime.iso8601>`.
    call_datetime -> NaiveDateTime;
    /// Calls and expects a `<struct>`.
    call_struct -> Members;
    /// Calls and expects an `<array>`.
    call_array -> Vec<Value>;
}

impl Client {
    /// Calls and expects a `<base64>` body.
    pub async fn call_bytes(
        &self,
        method: &str,
        args: &[&(dyn ToValue + Sync)],
    ) -> ClientResult<Vec<u8>> {
        Ok(self.call_as::<Binary>(method, args).await?.into_inner())
    }
}

impl RemoteMethod<'_> {
    /// Calls and expects a `<base64>` body.
    pub async fn call_bytes(&self, args: &[&(dyn ToValue + Sync)]) -> ClientResult<Vec<u8>> {
        Ok(self.call_as::<Binary>(args).await?.into_inner())
    }
}
