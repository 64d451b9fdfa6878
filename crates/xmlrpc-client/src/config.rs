//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::adapter::FieldMaps;

/// Configuration for an XML-RPC [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Endpoint every call is POSTed to.
    pub endpoint: Url,

    /// Request timeout, passed through to the HTTP client.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Struct member renames applied to call arguments.
    pub field_maps: FieldMaps,
}

impl ClientConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(endpoint.as_ref())?;
        Ok(Self {
            endpoint,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("xmlrpc/{}", env!("CARGO_PKG_VERSION")),
            verify_tls: true,
            field_maps: FieldMaps::default(),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Disables TLS verification (for testing only).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Sets the struct member renames.
    pub fn with_field_maps(mut self, field_maps: FieldMaps) -> Self {
        self.field_maps = field_maps;
        self
    }

    /// Returns the endpoint as a string.
    pub fn endpoint_str(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_creation() {
        let config = ClientConfig::new("http://betty.userland.com/RPC2").unwrap();
        assert_eq!(config.endpoint_str(), "http://betty.userland.com/RPC2");
        assert_eq!(
            config.timeout,
            Duration::from_secs(ClientConfig::DEFAULT_TIMEOUT_SECS)
        );
        assert!(config.verify_tls);
        assert!(config.user_agent.starts_with("xmlrpc/"));
        assert!(config.field_maps.is_empty());
    }

    #[test]
    fn config_builder_methods() {
        struct Record;

        let config = ClientConfig::new("https://rpc.example.com/")
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("tests/1.0")
            .with_insecure_tls()
            .with_field_maps(FieldMaps::new().with::<Record, _, _, _>([("a", "A")]));

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "tests/1.0");
        assert!(!config.verify_tls);
        assert_eq!(config.field_maps.wire_name::<Record>("a"), "A");
    }

    #[test]
    fn invalid_url_returns_error() {
        assert!(ClientConfig::new("not a url").is_err());
    }
}
