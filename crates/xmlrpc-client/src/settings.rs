//! CLI settings file.
//!
//! Settings live in `~/.config/xmlrpc/config.toml` by default:
//!
//! ```toml
//! endpoint = "http://betty.userland.com/RPC2"
//! timeout = 10
//! user_agent = "my-tool/1.0"
//! verify_tls = true
//! ```
//!
//! Every key is optional. Command-line flags take precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Contents of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Endpoint URL used when `--endpoint` is not given.
    pub endpoint: Option<String>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// User agent string.
    pub user_agent: Option<String>,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: None,
            user_agent: None,
            verify_tls: true,
        }
    }
}

/// Values given on the command line, overriding the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub timeout: Option<u64>,
    pub insecure: bool,
}

impl FileConfig {
    /// Loads settings from `path`, or from the default path.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// default settings.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!(path = %path.display(), "no settings file");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads settings from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            ClientError::config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loaded settings");
        Ok(config)
    }

    /// Returns the default settings file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("xmlrpc")
            .join("config.toml")
    }

    /// Merges command-line overrides and builds a client configuration.
    ///
    /// # Errors
    ///
    /// Fails if no endpoint is configured or the endpoint is not a valid URL.
    pub fn into_client_config(self, overrides: &Overrides) -> ClientResult<ClientConfig> {
        let endpoint = overrides
            .endpoint
            .clone()
            .or(self.endpoint)
            .ok_or_else(|| {
                ClientError::config("no endpoint: pass --endpoint or set `endpoint` in the settings file")
            })?;

        let mut config = ClientConfig::new(&endpoint)
            .map_err(|e| ClientError::config(format!("invalid endpoint {:?}: {}", endpoint, e)))?;

        if let Some(secs) = overrides.timeout.or(self.timeout) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if overrides.insecure || !self.verify_tls {
            config = config.with_insecure_tls();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
endpoint = "http://localhost:8080/RPC2"
timeout = 7
user_agent = "tests/1.0"
verify_tls = false
"#,
        );

        let file = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(file.endpoint.as_deref(), Some("http://localhost:8080/RPC2"));
        assert_eq!(file.timeout, Some(7));
        assert_eq!(file.user_agent.as_deref(), Some("tests/1.0"));
        assert!(!file.verify_tls);

        let config = file.into_client_config(&Overrides::default()).unwrap();
        assert_eq!(config.endpoint_str(), "http://localhost:8080/RPC2");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.user_agent, "tests/1.0");
        assert!(!config.verify_tls);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "");
        assert_eq!(FileConfig::load(Some(&path)).unwrap(), FileConfig::default());
    }

    #[test]
    fn overrides_win() {
        let file = FileConfig {
            endpoint: Some("http://file.example.com/".to_string()),
            timeout: Some(3),
            ..FileConfig::default()
        };
        let overrides = Overrides {
            endpoint: Some("http://flag.example.com/".to_string()),
            timeout: Some(9),
            insecure: true,
        };

        let config = file.into_client_config(&overrides).unwrap();
        assert_eq!(config.endpoint_str(), "http://flag.example.com/");
        assert_eq!(config.timeout, Duration::from_secs(9));
        assert!(!config.verify_tls);
    }

    #[test]
    fn missing_endpoint_is_config_error() {
        let err = FileConfig::default()
            .into_client_config(&Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn invalid_endpoint_is_config_error() {
        let overrides = Overrides {
            endpoint: Some("not a url".to_string()),
            ..Overrides::default()
        };
        let err = FileConfig::default().into_client_config(&overrides).unwrap_err();
        assert!(err.to_string().contains("invalid endpoint"));
    }

    #[test]
    fn explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "timeout = \"soon\"");
        let err = FileConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
