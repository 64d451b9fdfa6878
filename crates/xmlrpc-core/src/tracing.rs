//! Subscriber installation for binaries built on the xmlrpc crates.
//!
//! The libraries only emit events. `RUST_LOG` wins over the preset level
//! when it is set and valid.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Targets the preset level applies to.
const TARGETS: [&str; 3] = ["xmlrpc_core", "xmlrpc_protocol", "xmlrpc_client"];

/// Failure to install the global subscriber.
#[derive(Debug, Error)]
#[error("failed to set global tracing subscriber: {0}")]
pub struct TracingError(#[from] tracing::subscriber::SetGlobalDefaultError);

/// Level and detail of the stderr log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for the xmlrpc targets when `RUST_LOG` is not set.
    pub level: Level,
    /// Adds source location and target to each line.
    pub verbose: bool,
}

impl Default for TracingConfig {
    /// Warnings only.
    fn default() -> Self {
        Self {
            level: Level::WARN,
            verbose: false,
        }
    }
}

impl TracingConfig {
    /// Wire-level detail for `--debug`.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::TRACE,
            verbose: true,
        }
    }

    /// Filter directive applying `level` to every xmlrpc target.
    pub fn directive(&self) -> String {
        TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Installs a compact stderr subscriber as the global default.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let layer = fmt::layer()
        .compact()
        .without_time()
        .with_writer(std::io::stderr)
        .with_file(config.verbose)
        .with_line_number(config.verbose)
        .with_target(config.verbose);

    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(filter).with(layer))?;
    Ok(())
}
