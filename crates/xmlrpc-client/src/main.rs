//! xmlrpc CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::warn;

use xmlrpc_client::Client;
use xmlrpc_client::cli::{Cli, CliError, Command, render};
use xmlrpc_client::settings::FileConfig;
use xmlrpc_core::{TracingConfig, init_tracing};
use xmlrpc_protocol::Request;

/// Exit status for a call rejected with a fault.
const EXIT_FAULT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.fault() {
            Some(fault) => {
                eprintln!("fault {}: {}", fault.code, fault.message);
                ExitCode::from(EXIT_FAULT)
            }
            None => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let overrides = cli.command.overrides();

    match cli.command {
        Command::Encode { method, params } => {
            println!("{}", Request::new(method, params).to_xml());
            Ok(())
        }
        Command::Call {
            method,
            params,
            json,
            ..
        } => {
            let settings = FileConfig::load(cli.config.as_deref())?;
            if !settings.verify_tls || overrides.insecure {
                warn!("TLS certificate verification is disabled");
            }
            let client = Client::new(settings.into_client_config(&overrides)?)?;

            let value = client.call_values(&method, params).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", render(&value));
            }
            Ok(())
        }
    }
}
