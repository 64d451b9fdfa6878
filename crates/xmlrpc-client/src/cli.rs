//! Command-line interface definition.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use thiserror::Error;

use xmlrpc_core::{DATETIME_FORMAT, DATETIME_INPUT_FORMATS, Members, Value};

use crate::error::ClientError;
use crate::settings::Overrides;

/// xmlrpc - call XML-RPC methods from the shell
#[derive(Debug, Parser)]
#[command(name = "xmlrpc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to settings file
    #[arg(long, short, env = "XMLRPC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Call a remote method and print its result
    Call {
        /// Method name, e.g. examples.getStateName
        method: String,

        /// Parameters: int:4, bool:1, str:text, double:3.5, base64:SGk=,
        /// datetime:19980717T14:08:55, json:{"a":[1,2]}, or plain text
        #[arg(value_parser = parse_param)]
        params: Vec<Value>,

        /// Endpoint URL
        #[arg(long, short, env = "XMLRPC_ENDPOINT")]
        endpoint: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the methodCall document without sending it
    Encode {
        /// Method name
        method: String,

        /// Parameters, as for `call`
        #[arg(value_parser = parse_param)]
        params: Vec<Value>,
    },
}

impl Command {
    /// Returns the settings overrides given on the command line.
    pub fn overrides(&self) -> Overrides {
        match self {
            Self::Call {
                endpoint,
                timeout,
                insecure,
                ..
            } => Overrides {
                endpoint: endpoint.clone(),
                timeout: *timeout,
                insecure: *insecure,
            },
            Self::Encode { .. } => Overrides::default(),
        }
    }
}

/// Errors of the command-line front end.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Returns the remote fault, if the call failed with one.
    pub fn fault(&self) -> Option<&xmlrpc_core::Fault> {
        match self {
            Self::Client(e) => e.fault(),
            Self::Json(_) => None,
        }
    }
}

/// Parses one typed parameter literal.
///
/// Text without a known `type:` prefix is sent as a string.
pub fn parse_param(input: &str) -> Result<Value, String> {
    let Some((prefix, body)) = input.split_once(':') else {
        return Ok(Value::from(input));
    };

    match prefix {
        "int" | "i4" => body
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| format!("invalid int {:?}: {}", body, e)),
        "bool" | "boolean" => match body.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(format!("invalid bool {:?}: expected 0, 1, true or false", other)),
        },
        "str" | "string" => Ok(Value::from(body)),
        "double" => body
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| format!("invalid double {:?}: {}", body, e)),
        "base64" => STANDARD
            .decode(body.trim())
            .map(Value::Bytes)
            .map_err(|e| format!("invalid base64 {:?}: {}", body, e)),
        "datetime" => parse_datetime_param(body.trim()),
        "json" => {
            let json: serde_json::Value =
                serde_json::from_str(body).map_err(|e| format!("invalid json: {}", e))?;
            json_to_value(json)
        }
        _ => Ok(Value::from(input)),
    }
}

fn parse_datetime_param(text: &str) -> Result<Value, String> {
    xmlrpc_core::parse_datetime(text)
        .map(Value::DateTime)
        .ok_or_else(|| {
            format!(
                "invalid datetime {:?}: expected one of {}",
                text,
                DATETIME_INPUT_FORMATS.join(", ")
            )
        })
}

/// Converts a JSON document into a value.
///
/// Integral numbers become `Int`, other numbers `Double`. `null` has no
/// XML-RPC counterpart and is rejected.
pub fn json_to_value(json: serde_json::Value) -> Result<Value, String> {
    match json {
        serde_json::Value::Null => Err("null cannot be sent as an XML-RPC value".to_string()),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if n.is_u64() {
                Err(format!("integer {} does not fit in an XML-RPC int", n))
            } else {
                n.as_f64()
                    .map(Value::Double)
                    .ok_or_else(|| format!("unsupported number {}", n))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(json_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(name, item)| Ok((name, json_to_value(item)?)))
            .collect::<Result<Members, String>>()
            .map(Value::Struct),
    }
}

/// Renders a value as an indented text tree.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    render_into(value, 0, &mut out);
    out
}

fn render_into(value: &Value, indent: usize, out: &mut String) {
    match value {
        Value::Struct(members) if !members.is_empty() => {
            out.push_str("struct\n");
            for (name, member) in members {
                push_indent(out, indent + 1);
                out.push_str(name);
                out.push_str(": ");
                render_into(member, indent + 1, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            out.push_str("array\n");
            for item in items {
                push_indent(out, indent + 1);
                out.push_str("- ");
                render_into(item, indent + 1, out);
            }
        }
        Value::Struct(_) => out.push_str("struct {}\n"),
        Value::Array(_) => out.push_str("array []\n"),
        scalar => {
            out.push_str(&render_scalar(scalar));
            out.push('\n');
        }
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Int(i) => format!("int {}", i),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Str(s) => format!("string {:?}", s),
        Value::Double(d) => format!("double {}", d),
        Value::DateTime(dt) => format!("dateTime.iso8601 {}", dt.format(DATETIME_FORMAT)),
        Value::Bytes(bytes) => format!("base64 {}", STANDARD.encode(bytes)),
        Value::Struct(_) | Value::Array(_) => String::new(),
    }
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn typed_literals() {
        assert_eq!(parse_param("int:4"), Ok(Value::Int(4)));
        assert_eq!(parse_param("int:-4"), Ok(Value::Int(-4)));
        assert_eq!(parse_param("bool:1"), Ok(Value::Bool(true)));
        assert_eq!(parse_param("bool:false"), Ok(Value::Bool(false)));
        assert_eq!(parse_param("str:a:b"), Ok(Value::from("a:b")));
        assert_eq!(parse_param("double:3.5"), Ok(Value::Double(3.5)));
        assert_eq!(
            parse_param("base64:SGVsbG8gV29ybGQ="),
            Ok(Value::Bytes(b"Hello World".to_vec()))
        );
        let dt = NaiveDate::from_ymd_opt(1998, 7, 17)
            .unwrap()
            .and_hms_opt(14, 8, 55)
            .unwrap();
        assert_eq!(parse_param("datetime:19980717T14:08:55"), Ok(Value::DateTime(dt)));
        assert_eq!(parse_param("datetime:1998-07-17T14:08:55"), Ok(Value::DateTime(dt)));
        assert_eq!(parse_param("datetime:19980717T140855"), Ok(Value::DateTime(dt)));
    }

    #[test]
    fn plain_text_is_a_string() {
        assert_eq!(parse_param("Ben"), Ok(Value::from("Ben")));
        assert_eq!(
            parse_param("http://example.com/"),
            Ok(Value::from("http://example.com/"))
        );
    }

    #[test]
    fn bad_literals_are_rejected() {
        assert!(parse_param("int:four").is_err());
        assert!(parse_param("bool:2").is_err());
        assert!(parse_param("double:x").is_err());
        assert!(parse_param("base64:***").is_err());
        assert!(parse_param("datetime:yesterday").is_err());
        assert!(parse_param("json:{").is_err());
    }

    #[test]
    fn json_literals() {
        assert_eq!(
            parse_param(r#"json:{"name":"Ben","ids":[1,2.5],"ok":true}"#),
            Ok(Value::structure([
                ("name", Value::from("Ben")),
                ("ids", Value::Array(vec![Value::Int(1), Value::Double(2.5)])),
                ("ok", Value::Bool(true)),
            ]))
        );
        assert!(parse_param("json:null").is_err());
        assert!(parse_param("json:[1,null]").is_err());
        assert!(parse_param("json:18446744073709551615").is_err());
    }

    #[test]
    fn render_tree() {
        let value = Value::structure([
            ("count", Value::Int(2)),
            (
                "names",
                Value::Array(vec![Value::from("a"), Value::Array(vec![])]),
            ),
            ("blob", Value::Bytes(b"hi".to_vec())),
        ]);
        assert_eq!(
            render(&value),
            "struct\n  blob: base64 aGk=\n  count: int 2\n  names: array\n    - string \"a\"\n    - array []\n"
        );
        assert_eq!(render(&Value::Bool(true)), "boolean true\n");
        assert_eq!(render(&Value::Struct(Members::new())), "struct {}\n");
    }

    #[test]
    fn cli_parses_call() {
        let cli = Cli::try_parse_from([
            "xmlrpc",
            "call",
            "examples.getStateName",
            "int:41",
            "Ben",
            "--endpoint",
            "http://localhost/RPC2",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Command::Call {
                ref method,
                ref params,
                json,
                ..
            } => {
                assert_eq!(method, "examples.getStateName");
                assert_eq!(params, &vec![Value::Int(41), Value::from("Ben")]);
                assert!(json);
            }
            Command::Encode { .. } => panic!("expected call"),
        }
        let overrides = cli.command.overrides();
        assert_eq!(overrides.endpoint.as_deref(), Some("http://localhost/RPC2"));
    }

    #[test]
    fn cli_rejects_bad_param() {
        assert!(Cli::try_parse_from(["xmlrpc", "encode", "m", "int:x"]).is_err());
    }
}
