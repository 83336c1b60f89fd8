//! Command-line entry point for the automation client.

use anyhow::{anyhow, Context, Result};
use automation_client::{
    AutomationClient, AutomationResponse, ConfigManager, OperationRequest, ParamValue,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "nxclient")]
#[command(about = "Invoke automation operations on a remote server", version)]
struct Cli {
    /// Directory holding client.toml and secrets.toml
    #[arg(long, short = 'c', default_value = "config")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the operations advertised by the server
    Operations,

    /// Execute an operation
    Execute {
        operation: String,

        /// Operation parameter as name=value, value parsed as JSON when possible
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,

        /// Document property as key=value, sent in the `properties` parameter
        #[arg(long = "property", short = 'P')]
        properties: Vec<String>,

        #[arg(long)]
        input: Option<String>,

        /// Tell the server no response body is needed
        #[arg(long = "void")]
        void_op: bool,

        /// Request timeout in seconds, overrides the configured one
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Upload a file and execute an operation with it as input
    Upload {
        operation: String,

        file: PathBuf,

        #[arg(long)]
        filename: Option<String>,

        #[arg(long)]
        mime_type: Option<String>,

        #[arg(long = "param", short = 'p')]
        params: Vec<String>,
    },

    /// Acquire an authentication token, or revoke the current one
    Token {
        #[arg(long)]
        revoke: bool,
    },
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("automation_client=info".parse()?)
        .add_directive("nxclient=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let session = config_manager.session()?;
    info!("Connecting to {} as {}", session.server_url, session.user_id);

    let mut client = AutomationClient::connect(session)?;
    if !client.is_addon_installed() {
        warn!("Server does not expose the drive operations, some calls may be rejected");
    }

    match cli.command {
        Commands::Operations => {
            for name in client.registry().names() {
                println!("{}", name);
            }
        }
        Commands::Execute {
            operation,
            params,
            properties,
            input,
            void_op,
            timeout,
        } => {
            let mut request = OperationRequest::new(operation)
                .params(parse_params(&params)?)
                .void_op(void_op);
            if !properties.is_empty() {
                request = request.param(
                    "properties",
                    ParamValue::properties(parse_pairs(&properties)?),
                );
            }
            if let Some(input) = input {
                request = request.input(input);
            }

            let response = client.execute(&request, timeout.map(Duration::from_secs))?;
            print_response(response)?;
        }
        Commands::Upload {
            operation,
            file,
            filename,
            mime_type,
            params,
        } => {
            let request = OperationRequest::new(operation).params(parse_params(&params)?);
            let response = client.execute_with_blob(
                &request,
                &file,
                filename.as_deref(),
                mime_type.as_deref(),
            )?;
            print_response(response)?;
        }
        Commands::Token { revoke } => {
            if revoke {
                client.revoke_token()?;
                info!("Token revoked for device {}", client.session().device_id);
            } else {
                match client.request_token()? {
                    Some(token) => println!("{}", token),
                    None => warn!("Server does not support token authentication"),
                }
            }
        }
    }

    Ok(())
}

fn parse_pairs(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("Expected name=value, got '{}'", pair))
        })
        .collect()
}

fn parse_params(raw: &[String]) -> Result<Vec<(String, ParamValue)>> {
    Ok(parse_pairs(raw)?
        .into_iter()
        .map(|(name, value)| {
            let value = serde_json::from_str::<Value>(&value)
                .map(ParamValue::from)
                .unwrap_or_else(|_| ParamValue::from(value));
            (name, value)
        })
        .collect())
}

fn print_response(response: AutomationResponse) -> Result<()> {
    match response {
        AutomationResponse::Json(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        AutomationResponse::Raw(bytes) => {
            std::io::stdout().write_all(&bytes)?;
        }
    }
    Ok(())
}
