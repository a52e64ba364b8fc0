//! timewarp-mcp: synthesize backdated commit history
//!
//! By default the binary runs an MCP server over stdio exposing the
//! `generate_history` and `reset_history` tools. The `generate` and `reset`
//! subcommands run a single request and print its JSON body.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, Utc};
use clap::Parser;
use rust_mcp_sdk::mcp_server::{McpServerOptions, ServerRuntime, server_runtime};
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ProtocolVersion, ServerCapabilities, ServerCapabilitiesTools,
};
use rust_mcp_sdk::{McpServer, StdioTransport, ToMcpServerHandler, TransportOptions};
use serde::Serialize;
use serde_json::{Map, Value, json};
use timewarp_git::{GitDriver, HistoryDriver, MemoryDriver};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use timewarp_mcp::config::{Command, Config};
use timewarp_mcp::handlers::{
    GenerateResponse, HandlerError, handle_generate_history, handle_reset_history,
};
use timewarp_mcp::server::TimewarpServer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout carries the MCP transport and JSON output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_level().into()))
        .with_writer(std::io::stderr)
        .init();

    config.validate().context("Invalid configuration")?;
    let driver = config.driver()?;
    info!(workspace = %driver.workdir().display(), "Using workspace");

    match config.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(driver, config.utc).await,
        Command::Generate {
            start_date,
            end_date,
            intensity,
            dry_run,
        } => {
            let mut args = Map::new();
            args.insert("startDate".into(), json!(start_date));
            args.insert("endDate".into(), json!(end_date));
            if let Some(intensity) = intensity {
                args.insert("intensity".into(), json!(intensity));
            }

            let result = if dry_run {
                let mut preview = if driver.is_initialized() {
                    MemoryDriver::bootstrapped()
                } else {
                    MemoryDriver::new()
                };
                generate(&mut preview, config.utc, args)
            } else {
                let mut driver = driver;
                generate(&mut driver, config.utc, args)
            };
            emit(result)
        }
        Command::Reset => {
            let mut driver = driver;
            emit(handle_reset_history(&mut driver))
        }
    }
}

/// Run one generation in the configured zone
fn generate<D: HistoryDriver>(
    driver: &mut D,
    utc: bool,
    args: Map<String, Value>,
) -> Result<GenerateResponse, HandlerError> {
    let rng = rand::rng();
    if utc {
        handle_generate_history(driver, rng, &Utc, Some(args))
    } else {
        handle_generate_history(driver, rng, &Local, Some(args))
    }
}

/// Print a handler result as JSON, failing the process on error
fn emit<T: Serialize>(result: Result<T, HandlerError>) -> Result<()> {
    match result {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err) => {
            let mut body = err.body();
            body["status"] = json!(err.status_code());
            println!("{}", serde_json::to_string_pretty(&body)?);
            Err(anyhow!(err))
        }
    }
}

/// Serve the two tools over stdio until the client disconnects
async fn serve(driver: GitDriver, utc: bool) -> Result<()> {
    info!("Starting timewarp-mcp server...");

    let server_details = InitializeResult {
        server_info: Implementation {
            name: "timewarp-mcp".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            title: Some("Timewarp".into()),
            description: Some(env!("CARGO_PKG_DESCRIPTION").into()),
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        meta: None,
        instructions: Some(
            "Use generate_history with startDate, endDate and an optional intensity to fill \
             the workspace repository with backdated commits. Use reset_history to return \
             to the initial commit."
                .into(),
        ),
        protocol_version: ProtocolVersion::V2025_11_25.into(),
    };

    let transport = StdioTransport::new(TransportOptions::default())
        .map_err(|e| anyhow!("Failed to open stdio transport: {e}"))?;
    let handler = TimewarpServer::new(driver, utc);

    let server: Arc<ServerRuntime> = server_runtime::create_server(McpServerOptions {
        server_details,
        transport,
        handler: handler.to_mcp_server_handler(),
        task_store: None,
        client_task_store: None,
    });

    if let Err(start_error) = server.start().await {
        let message = start_error
            .rpc_error_message()
            .cloned()
            .unwrap_or_else(|| start_error.to_string());
        error!(%message, "Server stopped with an error");
        return Err(anyhow!(message));
    }

    info!("Server shut down");
    Ok(())
}
