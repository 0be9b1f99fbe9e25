//! gotest-mcp: MCP server for go test log analysis
//!
//! This binary exposes go test output analysis to MCP clients over stdio:
//! upload a log file, poll for the aggregate result, and drill into
//! individual test failures. A `parse` subcommand runs the same engine
//! once without the server for shell pipelines.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rust_mcp_sdk::mcp_server::{McpServerOptions, ToMcpServerHandler, server_runtime};
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, LATEST_PROTOCOL_VERSION, ServerCapabilities,
    ServerCapabilitiesTools,
};
use rust_mcp_sdk::{McpServer, StdioTransport, TransportOptions};
use tracing::info;

use gotest_mcp::config::{Command, Config};
use gotest_mcp::server::GotestServer;
use gotest_mcp::task::TaskManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout belongs to the MCP stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match config.command {
        Some(Command::Parse { ref file }) => run_parse(file.clone()),
        None => run_server(&config).await,
    }
}

/// One-shot mode: parse a log and print the result as JSON.
fn run_parse(file: Option<PathBuf>) -> anyhow::Result<()> {
    let result = match file {
        Some(path) => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            gotest_log::parse_with_auto_detection(file)?
        }
        None => {
            // stdin is not seekable, so buffer it for the detection passes
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            gotest_log::parse_with_auto_detection(std::io::Cursor::new(buf))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Server mode: run the MCP stdio server until the client disconnects.
async fn run_server(config: &Config) -> anyhow::Result<()> {
    info!("Starting gotest-mcp server...");

    let tasks = TaskManager::new();

    // Periodic registry cleanup so long-lived servers don't accumulate
    // stale tasks.
    let retention = config.task_retention_age();
    let cleanup_tasks = tasks.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60 * 60));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cleanup_tasks.cleanup_older_than(retention).await;
        }
    });

    let server_details = InitializeResult {
        server_info: Implementation {
            name: "gotest-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("Go Test Log Reader".to_string()),
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        meta: None,
        instructions: Some(
            "Upload go test output (JSON event stream or console text) with \
             upload_test_log, then poll get_analysis_result with the returned \
             task id. Use get_test_details to inspect a single failing test."
                .to_string(),
        ),
        protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
    };

    let transport = StdioTransport::new(TransportOptions::default())
        .map_err(|e| anyhow::anyhow!("failed to create stdio transport: {e}"))?;
    let handler = GotestServer::new(tasks);
    let server = server_runtime::create_server(McpServerOptions {
        server_details,
        transport,
        handler: handler.to_mcp_server_handler(),
        task_store: None,
        client_task_store: None,
    });

    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}
