//! OmniContext MCP Server.
//!
//! Exposes code intelligence tools to AI coding agents via the
//! Model Context Protocol (MCP). Supports stdio and streamable-HTTP
//! transports (spec.md §1, §9 "MCP Server").

mod tools;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use omni_core::config::Config;
use omni_core::paths;
use omni_core::pipeline::{Engine, IndexMode};

use tools::OmniContextServer;

/// OmniContext MCP Server
#[derive(Parser, Debug)]
#[command(name = "omnicontext-mcp", version, about)]
struct Args {
    /// Path to the repository to index.
    #[arg(long, default_value = ".")]
    repo: String,

    /// Name of the index to serve.
    #[arg(long, default_value = "default")]
    index: String,

    /// Transport protocol to use.
    #[arg(long, default_value = "stdio", value_parser = ["stdio", "sse"])]
    transport: String,

    /// Bind address for the streamable-HTTP transport (ignored for stdio).
    #[arg(long, default_value = "127.0.0.1:3179")]
    bind: String,

    /// Log level.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Skip automatic indexing on startup.
    #[arg(long)]
    no_auto_index: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let repo_path = PathBuf::from(&args.repo)
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(&args.repo));

    if !repo_path.exists() {
        bail!("repository path does not exist: {}", args.repo);
    }

    tracing::info!(repo = %repo_path.display(), index = %args.index, transport = %args.transport, "initializing MCP server");

    let data_root = paths::data_root();
    let config = Config::load(&data_root)?;
    let mut engine = Engine::open(&data_root, &args.index, &repo_path, config)?;

    if !args.no_auto_index {
        let status = engine.status()?;
        if status.file_count == 0 {
            tracing::info!("no existing index, running auto-index...");
            match engine.run_index(IndexMode::Create).await {
                Ok(report) => tracing::info!(
                    files = report.files_processed,
                    chunks = report.chunks_created,
                    "auto-index complete"
                ),
                Err(error) => tracing::warn!(%error, "auto-index failed"),
            }
        }
    }

    match args.transport.as_str() {
        "stdio" => run_stdio(engine).await,
        "sse" => run_http(engine, &args.bind).await,
        other => bail!("unsupported transport: {other}"),
    }
}

async fn run_stdio(engine: Engine) -> Result<()> {
    let server = OmniContextServer::new(engine);
    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    tracing::info!("MCP server ready on stdio");
    service.waiting().await?;
    Ok(())
}

#[cfg(feature = "sse")]
async fn run_http(engine: Engine, bind: &str) -> Result<()> {
    use std::sync::Arc;

    use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
    use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
    use tokio_util::sync::CancellationToken;

    // `OmniContextServer` already wraps the engine in an `Arc<Mutex<_>>`;
    // cloning it for each session shares the one resident engine.
    let server = OmniContextServer::new(engine);
    let service_factory = move || Ok(server.clone());

    let config = StreamableHttpServerConfig {
        sse_keep_alive: Some(std::time::Duration::from_secs(15)),
        stateful_mode: true,
        cancellation_token: CancellationToken::new(),
    };
    let mcp_service = StreamableHttpService::new(service_factory, Arc::new(LocalSessionManager::default()), config);

    let router = axum::Router::new().nest_service("/mcp", mcp_service);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %bind, "MCP server ready on streamable-HTTP");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(not(feature = "sse"))]
async fn run_http(_engine: Engine, _bind: &str) -> Result<()> {
    bail!("this build was compiled without the `sse` feature")
}
