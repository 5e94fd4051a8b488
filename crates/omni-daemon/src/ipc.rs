//! IPC transport layer for the OmniContext query server (spec.md §4.8).
//!
//! Uses named pipes on Windows and Unix domain sockets on Linux/macOS.
//! Communication is newline-delimited JSON-RPC 2.0 over the pipe; only one
//! server instance runs per index, and the presence of the socket file
//! implies liveness -- the server removes it on clean shutdown.
//!
//! ## Protocol
//!
//! Each message is a complete JSON object terminated by `\n`. The client
//! sends `Request` objects, the server responds with `Response` objects.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use omni_core::error::OmniError;
use omni_core::types::SymbolKind;
use omni_core::Engine;

use crate::protocol::{self, error_codes, Response};

/// Start the IPC server on `socket_path` and listen for client connections
/// until the process is asked to shut down. `engine` is shared with the
/// daemon's watch loop so both see a consistent, serialized view (§5).
pub async fn serve(engine: Arc<Mutex<Engine>>, socket_path: &Path) -> anyhow::Result<()> {
    #[cfg(windows)]
    {
        serve_named_pipe(engine, socket_path).await
    }

    #[cfg(not(windows))]
    {
        serve_unix_socket(engine, socket_path).await
    }
}

// ---------------------------------------------------------------------------
// Windows: Named Pipe server
// ---------------------------------------------------------------------------

#[cfg(windows)]
async fn serve_named_pipe(engine: Arc<Mutex<Engine>>, socket_path: &Path) -> anyhow::Result<()> {
    use tokio::net::windows::named_pipe::ServerOptions;

    let pipe_name = format!(r"\\.\pipe\{}", socket_path.display());
    tracing::info!(pipe = %pipe_name, "listening on named pipe");

    loop {
        let server = ServerOptions::new().first_pipe_instance(false).create(&pipe_name)?;
        server.connect().await?;
        tracing::info!("client connected");

        let engine = engine.clone();
        tokio::spawn(async move {
            let (reader, writer) = tokio::io::split(server);
            if let Err(error) = handle_client(engine, reader, writer).await {
                tracing::warn!(%error, "client handler error");
            }
            tracing::info!("client disconnected");
        });
    }
}

// ---------------------------------------------------------------------------
// Unix: Domain Socket server
// ---------------------------------------------------------------------------

#[cfg(not(windows))]
async fn serve_unix_socket(engine: Arc<Mutex<Engine>>, socket_path: &Path) -> anyhow::Result<()> {
    use tokio::net::UnixListener;

    // A stale socket file from an unclean shutdown would otherwise make
    // `bind` fail with `AddrInUse` (§4.9: presence implies liveness, but a
    // crashed server left a file behind with nothing listening).
    let _ = std::fs::remove_file(socket_path);
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let listener = UnixListener::bind(socket_path)?;
    tracing::info!(socket = %socket_path.display(), "listening on unix socket");

    let result = serve_unix_socket_loop(engine, &listener).await;
    let _ = std::fs::remove_file(socket_path);
    result
}

#[cfg(not(windows))]
async fn serve_unix_socket_loop(
    engine: Arc<Mutex<Engine>>,
    listener: &tokio::net::UnixListener,
) -> anyhow::Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        tracing::info!("client connected");

        let engine = engine.clone();
        tokio::spawn(async move {
            let (reader, writer) = tokio::io::split(stream);
            if let Err(error) = handle_client(engine, reader, writer).await {
                tracing::warn!(%error, "client handler error");
            }
            tracing::info!("client disconnected");
        });
    }
}

// ---------------------------------------------------------------------------
// Client handler (platform-agnostic)
// ---------------------------------------------------------------------------

/// Handle a single connected client: read newline-delimited JSON-RPC
/// requests, dispatch them against the shared engine, write back
/// responses. The server is read-only (§5): requests are serviced
/// concurrently across clients, serialised only by the engine's mutex.
async fn handle_client<R, W>(engine: Arc<Mutex<Engine>>, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<protocol::Request>(line) {
            Ok(req) => dispatch(&engine, req).await,
            Err(error) => {
                Response::error(0, error_codes::PARSE_ERROR, format!("invalid JSON-RPC: {error}"))
            }
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the matching `Engine` operation.
/// Method names and shapes follow spec.md §6 exactly.
async fn dispatch(engine: &Arc<Mutex<Engine>>, req: protocol::Request) -> Response {
    let start = std::time::Instant::now();

    // 30s response-rejection cap is enforced client-side (§4.8); the
    // server still logs slow requests for operators.
    let result = route(engine, &req).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::debug!(method = %req.method, elapsed_ms, "request handled");

    match result {
        Ok(value) => Response::success(req.id, value),
        Err(error) => Response::error(req.id, error.rpc_code() as i32, error.to_string()),
    }
}

async fn route(engine: &Arc<Mutex<Engine>>, req: &protocol::Request) -> Result<serde_json::Value, OmniError> {
    match req.method.as_str() {
        "ping" => {
            let eng = engine.lock().await;
            Ok(serde_json::json!({ "pong": true, "indexName": eng.index_name() }))
        }
        "stats" => handle_stats(engine).await,
        "parse" => handle_parse(parse_params(req)?),
        "search" => handle_search(engine, parse_params(req)?).await,
        "callers" => handle_callers(engine, parse_params(req)?).await,
        "impact" => handle_impact(engine, parse_params(req)?).await,
        "deps" => handle_deps(engine, parse_params(req)?).await,
        "dead" => handle_dead(engine, parse_params(req)?).await,
        "similar" => handle_similar(engine, parse_params(req)?).await,
        "cycles" => handle_cycles(engine).await,
        "symbols" => handle_symbols(engine, parse_params(req)?).await,
        other => Err(OmniError::InvalidInput { details: format!("unknown method: {other}") }),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(req: &protocol::Request) -> Result<T, OmniError> {
    let value = req.params.clone().unwrap_or_else(|| serde_json::Value::Object(Default::default()));
    serde_json::from_value(value)
        .map_err(|error| OmniError::InvalidInput { details: format!("invalid params: {error}") })
}

async fn handle_stats(engine: &Arc<Mutex<Engine>>) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let stats = eng.status()?;
    serde_json::to_value(stats).map_err(|e| OmniError::Serialization(e.to_string()))
}

fn handle_parse(params: protocol::ParseParams) -> Result<serde_json::Value, OmniError> {
    let parsed = omni_core::search::command::parse(&params.query);
    serde_json::to_value(parsed).map_err(|e| OmniError::Serialization(e.to_string()))
}

async fn handle_search(
    engine: &Arc<Mutex<Engine>>,
    params: protocol::SearchParams,
) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let results = eng.search(&params.query, params.limit, params.diversity)?;
    serde_json::to_value(results).map_err(|e| OmniError::Serialization(e.to_string()))
}

async fn handle_callers(
    engine: &Arc<Mutex<Engine>>,
    params: protocol::CallersParams,
) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let results = eng.callers(&params.symbol)?;
    serde_json::to_value(results).map_err(|e| OmniError::Serialization(e.to_string()))
}

async fn handle_impact(
    engine: &Arc<Mutex<Engine>>,
    params: protocol::ImpactParams,
) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let result = eng.impact(&params.symbol, params.depth)?;
    serde_json::to_value(result).map_err(|e| OmniError::Serialization(e.to_string()))
}

async fn handle_deps(
    engine: &Arc<Mutex<Engine>>,
    params: protocol::DepsParams,
) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let deps = eng.dependencies(Path::new(&params.file))?;
    serde_json::to_value(deps).map_err(|e| OmniError::Serialization(e.to_string()))
}

async fn handle_dead(
    engine: &Arc<Mutex<Engine>>,
    params: protocol::DeadParams,
) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let kind = params.kind.as_deref().map(SymbolKind::from_str_lossy);
    let results = eng.dead(kind)?;
    serde_json::to_value(results).map_err(|e| OmniError::Serialization(e.to_string()))
}

async fn handle_similar(
    engine: &Arc<Mutex<Engine>>,
    params: protocol::SimilarParams,
) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let results = eng.similar(params.limit)?;
    serde_json::to_value(results).map_err(|e| OmniError::Serialization(e.to_string()))
}

async fn handle_cycles(engine: &Arc<Mutex<Engine>>) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let cycles = eng.cycles()?;
    serde_json::to_value(cycles).map_err(|e| OmniError::Serialization(e.to_string()))
}

async fn handle_symbols(
    engine: &Arc<Mutex<Engine>>,
    params: protocol::SymbolsParams,
) -> Result<serde_json::Value, OmniError> {
    let eng = engine.lock().await;
    let kind = params.kind.as_deref().map(SymbolKind::from_str_lossy);
    let file = params.file.as_deref().map(Path::new);
    let results = eng.symbols(kind, file, params.exported)?;
    serde_json::to_value(results).map_err(|e| OmniError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_params_defaults_when_absent() {
        let req = protocol::Request {
            jsonrpc: "2.0".into(),
            id: 1,
            method: "dead".into(),
            params: None,
        };
        let params: protocol::DeadParams = parse_params(&req).expect("defaults");
        assert!(params.kind.is_none());
    }

    #[test]
    fn parse_params_rejects_malformed_value() {
        let req = protocol::Request {
            jsonrpc: "2.0".into(),
            id: 1,
            method: "search".into(),
            params: Some(serde_json::json!({ "limit": "not-a-number" })),
        };
        let result: Result<protocol::SearchParams, OmniError> = parse_params(&req);
        assert!(result.is_err());
    }
}
