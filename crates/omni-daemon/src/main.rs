//! `OmniContext` Daemon -- persistent background engine with IPC (spec.md §4.8).
//!
//! Keeps one named index's `Engine` resident and exposes it over a local
//! JSON-RPC 2.0 socket (Unix domain socket, or a named pipe on Windows).
//! Auto-indexes on startup unless told not to, then watches the repository
//! for changes (§4.7) while serving queries until a shutdown signal arrives
//! (§4.9: `absent -> running -> stopped`).

mod ipc;
mod protocol;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::sync::Mutex;

use omni_core::config::Config;
use omni_core::paths;
use omni_core::pipeline::{Engine, IndexMode};
use omni_core::types::PipelineEvent;
use omni_core::watcher::{ExcludeMatcher, FileWatcher};

/// `OmniContext` Daemon -- persistent background engine
#[derive(Parser, Debug)]
#[command(
    name = "omnicontext-daemon",
    version,
    about = "Persistent background engine with IPC interface"
)]
struct Args {
    /// Path to the repository to serve.
    #[arg(long, default_value = ".")]
    repo: String,

    /// Name of the index to serve.
    #[arg(long, default_value = "default")]
    index: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Skip automatic indexing on startup.
    #[arg(long)]
    no_auto_index: bool,

    /// Skip the filesystem watcher; serve a static snapshot of the index.
    #[arg(long)]
    no_watch: bool,
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

    tracing::info!(repo = %repo_path.display(), index = %args.index, "initializing daemon engine");

    let data_root = paths::data_root();
    let config = Config::load(&data_root)?;
    let mut engine = Engine::open(&data_root, &args.index, &repo_path, config)?;

    if !args.no_auto_index {
        let status = engine.status()?;
        if status.file_count == 0 {
            tracing::info!("no existing index, running auto-index...");
            let start = std::time::Instant::now();
            match engine.run_index(IndexMode::Create).await {
                Ok(report) => {
                    tracing::info!(
                        files = report.files_processed,
                        chunks = report.chunks_created,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "auto-index complete"
                    );
                }
                Err(error) => {
                    tracing::warn!(%error, "auto-index failed");
                }
            }
        } else {
            tracing::info!(files = status.file_count, "using existing index");
        }
    }

    let socket_path = paths::socket_path(&data_root, &args.index);
    write_pid_file(&data_root, &args.index, &repo_path)?;

    let engine = Arc::new(Mutex::new(engine));

    let watch_handle = if args.no_watch {
        None
    } else {
        Some(tokio::spawn(run_watch_loop(engine.clone(), repo_path.clone())))
    };

    tracing::info!(socket = %socket_path.display(), "starting IPC server");
    let serve_engine = engine.clone();
    let mut serve_task = tokio::spawn(async move { ipc::serve(serve_engine, &socket_path).await });

    let shutdown_reason = tokio::select! {
        result = &mut serve_task => {
            match result {
                Ok(Ok(())) => "ipc server stopped",
                Ok(Err(error)) => {
                    tracing::warn!(%error, "ipc server failed");
                    "ipc server error"
                }
                Err(error) => {
                    tracing::warn!(%error, "ipc server task panicked");
                    "ipc server panic"
                }
            }
        }
        () = wait_for_shutdown_signal() => {
            serve_task.abort();
            "shutdown signal"
        }
    };
    tracing::info!(reason = shutdown_reason, "shutting down");

    if let Some(handle) = watch_handle {
        handle.abort();
    }

    // §5 Cancellation: flush the debouncer with one bounded final reindex
    // before exiting, so in-flight changes are not lost on shutdown.
    {
        let mut eng = engine.lock().await;
        if let Err(error) = eng.run_index(IndexMode::Update).await {
            tracing::warn!(%error, "final flush reindex failed");
        }
    }

    let _ = std::fs::remove_file(paths::pid_file_path(&data_root, &args.index));
    tracing::info!("daemon shut down");
    Ok(())
}

/// Resolve once SIGTERM or SIGINT (Ctrl-C) arrives. Exits 0 either way
/// (§5), leaving the specific exit-code mapping to the caller's shell.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
                unreachable!()
            }
        };
        tokio::select! {
            _ = terminate.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Watch the repository for changes and trigger an incremental reindex
/// after the filesystem goes idle (§4.7). A second debounce layer sits on
/// top of `FileWatcher`'s own `notify-debouncer-mini` window: overlapping
/// batches (events that land while a reindex is already running) coalesce
/// into the next cycle rather than triggering concurrent indexer runs.
async fn run_watch_loop(engine: Arc<Mutex<Engine>>, repo_path: PathBuf) {
    let (config, debounce_ms) = {
        let eng = engine.lock().await;
        let cfg = eng.config().clone();
        let ms = cfg.watcher.debounce_ms;
        (cfg, ms)
    };

    let exclude = match ExcludeMatcher::new(&config.excludes) {
        Ok(matcher) => matcher,
        Err(error) => {
            tracing::warn!(%error, "failed to build watcher exclude set, watcher disabled");
            return;
        }
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel::<PipelineEvent>(256);
    let watcher = FileWatcher::new(&repo_path, &config.watcher, exclude);

    tokio::spawn(async move {
        if let Err(error) = watcher.watch(tx).await {
            tracing::warn!(%error, "file watcher stopped");
        }
    });

    while let Some(_first_event) = rx.recv().await {
        // Drain whatever else arrives within the debounce window so a
        // burst of saves collapses into a single indexer run.
        loop {
            match tokio::time::timeout(Duration::from_millis(debounce_ms), rx.recv()).await {
                Ok(Some(_more)) => continue,
                Ok(None) | Err(_) => break,
            }
        }

        let start = std::time::Instant::now();
        let mut eng = engine.lock().await;
        match eng.run_index(IndexMode::Update).await {
            Ok(report) if report.files_added + report.files_updated + report.files_deleted > 0 => {
                tracing::info!(
                    added = report.files_added,
                    updated = report.files_updated,
                    deleted = report.files_deleted,
                    chunks = report.chunks_created,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "incremental reindex complete"
                );
            }
            Ok(_) => {}
            Err(error) => tracing::warn!(%error, "incremental reindex failed"),
        }
    }
}

/// Write `<root>/pids/<index>.pid` with `{pid, root_path, started_at}`
/// (spec.md §6), so `status`/`list` tooling can detect a live daemon
/// without connecting to its socket.
fn write_pid_file(data_root: &std::path::Path, index_name: &str, repo_path: &std::path::Path) -> Result<()> {
    let pid_path = paths::pid_file_path(data_root, index_name);
    if let Some(parent) = pid_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::json!({
        "pid": std::process::id(),
        "root_path": repo_path,
        "started_at": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    });
    std::fs::write(pid_path, serde_json::to_vec_pretty(&body)?)?;
    Ok(())
}
