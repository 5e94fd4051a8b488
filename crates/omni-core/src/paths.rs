//! Path/Store Layout.
//!
//! Resolves the per-user data root and the per-index directories that live
//! under it. The data root honours an environment override
//! (`OMNICONTEXT_HOME`) before falling back to the OS-conventional
//! application-data directory (`dirs::data_dir()`, which in turn honours
//! `XDG_DATA_HOME` on Linux).
//!
//! ```text
//! <root>/db/<index-name>/…          vector+graph tables
//! <root>/config.json                 user configuration
//! <root>/cache/                      embedding cache
//! <root>/pids/<index>.pid            daemon pid file
//! <root>/logs/<index>.log            daemon log (append)
//! <root>/sockets/<index>.sock        query-server socket
//! ```

use std::path::{Path, PathBuf};

const HOME_ENV_VAR: &str = "OMNICONTEXT_HOME";

/// Resolves the data root directory, creating it if necessary.
pub fn data_root() -> PathBuf {
    if let Ok(override_path) = std::env::var(HOME_ENV_VAR) {
        if !override_path.is_empty() {
            return PathBuf::from(override_path);
        }
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("omnicontext")
}

/// Path to the user configuration file, `<root>/config.json`.
pub fn config_path(root: &Path) -> PathBuf {
    root.join("config.json")
}

/// Path to the shared embedding cache directory, `<root>/cache/`.
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join("cache")
}

/// Path to the cache's SQLite database file.
pub fn cache_db_path(root: &Path) -> PathBuf {
    cache_dir(root).join("embeddings.db3")
}

/// Directory holding one subdirectory per named index, `<root>/db/`.
pub fn db_dir(root: &Path) -> PathBuf {
    root.join("db")
}

/// Directory for a single named index's store, `<root>/db/<index-name>/`.
pub fn index_dir(root: &Path, index_name: &str) -> PathBuf {
    db_dir(root).join(index_name)
}

/// Path to a single index's SQLite database file.
pub fn index_db_path(root: &Path, index_name: &str) -> PathBuf {
    index_dir(root, index_name).join("index.db3")
}

/// Path to a daemon's pid file, `<root>/pids/<index>.pid`.
pub fn pid_file_path(root: &Path, index_name: &str) -> PathBuf {
    root.join("pids").join(format!("{index_name}.pid"))
}

/// Path to a daemon's append-only log file, `<root>/logs/<index>.log`.
pub fn log_file_path(root: &Path, index_name: &str) -> PathBuf {
    root.join("logs").join(format!("{index_name}.log"))
}

/// Path to a query server's local socket, `<root>/sockets/<index>.sock`.
pub fn socket_path(root: &Path, index_name: &str) -> PathBuf {
    root.join("sockets").join(format!("{index_name}.sock"))
}

/// Ensures every directory in the data-root layout exists.
pub fn ensure_layout(root: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(db_dir(root))?;
    std::fs::create_dir_all(cache_dir(root))?;
    std::fs::create_dir_all(root.join("pids"))?;
    std::fs::create_dir_all(root.join("logs"))?;
    std::fs::create_dir_all(root.join("sockets"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_env_override_wins() {
        // SAFETY: test-local, serialized by the test harness per-process env;
        // restored unconditionally before returning.
        let prev = std::env::var(HOME_ENV_VAR).ok();
        std::env::set_var(HOME_ENV_VAR, "/tmp/omni-test-root");
        assert_eq!(data_root(), PathBuf::from("/tmp/omni-test-root"));
        match prev {
            Some(v) => std::env::set_var(HOME_ENV_VAR, v),
            None => std::env::remove_var(HOME_ENV_VAR),
        }
    }

    #[test]
    fn layout_paths_are_nested_under_root() {
        let root = PathBuf::from("/tmp/omni-root");
        assert_eq!(config_path(&root), root.join("config.json"));
        assert_eq!(
            index_db_path(&root, "myidx"),
            root.join("db/myidx/index.db3")
        );
        assert_eq!(pid_file_path(&root, "myidx"), root.join("pids/myidx.pid"));
        assert_eq!(log_file_path(&root, "myidx"), root.join("logs/myidx.log"));
        assert_eq!(
            socket_path(&root, "myidx"),
            root.join("sockets/myidx.sock")
        );
    }
}
