//! Integration tests for MCP tool handlers.
//!
//! These tests create a real Engine backed by a tempdir, index test files,
//! and then exercise each MCP tool to verify correct behavior.
//!
//! Uses multi_thread flavor because Engine internally uses blocking I/O
//! (SQLite, file I/O) that must not run on the async executor.

use std::io::Write;

use omni_core::config::Config;
use omni_core::pipeline::{Engine, IndexMode};
use tempfile::TempDir;

/// Create a test engine with some sample files in a tempdir.
/// Engine creation must happen on a blocking thread because it
/// internally initializes SQLite and other blocking resources.
async fn create_test_engine() -> (Engine, TempDir) {
    let data_dir = TempDir::new().expect("create data dir");
    let repo_dir = TempDir::new().expect("create repo dir");
    let data_root = data_dir.path().to_path_buf();
    let repo_path = repo_dir.path().to_path_buf();

    let py_path = repo_path.join("auth.py");
    let mut f = std::fs::File::create(&py_path).unwrap();
    writeln!(
        f,
        r#""""Authentication module."""

class AuthService:
    """Handles user authentication and authorization."""

    def __init__(self, db):
        self.db = db
        self.token_expiry = 3600

    def validate_token(self, token: str) -> bool:
        """Validate a JWT token.

        Args:
            token: The JWT token string to validate.

        Returns:
            True if the token is valid, False otherwise.
        """
        if not token:
            return False
        return self.db.check_token(token)

    def login(self, username: str, password: str) -> str:
        """Authenticate a user and return a session token."""
        user = self.db.find_user(username)
        if user and user.check_password(password):
            return self.db.create_token(user)
        raise ValueError("Invalid credentials")

def create_auth_middleware(config):
    """Factory function for auth middleware."""
    return AuthService(config.db)
"#
    )
    .unwrap();

    let rs_path = repo_path.join("config.rs");
    let mut f = std::fs::File::create(&rs_path).unwrap();
    writeln!(
        f,
        r#"//! Configuration loading.

use std::path::PathBuf;

/// Application configuration.
pub struct Config {{
    pub db_path: PathBuf,
    pub port: u16,
    pub debug: bool,
}}

impl Config {{
    /// Create default configuration.
    pub fn default() -> Self {{
        Self {{
            db_path: PathBuf::from("data.db"),
            port: 8080,
            debug: false,
        }}
    }}
}}
"#
    )
    .unwrap();

    let engine = tokio::task::spawn_blocking(move || {
        let config = Config::default();
        Engine::open(&data_root, "test", &repo_path, config).expect("open engine")
    })
    .await
    .expect("spawn_blocking join");

    (engine, repo_dir)
}

/// Create an engine and run indexing on the test files.
async fn create_indexed_engine() -> (Engine, TempDir) {
    let (mut engine, dir) = create_test_engine().await;
    engine.run_index(IndexMode::Create).await.expect("index test files");
    (engine, dir)
}

// ---- Tests ----

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_engine_indexes_test_files() {
    let (engine, _dir) = create_indexed_engine().await;
    let status = engine.status().expect("get status");
    assert!(status.file_count >= 2, "should index at least 2 files, got {}", status.file_count);
    assert!(status.chunk_count > 0, "should create chunks");
    assert!(status.symbol_count > 0, "should extract symbols");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_finds_relevant_code() {
    let (engine, _dir) = create_indexed_engine().await;

    let results = engine.search("authentication", 5, 0.0).expect("search");
    assert!(!results.is_empty(), "should find results for 'authentication'");

    let has_auth_file = results.iter().any(|r| r.chunk.rel_path.to_string_lossy().contains("auth"));
    assert!(has_auth_file, "should find auth.py in results");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_by_symbol_name() {
    let (engine, _dir) = create_indexed_engine().await;

    let results = engine.search("validate_token", 5, 0.0).expect("search");
    assert!(!results.is_empty(), "should find results for 'validate_token'");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_empty_query() {
    let (engine, _dir) = create_indexed_engine().await;

    let results = engine.search("", 5, 0.0).expect("empty search");
    let _ = results;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_no_match() {
    let (engine, _dir) = create_indexed_engine().await;

    let results = engine.search("xyzzy_nonexistent_symbol_12345", 5, 0.0).expect("search");
    assert!(results.is_empty(), "should find no results for gibberish query");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_reports_correct_counts() {
    let (engine, _dir) = create_indexed_engine().await;
    let status = engine.status().expect("get status");

    assert!(status.file_count >= 2);
    assert!(status.chunk_count > 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_on_empty_engine() {
    let (engine, _dir) = create_test_engine().await;
    let status = engine.status().expect("get status");

    assert_eq!(status.file_count, 0);
    assert_eq!(status.chunk_count, 0);
    assert_eq!(status.symbol_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_index_produces_symbols() {
    let (engine, _dir) = create_indexed_engine().await;
    let status = engine.status().expect("get status");

    assert!(status.symbol_count >= 3, "should extract at least 3 symbols, got {}", status.symbol_count);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reindex_is_idempotent() {
    let (mut engine, _dir) = create_indexed_engine().await;
    let status1 = engine.status().expect("first status");

    engine.run_index(IndexMode::Update).await.expect("re-index");
    let status2 = engine.status().expect("second status");

    assert_eq!(status1.file_count, status2.file_count, "re-index should not duplicate files");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_respects_limit() {
    let (engine, _dir) = create_indexed_engine().await;

    let results = engine.search("token", 1, 0.0).expect("search with limit 1");
    assert!(results.len() <= 1, "should respect limit of 1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_symbol_lookup() {
    let (engine, _dir) = create_indexed_engine().await;

    let symbols = engine.store().find_symbols_by_name("validate_token", 5).expect("symbol lookup");
    assert!(!symbols.is_empty(), "should find validate_token symbol");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_summary_lists_chunks_and_symbols() {
    let (engine, _dir) = create_indexed_engine().await;

    let file = engine
        .store()
        .get_file_by_rel_path(std::path::Path::new("auth.py"))
        .expect("lookup")
        .expect("auth.py should be indexed");
    let chunks = engine.store().get_chunks_for_file(file.id).expect("chunks");
    assert!(!chunks.is_empty());

    let symbols = engine.symbols(None, Some(std::path::Path::new("auth.py")), None).expect("symbols");
    assert!(!symbols.is_empty(), "auth.py should have extracted symbols");
}
