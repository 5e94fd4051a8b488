//! Configuration loading and validation.
//!
//! Configuration is resolved with the following precedence (highest wins):
//!
//! 1. Environment variables (`OMNICONTEXT_*`)
//! 2. Repository-local override (`.lgrep.json`, index/root pinning only)
//! 3. User configuration (`<data-root>/config.json`)
//! 4. Compiled-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{OmniError, OmniResult};
use crate::paths;

/// Top-level configuration for OmniContext.
///
/// Field names use `camelCase` on the wire to match the documented
/// `config.json` keys exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Embedding model identifier.
    #[serde(default = "Config::default_model")]
    pub model: String,

    /// Maximum chunk size in characters.
    #[serde(default = "Config::default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunk windows, in characters.
    #[serde(default = "Config::default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Maximum file size to index, in bytes. Larger files are skipped.
    #[serde(default = "Config::default_max_file_size")]
    pub max_file_size: u64,

    /// Glob patterns to exclude from indexing, in addition to built-ins
    /// (`node_modules`, `.git`, `dist`, `build`, dotfiles).
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Additional glob patterns whose matches are never chunked or
    /// embedded, even if otherwise included (secrets, credentials, etc.).
    #[serde(default)]
    pub secret_excludes: Vec<String>,

    /// Maximum number of files included in an assembled context window.
    #[serde(default = "Config::default_context_file_limit")]
    pub context_file_limit: usize,

    /// Token budget for an assembled context window.
    #[serde(default = "Config::default_context_max_tokens")]
    pub context_max_tokens: u32,

    /// Graph traversal depth used to pull in neighbor chunks during
    /// context assembly.
    #[serde(default = "Config::default_context_graph_depth")]
    pub context_graph_depth: usize,

    /// Embedding provider settings (ambient; not an externally documented
    /// config key but configurable through the same file/env layering).
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// File watcher settings (ambient).
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Logging settings (ambient).
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    fn default_model() -> String {
        crate::embedder::model_manager::DEFAULT_MODEL.name.to_string()
    }
    fn default_chunk_size() -> usize {
        1200
    }
    fn default_chunk_overlap() -> usize {
        200
    }
    fn default_max_file_size() -> u64 {
        1_048_576
    }
    fn default_context_file_limit() -> usize {
        15
    }
    fn default_context_max_tokens() -> u32 {
        32_000
    }
    fn default_context_graph_depth() -> usize {
        2
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            chunk_size: Self::default_chunk_size(),
            chunk_overlap: Self::default_chunk_overlap(),
            max_file_size: Self::default_max_file_size(),
            excludes: Vec::new(),
            secret_excludes: Vec::new(),
            context_file_limit: Self::default_context_file_limit(),
            context_max_tokens: Self::default_context_max_tokens(),
            context_graph_depth: Self::default_context_graph_depth(),
            embedding: EmbeddingConfig::default(),
            watcher: WatcherConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingConfig {
    /// Manual override for the model file; if it exists on disk it is
    /// used as-is instead of the auto-managed cache under the data root.
    #[serde(default)]
    pub model_path: PathBuf,
    /// Output embedding dimensions, matching the resolved model spec.
    #[serde(default = "EmbeddingConfig::default_dimensions")]
    pub dimensions: usize,
    /// Batch size for embedding inference.
    #[serde(default = "EmbeddingConfig::default_batch_size")]
    pub batch_size: usize,
    /// Maximum sequence length for the tokenizer.
    #[serde(default = "EmbeddingConfig::default_max_seq_length")]
    pub max_seq_length: usize,
    /// Maximum number of in-flight embedding requests (backpressure cap).
    #[serde(default = "EmbeddingConfig::default_max_in_flight")]
    pub max_in_flight: usize,
}

impl EmbeddingConfig {
    fn default_dimensions() -> usize {
        crate::embedder::model_manager::DEFAULT_MODEL.dimensions
    }
    fn default_batch_size() -> usize {
        32
    }
    fn default_max_seq_length() -> usize {
        512
    }
    fn default_max_in_flight() -> usize {
        8
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            dimensions: Self::default_dimensions(),
            batch_size: Self::default_batch_size(),
            max_seq_length: Self::default_max_seq_length(),
            max_in_flight: Self::default_max_in_flight(),
        }
    }
}

/// File watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherConfig {
    /// Debounce interval in milliseconds (§4.7 specifies 1,500ms).
    #[serde(default = "WatcherConfig::default_debounce_ms")]
    pub debounce_ms: u64,
}

impl WatcherConfig {
    fn default_debounce_ms() -> u64 {
        1_500
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Self::default_debounce_ms(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// Whether to output logs as JSON.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".into()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

/// The repository-local override file, `.lgrep.json`, searched from the
/// current directory upward. Pins an index name and/or a root directory;
/// it is not a general configuration overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOverride {
    /// Pins the index name to use, bypassing auto-detection.
    #[serde(default)]
    pub index: Option<String>,
    /// Pins the root directory, resolved relative to the file itself.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

const OVERRIDE_FILE_NAME: &str = ".lgrep.json";

/// Search `start_dir` and its ancestors for `.lgrep.json`.
///
/// Returns the parsed override plus the directory it was found in (so
/// `root` can be resolved relative to it).
pub fn find_repo_override(start_dir: &Path) -> OmniResult<Option<(RepoOverride, PathBuf)>> {
    let mut dir = Some(start_dir);
    while let Some(d) = dir {
        let candidate = d.join(OVERRIDE_FILE_NAME);
        if candidate.is_file() {
            let content = std::fs::read_to_string(&candidate)?;
            let parsed: RepoOverride = serde_json::from_str(&content).map_err(|e| {
                OmniError::InvalidInput {
                    details: format!("malformed {OVERRIDE_FILE_NAME} at {}: {e}", candidate.display()),
                }
            })?;
            return Ok(Some((parsed, d.to_path_buf())));
        }
        dir = d.parent();
    }
    Ok(None)
}

impl Config {
    /// Load configuration: defaults, then the user config file under the
    /// data root, then environment overrides.
    pub fn load(data_root: &Path) -> OmniResult<Self> {
        let mut config = Self::default();

        let user_config_path = paths::config_path(data_root);
        if user_config_path.is_file() {
            config.merge_from_file(&user_config_path)?;
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Overlay values from `<data-root>/config.json`.
    fn merge_from_file(&mut self, path: &Path) -> OmniResult<()> {
        let content = std::fs::read_to_string(path)?;
        let overlay: Config = serde_json::from_str(&content).map_err(|e| OmniError::InvalidInput {
            details: format!("invalid config at {}: {e}", path.display()),
        })?;
        *self = overlay;
        Ok(())
    }

    /// Apply `OMNICONTEXT_*` environment variable overrides.
    ///
    /// Numeric keys parse as base-10 integers; list keys parse as
    /// comma-separated trimmed strings, per the external interfaces.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("OMNICONTEXT_MODEL") {
            self.model = v;
        }
        if let Ok(v) = std::env::var("OMNICONTEXT_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("OMNICONTEXT_CHUNK_SIZE") {
            if let Ok(n) = v.parse() {
                self.chunk_size = n;
            }
        }
        if let Ok(v) = std::env::var("OMNICONTEXT_CHUNK_OVERLAP") {
            if let Ok(n) = v.parse() {
                self.chunk_overlap = n;
            }
        }
        if let Ok(v) = std::env::var("OMNICONTEXT_MAX_FILE_SIZE") {
            if let Ok(n) = v.parse() {
                self.max_file_size = n;
            }
        }
        if let Ok(v) = std::env::var("OMNICONTEXT_EXCLUDES") {
            self.excludes = split_csv(&v);
        }
        if let Ok(v) = std::env::var("OMNICONTEXT_SECRET_EXCLUDES") {
            self.secret_excludes = split_csv(&v);
        }
        if let Ok(v) = std::env::var("OMNICONTEXT_MODEL_PATH") {
            self.embedding.model_path = PathBuf::from(v);
        }
    }
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 1200);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.max_file_size, 1_048_576);
        assert_eq!(config.context_file_limit, 15);
        assert_eq!(config.context_max_tokens, 32_000);
        assert_eq!(config.context_graph_depth, 2);
    }

    #[test]
    fn merge_from_file_replaces_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"chunkSize": 2000, "chunkOverlap": 300}"#).unwrap();
        let mut config = Config::default();
        config.merge_from_file(&path).expect("merge");
        assert_eq!(config.chunk_size, 2000);
        assert_eq!(config.chunk_overlap, 300);
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut config = Config::default();
        std::env::set_var("OMNICONTEXT_CHUNK_SIZE", "77");
        config.apply_env_overrides();
        std::env::remove_var("OMNICONTEXT_CHUNK_SIZE");
        assert_eq!(config.chunk_size, 77);
    }

    #[test]
    fn no_override_file_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = find_repo_override(dir.path()).expect("search");
        assert!(result.is_none());
    }

    #[test]
    fn override_file_is_found_and_parsed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(OVERRIDE_FILE_NAME), r#"{"index": "myindex"}"#).unwrap();
        let (found, at) = find_repo_override(&nested).expect("search").expect("found");
        assert_eq!(found.index.as_deref(), Some("myindex"));
        assert_eq!(at, dir.path());
    }
}
