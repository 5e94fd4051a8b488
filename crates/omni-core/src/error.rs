//! Error types for omni-core.
//!
//! The variants mirror the error taxonomy (kinds, not concrete Rust types)
//! that the rest of the engine reasons about: callers pattern-match on the
//! kind to decide whether to retry, surface to a user, or keep the run
//! going. `Database`/`Io` wrap the two external error types the store and
//! the file-system layer actually produce.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all omni-core operations.
#[derive(Debug, Error)]
pub enum OmniError {
    /// Index, symbol, or file not present.
    #[error("not found: {entity}")]
    NotFound {
        /// Description of what was not found.
        entity: String,
    },

    /// Creating an index or daemon that already exists.
    #[error("already exists: {entity}")]
    AlreadyExists {
        /// Description of what already exists.
        entity: String,
    },

    /// Bad config value, malformed query, rename with missing operands.
    #[error("invalid input: {details}")]
    InvalidInput {
        /// What's wrong with the input.
        details: String,
    },

    /// Syntax tree unavailable for a file. Non-fatal; attached to that
    /// file's error list by the indexer and the run continues.
    #[error("parse failure for {path}: {message}")]
    ParseFailure {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// Backing table cannot be opened or written. Fatal to the current
    /// operation.
    #[error("store error: {details}")]
    StoreError {
        /// Diagnostic details.
        details: String,
    },

    /// Embedding call failed after retry. Attached to the failing chunk
    /// and counted as skipped; the run continues.
    #[error("embedding provider error (after {attempts} attempts): {message}")]
    ProviderError {
        /// Number of attempts made before surfacing.
        attempts: u32,
        /// Human-readable error description.
        message: String,
    },

    /// RPC request exceeded the 30s response cap.
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout {
        /// Elapsed time before the timeout fired.
        elapsed_ms: u64,
    },

    /// Shutdown signal arrived during a cancellable operation.
    #[error("operation cancelled")]
    Cancelled,

    /// SQLite error, wrapped as-is.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error, wrapped as-is.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Condition that should not be reachable given the invariants above.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OmniError {
    /// JSON-RPC error code for this kind, for the query server's envelope.
    ///
    /// Uses the reserved JSON-RPC range for parse/invalid-request/method
    /// errors (handled before a `OmniError` even exists) and the
    /// implementation-defined `-32000..-32099` band for everything else.
    pub fn rpc_code(&self) -> i64 {
        match self {
            Self::NotFound { .. } => -32001,
            Self::AlreadyExists { .. } => -32002,
            Self::InvalidInput { .. } => -32602,
            Self::ParseFailure { .. } => -32003,
            Self::StoreError { .. } => -32004,
            Self::ProviderError { .. } => -32005,
            Self::Timeout { .. } => -32006,
            Self::Cancelled => -32007,
            Self::Database(_) | Self::Io(_) | Self::Serialization(_) | Self::Internal(_) => {
                -32000
            }
        }
    }

    /// Exit code for command-line wrappers, per the external interfaces:
    /// 0 success, 1 user error, 2 operational failure, 130 on interrupt.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::AlreadyExists { .. } | Self::InvalidInput { .. } => 1,
            Self::Cancelled => 130,
            _ => 2,
        }
    }
}

/// Convenience type alias for Results in omni-core.
pub type OmniResult<T> = Result<T, OmniError>;
