//! JSON-RPC protocol types for daemon IPC.
//!
//! All communication between a client and the daemon uses
//! newline-delimited JSON-RPC 2.0 messages over a Unix domain socket
//! (named pipe on Windows). Methods map 1:1 onto `omni_core::Engine`
//! operations (spec.md §6): `ping`, `search`, `callers`, `impact`, `deps`,
//! `dead`, `similar`, `cycles`, `symbols`, `stats`, plus `parse`, which
//! turns a free-text query into a structured command without running it.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Request ID for correlating responses.
    pub id: u64,
    /// Method name.
    pub method: String,
    /// Method parameters (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Request ID this response corresponds to.
    pub id: u64,
    /// Successful result (mutually exclusive with `error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error result (mutually exclusive with `result`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Response {
    /// Create a success response.
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self { jsonrpc: "2.0".into(), id, result: Some(result), error: None }
    }

    /// Create an error response.
    pub fn error(id: u64, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(RpcError { code, message: message.into(), data: None }),
        }
    }
}

// ---------------------------------------------------------------------------
// Method-specific parameter types (spec.md §6)
// ---------------------------------------------------------------------------

/// Parameters for the `parse` method: turns free text into a structured
/// `{command, args}` pair without executing it (spec.md §8 scenario 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseParams {
    /// The free-text query to parse.
    pub query: String,
}

/// Parameters for the `search` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// The search query.
    pub query: String,
    /// Maximum results.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// MMR diversity weight in `[0, 1]`; omitted or 0 disables diversification.
    #[serde(default)]
    pub diversity: f64,
}

/// Parameters for the `callers` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallersParams {
    /// Symbol name to find callers of.
    pub symbol: String,
}

/// Parameters for the `impact` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactParams {
    /// Name of the symbol whose change impact is being assessed.
    pub symbol: String,
    /// Traversal depth.
    #[serde(default = "default_depth")]
    pub depth: usize,
}

/// Parameters for the `deps` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepsParams {
    /// Path of the file, relative to the index root.
    pub file: String,
}

/// Parameters for the `dead` method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadParams {
    /// Restrict results to this symbol kind.
    #[serde(default)]
    pub kind: Option<String>,
}

/// Parameters for the `similar` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarParams {
    /// Symbol name to find near-duplicates of (currently unused beyond
    /// capping the result set; clusters are computed over the whole
    /// index, per `Engine::similar`).
    #[serde(default)]
    pub symbol: Option<String>,
    /// Maximum clusters returned.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Parameters for the `symbols` method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolsParams {
    /// Restrict results to this symbol kind.
    #[serde(default)]
    pub kind: Option<String>,
    /// Restrict results to this file, relative to the index root.
    #[serde(default)]
    pub file: Option<String>,
    /// Restrict results to exported (or non-exported) symbols.
    #[serde(default)]
    pub exported: Option<bool>,
}

fn default_limit() -> usize {
    10
}

fn default_depth() -> usize {
    3
}

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Standard JSON-RPC error codes, plus the implementation-defined band
/// used to surface `OmniError::rpc_code()`.
pub mod error_codes {
    /// Invalid JSON was received by the server.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
}
