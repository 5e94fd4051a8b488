//! MCP tool definitions for OmniContext.
//!
//! Each tool is annotated with `#[tool]` and exposes a code intelligence
//! capability to AI agents via the Model Context Protocol.
//!
//! ## Thread Safety
//!
//! `Engine` wraps a `rusqlite::Connection`, which is `!Sync`. We wrap it
//! in a `tokio::sync::Mutex` so that the MCP server can safely share it
//! across async tasks.

use std::path::Path;
use std::sync::Arc;

use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
    ErrorData as McpError,
    ServerHandler,
};
use serde::Deserialize;
use tokio::sync::Mutex;

use omni_core::Engine;

// -----------------------------------------------------------------------
// Parameter structs for each tool
// -----------------------------------------------------------------------

/// Parameters for search_code tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchCodeParams {
    /// Search query -- natural language or symbol name.
    pub query: String,
    /// Maximum number of results to return (default: 10).
    pub limit: Option<usize>,
    /// MMR diversity weight in `[0, 1]` (default: 0, no diversification).
    pub diversity: Option<f64>,
}

/// Parameters for get_symbol tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetSymbolParams {
    /// Symbol name or qualified name to look up.
    pub name: String,
    /// Maximum number of results (default: 5).
    pub limit: Option<usize>,
}

/// Parameters for get_file_summary tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetFileSummaryParams {
    /// File path relative to the index root.
    pub path: String,
}

/// Parameters for get_dependencies tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDependenciesParams {
    /// File path relative to the index root.
    pub file: String,
}

/// Parameters for find_patterns tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FindPatternsParams {
    /// Description of the pattern to find.
    pub pattern: String,
    /// Maximum number of examples to return (default: 5).
    pub limit: Option<usize>,
}

// -----------------------------------------------------------------------
// MCP Server
// -----------------------------------------------------------------------

/// OmniContext MCP Server.
///
/// Exposes code intelligence tools to AI coding agents.
#[derive(Clone)]
pub struct OmniContextServer {
    engine: Arc<Mutex<Engine>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OmniContextServer {
    /// Create a new MCP server backed by the given engine.
    pub fn new(engine: Engine) -> Self {
        Self { engine: Arc::new(Mutex::new(engine)), tool_router: Self::tool_router() }
    }

    #[tool(
        name = "search_code",
        description = "Search the codebase using hybrid retrieval (keyword + semantic). Returns ranked code chunks with file paths, scores, and source code. Use natural language queries like 'authentication middleware' or symbol names like 'validate_token'."
    )]
    async fn search_code(
        &self,
        params: Parameters<SearchCodeParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params.0.limit.unwrap_or(10);
        let diversity = params.0.diversity.unwrap_or(0.0);
        let query = &params.0.query;
        let engine = self.engine.lock().await;

        match engine.search(query, limit, diversity) {
            Ok(results) => {
                if results.is_empty() {
                    return Ok(CallToolResult::success(vec![Content::text(
                        "No results found. Make sure the repository has been indexed with `omnicontext index .`",
                    )]));
                }

                let mut output = String::new();
                for (i, result) in results.iter().enumerate() {
                    output.push_str(&format!(
                        "## Result {} (score: {:.4})\n**File**: {}\n**Lines**: {}-{}\n```\n{}\n```\n\n",
                        i + 1,
                        result.score,
                        result.chunk.rel_path.display(),
                        result.chunk.line_start,
                        result.chunk.line_end,
                        result.chunk.content,
                    ));
                }

                Ok(CallToolResult::success(vec![Content::text(output)]))
            }
            Err(e) => Err(McpError::internal_error(format!("search failed: {e}"), None)),
        }
    }

    #[tool(
        name = "get_symbol",
        description = "Look up a specific code symbol by name or qualified name. Returns its kind, location, signature, and doc comment. Examples: 'validate_token', 'AuthService.validate_token'."
    )]
    async fn get_symbol(
        &self,
        params: Parameters<GetSymbolParams>,
    ) -> Result<CallToolResult, McpError> {
        let name = &params.0.name;
        let limit = params.0.limit.unwrap_or(5);
        let engine = self.engine.lock().await;
        let store = engine.store();

        match store.find_symbols_by_name(name, limit) {
            Ok(symbols) if symbols.is_empty() => Ok(CallToolResult::success(vec![Content::text(
                format!("No symbol found matching '{name}'"),
            )])),
            Ok(symbols) => {
                let mut output = format!("## Symbols matching '{name}'\n\n");
                for sym in &symbols {
                    output.push_str(&format!(
                        "### {} ({})\n**File**: {}\n**Lines**: {}-{}\n",
                        sym.qualified_name,
                        sym.kind.as_str(),
                        sym.rel_path.display(),
                        sym.line_start,
                        sym.line_end,
                    ));
                    if let Some(ref sig) = sym.signature {
                        output.push_str(&format!("**Signature**: `{sig}`\n"));
                    }
                    if let Some(ref doc) = sym.doc {
                        output.push_str(&format!("**Doc**: {doc}\n"));
                    }
                    output.push('\n');
                }
                Ok(CallToolResult::success(vec![Content::text(output)]))
            }
            Err(e) => Err(McpError::internal_error(format!("symbol lookup failed: {e}"), None)),
        }
    }

    #[tool(
        name = "get_file_summary",
        description = "Get a structural summary of a file: its chunks, extracted symbols, and dependencies. Provide the file path relative to the index root."
    )]
    async fn get_file_summary(
        &self,
        params: Parameters<GetFileSummaryParams>,
    ) -> Result<CallToolResult, McpError> {
        let path = &params.0.path;
        let engine = self.engine.lock().await;
        let store = engine.store();
        let file_path = Path::new(path);

        match store.get_file_by_rel_path(file_path) {
            Ok(Some(file)) => {
                let mut output = format!(
                    "## File: {}\n**Language**: {}\n**Size**: {} bytes\n\n",
                    path, file.language, file.size
                );

                match store.get_chunks_for_file(file.id) {
                    Ok(chunks) => {
                        output.push_str(&format!("### Chunks ({})\n\n", chunks.len()));
                        for chunk in &chunks {
                            output.push_str(&format!(
                                "- L{}-L{} ({} tokens)\n",
                                chunk.line_start, chunk.line_end, chunk.token_count
                            ));
                        }
                    }
                    Err(e) => output.push_str(&format!("Error loading chunks: {e}\n")),
                }

                match engine.symbols(None, Some(file_path), None) {
                    Ok(symbols) if !symbols.is_empty() => {
                        output.push_str(&format!("\n### Symbols ({})\n\n", symbols.len()));
                        for sym in &symbols {
                            output.push_str(&format!(
                                "- **{}** ({}) L{}-L{}{}\n",
                                sym.qualified_name,
                                sym.kind.as_str(),
                                sym.line_start,
                                sym.line_end,
                                if sym.is_exported { " [exported]" } else { "" },
                            ));
                        }
                    }
                    Ok(_) => {}
                    Err(e) => output.push_str(&format!("\nError loading symbols: {e}\n")),
                }

                Ok(CallToolResult::success(vec![Content::text(output)]))
            }
            Ok(None) => Ok(CallToolResult::success(vec![Content::text(format!(
                "File not found in index: '{path}'"
            ))])),
            Err(e) => Err(McpError::internal_error(format!("file lookup failed: {e}"), None)),
        }
    }

    #[tool(
        name = "get_status",
        description = "Get the current status of the OmniContext index: indexed files, chunks, symbols, dependencies, and vectors."
    )]
    async fn get_status(&self) -> Result<CallToolResult, McpError> {
        let engine = self.engine.lock().await;
        match engine.status() {
            Ok(s) => {
                let output = format!(
                    "## OmniContext Status\n\n\
                     - Files: {}\n- Chunks: {}\n- Symbols: {}\n\
                     - Dependencies: {}\n- Calls: {}\n- Vectors: {}\n- Has cycles: {}\n",
                    s.file_count,
                    s.chunk_count,
                    s.symbol_count,
                    s.dependency_count,
                    s.call_count,
                    s.vector_count,
                    s.has_cycles,
                );
                Ok(CallToolResult::success(vec![Content::text(output)]))
            }
            Err(e) => Err(McpError::internal_error(format!("status failed: {e}"), None)),
        }
    }

    #[tool(
        name = "get_dependencies",
        description = "Get module-level dependencies declared in a file, plus its blast radius (direct and transitive dependents). Provide the file path relative to the index root."
    )]
    async fn get_dependencies(
        &self,
        params: Parameters<GetDependenciesParams>,
    ) -> Result<CallToolResult, McpError> {
        let file_path = Path::new(&params.0.file);
        let engine = self.engine.lock().await;

        let deps = match engine.dependencies(file_path) {
            Ok(deps) => deps,
            Err(e) => return Err(McpError::internal_error(format!("dependency lookup failed: {e}"), None)),
        };
        // Blast radius is file-level here (the MCP params take a file path,
        // not a symbol), so it's computed directly off the dependency graph
        // rather than through `Engine::impact`, which resolves a symbol name.
        let blast_radius = match engine.dependency_graph() {
            Ok(graph) => {
                let key = file_path.to_string_lossy();
                Some(graph.downstream(&key, 3))
            }
            Err(_) => None,
        };

        let mut output = format!("## Dependencies for `{}`\n\n", params.0.file);
        if deps.is_empty() {
            output.push_str("No outgoing dependencies recorded.\n");
        } else {
            output.push_str("### Imports\n\n");
            for dep in &deps {
                let resolved = dep
                    .resolved_path
                    .as_ref()
                    .map(|p| format!(" -> {}", p.display()))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "- `{}` ({}){}{}\n",
                    dep.target_module,
                    dep.kind.as_str(),
                    resolved,
                    if dep.is_external { " [external]" } else { "" },
                ));
            }
        }

        if let Some(dependents) = blast_radius {
            output.push_str(&format!("\n### Blast radius\n\n- Dependents: {}\n", dependents.len()));
            for dependent in dependents.iter().take(20) {
                output.push_str(&format!("  - {dependent}\n"));
            }
        }

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "find_patterns",
        description = "Find code patterns by searching for specific constructs. Combines keyword and semantic search to find similar implementations. Examples: 'error handling', 'API endpoint handlers'."
    )]
    async fn find_patterns(
        &self,
        params: Parameters<FindPatternsParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params.0.limit.unwrap_or(5);
        let pattern = &params.0.pattern;
        let engine = self.engine.lock().await;

        match engine.search(pattern, limit, 0.3) {
            Ok(results) => {
                if results.is_empty() {
                    return Ok(CallToolResult::success(vec![Content::text(format!(
                        "No patterns matching '{pattern}' found."
                    ))]));
                }

                let mut output = format!("## Pattern: '{pattern}'\n\nFound {} examples:\n\n", results.len());
                for (i, result) in results.iter().enumerate() {
                    output.push_str(&format!(
                        "### Example {} -- {} (score: {:.4})\nL{}-L{}\n```\n{}\n```\n\n",
                        i + 1,
                        result.chunk.rel_path.display(),
                        result.score,
                        result.chunk.line_start,
                        result.chunk.line_end,
                        result.chunk.content,
                    ));
                }
                Ok(CallToolResult::success(vec![Content::text(output)]))
            }
            Err(e) => Err(McpError::internal_error(format!("pattern search failed: {e}"), None)),
        }
    }

    #[tool(
        name = "get_architecture",
        description = "Get a high-level overview of the codebase architecture: index statistics and dependency cycles, if any."
    )]
    async fn get_architecture(&self) -> Result<CallToolResult, McpError> {
        let engine = self.engine.lock().await;
        let stats = engine.status().map_err(|e| McpError::internal_error(format!("architecture failed: {e}"), None))?;

        let mut output = format!(
            "## Codebase Architecture\n\n\
             **Files**: {}\n**Symbols**: {}\n**Dependencies**: {}\n\n\
             ### Indexed Content\n\n\
             - {} files indexed\n- {} code chunks searchable\n\
             - {} symbols (functions, classes, traits, etc.)\n- {} vector embeddings\n",
            stats.file_count, stats.symbol_count, stats.dependency_count,
            stats.file_count, stats.chunk_count, stats.symbol_count, stats.vector_count,
        );

        if stats.has_cycles {
            match engine.cycles() {
                Ok(cycles) => {
                    output.push_str(&format!("\n### Dependency Cycles ({})\n\n", cycles.len()));
                    for cycle in cycles.iter().take(10) {
                        let names: Vec<String> = cycle.iter().map(|p| p.display().to_string()).collect();
                        output.push_str(&format!("- {}\n", names.join(" -> ")));
                    }
                }
                Err(e) => output.push_str(&format!("\nError computing cycles: {e}\n")),
            }
        }

        output.push_str(
            "\n### Recommendations\n\n\
             - Use `search_code` to explore specific functionality\n\
             - Use `get_symbol` to look up functions or classes\n\
             - Use `get_file_summary` for file structure\n\
             - Use `find_patterns` to discover recurring patterns\n",
        );

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "explain_codebase",
        description = "Get a comprehensive explanation of the codebase: index statistics and how to explore it further. Good for onboarding to a new project."
    )]
    async fn explain_codebase(&self) -> Result<CallToolResult, McpError> {
        let engine = self.engine.lock().await;
        match engine.status() {
            Ok(s) => {
                let output = format!(
                    "## Codebase Overview\n\n\
                     ### Statistics\n\n\
                     | Metric | Count |\n|--------|-------|\n\
                     | Files | {} |\n| Code Chunks | {} |\n\
                     | Symbols | {} |\n| Dependencies | {} |\n| Embeddings | {} |\n\n\
                     ### How to Explore\n\n\
                     1. **Find entry points**: `search_code \"main function\"`\n\
                     2. **Understand a module**: `get_file_summary \"path/to/file.rs\"`\n\
                     3. **Look up definitions**: `get_symbol \"SymbolName\"`\n\
                     4. **Find patterns**: `find_patterns \"error handling\"`\n\
                     5. **Trace change impact**: `get_dependencies \"path/to/file.rs\"`\n",
                    s.file_count, s.chunk_count, s.symbol_count, s.dependency_count, s.vector_count,
                );
                Ok(CallToolResult::success(vec![Content::text(output)]))
            }
            Err(e) => Err(McpError::internal_error(format!("explain failed: {e}"), None)),
        }
    }
}

#[tool_handler]
impl ServerHandler for OmniContextServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "OmniContext provides deep code intelligence for AI coding agents. \
                 It indexes source code into searchable chunks with full-text and semantic search, \
                 plus a symbol and dependency graph. Use search_code for general queries, get_symbol \
                 for specific lookups, and get_file_summary for file structure analysis."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}
