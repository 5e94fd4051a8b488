//! Core domain types shared across all omni-core subsystems.
//!
//! These types form the API contract between modules. Changing them
//! requires updating all consumers, so they should be stable and minimal.
//! They mirror the data model directly: `IndexMetadata`, `FileRecord`,
//! `Chunk`, `Symbol`, `Dependency`, `CallEdge`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Languages the parser front-end has a grammar for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Go (.go)
    Go,
    /// Rust (.rs)
    Rust,
    /// Python (.py)
    Python,
    /// C (.c, .h)
    C,
    /// C++ (.cpp, .cc, .cxx, .hpp, .hxx, .hh)
    Cpp,
    /// Java (.java)
    Java,
    /// No registered grammar for this extension.
    Unknown,
}

impl Language {
    /// Detect language from a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "go" => Self::Go,
            "rs" => Self::Rust,
            "py" => Self::Python,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => Self::Cpp,
            "java" => Self::Java,
            _ => Self::Unknown,
        }
    }

    /// Returns the language identifier string used in the parser registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Python => "python",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Java => "java",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true if this language has a registered grammar.
    pub fn is_code(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// File-level types
// ---------------------------------------------------------------------------

/// A discovered and indexed file (`FileRecord` in the data model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Database ID (0 if not yet persisted).
    pub id: i64,
    /// Absolute path on disk at the time of indexing.
    pub abs_path: PathBuf,
    /// Path relative to the index's `root_path`.
    pub rel_path: PathBuf,
    /// Extension without the leading dot, lowercased.
    pub extension: String,
    /// Detected language.
    pub language: Language,
    /// Content fingerprint, `sha256(content)` hex digest.
    pub content_hash: String,
    /// File size in bytes at analysis time.
    pub size: u64,
    /// Modification time, seconds since epoch.
    pub mtime: i64,
    /// When this file was last analyzed, ISO-8601.
    pub analyzed_at: String,
    /// Parse failure note, if any (§4.1: null tree, non-fatal).
    pub parse_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Chunk types
// ---------------------------------------------------------------------------

/// A bounded, overlapping text window of a source file (`Chunk`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Database ID (0 if not yet persisted).
    pub id: i64,
    /// ID of the parent file.
    pub file_id: i64,
    /// Absolute path of the file this chunk was taken from.
    pub file_path: PathBuf,
    /// Path relative to the index root.
    pub rel_path: PathBuf,
    /// The raw window of source text.
    pub content: String,
    /// Starting line number (1-indexed, inclusive).
    pub line_start: u32,
    /// Ending line number (1-indexed, inclusive).
    pub line_end: u32,
    /// Must equal the parent file's current `content_hash` (invariant).
    pub content_hash: String,
    /// Embedding vector; length equals `IndexMetadata.model_dimensions`
    /// once embedded, empty before embedding completes.
    pub vector: Vec<f32>,
    /// Estimated token count, used by context assembly budgeting.
    pub token_count: u32,
}

// ---------------------------------------------------------------------------
// Symbol types
// ---------------------------------------------------------------------------

/// The kind of a named declaration (`Symbol.kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Named function or standalone procedure.
    Function,
    /// Arrow / lambda function bound to a name.
    ArrowFunction,
    /// Class, struct, or record definition.
    Class,
    /// Function defined within a class/struct/impl scope.
    Method,
    /// Field or accessor.
    Property,
    /// Mutable binding.
    Variable,
    /// Immutable or `const`/`static` binding.
    Constant,
    /// Interface, trait, or protocol.
    Interface,
    /// Type alias / typedef.
    TypeAlias,
    /// Enum type.
    Enum,
    /// A single enum variant.
    EnumMember,
    /// Event/signal declaration (language-specific; rare outside the
    /// six registered grammars but kept for symmetry with the data model).
    Event,
}

impl SymbolKind {
    /// Convert to the database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::ArrowFunction => "arrow_function",
            Self::Class => "class",
            Self::Method => "method",
            Self::Property => "property",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Interface => "interface",
            Self::TypeAlias => "type_alias",
            Self::Enum => "enum",
            Self::EnumMember => "enum_member",
            Self::Event => "event",
        }
    }

    /// Parse from the database string.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "function" => Self::Function,
            "arrow_function" => Self::ArrowFunction,
            "class" => Self::Class,
            "method" => Self::Method,
            "property" => Self::Property,
            "variable" => Self::Variable,
            "constant" => Self::Constant,
            "interface" => Self::Interface,
            "type_alias" => Self::TypeAlias,
            "enum" => Self::Enum,
            "enum_member" => Self::EnumMember,
            "event" => Self::Event,
            _ => Self::Function,
        }
    }
}

/// A named declaration extracted from a syntax tree (`Symbol`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Stable id: `"{rel_path}:{qualified_name}:{kind}"`.
    pub id: String,
    /// Short name, e.g. `validate_token`.
    pub name: String,
    /// Dotted qualified name, e.g. `Middleware.validate_token`.
    pub qualified_name: String,
    /// Declaration kind.
    pub kind: SymbolKind,
    /// File this symbol is defined in.
    pub file_id: i64,
    /// File path relative to the index root.
    pub rel_path: PathBuf,
    /// Starting line (1-indexed).
    pub line_start: u32,
    /// Ending line (1-indexed, inclusive).
    pub line_end: u32,
    /// Starting column (0-indexed).
    pub col_start: u32,
    /// Whether this symbol is part of the file/module's public surface.
    pub is_exported: bool,
    /// Whether this is the module's default export (language-specific).
    pub is_default_export: bool,
    /// One-line signature, if derivable.
    pub signature: Option<String>,
    /// Extracted doc comment, if any.
    pub doc: Option<String>,
    /// Id of the enclosing symbol (class/impl/module), if nested.
    pub parent_id: Option<String>,
    /// Language-specific modifiers (`async`, `static`, `pub(crate)`, ...).
    pub modifiers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Dependency edge types
// ---------------------------------------------------------------------------

/// The kind of module-level dependency relationship (`Dependency.kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Static import of a module.
    Import,
    /// Type-only import (no runtime value is pulled in).
    ImportType,
    /// Import evaluated at runtime (`import()`, reflective load).
    DynamicImport,
    /// CommonJS-style `require`.
    Require,
    /// A symbol is exported from this file.
    Export,
    /// A symbol is exported, re-sourced from another module.
    ExportFrom,
    /// `export * from` / `pub use` style re-export.
    ReExport,
}

impl DependencyKind {
    /// Convert to the database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::ImportType => "import_type",
            Self::DynamicImport => "dynamic_import",
            Self::Require => "require",
            Self::Export => "export",
            Self::ExportFrom => "export_from",
            Self::ReExport => "re_export",
        }
    }

    /// Parse from the database string.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "import" => Self::Import,
            "import_type" => Self::ImportType,
            "dynamic_import" => Self::DynamicImport,
            "require" => Self::Require,
            "export" => Self::Export,
            "export_from" => Self::ExportFrom,
            "re_export" => Self::ReExport,
            _ => Self::Import,
        }
    }
}

/// One named item pulled in (or re-exported) by a `Dependency`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyName {
    /// The name as written at the source.
    pub name: String,
    /// Local alias, if renamed on import.
    pub alias: Option<String>,
    /// Whether this name is type-only.
    pub is_type_only: bool,
    /// Whether this is the module's default export/import.
    pub is_default: bool,
    /// Whether this is a namespace import (`import * as ns`).
    pub is_namespace: bool,
}

/// A module-level import/export edge between files (`Dependency`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Database ID (0 if not yet persisted).
    pub id: i64,
    /// File the dependency was declared in, relative to the index root.
    pub source_file: PathBuf,
    /// The raw specifier as written (`"./utils"`, `"os.path"`, `"fmt"`).
    pub target_module: String,
    /// Resolved file, relative to the index root, when not external.
    pub resolved_path: Option<PathBuf>,
    /// Kind of dependency.
    pub kind: DependencyKind,
    /// Named items pulled in or re-exported.
    pub names: Vec<DependencyName>,
    /// Line number where the dependency is declared.
    pub line: u32,
    /// True when the specifier did not resolve to a file in this index.
    pub is_external: bool,
}

// ---------------------------------------------------------------------------
// Call edges
// ---------------------------------------------------------------------------

/// A resolved or best-effort function/method invocation (`CallEdge`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEdge {
    /// Database ID (0 if not yet persisted).
    pub id: i64,
    /// Id of the enclosing symbol at the call site, if one was in scope.
    pub caller_id: Option<String>,
    /// File the call occurs in, relative to the index root.
    pub caller_file: PathBuf,
    /// Bare name of the callee as written at the call site.
    pub callee_name: String,
    /// Resolved callee symbol id, set iff it uniquely resolves (§4.2).
    pub callee_id: Option<String>,
    /// Resolved callee file, when known.
    pub callee_file: Option<PathBuf>,
    /// Line of the call site.
    pub line: u32,
    /// Column of the call site.
    pub column: u32,
    /// Whether this was written as `receiver.method(...)`.
    pub is_method_call: bool,
    /// Receiver expression text, for method calls.
    pub receiver: Option<String>,
    /// Number of arguments at the call site.
    pub argument_count: u32,
}

// ---------------------------------------------------------------------------
// Index metadata
// ---------------------------------------------------------------------------

/// Lifecycle status of an `Index` (§4.9 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    /// An indexer run is currently in progress (create or update).
    Building,
    /// The index completed at least one successful run and is queryable.
    Ready,
    /// The index could not be opened at all; unrecoverable.
    Failed,
}

impl IndexStatus {
    /// Convert to the database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Parse from the database string.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "ready" => Self::Ready,
            "failed" => Self::Failed,
            _ => Self::Building,
        }
    }
}

/// Registry row describing one named index (`IndexMetadata`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// The index's unique name within a data root.
    pub name: String,
    /// Absolute root path this index was created against.
    pub root_path: PathBuf,
    /// Embedding model identifier.
    pub model: String,
    /// Embedding vector dimensionality for this index.
    pub model_dimensions: usize,
    /// Current lifecycle status.
    pub status: IndexStatus,
    /// Number of rows in this index's chunks table.
    pub chunk_count: u64,
    /// Creation timestamp, ISO-8601.
    pub created_at: String,
    /// Last-updated timestamp, ISO-8601.
    pub updated_at: String,
}

// ---------------------------------------------------------------------------
// Search types (ambient: query-engine result shape, not a stored entity)
// ---------------------------------------------------------------------------

/// A search result with scoring details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query, before MMR adjustment.
    pub similarity: f64,
    /// Final score after MMR diversification (equals `similarity` when
    /// `diversity == 0`).
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Pipeline events
// ---------------------------------------------------------------------------

/// Events flowing from the watcher/CLI into the indexer.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A file was created or modified and needs (re-)indexing.
    FileChanged {
        /// Absolute path to the file.
        path: PathBuf,
    },
    /// A file was deleted and should be removed from the index.
    FileDeleted {
        /// Absolute path to the deleted file.
        path: PathBuf,
    },
    /// A full repository scan is requested.
    FullScan,
    /// Shutdown the pipeline gracefully.
    Shutdown,
}

// ---------------------------------------------------------------------------
// Context assembly types (ambient, §1 "LLM-context assembly")
// ---------------------------------------------------------------------------

/// Priority level for chunks in context assembly.
///
/// Used to pack maximum relevant context within a token budget by
/// prioritizing critical chunks and compressing low-priority ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkPriority {
    /// Critical context: active file, cursor context, direct dependencies.
    /// Always included, never compressed.
    Critical = 4,
    /// High relevance: search results with score >0.8, test files.
    High = 3,
    /// Medium relevance: search results with score 0.5-0.8, graph neighbors.
    Medium = 2,
    /// Low relevance: everything else.
    Low = 1,
}

impl ChunkPriority {
    /// Determine priority from search score and context flags.
    pub fn from_score_and_context(
        score: f64,
        is_active_file: bool,
        is_test: bool,
        is_graph_neighbor: bool,
    ) -> Self {
        if is_active_file {
            return Self::Critical;
        }
        if is_test {
            return Self::High;
        }
        if is_graph_neighbor {
            return Self::Medium;
        }
        if score >= 0.8 {
            Self::High
        } else if score >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Compression factor for this priority (0.0 = no compression, 1.0 = maximum).
    pub fn compression_factor(&self) -> f64 {
        match self {
            Self::Critical => 0.0,
            Self::High => 0.1,
            Self::Medium => 0.3,
            Self::Low => 0.6,
        }
    }
}

/// A token-budget-aware context window assembled from search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Ordered entries (highest priority, then score, first).
    pub entries: Vec<ContextEntry>,
    /// Total tokens consumed.
    pub total_tokens: u32,
    /// Token budget this window was assembled for.
    pub token_budget: u32,
}

/// A single entry in a context window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    /// File path of this chunk, relative to the index root.
    pub rel_path: PathBuf,
    /// The code chunk (possibly compressed).
    pub chunk: Chunk,
    /// Relevance score.
    pub score: f64,
    /// Whether this chunk was included via graph traversal, not direct match.
    pub is_graph_neighbor: bool,
    /// Priority level assigned to this chunk.
    pub priority: ChunkPriority,
}

impl ContextWindow {
    /// Render the context window as a single string suitable for LLM consumption.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut current_file: Option<&std::path::Path> = None;

        for entry in &self.entries {
            if current_file != Some(&entry.rel_path) {
                if current_file.is_some() {
                    out.push_str("\n\n");
                }
                out.push_str(&format!("// === {} ===\n", entry.rel_path.display()));
                current_file = Some(&entry.rel_path);
            }
            out.push_str(&entry.chunk.content);
            out.push('\n');
        }

        out
    }

    /// Number of entries in this window.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Query engine result types (ambient: not stored entities)
// ---------------------------------------------------------------------------

/// Aggregate counters for one index, backing the `stats` query and the
/// CLI/daemon status surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of rows in `files`.
    pub file_count: u64,
    /// Number of rows in `chunks`.
    pub chunk_count: u64,
    /// Number of rows in `symbols`.
    pub symbol_count: u64,
    /// Number of rows in `dependencies`.
    pub dependency_count: u64,
    /// Number of rows in `calls`.
    pub call_count: u64,
    /// Number of vectors currently held by the in-memory vector index.
    pub vector_count: usize,
    /// Whether the file-level dependency graph contains a cycle.
    pub has_cycles: bool,
}

/// Result of a `callers` query: who calls a given symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerInfo {
    /// The resolved or best-effort caller symbol id, if one enclosed the call.
    pub caller_id: Option<String>,
    /// File the call occurs in.
    pub caller_file: PathBuf,
    /// Line of the call site.
    pub line: u32,
}

/// Result of an `impact` query: every file reachable from a symbol's
/// direct callers by following dependency edges backwards (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactResult {
    /// The symbol name the query started from.
    pub target: String,
    /// Files containing a direct caller of `target`.
    pub direct_dependents: Vec<PathBuf>,
    /// Files reachable transitively through the dependent chain from a
    /// direct caller's file, excluding the direct callers themselves.
    pub transitive_dependents: Vec<PathBuf>,
    /// `direct_dependents.len() + transitive_dependents.len()`.
    pub total: usize,
}

/// One group of cyclically-dependent files, as found by `cycles`.
pub type Cycle = Vec<PathBuf>;

/// One cluster of near-duplicate chunks, as found by `similar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarGroup {
    /// The chunks in this cluster, most-similar-to-the-seed first.
    pub chunks: Vec<Chunk>,
    /// Cosine similarity of the least-similar member to the seed chunk.
    pub min_similarity: f64,
}

/// A single textual edit proposed by a `rename` query. `rename` only
/// plans edits; it never writes to disk (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameEdit {
    /// File the edit applies to, relative to the index root.
    pub rel_path: PathBuf,
    /// Line of the occurrence (1-indexed).
    pub line: u32,
    /// Column of the occurrence (0-indexed).
    pub column: u32,
    /// Text as it currently reads.
    pub old_text: String,
    /// Text after the rename.
    pub new_text: String,
}

/// A symbol that is never called and never exported, as found by `dead`.
pub type DeadSymbol = Symbol;
