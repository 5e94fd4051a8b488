//! Pipeline orchestrator -- the Indexer and the public `Engine` API (§4.5).
//!
//! Wires every subsystem together into one named index: discovery and
//! exclusion (`watcher::ExcludeMatcher`), parsing (`parser`), chunking
//! (`chunker`), embedding (`embedder`, backed by `cache`), and persistence
//! (`index::MetadataIndex`). Query operations are delegated to
//! `search::SearchEngine` over state rebuilt fresh from the store on every
//! call (§4.6, §9): there is no persistent in-memory vector index or
//! dependency graph living between requests.
//!
//! ```text
//! discover --> classify (unchanged/added/modified/deleted)
//!          --> read/hash/parse/extract/chunk/embed (added + modified only)
//!          --> per-file transactional write
//!          --> delete rows for removed files
//!          --> refresh IndexMetadata (status, chunk_count, updated_at)
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::cache::EmbeddingCache;
use crate::chunker;
use crate::config::Config;
use crate::embedder::Embedder;
use crate::error::{OmniError, OmniResult};
use crate::graph::DependencyGraph;
use crate::index::MetadataIndex;
use crate::parser::{self, ChunkKind, Visibility};
use crate::paths;
use crate::search::SearchEngine;
use crate::types::{
    CallEdge, Chunk, DeadSymbol, Dependency, DependencyKind, FileRecord, ImpactResult,
    IndexMetadata, IndexStats, IndexStatus, Language, RenameEdit, SearchResult, SimilarGroup,
    Symbol, SymbolKind,
};
use crate::vector::VectorIndex;
use crate::watcher::ExcludeMatcher;

/// Which of the two indexer runs this invocation performs (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// First run against a root with no prior `FileRecord`s.
    Create,
    /// Subsequent run; unchanged files are skipped by content hash.
    Update,
}

/// Reported counters for one indexer run (§4.5, §8).
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct IndexReport {
    /// Files that were read, parsed and (re-)written this run.
    pub files_processed: usize,
    /// Files whose content hash matched the stored record; untouched.
    pub files_skipped: usize,
    /// Files newly discovered with no prior `FileRecord`.
    pub files_added: usize,
    /// Files discovered with a changed content hash.
    pub files_updated: usize,
    /// Files present in the store but no longer discovered on disk.
    pub files_deleted: usize,
    /// Chunk rows inserted this run.
    pub chunks_created: usize,
}

/// The public entry point of `omni-core`: one named index over one root
/// path, plus the query engine over its store.
///
/// `Engine` owns the sole write connection to its index database for the
/// run it performs; concurrent writers to the same index are not
/// supported (§5). Each query call rebuilds the vector index and
/// dependency graph it needs from the store rather than keeping them
/// resident, per §4.6 and the Design Notes.
pub struct Engine {
    data_root: PathBuf,
    index_name: String,
    config: Config,
    store: MetadataIndex,
    cache: EmbeddingCache,
    embedder: Embedder,
    exclude: ExcludeMatcher,
    search_engine: SearchEngine,
}

impl Engine {
    /// Open an existing named index, or create a fresh one rooted at
    /// `root_path` if no metadata row exists yet.
    ///
    /// `data_root` is the OmniContext data directory (`paths::data_root()`
    /// unless overridden); `index_name` identifies the index within it.
    pub fn open(data_root: &Path, index_name: &str, root_path: &Path, config: Config) -> OmniResult<Self> {
        paths::ensure_layout(data_root)?;

        let db_path = paths::index_db_path(data_root, index_name);
        let store = MetadataIndex::open(&db_path)?;

        let cache_path = paths::cache_db_path(data_root);
        let cache = EmbeddingCache::open(&cache_path)?;

        let embedder = Embedder::new(&config.embedding)?;
        let exclude = ExcludeMatcher::new(&config.excludes)?;
        let search_engine = SearchEngine::new(60);

        if store.get_metadata()?.is_none() {
            let now = now_iso();
            store.upsert_metadata(&IndexMetadata {
                name: index_name.to_string(),
                root_path: root_path.to_path_buf(),
                model: config.model.clone(),
                model_dimensions: config.embedding.dimensions,
                status: IndexStatus::Building,
                chunk_count: 0,
                created_at: now.clone(),
                updated_at: now,
            })?;
        }

        Ok(Self {
            data_root: data_root.to_path_buf(),
            index_name: index_name.to_string(),
            config,
            store,
            cache,
            embedder,
            exclude,
            search_engine,
        })
    }

    /// Name of this index.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Data root this index lives under.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Effective configuration this engine was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current metadata row, if the index has ever completed a run.
    pub fn metadata(&self) -> OmniResult<Option<IndexMetadata>> {
        self.store.get_metadata()
    }

    /// Aggregate row counts plus whether the dependency graph has a cycle.
    pub fn status(&self) -> OmniResult<IndexStats> {
        self.store.statistics()
    }

    // -----------------------------------------------------------------
    // Indexer (§4.5)
    // -----------------------------------------------------------------

    /// Run the indexer in `mode`. Safe to call repeatedly; a second
    /// `Update` run with no filesystem change reports `files_skipped ==
    /// total` and every other counter at zero (§8).
    pub async fn run_index(&mut self, mode: IndexMode) -> OmniResult<IndexReport> {
        let meta = self
            .store
            .get_metadata()?
            .ok_or_else(|| OmniError::NotFound { entity: format!("index {}", self.index_name) })?;
        let root_path = meta.root_path.clone();

        self.store.set_status(IndexStatus::Building, &now_iso())?;

        let report = match self.index_once(&root_path).await {
            Ok(report) => report,
            Err(err) => {
                // Only an unopenable store makes the index unrecoverable
                // (§4.9); every other failure is per-file and already
                // folded into the report by `index_once`.
                self.store.set_status(IndexStatus::Failed, &now_iso())?;
                return Err(err);
            }
        };

        let now = now_iso();
        self.store.refresh_chunk_count(&now)?;
        self.store.set_status(IndexStatus::Ready, &now)?;

        let _ = mode; // create/update differ only in the starting status transition above
        Ok(report)
    }

    async fn index_once(&mut self, root_path: &Path) -> OmniResult<IndexReport> {
        let mut report = IndexReport::default();

        let discovered = discover_files(root_path, &self.exclude, self.config.max_file_size)?;
        let existing = self
            .store
            .list_files()?
            .into_iter()
            .map(|f| (f.rel_path.clone(), f))
            .collect::<HashMap<_, _>>();

        let mut seen = std::collections::HashSet::new();

        // Batches of at most 64 files per run (§5 backpressure).
        for batch in discovered.chunks(64) {
            for abs_path in batch {
                let rel_path = match abs_path.strip_prefix(root_path) {
                    Ok(p) => p.to_path_buf(),
                    Err(_) => continue,
                };
                seen.insert(rel_path.clone());

                let bytes = match std::fs::read(abs_path) {
                    Ok(b) => b,
                    Err(error) => {
                        tracing::warn!(path = %abs_path.display(), %error, "failed to read file, skipping");
                        continue;
                    }
                };
                let content_hash = hash_bytes(&bytes);

                match existing.get(&rel_path) {
                    Some(prior) if prior.content_hash == content_hash => {
                        report.files_skipped += 1;
                        continue;
                    }
                    Some(_) => report.files_updated += 1,
                    None => report.files_added += 1,
                }

                self.process_file(root_path, abs_path, &rel_path, &bytes, &content_hash, &mut report)?;
                report.files_processed += 1;
            }
        }

        for (rel_path, _) in existing.iter().filter(|(path, _)| !seen.contains(*path)) {
            self.store.delete_file(rel_path)?;
            report.files_deleted += 1;
        }

        Ok(report)
    }

    /// Process one added/modified file: parse, extract, chunk, embed, and
    /// write the result transactionally (§4.5 step 4-5).
    fn process_file(
        &mut self,
        root_path: &Path,
        abs_path: &Path,
        rel_path: &Path,
        bytes: &[u8],
        content_hash: &str,
        report: &mut IndexReport,
    ) -> OmniResult<()> {
        let extension = abs_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let language = Language::from_extension(&extension);
        let content = String::from_utf8_lossy(bytes);
        let metadata = std::fs::metadata(abs_path)?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let outcome = parser::parse_file(abs_path, bytes, language);
        let parse_error = outcome.as_ref().and_then(|o| o.error.clone());
        let elements = outcome.map(|o| o.elements).unwrap_or_default();

        let file = FileRecord {
            id: 0,
            abs_path: abs_path.to_path_buf(),
            rel_path: rel_path.to_path_buf(),
            extension,
            language,
            content_hash: content_hash.to_string(),
            size: bytes.len() as u64,
            mtime,
            analyzed_at: now_iso(),
            parse_error,
        };
        let file_id = self.store.upsert_file(&file)?;
        self.store.clear_file_children(file_id, rel_path)?;

        let (symbols, local_by_name) = build_symbols(&elements, file_id, rel_path);
        for symbol in &symbols {
            self.store.upsert_symbol(symbol)?;
        }

        for call in build_calls(&elements, &symbols, &local_by_name, rel_path, &self.store)? {
            self.store.insert_call(&call)?;
        }

        if let Some(imports) = parser::parse_imports(abs_path, bytes, language) {
            for dep in resolve_dependencies(&imports, root_path, abs_path) {
                self.store.insert_dependency(&dep)?;
            }
        }

        let chunking = chunker::chunk_file(&content, file_id, abs_path, rel_path, content_hash, &self.config);
        self.embed_and_store_chunks(chunking.chunks, report)?;

        Ok(())
    }

    /// Embed and persist a batch of freshly-produced chunks, consulting
    /// the shared embedding cache per chunk before falling back to the
    /// embedder (§4.4).
    fn embed_and_store_chunks(&mut self, chunks: Vec<Chunk>, report: &mut IndexReport) -> OmniResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let model = self.config.model.clone();
        let mut keys = Vec::with_capacity(chunks.len());
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(chunks.len());
        let mut to_embed_idx = Vec::new();
        let mut to_embed_text = Vec::new();

        for chunk in &chunks {
            let key = EmbeddingCache::key(&model, &chunk.content);
            match self.cache.get(&key)? {
                Some(vector) => vectors.push(Some(vector)),
                None => {
                    to_embed_idx.push(vectors.len());
                    to_embed_text.push(chunk.content.as_str());
                    vectors.push(None);
                }
            }
            keys.push(key);
        }

        if !to_embed_text.is_empty() && self.embedder.is_available() {
            let fresh = self.embedder.embed_batch(&to_embed_text);
            let now = now_iso();
            for (pos, vector) in to_embed_idx.into_iter().zip(fresh.into_iter()) {
                if let Some(ref v) = vector {
                    self.cache.put(&keys[pos], &model, v, &now)?;
                }
                vectors[pos] = vector;
            }
        }

        for (mut chunk, vector) in chunks.into_iter().zip(vectors.into_iter()) {
            if let Some(vector) = vector {
                chunk.vector = vector;
            }
            self.store.insert_chunk(&chunk)?;
            report.chunks_created += 1;
        }

        Ok(())
    }

    // -----------------------------------------------------------------
    // Query engine (§4.6) -- thin delegation to `SearchEngine`, rebuilding
    // the vector index or dependency graph per call as needed.
    // -----------------------------------------------------------------

    /// Semantic + keyword hybrid search with optional MMR diversification.
    pub fn search(&self, query: &str, limit: usize, diversity: f64) -> OmniResult<Vec<SearchResult>> {
        let query_vector = if self.embedder.is_available() {
            self.embedder.embed_single(query).ok()
        } else {
            None
        };
        let vectors = VectorIndex::from_vectors(
            self.config.embedding.dimensions,
            self.store.list_embedded_chunks()?.iter().map(|c| (c.id, c.vector.clone())).collect(),
        );
        self.search_engine.search(&self.store, &vectors, query, query_vector, limit, diversity)
    }

    /// Callers of `symbol` by name (§4.6).
    pub fn callers(&self, symbol: &str) -> OmniResult<Vec<crate::types::CallerInfo>> {
        self.search_engine.callers(&self.store, symbol)
    }

    /// Files transitively affected by a change to `symbol` (§4.6): resolves
    /// `symbol` to its direct callers' files, then BFS's the reverse
    /// dependency graph from those files.
    pub fn impact(&self, symbol: &str, depth: usize) -> OmniResult<ImpactResult> {
        self.search_engine.impact(&self.store, symbol, depth)
    }

    /// Symbols of `kind` (or all function/method symbols) with zero
    /// incoming calls.
    pub fn dead(&self, kind: Option<SymbolKind>) -> OmniResult<Vec<DeadSymbol>> {
        self.search_engine.dead(&self.store, kind)
    }

    /// Exported symbols never referenced by another file's dependency or
    /// call edges.
    pub fn unused_exports(&self) -> OmniResult<Vec<DeadSymbol>> {
        self.search_engine.unused_exports(&self.store)
    }

    /// Simple cycles in the file-level dependency graph, up to length 16.
    pub fn cycles(&self) -> OmniResult<Vec<Vec<PathBuf>>> {
        self.search_engine.cycles(&self.store)
    }

    /// Clusters of near-duplicate chunks (cosine > 0.85).
    pub fn similar(&self, limit: usize) -> OmniResult<Vec<SimilarGroup>> {
        self.search_engine.similar(&self.store, limit)
    }

    /// Preview-only rename edits for every occurrence of `old`.
    pub fn rename(&self, old: &str, new: &str) -> OmniResult<Vec<RenameEdit>> {
        self.search_engine.rename(&self.store, old, new)
    }

    /// Rebuild the file-level dependency graph from the store (used by
    /// collaborators that need direct graph access beyond `impact`/`cycles`).
    pub fn dependency_graph(&self) -> OmniResult<DependencyGraph> {
        Ok(DependencyGraph::from_dependencies(&self.store.list_dependencies()?))
    }

    /// Dependencies whose source file is `file` (JSON-RPC `deps`).
    pub fn dependencies(&self, file: &Path) -> OmniResult<Vec<Dependency>> {
        Ok(self
            .store
            .list_dependencies()?
            .into_iter()
            .filter(|d| d.source_file == file)
            .collect())
    }

    /// Symbols matching the given filters (JSON-RPC `symbols`).
    pub fn symbols(
        &self,
        kind: Option<SymbolKind>,
        file: Option<&Path>,
        exported: Option<bool>,
    ) -> OmniResult<Vec<Symbol>> {
        Ok(self
            .store
            .list_symbols()?
            .into_iter()
            .filter(|s| kind.map_or(true, |k| s.kind == k))
            .filter(|s| file.map_or(true, |f| s.rel_path == f))
            .filter(|s| exported.map_or(true, |e| s.is_exported == e))
            .collect())
    }

    /// Direct access to the underlying store, for collaborators that need
    /// read-only access beyond the query engine surface (e.g. `symbols`,
    /// `deps` JSON-RPC methods).
    pub fn store(&self) -> &MetadataIndex {
        &self.store
    }
}

/// Walk `root`, skipping excluded paths and oversized files, collecting
/// every file with a registered language grammar. Mirrors
/// `watcher::FileWatcher::full_scan` but returns paths directly instead of
/// going through a channel, since the indexer consumes the whole list at
/// once rather than streaming it.
fn discover_files(root: &Path, exclude: &ExcludeMatcher, max_file_size: u64) -> OmniResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(path = %dir.display(), %error, "failed to read directory");
                continue;
            }
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if exclude.is_excluded(&path) {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                stack.push(path);
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !Language::from_extension(extension).is_code() {
                continue;
            }

            let size = entry.metadata()?.len();
            if size > max_file_size {
                continue;
            }

            found.push(path);
        }
    }

    found.sort();
    Ok(found)
}

/// sha256 hex digest of raw file bytes, used as `FileRecord.content_hash`
/// and `Chunk.content_hash` (§8: `sha256("")` must equal the well-known
/// empty-input digest).
fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Lightweight ISO-8601 UTC timestamp without pulling in a date/time
/// crate the rest of the workspace doesn't otherwise need. Civil calendar
/// conversion from a Unix timestamp follows Howard Hinnant's
/// `civil_from_days` algorithm.
fn now_iso() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format_iso(secs)
}

fn format_iso(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let time_of_day = secs % 86_400;
    let (hour, minute, second) = (time_of_day / 3600, (time_of_day % 3600) / 60, time_of_day % 60);

    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { y + 1 } else { y };

    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}Z")
}

/// Map `ChunkKind`/`depth`/`Visibility` onto `Symbol` rows, per §4.2:
/// `Module`, `Impl`, `TopLevel` and `Test` elements are chunked for
/// search but never produce a `Symbol`; a `Function` nested inside
/// another element (depth > 0) becomes a `Method`.
///
/// Returns the symbols plus a name -> id map scoped to this file, used by
/// `build_calls` to prefer local resolution over a store-wide lookup.
fn build_symbols(
    elements: &[crate::parser::StructuralElement],
    file_id: i64,
    rel_path: &Path,
) -> (Vec<Symbol>, HashMap<String, String>) {
    let mut symbols = Vec::new();
    let mut by_name: HashMap<String, String> = HashMap::new();
    // Stack of (depth, symbol_id) for parent tracking: elements arrive in
    // source order, so the nearest enclosing element with a smaller depth
    // is this element's parent.
    let mut stack: Vec<(u32, String)> = Vec::new();

    for element in elements {
        while stack.last().is_some_and(|(depth, _)| *depth >= element.depth) {
            stack.pop();
        }

        let kind = match element.kind {
            ChunkKind::Function => {
                if element.depth > 0 {
                    Some(SymbolKind::Method)
                } else {
                    Some(SymbolKind::Function)
                }
            }
            ChunkKind::Class => Some(SymbolKind::Class),
            ChunkKind::Trait => Some(SymbolKind::Interface),
            ChunkKind::Const => Some(SymbolKind::Constant),
            ChunkKind::TypeDef => Some(SymbolKind::TypeAlias),
            ChunkKind::Enum => Some(SymbolKind::Enum),
            ChunkKind::Impl | ChunkKind::Module | ChunkKind::TopLevel | ChunkKind::Test => None,
        };

        let Some(kind) = kind else {
            continue;
        };

        let id = format!("{}:{}:{}", rel_path.display(), element.symbol_path, kind.as_str());
        let parent_id = stack.last().map(|(_, id)| id.clone());

        symbols.push(Symbol {
            id: id.clone(),
            name: element.name.clone(),
            qualified_name: element.symbol_path.clone(),
            kind,
            file_id,
            rel_path: rel_path.to_path_buf(),
            line_start: element.line_start,
            line_end: element.line_end,
            col_start: element.col_start,
            is_exported: matches!(element.visibility, Visibility::Public),
            is_default_export: false,
            signature: element.signature.clone(),
            doc: element.doc_comment.clone(),
            parent_id,
            modifiers: Vec::new(),
        });

        by_name.insert(element.name.clone(), id.clone());
        stack.push((element.depth, id));
    }

    (symbols, by_name)
}

/// Build best-effort `CallEdge`s from each element's `references` (§4.2).
/// Resolution prefers a same-file symbol by name, then falls back to a
/// unique store-wide match from a prior run; anything else keeps only
/// `callee_name`.
fn build_calls(
    elements: &[crate::parser::StructuralElement],
    symbols: &[Symbol],
    local_by_name: &HashMap<String, String>,
    rel_path: &Path,
    store: &MetadataIndex,
) -> OmniResult<Vec<CallEdge>> {
    let mut calls = Vec::new();
    let symbol_by_path = symbols_for_elements(elements, symbols);

    for (element, symbol) in elements.iter().zip(symbol_by_path) {
        for callee_name in &element.references {
            let (callee_id, callee_file) = if let Some(id) = local_by_name.get(callee_name) {
                (Some(id.clone()), Some(rel_path.to_path_buf()))
            } else {
                let matches = store.find_symbols_by_name(callee_name, 2)?;
                if matches.len() == 1 {
                    (Some(matches[0].id.clone()), Some(matches[0].rel_path.clone()))
                } else {
                    (None, None)
                }
            };

            calls.push(CallEdge {
                id: 0,
                caller_id: symbol.map(|s| s.id.clone()),
                caller_file: rel_path.to_path_buf(),
                callee_name: callee_name.clone(),
                callee_id,
                callee_file,
                line: element.line_start,
                column: element.col_start,
                is_method_call: false,
                receiver: None,
                argument_count: 0,
            });
        }
    }

    Ok(calls)
}

/// Pair each structural element with the `Symbol` it produced, if any
/// (elements that don't produce a symbol -- `Module`/`Impl`/`TopLevel`/
/// `Test` -- still carry `references` worth recording as unattributed calls).
fn symbols_for_elements<'a>(
    elements: &[crate::parser::StructuralElement],
    symbols: &'a [Symbol],
) -> Vec<Option<&'a Symbol>> {
    let mut by_path: HashMap<&str, &Symbol> = HashMap::new();
    for symbol in symbols {
        by_path.insert(symbol.qualified_name.as_str(), symbol);
    }
    elements.iter().map(|e| by_path.get(e.symbol_path.as_str()).copied()).collect()
}

/// Resolve each `ImportStatement` against the file's directory, marking a
/// dependency external when the specifier neither starts with `.`/`/` nor
/// resolves to a file under the index root (§4.2).
fn resolve_dependencies(
    imports: &[crate::parser::ImportStatement],
    root_path: &Path,
    abs_path: &Path,
) -> Vec<Dependency> {
    let dir = abs_path.parent().unwrap_or(root_path);
    let candidate_extensions = ["", ".rs", ".go", ".py", ".java", ".c", ".h", ".cpp", ".hpp"];

    imports
        .iter()
        .map(|import| {
            let source_file = abs_path.strip_prefix(root_path).unwrap_or(abs_path).to_path_buf();
            let is_relative = import.target_module.starts_with('.') || import.target_module.starts_with('/');

            let resolved_path = if is_relative {
                candidate_extensions.iter().find_map(|ext| {
                    let candidate = dir.join(format!("{}{}", import.target_module, ext));
                    candidate
                        .canonicalize()
                        .ok()
                        .and_then(|abs| abs.strip_prefix(root_path).ok().map(Path::to_path_buf))
                })
            } else {
                None
            };

            let is_external = resolved_path.is_none() && !is_relative;

            Dependency {
                id: 0,
                source_file,
                target_module: import.target_module.clone(),
                resolved_path,
                kind: match import.kind {
                    DependencyKind::Import
                    | DependencyKind::ImportType
                    | DependencyKind::DynamicImport
                    | DependencyKind::Require
                    | DependencyKind::Export
                    | DependencyKind::ExportFrom
                    | DependencyKind::ReExport => import.kind,
                },
                names: import.names.clone(),
                line: import.line,
                is_external,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.embedding.dimensions = 4;
        config
    }

    fn open_test_engine(data_root: &Path, root_path: &Path) -> Engine {
        Engine::open(data_root, "test-index", root_path, test_config()).expect("open engine")
    }

    #[test]
    fn iso_timestamp_has_expected_shape() {
        let stamp = format_iso(1_735_689_600); // 2025-01-01T00:00:00Z
        assert_eq!(stamp, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn hash_of_empty_input_matches_known_digest() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn create_then_update_is_idempotent() {
        let data_dir = tempfile::tempdir().expect("data dir");
        let repo_dir = tempfile::tempdir().expect("repo dir");

        std::fs::write(repo_dir.path().join("a.rs"), "fn a() {}\n").expect("write a");
        std::fs::write(repo_dir.path().join("b.rs"), "fn b() { a(); }\n").expect("write b");

        let mut engine = open_test_engine(data_dir.path(), repo_dir.path());
        let first = engine.run_index(IndexMode::Create).await.expect("first run");
        assert_eq!(first.files_added, 2);
        assert_eq!(first.files_skipped, 0);
        assert!(first.chunks_created >= 2);

        let second = engine.run_index(IndexMode::Update).await.expect("second run");
        assert_eq!(second.files_skipped, 2);
        assert_eq!(second.files_added, 0);
        assert_eq!(second.files_updated, 0);
        assert_eq!(second.files_deleted, 0);
        assert_eq!(second.chunks_created, 0);

        let meta = engine.metadata().expect("metadata").expect("present");
        assert_eq!(meta.status, IndexStatus::Ready);
        assert_eq!(meta.chunk_count, engine.status().expect("stats").chunk_count);
    }

    #[tokio::test]
    async fn update_detects_added_modified_and_deleted_files() {
        let data_dir = tempfile::tempdir().expect("data dir");
        let repo_dir = tempfile::tempdir().expect("repo dir");

        std::fs::write(repo_dir.path().join("keep.rs"), "fn keep() {}\n").expect("write keep");
        std::fs::write(repo_dir.path().join("change.rs"), "fn change() {}\n").expect("write change");
        std::fs::write(repo_dir.path().join("remove.rs"), "fn remove() {}\n").expect("write remove");

        let mut engine = open_test_engine(data_dir.path(), repo_dir.path());
        engine.run_index(IndexMode::Create).await.expect("first run");

        std::fs::write(repo_dir.path().join("change.rs"), "fn change() { 1 + 1; }\n").expect("rewrite change");
        std::fs::remove_file(repo_dir.path().join("remove.rs")).expect("remove file");
        std::fs::write(repo_dir.path().join("added.rs"), "fn added() {}\n").expect("write added");

        let report = engine.run_index(IndexMode::Update).await.expect("update run");
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.files_updated, 1);
        assert_eq!(report.files_added, 1);
        assert_eq!(report.files_deleted, 1);
    }

    #[tokio::test]
    async fn symbols_and_calls_are_recorded() {
        let data_dir = tempfile::tempdir().expect("data dir");
        let repo_dir = tempfile::tempdir().expect("repo dir");
        std::fs::write(
            repo_dir.path().join("lib.rs"),
            "fn helper() {}\n\nfn main() { helper(); }\n",
        )
        .expect("write lib");

        let mut engine = open_test_engine(data_dir.path(), repo_dir.path());
        engine.run_index(IndexMode::Create).await.expect("index run");

        let symbols = engine.store().list_symbols().expect("symbols");
        assert!(symbols.iter().any(|s| s.name == "helper"));
        assert!(symbols.iter().any(|s| s.name == "main"));

        let calls = engine.store().list_calls().expect("calls");
        assert!(calls.iter().any(|c| c.callee_name == "helper" && c.callee_id.is_some()));
    }
}
