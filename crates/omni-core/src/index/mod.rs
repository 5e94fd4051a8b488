//! SQLite metadata store for one named index.
//!
//! This module owns the persistent storage of file metadata, chunks,
//! symbols, dependencies, and call edges for a single index. Every query
//! engine operation (`search`, `callers`, `impact`, `dead`, `cycles`, ...)
//! reads from here; the in-memory vector index and dependency graph are
//! both rebuilt from this store, never the other way around.
//!
//! ## Concurrency
//!
//! SQLite is configured in WAL mode for concurrent reads during writes.
//! Only one writer is allowed at a time (SQLite constraint); the indexer
//! holds the sole write connection for the lifetime of a run.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{OmniError, OmniResult};
use crate::types::{
    CallEdge, Chunk, Dependency, DependencyKind, DependencyName, FileRecord, IndexMetadata,
    IndexStats, IndexStatus, Language, Symbol, SymbolKind,
};

/// SQLite-backed metadata store for one index.
pub struct MetadataIndex {
    conn: Connection,
}

impl MetadataIndex {
    /// Open or create an index database at the given path.
    pub fn open(db_path: &Path) -> OmniResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "cache_size", "-64000")?; // 64MB cache
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let index = Self { conn };
        index.ensure_schema()?;

        Ok(index)
    }

    /// Create all tables and indexes if they don't exist.
    fn ensure_schema(&self) -> OmniResult<()> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    /// Run an integrity check on the database.
    pub fn check_integrity(&self) -> OmniResult<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Get the raw connection for advanced queries.
    /// Use sparingly -- prefer adding methods to this struct.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // -----------------------------------------------------------------
    // Index metadata (singleton row)
    // -----------------------------------------------------------------

    /// Fetch the singleton metadata row, if one has been written yet.
    pub fn get_metadata(&self) -> OmniResult<Option<IndexMetadata>> {
        self.conn
            .query_row(
                "SELECT name, root_path, model, model_dimensions, status, chunk_count,
                        created_at, updated_at
                 FROM index_metadata WHERE id = 1",
                [],
                |row| {
                    Ok(IndexMetadata {
                        name: row.get(0)?,
                        root_path: PathBuf::from(row.get::<_, String>(1)?),
                        model: row.get(2)?,
                        model_dimensions: row.get::<_, i64>(3)? as usize,
                        status: IndexStatus::from_str_lossy(&row.get::<_, String>(4)?),
                        chunk_count: row.get::<_, i64>(5)? as u64,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(OmniError::from)
    }

    /// Insert or replace the singleton metadata row.
    pub fn upsert_metadata(&self, meta: &IndexMetadata) -> OmniResult<()> {
        self.conn.execute(
            "INSERT INTO index_metadata
                (id, name, root_path, model, model_dimensions, status, chunk_count,
                 created_at, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                root_path = excluded.root_path,
                model = excluded.model,
                model_dimensions = excluded.model_dimensions,
                status = excluded.status,
                chunk_count = excluded.chunk_count,
                updated_at = excluded.updated_at",
            params![
                meta.name,
                meta.root_path.to_string_lossy(),
                meta.model,
                meta.model_dimensions as i64,
                meta.status.as_str(),
                meta.chunk_count as i64,
                meta.created_at,
                meta.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update only the status column of the singleton metadata row.
    pub fn set_status(&self, status: IndexStatus, updated_at: &str) -> OmniResult<()> {
        self.conn.execute(
            "UPDATE index_metadata SET status = ?1, updated_at = ?2 WHERE id = 1",
            params![status.as_str(), updated_at],
        )?;
        Ok(())
    }

    /// Recompute and persist `chunk_count` on the singleton metadata row.
    pub fn refresh_chunk_count(&self, updated_at: &str) -> OmniResult<()> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM chunks", [], |r| r.get(0))?;
        self.conn.execute(
            "UPDATE index_metadata SET chunk_count = ?1, updated_at = ?2 WHERE id = 1",
            params![count, updated_at],
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------

    /// Look up a file by its path relative to the index root.
    pub fn get_file_by_rel_path(&self, rel_path: &Path) -> OmniResult<Option<FileRecord>> {
        self.conn
            .query_row(
                "SELECT id, abs_path, rel_path, extension, language, content_hash, size,
                        mtime, analyzed_at, parse_error
                 FROM files WHERE rel_path = ?1",
                params![rel_path.to_string_lossy()],
                Self::row_to_file,
            )
            .optional()
            .map_err(OmniError::from)
    }

    /// List every indexed file.
    pub fn list_files(&self) -> OmniResult<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, abs_path, rel_path, extension, language, content_hash, size,
                    mtime, analyzed_at, parse_error
             FROM files ORDER BY rel_path",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_file)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Insert a new file row, or update the existing one for the same
    /// `abs_path`. Returns the row id.
    pub fn upsert_file(&self, file: &FileRecord) -> OmniResult<i64> {
        self.conn.execute(
            "INSERT INTO files
                (abs_path, rel_path, extension, language, content_hash, size, mtime,
                 analyzed_at, parse_error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(abs_path) DO UPDATE SET
                rel_path = excluded.rel_path,
                extension = excluded.extension,
                language = excluded.language,
                content_hash = excluded.content_hash,
                size = excluded.size,
                mtime = excluded.mtime,
                analyzed_at = excluded.analyzed_at,
                parse_error = excluded.parse_error",
            params![
                file.abs_path.to_string_lossy(),
                file.rel_path.to_string_lossy(),
                file.extension,
                file.language.as_str(),
                file.content_hash,
                file.size as i64,
                file.mtime,
                file.analyzed_at,
                file.parse_error,
            ],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM files WHERE abs_path = ?1",
            params![file.abs_path.to_string_lossy()],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    /// Delete a file and everything derived from it (chunks and symbols
    /// cascade via foreign key; dependencies and calls are removed
    /// explicitly since they key on path text, not `file_id`).
    pub fn delete_file(&self, rel_path: &Path) -> OmniResult<()> {
        self.conn.execute(
            "DELETE FROM files WHERE rel_path = ?1",
            params![rel_path.to_string_lossy()],
        )?;
        self.delete_dependencies_for_source(rel_path)?;
        self.delete_calls_for_caller_file(rel_path)?;
        Ok(())
    }

    /// Clear a file's chunks, symbols, dependencies, and calls ahead of a
    /// re-index, without removing the file row itself.
    pub fn clear_file_children(&self, file_id: i64, rel_path: &Path) -> OmniResult<()> {
        self.conn.execute("DELETE FROM chunks WHERE file_id = ?1", params![file_id])?;
        self.conn.execute("DELETE FROM symbols WHERE file_id = ?1", params![file_id])?;
        self.delete_dependencies_for_source(rel_path)?;
        self.delete_calls_for_caller_file(rel_path)?;
        Ok(())
    }

    fn row_to_file(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
        Ok(FileRecord {
            id: row.get(0)?,
            abs_path: PathBuf::from(row.get::<_, String>(1)?),
            rel_path: PathBuf::from(row.get::<_, String>(2)?),
            extension: row.get(3)?,
            language: language_from_str(&row.get::<_, String>(4)?),
            content_hash: row.get(5)?,
            size: row.get::<_, i64>(6)? as u64,
            mtime: row.get(7)?,
            analyzed_at: row.get(8)?,
            parse_error: row.get(9)?,
        })
    }

    // -----------------------------------------------------------------
    // Chunks
    // -----------------------------------------------------------------

    /// Insert a chunk row. Returns the assigned row id, which doubles as
    /// the vector index's key.
    pub fn insert_chunk(&self, chunk: &Chunk) -> OmniResult<i64> {
        let vector_bytes = if chunk.vector.is_empty() {
            None
        } else {
            Some(vector_to_bytes(&chunk.vector))
        };
        self.conn.execute(
            "INSERT INTO chunks
                (file_id, rel_path, content, line_start, line_end, content_hash, vector,
                 token_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                chunk.file_id,
                chunk.rel_path.to_string_lossy(),
                chunk.content,
                chunk.line_start,
                chunk.line_end,
                chunk.content_hash,
                vector_bytes,
                chunk.token_count,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Persist an embedding vector for an already-inserted chunk.
    pub fn set_chunk_vector(&self, chunk_id: i64, vector: &[f32]) -> OmniResult<()> {
        self.conn.execute(
            "UPDATE chunks SET vector = ?1 WHERE id = ?2",
            params![vector_to_bytes(vector), chunk_id],
        )?;
        Ok(())
    }

    /// Fetch every chunk belonging to a file.
    pub fn get_chunks_for_file(&self, file_id: i64) -> OmniResult<Vec<Chunk>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.file_id, f.abs_path, c.rel_path, c.content, c.line_start,
                    c.line_end, c.content_hash, c.vector, c.token_count
             FROM chunks c JOIN files f ON f.id = c.file_id
             WHERE c.file_id = ?1 ORDER BY c.line_start",
        )?;
        let rows = stmt
            .query_map(params![file_id], Self::row_to_chunk)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Fetch a single chunk by id.
    pub fn get_chunk(&self, chunk_id: i64) -> OmniResult<Option<Chunk>> {
        self.conn
            .query_row(
                "SELECT c.id, c.file_id, f.abs_path, c.rel_path, c.content, c.line_start,
                        c.line_end, c.content_hash, c.vector, c.token_count
                 FROM chunks c JOIN files f ON f.id = c.file_id
                 WHERE c.id = ?1",
                params![chunk_id],
                Self::row_to_chunk,
            )
            .optional()
            .map_err(OmniError::from)
    }

    /// Fetch every embedded chunk in the index (used to rebuild the
    /// in-memory vector index on startup).
    pub fn list_embedded_chunks(&self) -> OmniResult<Vec<Chunk>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.file_id, f.abs_path, c.rel_path, c.content, c.line_start,
                    c.line_end, c.content_hash, c.vector, c.token_count
             FROM chunks c JOIN files f ON f.id = c.file_id
             WHERE c.vector IS NOT NULL",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_chunk)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
        let vector_bytes: Option<Vec<u8>> = row.get(8)?;
        Ok(Chunk {
            id: row.get(0)?,
            file_id: row.get(1)?,
            file_path: PathBuf::from(row.get::<_, String>(2)?),
            rel_path: PathBuf::from(row.get::<_, String>(3)?),
            content: row.get(4)?,
            line_start: row.get(5)?,
            line_end: row.get(6)?,
            content_hash: row.get(7)?,
            vector: vector_bytes.map(|b| bytes_to_vector(&b)).unwrap_or_default(),
            token_count: row.get(9)?,
        })
    }

    // -----------------------------------------------------------------
    // Symbols
    // -----------------------------------------------------------------

    /// Insert or replace a symbol row.
    pub fn upsert_symbol(&self, symbol: &Symbol) -> OmniResult<()> {
        let modifiers = serde_json::to_string(&symbol.modifiers)
            .map_err(|e| OmniError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO symbols
                (id, name, qualified_name, kind, file_id, rel_path, line_start, line_end,
                 col_start, is_exported, is_default_export, signature, doc, parent_id,
                 modifiers)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                qualified_name = excluded.qualified_name,
                kind = excluded.kind,
                file_id = excluded.file_id,
                rel_path = excluded.rel_path,
                line_start = excluded.line_start,
                line_end = excluded.line_end,
                col_start = excluded.col_start,
                is_exported = excluded.is_exported,
                is_default_export = excluded.is_default_export,
                signature = excluded.signature,
                doc = excluded.doc,
                parent_id = excluded.parent_id,
                modifiers = excluded.modifiers",
            params![
                symbol.id,
                symbol.name,
                symbol.qualified_name,
                symbol.kind.as_str(),
                symbol.file_id,
                symbol.rel_path.to_string_lossy(),
                symbol.line_start,
                symbol.line_end,
                symbol.col_start,
                symbol.is_exported,
                symbol.is_default_export,
                symbol.signature,
                symbol.doc,
                symbol.parent_id,
                modifiers,
            ],
        )?;
        Ok(())
    }

    /// Fetch a symbol by its stable id.
    pub fn get_symbol(&self, id: &str) -> OmniResult<Option<Symbol>> {
        self.conn
            .query_row(
                "SELECT id, name, qualified_name, kind, file_id, rel_path, line_start,
                        line_end, col_start, is_exported, is_default_export, signature,
                        doc, parent_id, modifiers
                 FROM symbols WHERE id = ?1",
                params![id],
                Self::row_to_symbol,
            )
            .optional()
            .map_err(OmniError::from)
    }

    /// Find symbols by exact short name.
    pub fn find_symbols_by_name(&self, name: &str, limit: usize) -> OmniResult<Vec<Symbol>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, qualified_name, kind, file_id, rel_path, line_start,
                    line_end, col_start, is_exported, is_default_export, signature,
                    doc, parent_id, modifiers
             FROM symbols WHERE name = ?1 LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![name, limit as i64], Self::row_to_symbol)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List every symbol in the index.
    pub fn list_symbols(&self) -> OmniResult<Vec<Symbol>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, qualified_name, kind, file_id, rel_path, line_start,
                    line_end, col_start, is_exported, is_default_export, signature,
                    doc, parent_id, modifiers
             FROM symbols",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_symbol)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_to_symbol(row: &rusqlite::Row<'_>) -> rusqlite::Result<Symbol> {
        let modifiers_json: String = row.get(14)?;
        let modifiers: Vec<String> = serde_json::from_str(&modifiers_json).unwrap_or_default();
        Ok(Symbol {
            id: row.get(0)?,
            name: row.get(1)?,
            qualified_name: row.get(2)?,
            kind: SymbolKind::from_str_lossy(&row.get::<_, String>(3)?),
            file_id: row.get(4)?,
            rel_path: PathBuf::from(row.get::<_, String>(5)?),
            line_start: row.get(6)?,
            line_end: row.get(7)?,
            col_start: row.get(8)?,
            is_exported: row.get(9)?,
            is_default_export: row.get(10)?,
            signature: row.get(11)?,
            doc: row.get(12)?,
            parent_id: row.get(13)?,
            modifiers,
        })
    }

    // -----------------------------------------------------------------
    // Dependencies
    // -----------------------------------------------------------------

    /// Insert a dependency edge. Returns the assigned row id.
    pub fn insert_dependency(&self, dep: &Dependency) -> OmniResult<i64> {
        let names = serde_json::to_string(&dep.names).map_err(|e| OmniError::Serialization(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO dependencies
                (source_file, target_module, resolved_path, kind, names, line, is_external)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                dep.source_file.to_string_lossy(),
                dep.target_module,
                dep.resolved_path.as_ref().map(|p| p.to_string_lossy().to_string()),
                dep.kind.as_str(),
                names,
                dep.line,
                dep.is_external,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List every dependency edge in the index.
    pub fn list_dependencies(&self) -> OmniResult<Vec<Dependency>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_file, target_module, resolved_path, kind, names, line,
                    is_external
             FROM dependencies",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_dependency)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Remove every dependency declared in a given source file.
    pub fn delete_dependencies_for_source(&self, source_file: &Path) -> OmniResult<()> {
        self.conn.execute(
            "DELETE FROM dependencies WHERE source_file = ?1",
            params![source_file.to_string_lossy()],
        )?;
        Ok(())
    }

    fn row_to_dependency(row: &rusqlite::Row<'_>) -> rusqlite::Result<Dependency> {
        let names_json: String = row.get(5)?;
        let names: Vec<DependencyName> = serde_json::from_str(&names_json).unwrap_or_default();
        let resolved: Option<String> = row.get(3)?;
        Ok(Dependency {
            id: row.get(0)?,
            source_file: PathBuf::from(row.get::<_, String>(1)?),
            target_module: row.get(2)?,
            resolved_path: resolved.map(PathBuf::from),
            kind: dependency_kind_from_str(&row.get::<_, String>(4)?),
            names,
            line: row.get(6)?,
            is_external: row.get(7)?,
        })
    }

    // -----------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------

    /// Insert a call edge. Returns the assigned row id.
    pub fn insert_call(&self, call: &CallEdge) -> OmniResult<i64> {
        self.conn.execute(
            "INSERT INTO calls
                (caller_id, caller_file, callee_name, callee_id, callee_file, line, column,
                 is_method_call, receiver, argument_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                call.caller_id,
                call.caller_file.to_string_lossy(),
                call.callee_name,
                call.callee_id,
                call.callee_file.as_ref().map(|p| p.to_string_lossy().to_string()),
                call.line,
                call.column,
                call.is_method_call,
                call.receiver,
                call.argument_count,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List every call edge in the index.
    pub fn list_calls(&self) -> OmniResult<Vec<CallEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, caller_id, caller_file, callee_name, callee_id, callee_file, line,
                    column, is_method_call, receiver, argument_count
             FROM calls",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_call)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List every call edge whose `callee_name` matches (best-effort
    /// "who calls this name" before symbol resolution narrows it down).
    pub fn calls_to_callee_name(&self, name: &str) -> OmniResult<Vec<CallEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, caller_id, caller_file, callee_name, callee_id, callee_file, line,
                    column, is_method_call, receiver, argument_count
             FROM calls WHERE callee_name = ?1",
        )?;
        let rows = stmt
            .query_map(params![name], Self::row_to_call)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Remove every call edge recorded in a given caller file.
    pub fn delete_calls_for_caller_file(&self, caller_file: &Path) -> OmniResult<()> {
        self.conn.execute(
            "DELETE FROM calls WHERE caller_file = ?1",
            params![caller_file.to_string_lossy()],
        )?;
        Ok(())
    }

    fn row_to_call(row: &rusqlite::Row<'_>) -> rusqlite::Result<CallEdge> {
        let callee_file: Option<String> = row.get(5)?;
        Ok(CallEdge {
            id: row.get(0)?,
            caller_id: row.get(1)?,
            caller_file: PathBuf::from(row.get::<_, String>(2)?),
            callee_name: row.get(3)?,
            callee_id: row.get(4)?,
            callee_file: callee_file.map(PathBuf::from),
            line: row.get(6)?,
            column: row.get(7)?,
            is_method_call: row.get(8)?,
            receiver: row.get(9)?,
            argument_count: row.get(10)?,
        })
    }

    // -----------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------

    /// Compute aggregate counters across every table. `vector_count` and
    /// `has_cycles` are filled in by the caller, which has access to the
    /// in-memory vector index and dependency graph this store doesn't.
    pub fn statistics(&self) -> OmniResult<IndexStats> {
        let file_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?;
        let chunk_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM chunks", [], |r| r.get(0))?;
        let symbol_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM symbols", [], |r| r.get(0))?;
        let dependency_count: i64 =
            self.conn.query_row("SELECT COUNT(*) FROM dependencies", [], |r| r.get(0))?;
        let call_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM calls", [], |r| r.get(0))?;
        Ok(IndexStats {
            file_count: file_count as u64,
            chunk_count: chunk_count as u64,
            symbol_count: symbol_count as u64,
            dependency_count: dependency_count as u64,
            call_count: call_count as u64,
            vector_count: 0,
            has_cycles: false,
        })
    }
}

/// Auto-detection (§4.6, §8 scenario 2): among every `ready` index under
/// `data_root`, pick the one whose `root_path` is the deepest ancestor of
/// `cwd`. Indexes in `building` or `failed` status are never auto-selected.
/// Returns `None` when no index's root contains `cwd`.
pub fn auto_detect_index(data_root: &Path, cwd: &Path) -> OmniResult<Option<String>> {
    let db_root = crate::paths::db_dir(data_root);
    if !db_root.exists() {
        return Ok(None);
    }

    let mut best: Option<(usize, String)> = None;
    for entry in std::fs::read_dir(&db_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let db_path = crate::paths::index_db_path(data_root, &name);
        if !db_path.exists() {
            continue;
        }

        let store = MetadataIndex::open(&db_path)?;
        let Some(meta) = store.get_metadata()? else { continue };
        if meta.status != IndexStatus::Ready {
            continue;
        }
        if !cwd.starts_with(&meta.root_path) {
            continue;
        }

        let depth = meta.root_path.components().count();
        if best.as_ref().map_or(true, |(best_depth, _)| depth > *best_depth) {
            best = Some((depth, name));
        }
    }

    Ok(best.map(|(_, name)| name))
}

fn vector_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_vector(b: &[u8]) -> Vec<f32> {
    b.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn language_from_str(s: &str) -> Language {
    match s {
        "go" => Language::Go,
        "rust" => Language::Rust,
        "python" => Language::Python,
        "c" => Language::C,
        "cpp" => Language::Cpp,
        "java" => Language::Java,
        _ => Language::Unknown,
    }
}

fn dependency_kind_from_str(s: &str) -> DependencyKind {
    DependencyKind::from_str_lossy(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndexStatus;

    fn open_test_index() -> (tempfile::TempDir, MetadataIndex) {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = MetadataIndex::open(&dir.path().join("test.db3")).expect("open");
        (dir, index)
    }

    fn sample_file() -> FileRecord {
        FileRecord {
            id: 0,
            abs_path: PathBuf::from("/repo/src/lib.rs"),
            rel_path: PathBuf::from("src/lib.rs"),
            extension: "rs".into(),
            language: Language::Rust,
            content_hash: "abc123".into(),
            size: 42,
            mtime: 1_700_000_000,
            analyzed_at: "2026-01-01T00:00:00Z".into(),
            parse_error: None,
        }
    }

    #[test]
    fn open_creates_database() {
        let (_dir, index) = open_test_index();
        assert!(index.check_integrity().expect("integrity"));
    }

    #[test]
    fn metadata_round_trips() {
        let (_dir, index) = open_test_index();
        assert!(index.get_metadata().expect("get").is_none());

        let meta = IndexMetadata {
            name: "myrepo".into(),
            root_path: PathBuf::from("/repo"),
            model: "jina-embeddings-v2-base-code".into(),
            model_dimensions: 768,
            status: IndexStatus::Building,
            chunk_count: 0,
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        };
        index.upsert_metadata(&meta).expect("upsert");

        let fetched = index.get_metadata().expect("get").expect("present");
        assert_eq!(fetched.name, "myrepo");
        assert_eq!(fetched.status, IndexStatus::Building);

        index.set_status(IndexStatus::Ready, "2026-01-02T00:00:00Z").expect("set status");
        let fetched = index.get_metadata().expect("get").expect("present");
        assert_eq!(fetched.status, IndexStatus::Ready);
    }

    #[test]
    fn file_upsert_and_lookup() {
        let (_dir, index) = open_test_index();
        let file = sample_file();
        let id = index.upsert_file(&file).expect("upsert");
        assert!(id > 0);

        let found = index
            .get_file_by_rel_path(Path::new("src/lib.rs"))
            .expect("query")
            .expect("present");
        assert_eq!(found.content_hash, "abc123");
        assert_eq!(found.id, id);

        let mut updated = file.clone();
        updated.content_hash = "def456".into();
        let id2 = index.upsert_file(&updated).expect("upsert again");
        assert_eq!(id, id2, "same abs_path should update, not duplicate");

        let files = index.list_files().expect("list");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content_hash, "def456");
    }

    #[test]
    fn deleting_a_file_cascades_chunks_and_symbols() {
        let (_dir, index) = open_test_index();
        let file = sample_file();
        let file_id = index.upsert_file(&file).expect("upsert file");

        let chunk = Chunk {
            id: 0,
            file_id,
            file_path: file.abs_path.clone(),
            rel_path: file.rel_path.clone(),
            content: "fn main() {}".into(),
            line_start: 1,
            line_end: 1,
            content_hash: "abc123".into(),
            vector: vec![0.1, 0.2, 0.3],
            token_count: 3,
        };
        index.insert_chunk(&chunk).expect("insert chunk");

        let symbol = Symbol {
            id: "src/lib.rs:main:function".into(),
            name: "main".into(),
            qualified_name: "main".into(),
            kind: SymbolKind::Function,
            file_id,
            rel_path: file.rel_path.clone(),
            line_start: 1,
            line_end: 1,
            col_start: 0,
            is_exported: false,
            is_default_export: false,
            signature: Some("fn main()".into()),
            doc: None,
            parent_id: None,
            modifiers: Vec::new(),
        };
        index.upsert_symbol(&symbol).expect("insert symbol");

        assert_eq!(index.get_chunks_for_file(file_id).expect("chunks").len(), 1);
        assert!(index.get_symbol(&symbol.id).expect("get symbol").is_some());

        index.delete_file(&file.rel_path).expect("delete");

        assert!(index.get_file_by_rel_path(&file.rel_path).expect("query").is_none());
        assert_eq!(index.get_chunks_for_file(file_id).expect("chunks").len(), 0);
        assert!(index.get_symbol(&symbol.id).expect("get symbol").is_none());
    }

    #[test]
    fn chunk_vector_round_trips_through_blob_storage() {
        let (_dir, index) = open_test_index();
        let file = sample_file();
        let file_id = index.upsert_file(&file).expect("upsert");

        let chunk = Chunk {
            id: 0,
            file_id,
            file_path: file.abs_path.clone(),
            rel_path: file.rel_path.clone(),
            content: "content".into(),
            line_start: 1,
            line_end: 2,
            content_hash: "h".into(),
            vector: Vec::new(),
            token_count: 1,
        };
        let chunk_id = index.insert_chunk(&chunk).expect("insert");

        let vector = vec![0.5f32, -0.25, 1.0, 0.0];
        index.set_chunk_vector(chunk_id, &vector).expect("set vector");

        let fetched = index.get_chunk(chunk_id).expect("get").expect("present");
        assert_eq!(fetched.vector, vector);

        let embedded = index.list_embedded_chunks().expect("list embedded");
        assert_eq!(embedded.len(), 1);
    }

    #[test]
    fn dependency_and_call_round_trip() {
        let (_dir, index) = open_test_index();

        let dep = Dependency {
            id: 0,
            source_file: PathBuf::from("src/main.rs"),
            target_module: "crate::lib".into(),
            resolved_path: Some(PathBuf::from("src/lib.rs")),
            kind: DependencyKind::Import,
            names: vec![DependencyName {
                name: "Config".into(),
                alias: None,
                is_type_only: false,
                is_default: false,
                is_namespace: false,
            }],
            line: 3,
            is_external: false,
        };
        index.insert_dependency(&dep).expect("insert dep");
        let deps = index.list_dependencies().expect("list deps");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].names[0].name, "Config");

        let call = CallEdge {
            id: 0,
            caller_id: Some("src/main.rs:main:function".into()),
            caller_file: PathBuf::from("src/main.rs"),
            callee_name: "run".into(),
            callee_id: Some("src/lib.rs:run:function".into()),
            callee_file: Some(PathBuf::from("src/lib.rs")),
            line: 5,
            column: 4,
            is_method_call: false,
            receiver: None,
            argument_count: 0,
        };
        index.insert_call(&call).expect("insert call");
        let callers = index.calls_to_callee_name("run").expect("callers");
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].caller_file, PathBuf::from("src/main.rs"));

        index.delete_calls_for_caller_file(Path::new("src/main.rs")).expect("delete calls");
        assert!(index.calls_to_callee_name("run").expect("callers").is_empty());
    }

    #[test]
    fn statistics_reflects_row_counts() {
        let (_dir, index) = open_test_index();
        index.upsert_file(&sample_file()).expect("upsert");
        let stats = index.statistics().expect("stats");
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.chunk_count, 0);
    }

    fn seed_index(data_root: &Path, name: &str, root_path: &Path, status: IndexStatus) {
        let db_path = crate::paths::index_db_path(data_root, name);
        let index = MetadataIndex::open(&db_path).expect("open");
        let now = "2026-01-01T00:00:00Z".to_string();
        index
            .upsert_metadata(&IndexMetadata {
                name: name.to_string(),
                root_path: root_path.to_path_buf(),
                model: "test-model".into(),
                model_dimensions: 8,
                status,
                chunk_count: 0,
                created_at: now.clone(),
                updated_at: now,
            })
            .expect("seed metadata");
    }

    #[test]
    fn auto_detect_picks_deepest_ready_ancestor() {
        let data_root = tempfile::tempdir().expect("tempdir");
        seed_index(data_root.path(), "repo-root", Path::new("/repo"), IndexStatus::Ready);
        seed_index(data_root.path(), "repo-pkg", Path::new("/repo/pkg"), IndexStatus::Ready);

        let b = auto_detect_index(data_root.path(), Path::new("/repo/pkg/src")).expect("detect");
        assert_eq!(b, Some("repo-pkg".to_string()));

        let a = auto_detect_index(data_root.path(), Path::new("/repo/other")).expect("detect");
        assert_eq!(a, Some("repo-root".to_string()));

        let none = auto_detect_index(data_root.path(), Path::new("/elsewhere")).expect("detect");
        assert_eq!(none, None);
    }

    #[test]
    fn auto_detect_skips_building_and_failed_indexes() {
        let data_root = tempfile::tempdir().expect("tempdir");
        seed_index(data_root.path(), "building", Path::new("/repo"), IndexStatus::Building);
        seed_index(data_root.path(), "failed", Path::new("/repo"), IndexStatus::Failed);

        let result = auto_detect_index(data_root.path(), Path::new("/repo/src")).expect("detect");
        assert_eq!(result, None);
    }
}
