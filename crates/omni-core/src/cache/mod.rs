//! Shared, content-addressed embedding cache.
//!
//! Embeddings are expensive (a local ONNX forward pass per chunk) and
//! deterministic given `(model, content)`. Rather than re-embed identical
//! chunks across indexes -- the same vendored dependency shows up in many
//! repos -- every index shares one cache keyed by
//! `sha256(model || '\0' || content)`, stored at `<root>/cache/embeddings.db3`
//! (`paths::cache_db_path`).
//!
//! This is a plain key/value table, not an index: no rel_path, no file_id,
//! nothing that ties an entry to a particular repo. A cache miss just
//! means re-embedding; it is never a correctness problem, so this module
//! treats its own I/O errors as fatal but never invents a recovery story.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::error::OmniResult;

/// SQLite-backed, content-addressed store of embedding vectors.
pub struct EmbeddingCache {
    conn: Connection,
}

impl EmbeddingCache {
    /// Open or create the cache database at the given path.
    pub fn open(db_path: &Path) -> OmniResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS embeddings (
                key TEXT PRIMARY KEY,
                model TEXT NOT NULL,
                dimensions INTEGER NOT NULL,
                vector BLOB NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Compute the cache key for a `(model, content)` pair.
    pub fn key(model: &str, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update(b"\0");
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Look up a cached embedding by key.
    pub fn get(&self, key: &str) -> OmniResult<Option<Vec<f32>>> {
        let row: Option<Vec<u8>> = self
            .conn
            .query_row("SELECT vector FROM embeddings WHERE key = ?1", params![key], |r| r.get(0))
            .optional()?;
        Ok(row.map(|bytes| bytes_to_vector(&bytes)))
    }

    /// Store an embedding under its content-address key.
    pub fn put(&self, key: &str, model: &str, vector: &[f32], created_at: &str) -> OmniResult<()> {
        self.conn.execute(
            "INSERT INTO embeddings (key, model, dimensions, vector, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                model = excluded.model,
                dimensions = excluded.dimensions,
                vector = excluded.vector,
                created_at = excluded.created_at",
            params![key, model, vector.len() as i64, vector_to_bytes(vector), created_at],
        )?;
        Ok(())
    }

    /// Number of cached embeddings.
    pub fn len(&self) -> OmniResult<u64> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM embeddings", [], |r| r.get(0))?;
        Ok(count as u64)
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> OmniResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every cached embedding for a model (used when a model
    /// upgrade should not keep serving stale vectors under the same key).
    pub fn clear_model(&self, model: &str) -> OmniResult<()> {
        self.conn.execute("DELETE FROM embeddings WHERE model = ?1", params![model])?;
        Ok(())
    }
}

fn vector_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_vector(b: &[u8]) -> Vec<f32> {
    b.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
