//! Context assembly with priority-based packing and compression.
//!
//! Assembles token-budget-aware context windows from search results,
//! prioritizing critical chunks and compressing low-priority ones to fit
//! maximum relevant context within the configured budget
//! (`contextMaxTokens`, `contextFileLimit`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::search::intent::QueryIntent;
use crate::types::{Chunk, ChunkPriority, ContextEntry, ContextWindow, SearchResult};

/// Packs search results into a token-budget-aware context window.
pub struct ContextAssembler {
    token_budget: u32,
    file_limit: usize,
}

impl ContextAssembler {
    /// Create a new assembler with the given token budget and per-window
    /// distinct-file cap (`contextFileLimit`).
    pub fn new(token_budget: u32, file_limit: usize) -> Self {
        Self { token_budget, file_limit }
    }

    /// Assemble a context window from ranked search results.
    ///
    /// `active_file` (if known) is always marked critical and never
    /// compressed. `graph_neighbors` marks chunks pulled in via
    /// dependency-graph traversal rather than a direct query match.
    pub fn assemble(
        &self,
        query: &str,
        search_results: Vec<SearchResult>,
        active_file: Option<&Path>,
        graph_neighbors: &HashSet<PathBuf>,
    ) -> ContextWindow {
        let strategy = QueryIntent::classify(query).context_strategy();

        let mut seen_files: HashSet<PathBuf> = HashSet::new();
        let mut entries: Vec<ContextEntry> = Vec::new();

        for result in search_results {
            let rel_path = result.chunk.rel_path.clone();
            if !seen_files.contains(&rel_path) && seen_files.len() >= self.file_limit {
                continue;
            }

            let is_active_file = active_file.is_some_and(|af| af == rel_path.as_path());
            let is_test = looks_like_test_file(&rel_path);
            let is_graph_neighbor = graph_neighbors.contains(&rel_path);

            if is_test && !strategy.include_tests && !is_active_file {
                continue;
            }

            let priority = ChunkPriority::from_score_and_context(
                result.score,
                is_active_file,
                is_test,
                is_graph_neighbor,
            );

            seen_files.insert(rel_path.clone());
            entries.push(ContextEntry {
                rel_path,
                chunk: result.chunk,
                score: result.score,
                is_graph_neighbor,
                priority,
            });
        }

        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
        });

        self.pack_with_budget(entries)
    }

    /// Pack entries within the token budget, compressing non-critical
    /// entries as needed and dropping whatever still doesn't fit.
    fn pack_with_budget(&self, entries: Vec<ContextEntry>) -> ContextWindow {
        let mut packed = Vec::new();
        let mut total_tokens: u32 = 0;

        for mut entry in entries {
            let remaining = self.token_budget.saturating_sub(total_tokens);

            if entry.chunk.token_count <= remaining {
                total_tokens += entry.chunk.token_count;
                packed.push(entry);
                continue;
            }

            if entry.priority == ChunkPriority::Critical {
                // Critical entries are never compressed or dropped; they
                // may push the window over budget (§4.16: active file and
                // direct dependencies are "always included, never
                // compressed").
                total_tokens += entry.chunk.token_count;
                packed.push(entry);
                continue;
            }

            let compressed = compress_chunk(&entry.chunk, entry.priority);
            if compressed.token_count <= remaining {
                total_tokens += compressed.token_count;
                entry.chunk = compressed;
                packed.push(entry);
            }
        }

        ContextWindow { entries: packed, total_tokens, token_budget: self.token_budget }
    }
}

/// Best-effort test-file detection from path conventions across the six
/// registered languages: `test_*.py`, `*_test.go`, `*.test.rs` style
/// names, and files under a `tests/`/`test/` directory.
fn looks_like_test_file(rel_path: &Path) -> bool {
    if rel_path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        s == "test" || s == "tests" || s == "__tests__"
    }) {
        return true;
    }
    let Some(stem) = rel_path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) else {
        return false;
    };
    stem.starts_with("test_") || stem.ends_with("_test") || stem.ends_with("test")
}

/// Compress a chunk's content according to its assigned priority.
/// `Critical` chunks are never passed in here (see `pack_with_budget`).
fn compress_chunk(chunk: &Chunk, priority: ChunkPriority) -> Chunk {
    let compression_factor = priority.compression_factor();
    if compression_factor == 0.0 {
        return chunk.clone();
    }

    let lines: Vec<&str> = chunk.content.lines().collect();
    if lines.is_empty() {
        return chunk.clone();
    }

    let first_line = lines[0];
    let compressed_content = match priority {
        ChunkPriority::Critical => chunk.content.clone(),
        ChunkPriority::High => {
            let keep = 6.min(lines.len());
            let mut content = lines[..keep].join("\n");
            if lines.len() > keep {
                content.push_str("\n// ... (truncated)");
            }
            content
        }
        ChunkPriority::Medium => {
            format!("{first_line}\n// ... (implementation omitted)")
        }
        ChunkPriority::Low => {
            format!("{first_line} /* ... */")
        }
    };

    let token_count = estimate_tokens(&compressed_content);
    Chunk {
        id: chunk.id,
        file_id: chunk.file_id,
        file_path: chunk.file_path.clone(),
        rel_path: chunk.rel_path.clone(),
        content: compressed_content,
        line_start: chunk.line_start,
        line_end: chunk.line_end,
        content_hash: chunk.content_hash.clone(),
        vector: Vec::new(),
        token_count,
    }
}

fn estimate_tokens(text: &str) -> u32 {
    ((text.len() / 4).max(1)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_chunk(rel_path: &str, content: &str, token_count: u32, score_seed: i64) -> Chunk {
        Chunk {
            id: score_seed,
            file_id: 1,
            file_path: PathBuf::from(rel_path),
            rel_path: PathBuf::from(rel_path),
            content: content.to_string(),
            line_start: 1,
            line_end: content.lines().count() as u32,
            content_hash: "h".into(),
            vector: Vec::new(),
            token_count,
        }
    }

    fn make_result(chunk: Chunk, score: f64) -> SearchResult {
        SearchResult { chunk, similarity: score, score }
    }

    #[test]
    fn assembles_within_budget() {
        let assembler = ContextAssembler::new(1000, 15);
        let results = vec![
            make_result(make_chunk("a.rs", "fn a() {}", 100, 1), 0.9),
            make_result(make_chunk("b.rs", "fn b() {}", 100, 2), 0.8),
        ];

        let window = assembler.assemble("fix the bug", results, None, &HashSet::new());
        assert_eq!(window.entries.len(), 2);
        assert!(window.total_tokens <= 1000);
    }

    #[test]
    fn drops_entries_once_budget_is_exhausted() {
        let assembler = ContextAssembler::new(120, 15);
        let results = vec![
            make_result(make_chunk("a.rs", "fn a() {}", 100, 1), 0.9),
            make_result(make_chunk("b.rs", "fn b() {}\nfn c() {}\nfn d() {}", 100, 2), 0.2),
        ];

        let window = assembler.assemble("fix the bug", results, None, &HashSet::new());
        assert_eq!(window.entries.len(), 1);
        assert_eq!(window.entries[0].rel_path, PathBuf::from("a.rs"));
    }

    #[test]
    fn active_file_is_never_compressed_or_dropped() {
        let assembler = ContextAssembler::new(10, 15);
        let big_content = "fn big() {\n".to_string() + &"  line();\n".repeat(50) + "}";
        let chunk = make_chunk("active.rs", &big_content, 500, 1);
        let results = vec![make_result(chunk, 0.1)];

        let window = assembler.assemble(
            "fix the bug",
            results,
            Some(Path::new("active.rs")),
            &HashSet::new(),
        );

        assert_eq!(window.entries.len(), 1);
        assert_eq!(window.entries[0].priority, ChunkPriority::Critical);
        assert!(window.total_tokens > 10, "critical entries may exceed the budget");
    }

    #[test]
    fn file_limit_caps_distinct_files_not_chunk_count() {
        let assembler = ContextAssembler::new(10_000, 1);
        let results = vec![
            make_result(make_chunk("a.rs", "fn a() {}", 10, 1), 0.9),
            make_result(make_chunk("a.rs", "fn a2() {}", 10, 2), 0.85),
            make_result(make_chunk("b.rs", "fn b() {}", 10, 3), 0.8),
        ];

        let window = assembler.assemble("fix the bug", results, None, &HashSet::new());
        assert!(window.entries.iter().all(|e| e.rel_path == PathBuf::from("a.rs")));
    }

    #[test]
    fn test_files_are_excluded_for_explain_intent() {
        let assembler = ContextAssembler::new(10_000, 15);
        let results = vec![make_result(make_chunk("tests/a_test.rs", "fn t() {}", 10, 1), 0.9)];

        let window = assembler.assemble("explain how auth works", results, None, &HashSet::new());
        assert!(window.entries.is_empty());
    }

    #[test]
    fn looks_like_test_file_matches_common_conventions() {
        assert!(looks_like_test_file(Path::new("src/test_auth.py")));
        assert!(looks_like_test_file(Path::new("pkg/auth_test.go")));
        assert!(looks_like_test_file(Path::new("tests/auth.rs")));
        assert!(!looks_like_test_file(Path::new("src/auth.rs")));
    }
}
