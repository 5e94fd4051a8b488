//! Query Engine: hybrid search, caller lookup, impact BFS, cycles DFS,
//! dead-code/unused-export scans, similar-code clustering, rename preview
//! (§4.6). Every operation reads the store; none write.

pub mod command;
pub mod context_assembler;
pub mod intent;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::error::OmniResult;
use crate::graph::DependencyGraph;
use crate::index::MetadataIndex;
use crate::types::{
    CallerInfo, Chunk, DeadSymbol, ImpactResult, RenameEdit, SearchResult, SimilarGroup,
    SymbolKind,
};
use crate::vector::{l2_normalize, VectorIndex};

/// Symbol kinds `dead` considers, per §4.6 ("function, method").
const DEAD_CODE_KINDS: [SymbolKind; 2] = [SymbolKind::Function, SymbolKind::Method];

/// Maximum simple-cycle length `cycles` reports, per §4.6.
const MAX_CYCLE_LENGTH: usize = 16;

/// Cosine similarity threshold above which two chunks are considered
/// near-duplicates for `similar`, per §4.6.
const SIMILAR_THRESHOLD: f32 = 0.85;

/// Hybrid search engine: fuses semantic (vector) and keyword signals via
/// Reciprocal Rank Fusion, and answers every other read-only query over
/// the structural store.
pub struct SearchEngine {
    rrf_k: u32,
}

impl SearchEngine {
    /// Create a new search engine with the given RRF constant.
    pub fn new(rrf_k: u32) -> Self {
        Self { rrf_k }
    }

    /// Compute RRF score from two rank lists (1-indexed; `None` = absent
    /// from that signal's ranking).
    pub fn rrf_score(&self, semantic_rank: Option<u32>, keyword_rank: Option<u32>) -> f64 {
        let k = f64::from(self.rrf_k);
        let semantic = semantic_rank.map_or(0.0, |r| 1.0 / (k + f64::from(r)));
        let keyword = keyword_rank.map_or(0.0, |r| 1.0 / (k + f64::from(r)));
        semantic + keyword
    }

    /// `search(query, limit, diversity)`: embed the query, score every
    /// embedded chunk by cosine similarity, optionally diversify with MMR,
    /// and fuse in a keyword-substring signal via RRF.
    ///
    /// `query_vector` is `None` when the embedding provider is degraded
    /// (§4.5); search then falls back to the keyword signal alone.
    pub fn search(
        &self,
        store: &MetadataIndex,
        vectors: &VectorIndex,
        query: &str,
        query_vector: Option<Vec<f32>>,
        limit: usize,
        diversity: f64,
    ) -> OmniResult<Vec<SearchResult>> {
        let chunks_by_id: HashMap<i64, Chunk> =
            store.list_embedded_chunks()?.into_iter().map(|c| (c.id, c)).collect();

        let semantic_ranked: Vec<(i64, f32)> = match &query_vector {
            Some(qv) => {
                let mut qv = qv.clone();
                l2_normalize(&mut qv);
                let k = chunks_by_id.len().max(limit * 4).max(limit);
                vectors.search(&qv, k)?
            }
            None => Vec::new(),
        };

        let keyword_ranked = keyword_rank(store, query)?;

        let mut semantic_rank_of: HashMap<i64, u32> = HashMap::new();
        for (rank, (id, _)) in semantic_ranked.iter().enumerate() {
            semantic_rank_of.insert(*id, rank as u32 + 1);
        }
        let mut keyword_rank_of: HashMap<i64, u32> = HashMap::new();
        for (rank, id) in keyword_ranked.iter().enumerate() {
            keyword_rank_of.insert(*id, rank as u32 + 1);
        }
        let semantic_sim_of: HashMap<i64, f32> = semantic_ranked.into_iter().collect();

        let mut candidate_ids: Vec<i64> =
            semantic_rank_of.keys().chain(keyword_rank_of.keys()).copied().collect();
        candidate_ids.sort_unstable();
        candidate_ids.dedup();

        let mut scored: Vec<(Chunk, f64)> = candidate_ids
            .into_iter()
            .filter_map(|id| {
                let chunk = chunks_by_id.get(&id)?.clone();
                let score = self.rrf_score(semantic_rank_of.get(&id).copied(), keyword_rank_of.get(&id).copied());
                Some((chunk, score))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.rel_path.cmp(&b.0.rel_path))
        });

        let selected = if diversity > 0.0 {
            mmr_select(scored, &semantic_sim_of, diversity, limit)
        } else {
            scored.into_iter().take(limit).collect()
        };

        Ok(selected
            .into_iter()
            .map(|(chunk, score)| {
                let similarity = f64::from(semantic_sim_of.get(&chunk.id).copied().unwrap_or(0.0));
                SearchResult { chunk, similarity, score }
            })
            .collect())
    }

    /// `callers(symbol)`: every call edge whose resolved callee matches a
    /// symbol named `symbol`, falling back to a bare-name match when
    /// resolution didn't succeed.
    pub fn callers(&self, store: &MetadataIndex, symbol: &str) -> OmniResult<Vec<CallerInfo>> {
        let matching_ids: HashSet<String> = store
            .find_symbols_by_name(symbol, usize::MAX)?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let mut results: Vec<CallerInfo> = store
            .list_calls()?
            .into_iter()
            .filter(|call| {
                call.callee_id.as_ref().is_some_and(|id| matching_ids.contains(id))
                    || (call.callee_id.is_none() && call.callee_name == symbol)
            })
            .map(|call| CallerInfo { caller_id: call.caller_id, caller_file: call.caller_file, line: call.line })
            .collect();

        results.sort_by(|a, b| a.caller_file.cmp(&b.caller_file).then(a.line.cmp(&b.line)));
        Ok(results)
    }

    /// `impact(symbol)`: resolve `symbol` to the files containing its
    /// direct callers, then BFS the reverse file-dependency graph from
    /// those files out to transitive closure.
    pub fn impact(&self, store: &MetadataIndex, symbol: &str, depth: usize) -> OmniResult<ImpactResult> {
        let mut direct: Vec<PathBuf> =
            self.callers(store, symbol)?.into_iter().map(|c| c.caller_file).collect();
        direct.sort();
        direct.dedup();

        let graph = DependencyGraph::from_dependencies(&store.list_dependencies()?);
        let mut transitive: Vec<PathBuf> = Vec::new();
        for file in &direct {
            let key = file.to_string_lossy();
            for dependent in graph.downstream(&key, depth.max(1)) {
                let dependent = PathBuf::from(dependent);
                if !direct.contains(&dependent) && !transitive.contains(&dependent) {
                    transitive.push(dependent);
                }
            }
        }
        transitive.sort();

        let total = direct.len() + transitive.len();
        Ok(ImpactResult { target: symbol.to_string(), direct_dependents: direct, transitive_dependents: transitive, total })
    }

    /// `dead(kind?)`: symbols of the given kind (default: function/method)
    /// with zero incoming calls.
    pub fn dead(&self, store: &MetadataIndex, kind: Option<SymbolKind>) -> OmniResult<Vec<DeadSymbol>> {
        let called_ids: HashSet<String> =
            store.list_calls()?.into_iter().filter_map(|c| c.callee_id).collect();
        let called_names: HashSet<String> =
            store.list_calls()?.into_iter().filter(|c| c.callee_id.is_none()).map(|c| c.callee_name).collect();

        let kinds: Vec<SymbolKind> = match kind {
            Some(k) => vec![k],
            None => DEAD_CODE_KINDS.to_vec(),
        };

        let dead = store
            .list_symbols()?
            .into_iter()
            .filter(|sym| kinds.contains(&sym.kind))
            .filter(|sym| !called_ids.contains(&sym.id) && !called_names.contains(&sym.name))
            .collect();

        Ok(dead)
    }

    /// `unused-exports`: exported symbols never referenced by another
    /// file's imported names, and never called.
    pub fn unused_exports(&self, store: &MetadataIndex) -> OmniResult<Vec<DeadSymbol>> {
        let deps = store.list_dependencies()?;
        let imported_names: HashSet<String> =
            deps.iter().flat_map(|d| d.names.iter().map(|n| n.name.clone())).collect();
        let called_ids: HashSet<String> =
            store.list_calls()?.into_iter().filter_map(|c| c.callee_id).collect();
        let called_names: HashSet<String> =
            store.list_calls()?.into_iter().filter(|c| c.callee_id.is_none()).map(|c| c.callee_name).collect();

        let unused = store
            .list_symbols()?
            .into_iter()
            .filter(|sym| sym.is_exported)
            .filter(|sym| !imported_names.contains(&sym.name))
            .filter(|sym| !called_ids.contains(&sym.id) && !called_names.contains(&sym.name))
            .collect();

        Ok(unused)
    }

    /// `cycles`: simple cycles in the file-dependency graph, external
    /// edges excluded, deduplicated by rotation-normalized path sequence.
    pub fn cycles(&self, store: &MetadataIndex) -> OmniResult<Vec<Vec<PathBuf>>> {
        let graph = DependencyGraph::from_dependencies(&store.list_dependencies()?);
        let found = graph.find_cycles();

        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut result = Vec::new();
        for cycle in found {
            if cycle.len() > MAX_CYCLE_LENGTH {
                continue;
            }
            let normalized = normalize_rotation(&cycle);
            if seen.insert(normalized) {
                result.push(cycle.into_iter().map(PathBuf::from).collect());
            }
        }
        Ok(result)
    }

    /// `similar(limit)`: union-find clusters of chunks whose pairwise
    /// cosine similarity exceeds the threshold, clusters of size >= 2.
    pub fn similar(&self, store: &MetadataIndex, limit: usize) -> OmniResult<Vec<SimilarGroup>> {
        let chunks = store.list_embedded_chunks()?;
        let n = chunks.len();
        if n < 2 {
            return Ok(Vec::new());
        }

        let mut parent: Vec<usize> = (0..n).collect();
        fn find(parent: &mut [usize], x: usize) -> usize {
            if parent[x] != x {
                parent[x] = find(parent, parent[x]);
            }
            parent[x]
        }

        let mut pair_similarity: HashMap<(usize, usize), f32> = HashMap::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let sim = cosine(&chunks[i].vector, &chunks[j].vector);
                if sim >= SIMILAR_THRESHOLD {
                    pair_similarity.insert((i, j), sim);
                    let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                    if ri != rj {
                        parent[ri] = rj;
                    }
                }
            }
        }

        let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..n {
            let root = find(&mut parent, i);
            clusters.entry(root).or_default().push(i);
        }

        let mut groups: Vec<SimilarGroup> = clusters
            .into_values()
            .filter(|members| members.len() >= 2)
            .map(|members| {
                let min_similarity = members
                    .iter()
                    .enumerate()
                    .flat_map(|(a, &i)| members[a + 1..].iter().map(move |&j| (i, j)))
                    .filter_map(|(i, j)| {
                        let key = if i < j { (i, j) } else { (j, i) };
                        pair_similarity.get(&key).copied()
                    })
                    .fold(1.0f32, f32::min);
                SimilarGroup {
                    chunks: members.into_iter().map(|i| chunks[i].clone()).collect(),
                    min_similarity: f64::from(min_similarity),
                }
            })
            .collect();

        groups.sort_by(|a, b| b.min_similarity.partial_cmp(&a.min_similarity).unwrap_or(std::cmp::Ordering::Equal));
        groups.truncate(limit);
        Ok(groups)
    }

    /// `rename(old, new, preview)`: list every edit that renaming `old` to
    /// `new` would require. Preview-only; never writes files (§4.6).
    pub fn rename(&self, store: &MetadataIndex, old: &str, new: &str) -> OmniResult<Vec<RenameEdit>> {
        let mut edits = Vec::new();

        for symbol in store.find_symbols_by_name(old, usize::MAX)? {
            edits.push(RenameEdit {
                rel_path: symbol.rel_path,
                line: symbol.line_start,
                column: symbol.col_start,
                old_text: old.to_string(),
                new_text: new.to_string(),
            });
        }

        for call in store.calls_to_callee_name(old)? {
            edits.push(RenameEdit {
                rel_path: call.caller_file,
                line: call.line,
                column: call.column,
                old_text: old.to_string(),
                new_text: new.to_string(),
            });
        }

        for dep in store.list_dependencies()? {
            for name in &dep.names {
                if name.name == old {
                    edits.push(RenameEdit {
                        rel_path: dep.source_file.clone(),
                        line: dep.line,
                        column: 0,
                        old_text: old.to_string(),
                        new_text: new.to_string(),
                    });
                }
            }
        }

        edits.sort_by(|a, b| a.rel_path.cmp(&b.rel_path).then(a.line.cmp(&b.line)));
        Ok(edits)
    }
}

/// Simple case-insensitive substring match over chunk content, acting as
/// the keyword signal RRF fuses with the semantic signal. Ranked by match
/// count, ties broken by shorter then lexicographic `rel_path` (§4.6).
fn keyword_rank(store: &MetadataIndex, query: &str) -> OmniResult<Vec<i64>> {
    let needle = query.to_lowercase();
    if needle.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut scored: Vec<(i64, usize, PathBuf)> = store
        .list_embedded_chunks()?
        .into_iter()
        .filter_map(|chunk| {
            let hits = chunk.content.to_lowercase().matches(&needle).count();
            if hits == 0 {
                None
            } else {
                Some((chunk.id, hits, chunk.rel_path))
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.2.as_os_str().len().cmp(&b.2.as_os_str().len()))
            .then_with(|| a.2.cmp(&b.2))
    });

    Ok(scored.into_iter().map(|(id, _, _)| id).collect())
}

/// MMR diversification: `score = λ·sim(q,c) − (1−λ)·max sim(c, selected)`,
/// `λ = 1 − diversity`.
fn mmr_select(
    candidates: Vec<(Chunk, f64)>,
    semantic_sim_of: &HashMap<i64, f32>,
    diversity: f64,
    limit: usize,
) -> Vec<(Chunk, f64)> {
    let lambda = (1.0 - diversity).clamp(0.0, 1.0);
    let mut pool = candidates;
    let mut selected: Vec<(Chunk, f64)> = Vec::new();

    while selected.len() < limit && !pool.is_empty() {
        let mut best_idx = 0usize;
        let mut best_mmr = f64::MIN;

        for (idx, (chunk, _)) in pool.iter().enumerate() {
            let sim_to_query = f64::from(semantic_sim_of.get(&chunk.id).copied().unwrap_or(0.0));
            let max_sim_to_selected = selected
                .iter()
                .map(|(selected_chunk, _)| {
                    f64::from(cosine(&chunk.vector, &selected_chunk.vector))
                })
                .fold(0.0f64, f64::max);

            let mmr = lambda * sim_to_query - (1.0 - lambda) * max_sim_to_selected;
            if mmr > best_mmr {
                best_mmr = mmr;
                best_idx = idx;
            }
        }

        let (chunk, rrf_score) = pool.remove(best_idx);
        selected.push((chunk, rrf_score));
    }

    selected
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Rotate a cycle to start at its lexicographically smallest element, so
/// `[a, b, c]` and `[b, c, a]` dedupe to the same key.
fn normalize_rotation(cycle: &[String]) -> Vec<String> {
    if cycle.is_empty() {
        return Vec::new();
    }
    let min_idx = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, s)| s.as_str())
        .map(|(i, _)| i)
        .unwrap_or(0);
    cycle[min_idx..].iter().chain(cycle[..min_idx].iter()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallEdge, Dependency, DependencyKind, DependencyName, FileRecord, Language, Symbol};

    fn open_test_store() -> (tempfile::TempDir, MetadataIndex) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MetadataIndex::open(&dir.path().join("test.db3")).expect("open");
        (dir, store)
    }

    fn file_record(rel: &str) -> FileRecord {
        FileRecord {
            id: 0,
            abs_path: PathBuf::from("/repo").join(rel),
            rel_path: PathBuf::from(rel),
            extension: "rs".into(),
            language: Language::Rust,
            content_hash: "h".into(),
            size: 10,
            mtime: 0,
            analyzed_at: "t".into(),
            parse_error: None,
        }
    }

    #[test]
    fn rrf_score_both_signals() {
        let engine = SearchEngine::new(60);
        let score = engine.rrf_score(Some(1), Some(1));
        assert!((score - 2.0 / 61.0).abs() < 1e-10);
    }

    #[test]
    fn rrf_score_semantic_only() {
        let engine = SearchEngine::new(60);
        assert!((engine.rrf_score(Some(1), None) - 1.0 / 61.0).abs() < 1e-10);
    }

    #[test]
    fn rrf_score_no_signal() {
        let engine = SearchEngine::new(60);
        assert_eq!(engine.rrf_score(None, None), 0.0);
    }

    #[test]
    fn rrf_higher_rank_gets_higher_score() {
        let engine = SearchEngine::new(60);
        assert!(engine.rrf_score(Some(1), Some(1)) > engine.rrf_score(Some(10), Some(10)));
    }

    #[test]
    fn callers_matches_resolved_and_bare_name() {
        let (_dir, store) = open_test_store();
        let file_id = store.upsert_file(&file_record("main.rs")).expect("file");
        store
            .insert_call(&CallEdge {
                id: 0,
                caller_id: Some("main.rs:main:function".into()),
                caller_file: "main.rs".into(),
                callee_name: "run".into(),
                callee_id: None,
                callee_file: None,
                line: 5,
                column: 0,
                is_method_call: false,
                receiver: None,
                argument_count: 0,
            })
            .expect("insert call");
        let _ = file_id;

        let engine = SearchEngine::new(60);
        let callers = engine.callers(&store, "run").expect("callers");
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].caller_file, PathBuf::from("main.rs"));
    }

    #[test]
    fn dead_finds_symbols_with_no_callers() {
        let (_dir, store) = open_test_store();
        let file_id = store.upsert_file(&file_record("lib.rs")).expect("file");
        let symbol = Symbol {
            id: "lib.rs:orphan:function".into(),
            name: "orphan".into(),
            qualified_name: "orphan".into(),
            kind: SymbolKind::Function,
            file_id,
            rel_path: "lib.rs".into(),
            line_start: 1,
            line_end: 2,
            col_start: 0,
            is_exported: false,
            is_default_export: false,
            signature: None,
            doc: None,
            parent_id: None,
            modifiers: Vec::new(),
        };
        store.upsert_symbol(&symbol).expect("symbol");

        let engine = SearchEngine::new(60);
        let dead = engine.dead(&store, None).expect("dead");
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].name, "orphan");
    }

    #[test]
    fn impact_resolves_symbol_to_caller_files_then_bfs_dependents() {
        let (_dir, store) = open_test_store();
        store
            .insert_dependency(&Dependency {
                id: 0,
                source_file: "a.rs".into(),
                target_module: "b".into(),
                resolved_path: Some(PathBuf::from("b.rs")),
                kind: DependencyKind::Import,
                names: Vec::new(),
                line: 1,
                is_external: false,
            })
            .expect("dep");
        store
            .insert_call(&CallEdge {
                id: 0,
                caller_id: Some("b.rs:run:function".into()),
                caller_file: "b.rs".into(),
                callee_name: "target_fn".into(),
                callee_id: None,
                callee_file: None,
                line: 3,
                column: 0,
                is_method_call: false,
                receiver: None,
                argument_count: 0,
            })
            .expect("insert call");

        let engine = SearchEngine::new(60);
        let impact = engine.impact(&store, "target_fn", 2).expect("impact");
        assert_eq!(impact.direct_dependents, vec![PathBuf::from("b.rs")]);
        assert_eq!(impact.transitive_dependents, vec![PathBuf::from("a.rs")]);
        assert_eq!(impact.total, 2);
    }

    #[test]
    fn cycles_are_deduplicated_by_rotation() {
        let (_dir, store) = open_test_store();
        for (src, dst) in [("a.rs", "b.rs"), ("b.rs", "c.rs"), ("c.rs", "a.rs")] {
            store
                .insert_dependency(&Dependency {
                    id: 0,
                    source_file: src.into(),
                    target_module: dst.into(),
                    resolved_path: Some(PathBuf::from(dst)),
                    kind: DependencyKind::Import,
                    names: Vec::new(),
                    line: 1,
                    is_external: false,
                })
                .expect("dep");
        }

        let engine = SearchEngine::new(60);
        let cycles = engine.cycles(&store).expect("cycles");
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
    }

    #[test]
    fn unused_exports_excludes_imported_and_called_symbols() {
        let (_dir, store) = open_test_store();
        let file_id = store.upsert_file(&file_record("lib.rs")).expect("file");
        let exported = Symbol {
            id: "lib.rs:Config:class".into(),
            name: "Config".into(),
            qualified_name: "Config".into(),
            kind: SymbolKind::Class,
            file_id,
            rel_path: "lib.rs".into(),
            line_start: 1,
            line_end: 2,
            col_start: 0,
            is_exported: true,
            is_default_export: false,
            signature: None,
            doc: None,
            parent_id: None,
            modifiers: Vec::new(),
        };
        store.upsert_symbol(&exported).expect("symbol");

        let engine = SearchEngine::new(60);
        let unused = engine.unused_exports(&store).expect("unused");
        assert_eq!(unused.len(), 1);

        store
            .insert_dependency(&Dependency {
                id: 0,
                source_file: "main.rs".into(),
                target_module: "lib".into(),
                resolved_path: Some(PathBuf::from("lib.rs")),
                kind: DependencyKind::Import,
                names: vec![DependencyName {
                    name: "Config".into(),
                    alias: None,
                    is_type_only: false,
                    is_default: false,
                    is_namespace: false,
                }],
                line: 1,
                is_external: false,
            })
            .expect("dep");

        let unused = engine.unused_exports(&store).expect("unused after import");
        assert!(unused.is_empty());
    }

    #[test]
    fn rename_collects_symbol_call_and_import_sites() {
        let (_dir, store) = open_test_store();
        let file_id = store.upsert_file(&file_record("lib.rs")).expect("file");
        store
            .upsert_symbol(&Symbol {
                id: "lib.rs:old_name:function".into(),
                name: "old_name".into(),
                qualified_name: "old_name".into(),
                kind: SymbolKind::Function,
                file_id,
                rel_path: "lib.rs".into(),
                line_start: 3,
                line_end: 4,
                col_start: 0,
                is_exported: true,
                is_default_export: false,
                signature: None,
                doc: None,
                parent_id: None,
                modifiers: Vec::new(),
            })
            .expect("symbol");
        store
            .insert_call(&CallEdge {
                id: 0,
                caller_id: None,
                caller_file: "main.rs".into(),
                callee_name: "old_name".into(),
                callee_id: None,
                callee_file: None,
                line: 10,
                column: 2,
                is_method_call: false,
                receiver: None,
                argument_count: 0,
            })
            .expect("call");

        let engine = SearchEngine::new(60);
        let edits = engine.rename(&store, "old_name", "new_name").expect("rename");
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().all(|e| e.new_text == "new_name"));
    }

    #[test]
    fn normalize_rotation_matches_equivalent_cycles() {
        let a = normalize_rotation(&["a".into(), "b".into(), "c".into()]);
        let b = normalize_rotation(&["b".into(), "c".into(), "a".into()]);
        assert_eq!(a, b);
    }
}
