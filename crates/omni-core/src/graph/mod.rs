//! Dependency graph construction and traversal using petgraph.
//!
//! Built fresh per query from the `dependencies`/`calls` tables (§4.6: "an
//! in-memory adjacency map built per query ... never a persistent cyclic
//! object graph") rather than maintained incrementally by the indexer.
//! Nodes are keyed by `String` so the same type serves two shapes:
//!
//! - the file-level graph, keyed by `rel_path`, fed from `Dependency` rows
//!   (`impact`, `cycles`)
//! - the symbol-level call graph, keyed by `Symbol.id`, fed from `CallEdge`
//!   rows (`callers`, `dead`)
//!
//! Used for:
//! - Dependency proximity boosting in search
//! - `get_dependencies` MCP tool / `impact` query
//! - Circular dependency detection (`cycles`)
//! - Call graph traversal (`callers`, `dead`)

use std::collections::{HashMap, VecDeque};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{OmniError, OmniResult};
use crate::types::{CallEdge, Dependency};

/// Kind of edge carried by a `DependencyGraph`. Local to this module: the
/// stored `DependencyKind` (import/export/re-export variants) collapses to
/// `Import` here, since traversal doesn't care which import flavor it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// A file imports another file (from a `Dependency` row).
    Import,
    /// A symbol calls another symbol (from a `CallEdge` row).
    Call,
}

/// A directed graph over string-keyed nodes (file paths or symbol ids).
pub struct DependencyGraph {
    graph: DiGraph<String, EdgeKind>,
    node_index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self { graph: DiGraph::new(), node_index: HashMap::new() }
    }

    /// Build the file-level dependency graph from resolved `Dependency`
    /// rows. Unresolved (external) dependencies are skipped -- there is no
    /// second endpoint to draw an edge to.
    pub fn from_dependencies(deps: &[Dependency]) -> Self {
        let mut graph = Self::new();
        for dep in deps {
            if dep.is_external {
                continue;
            }
            let Some(target) = &dep.resolved_path else { continue };
            graph.add_edge(
                &dep.source_file.to_string_lossy(),
                &target.to_string_lossy(),
                EdgeKind::Import,
            );
        }
        graph
    }

    /// Build the symbol-level call graph from resolved `CallEdge` rows.
    /// Calls whose callee did not resolve to a known symbol are skipped.
    pub fn from_calls(calls: &[CallEdge]) -> Self {
        let mut graph = Self::new();
        for call in calls {
            let (Some(caller), Some(callee)) = (&call.caller_id, &call.callee_id) else {
                continue;
            };
            graph.add_edge(caller, callee, EdgeKind::Call);
        }
        graph
    }

    /// Ensure a node exists for the given key, returning its index.
    fn ensure_node(&mut self, key: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(key) {
            return idx;
        }
        let idx = self.graph.add_node(key.to_string());
        self.node_index.insert(key.to_string(), idx);
        idx
    }

    /// Add a node with no edges, if not already present.
    pub fn add_node(&mut self, key: &str) {
        self.ensure_node(key);
    }

    /// Add a directed edge, creating either endpoint if missing.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        self.graph.add_edge(from_idx, to_idx, kind);
    }

    /// Nodes reachable from `key` by following outgoing edges (what `key`
    /// depends on), BFS up to `depth` hops.
    pub fn upstream(&self, key: &str, depth: usize) -> Vec<String> {
        let Some(&node) = self.node_index.get(key) else { return Vec::new() };
        bfs_collect(&self.graph, node, depth, Direction::Outgoing)
    }

    /// Nodes that reach `key` by following incoming edges (what depends on
    /// `key`), BFS up to `depth` hops.
    pub fn downstream(&self, key: &str, depth: usize) -> Vec<String> {
        let Some(&node) = self.node_index.get(key) else { return Vec::new() };
        bfs_collect(&self.graph, node, depth, Direction::Incoming)
    }

    /// Whether the graph contains any cycle.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Strongly connected components with more than one node, i.e. cycles.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| scc.into_iter().map(|n| self.graph[n].clone()).collect())
            .collect()
    }

    /// Shortest undirected hop distance between two nodes, or `None` if
    /// they are not connected (or either is unknown).
    pub fn distance(&self, from: &str, to: &str) -> OmniResult<Option<usize>> {
        let (Some(&from_node), Some(&to_node)) =
            (self.node_index.get(from), self.node_index.get(to))
        else {
            return Ok(None);
        };

        let mut visited: HashMap<NodeIndex, usize> = HashMap::new();
        let mut queue = VecDeque::new();
        visited.insert(from_node, 0);
        queue.push_back(from_node);

        while let Some(current) = queue.pop_front() {
            let dist = *visited.get(&current).ok_or_else(|| {
                OmniError::Internal("BFS frontier node missing its own distance".into())
            })?;

            if current == to_node {
                return Ok(Some(dist));
            }

            for direction in [Direction::Outgoing, Direction::Incoming] {
                for neighbor in self.graph.neighbors_directed(current, direction) {
                    if !visited.contains_key(&neighbor) {
                        visited.insert(neighbor, dist + 1);
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        Ok(None)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn bfs_collect(
    graph: &DiGraph<String, EdgeKind>,
    start: NodeIndex,
    depth: usize,
    direction: Direction,
) -> Vec<String> {
    let mut visited = Vec::new();
    let mut frontier = vec![start];

    for _ in 0..depth {
        let mut next_frontier = Vec::new();
        for &n in &frontier {
            for neighbor in graph.neighbors_directed(n, direction) {
                let key = graph[neighbor].clone();
                if !visited.contains(&key) {
                    visited.push(key);
                    next_frontier.push(neighbor);
                }
            }
        }
        frontier = next_frontier;
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_query_upstream() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a.rs", "b.rs", EdgeKind::Import);

        let upstream = graph.upstream("a.rs", 1);
        assert_eq!(upstream, vec!["b.rs".to_string()]);
    }

    #[test]
    fn upstream_of_unknown_node_is_empty() {
        let graph = DependencyGraph::new();
        assert!(graph.upstream("missing.rs", 1).is_empty());
    }

    #[test]
    fn downstream_collects_all_dependents() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a.rs", "c.rs", EdgeKind::Import);
        graph.add_edge("b.rs", "c.rs", EdgeKind::Import);

        let downstream = graph.downstream("c.rs", 1);
        assert_eq!(downstream.len(), 2);
        assert!(downstream.contains(&"a.rs".to_string()));
        assert!(downstream.contains(&"b.rs".to_string()));
    }

    #[test]
    fn cycle_detection() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a.rs", "b.rs", EdgeKind::Import);
        graph.add_edge("b.rs", "c.rs", EdgeKind::Import);
        graph.add_edge("c.rs", "a.rs", EdgeKind::Import);

        assert!(graph.has_cycles());
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
    }

    #[test]
    fn no_cycles_in_a_dag() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a.rs", "b.rs", EdgeKind::Import);
        graph.add_edge("b.rs", "c.rs", EdgeKind::Import);

        assert!(!graph.has_cycles());
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn distance_between_nodes() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b", EdgeKind::Call);
        graph.add_edge("b", "c", EdgeKind::Call);

        assert_eq!(graph.distance("a", "c").expect("dist"), Some(2));
        assert_eq!(graph.distance("a", "b").expect("dist"), Some(1));
        assert_eq!(graph.distance("a", "missing").expect("dist"), None);
    }

    #[test]
    fn from_dependencies_skips_external_and_unresolved() {
        let deps = vec![
            Dependency {
                id: 1,
                source_file: "a.rs".into(),
                target_module: "b".into(),
                resolved_path: Some("b.rs".into()),
                kind: crate::types::DependencyKind::Import,
                names: Vec::new(),
                line: 1,
                is_external: false,
            },
            Dependency {
                id: 2,
                source_file: "a.rs".into(),
                target_module: "serde".into(),
                resolved_path: None,
                kind: crate::types::DependencyKind::Import,
                names: Vec::new(),
                line: 2,
                is_external: true,
            },
        ];
        let graph = DependencyGraph::from_dependencies(&deps);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}
