//! Free-text command parsing: turns a natural-language query into a
//! structured `{command, args}` pair a client can dispatch directly against
//! one of the query-engine operations, without going through `search`.

use serde::{Deserialize, Serialize};

/// One of the read-only query-engine operations a free-text query can
/// resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    /// Fall-through: no structured command recognised, run hybrid search.
    Search,
    /// Who calls a symbol.
    Callers,
    /// Files affected by a change to a symbol.
    Impact,
    /// Symbols with zero incoming calls.
    Dead,
    /// Exported symbols nothing else references.
    UnusedExports,
    /// Cycles in the file dependency graph.
    Cycles,
    /// Near-duplicate code clusters.
    Similar,
    /// Preview a symbol rename.
    Rename,
}

/// A free-text query parsed into a command and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// The recognised command.
    pub command: CommandKind,
    /// Positional arguments for the command (symbol names, in order).
    pub args: Vec<String>,
}

/// Phrase prefixes that resolve to `CommandKind::Callers`, checked in order.
const CALLERS_PREFIXES: [&str; 4] =
    ["what calls ", "who calls ", "callers of ", "find callers of "];

/// Phrase prefixes that resolve to `CommandKind::Impact`.
const IMPACT_PREFIXES: [&str; 2] = ["impact of ", "change impact of "];

/// Phrase prefixes that resolve to `CommandKind::Similar`.
const SIMILAR_PREFIXES: [&str; 2] = ["similar to ", "similar code to "];

/// Parse a free-text query into a `{command, args}` pair (spec.md §8
/// scenario 5). Falls back to `Search` with no args when nothing more
/// specific is recognised.
pub fn parse(query: &str) -> ParsedCommand {
    let trimmed = query.trim();
    let lower = trimmed.to_lowercase();

    if let Some(rest) = lower.strip_prefix("rename ") {
        if let Some(split_at) = rest.find(" to ") {
            let old = trimmed[7..7 + split_at].trim();
            let new = trimmed[7 + split_at + 4..].trim().trim_end_matches('?');
            if !old.is_empty() && !new.is_empty() {
                return ParsedCommand {
                    command: CommandKind::Rename,
                    args: vec![old.to_string(), new.to_string()],
                };
            }
        }
    }

    if let Some(name) = extract_argument(&lower, trimmed, &CALLERS_PREFIXES) {
        return ParsedCommand { command: CommandKind::Callers, args: vec![name] };
    }

    if let Some(name) = extract_argument(&lower, trimmed, &IMPACT_PREFIXES) {
        return ParsedCommand { command: CommandKind::Impact, args: vec![name] };
    }

    if let Some(name) = extract_argument(&lower, trimmed, &SIMILAR_PREFIXES) {
        return ParsedCommand { command: CommandKind::Similar, args: vec![name] };
    }

    if lower.contains("unused export") {
        return ParsedCommand { command: CommandKind::UnusedExports, args: Vec::new() };
    }

    if lower.contains("dead code") || lower.contains("unreachable code") || lower.contains("unused function") {
        return ParsedCommand { command: CommandKind::Dead, args: Vec::new() };
    }

    if lower.contains("cycle") || lower.contains("circular depend") {
        return ParsedCommand { command: CommandKind::Cycles, args: Vec::new() };
    }

    ParsedCommand { command: CommandKind::Search, args: Vec::new() }
}

/// Find the first matching prefix in `lower` and return the trimmed text
/// that follows it, taken from `original` at the same byte offset (the
/// ASCII-only prefixes keep `lower` and `original` aligned byte-for-byte).
fn extract_argument(lower: &str, original: &str, prefixes: &[&str]) -> Option<String> {
    for prefix in prefixes {
        if let Some(pos) = lower.find(prefix) {
            let start = pos + prefix.len();
            let name = original.get(start..)?.trim().trim_end_matches('?').trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_callers_query() {
        let parsed = parse("what calls awardBadge");
        assert_eq!(parsed.command, CommandKind::Callers);
        assert_eq!(parsed.args, vec!["awardBadge".to_string()]);
    }

    #[test]
    fn parses_rename_query() {
        let parsed = parse("rename foo to bar");
        assert_eq!(parsed.command, CommandKind::Rename);
        assert_eq!(parsed.args, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn falls_back_to_search() {
        let parsed = parse("explain the build workflow");
        assert_eq!(parsed.command, CommandKind::Search);
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn parses_callers_with_alternate_phrasing() {
        assert_eq!(parse("who calls runJob").command, CommandKind::Callers);
        assert_eq!(parse("callers of runJob").command, CommandKind::Callers);
    }

    #[test]
    fn parses_impact_query() {
        let parsed = parse("impact of deleteUser");
        assert_eq!(parsed.command, CommandKind::Impact);
        assert_eq!(parsed.args, vec!["deleteUser".to_string()]);
    }

    #[test]
    fn parses_dead_and_cycles_queries() {
        assert_eq!(parse("find dead code").command, CommandKind::Dead);
        assert_eq!(parse("any circular dependencies?").command, CommandKind::Cycles);
        assert_eq!(parse("list unused exports").command, CommandKind::UnusedExports);
    }
}
