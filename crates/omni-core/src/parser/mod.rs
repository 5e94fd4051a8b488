//! AST parsing subsystem using tree-sitter.
//!
//! This module provides language-agnostic AST parsing with per-language
//! structural extractors. Each supported language registers an analyzer
//! that maps tree-sitter AST nodes to OmniContext structural elements.
//!
//! ## Architecture
//!
//! ```text
//! Source File -> Language Detection -> tree-sitter Grammar
//!            -> Incremental Parse -> CST
//!            -> Structural Extraction -> Vec<StructuralElement>
//! ```
//!
//! The parser is stateless and can be invoked from multiple threads
//! via `spawn_blocking`.

pub mod registry;
pub mod languages;

use std::path::Path;

use crate::types::Language;

/// AST-extraction granularity of a [`StructuralElement`].
///
/// This is finer-grained than [`crate::types::SymbolKind`]: it reflects
/// what tree-sitter found, not what belongs in the symbol table. The
/// indexer maps `ChunkKind` (plus nesting depth) onto `SymbolKind` when
/// it builds `Symbol` rows; `Module`, `Impl`, `TopLevel` and `Test`
/// elements are chunked for search but never produce a `Symbol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    /// Free function or method.
    Function,
    /// Class, struct, or record definition.
    Class,
    /// Trait, interface, or protocol.
    Trait,
    /// Inherent or trait implementation block.
    Impl,
    /// Constant or static binding.
    Const,
    /// Type alias / typedef.
    TypeDef,
    /// Enum definition.
    Enum,
    /// File or module-level element (the whole file as a fallback unit).
    Module,
    /// Test function, identified by naming convention or attribute.
    Test,
    /// Anything else kept at file top level without a narrower kind.
    TopLevel,
}

/// Visibility as written at the declaration site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Exported from its module/package (`pub`, `export`, capitalized Go name, ...).
    Public,
    /// Visible within the enclosing package/crate only.
    Internal,
    /// Not visible outside its enclosing scope.
    Private,
}

/// A structural element extracted from an AST.
#[derive(Debug, Clone)]
pub struct StructuralElement {
    /// Fully qualified name of this element.
    pub symbol_path: String,
    /// Short name (last component of symbol_path).
    pub name: String,
    /// What kind of construct this is.
    pub kind: ChunkKind,
    /// Visibility specifier.
    pub visibility: Visibility,
    /// Starting line (1-indexed).
    pub line_start: u32,
    /// Ending line (1-indexed, inclusive).
    pub line_end: u32,
    /// Starting column (0-indexed).
    pub col_start: u32,
    /// Nesting depth (0 = top level), used to distinguish free functions
    /// from methods when mapping to `SymbolKind`.
    pub depth: u32,
    /// Raw source code of this element.
    pub content: String,
    /// Extracted doc comment, if present.
    pub doc_comment: Option<String>,
    /// One-line signature, if derivable.
    pub signature: Option<String>,
    /// Symbols referenced within this element (for dependency extraction).
    pub references: Vec<String>,
}

/// Wrap plain name strings (no alias, no type-only/default/namespace
/// flags) as `DependencyName`s, for analyzers that don't track those
/// distinctions at the import site.
pub fn plain_names(names: Vec<String>) -> Vec<crate::types::DependencyName> {
    names
        .into_iter()
        .map(|name| crate::types::DependencyName {
            name,
            alias: None,
            is_type_only: false,
            is_default: false,
            is_namespace: false,
        })
        .collect()
}

/// One import/require/export statement found in a source file.
#[derive(Debug, Clone)]
pub struct ImportStatement {
    /// The raw specifier as written (`"./utils"`, `"os.path"`, `"fmt"`).
    pub target_module: String,
    /// Kind of dependency this statement represents.
    pub kind: crate::types::DependencyKind,
    /// Named items pulled in or re-exported by this statement.
    pub names: Vec<crate::types::DependencyName>,
    /// Line number the statement appears on (1-indexed).
    pub line: u32,
}

/// Trait that each language analyzer must implement.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "python", "rust").
    fn language_id(&self) -> &str;

    /// Returns the tree-sitter `Language` for this analyzer.
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Extract structural elements from a parsed tree.
    fn extract_structure(
        &self,
        tree: &tree_sitter::Tree,
        source: &[u8],
        file_path: &Path,
    ) -> Vec<StructuralElement>;

    /// Extract import statements from a parsed tree for dependency graph construction.
    ///
    /// Default implementation returns empty (languages can override).
    fn extract_imports(
        &self,
        _tree: &tree_sitter::Tree,
        _source: &[u8],
        _file_path: &Path,
    ) -> Vec<ImportStatement> {
        Vec::new()
    }
}

/// The outcome of attempting to parse one file: either a tree was built
/// and elements extracted, or parsing failed with a human-readable note.
///
/// Parse failures are not propagated as `Err`: an unparseable file is
/// recorded with zero symbols and a note on its `FileRecord`, and
/// indexing continues with the rest of the batch.
pub struct ParseOutcome {
    /// Structural elements found, empty if parsing failed entirely.
    pub elements: Vec<StructuralElement>,
    /// Set when the parse failed or the language has no grammar.
    pub error: Option<String>,
}

/// Parse a source file and extract its structural elements.
///
/// Returns `None` only when this language has no registered grammar at
/// all (the caller should then skip chunking by AST and fall back to
/// treating the file as a single `Module`-kind unit). A parse failure on
/// a registered language still returns `Some`, with `error` set and
/// `elements` empty, so the file is recorded rather than dropped.
pub fn parse_file(file_path: &Path, source: &[u8], language: Language) -> Option<ParseOutcome> {
    let registry = registry::global_registry();
    let analyzer = registry.get(language)?;

    let mut parser = tree_sitter::Parser::new();
    if let Err(e) = parser.set_language(&analyzer.tree_sitter_language()) {
        return Some(ParseOutcome {
            elements: Vec::new(),
            error: Some(format!("failed to set tree-sitter language: {e}")),
        });
    }

    match parser.parse(source, None) {
        Some(tree) => Some(ParseOutcome {
            elements: analyzer.extract_structure(&tree, source, file_path),
            error: None,
        }),
        None => Some(ParseOutcome {
            elements: Vec::new(),
            error: Some("tree-sitter returned no tree (timeout or cancellation)".into()),
        }),
    }
}

/// Extract import statements from a source file.
///
/// Uses the same tree-sitter parse infrastructure as `parse_file`, and
/// the same null-on-failure contract: `None` means no grammar for this
/// language, `Some(vec![])` means the grammar is registered but nothing
/// (or nothing parseable) was found.
pub fn parse_imports(file_path: &Path, source: &[u8], language: Language) -> Option<Vec<ImportStatement>> {
    let registry = registry::global_registry();
    let analyzer = registry.get(language)?;

    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&analyzer.tree_sitter_language()).ok()?;

    let tree = parser.parse(source, None)?;
    Some(analyzer.extract_imports(&tree, source, file_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_unknown_language_returns_none() {
        let result = parse_file(Path::new("test.xyz"), b"hello world", Language::Unknown);
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_file_rust_source_returns_elements() {
        let result = parse_file(
            Path::new("lib.rs"),
            b"pub fn hello() -> &'static str {\n    \"hi\"\n}\n",
            Language::Rust,
        );
        let outcome = result.expect("rust grammar is registered");
        assert!(outcome.error.is_none());
        assert!(!outcome.elements.is_empty());
    }
}
