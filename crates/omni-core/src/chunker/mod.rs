//! Sliding-window chunker.
//!
//! Produces fixed-size, overlapping windows of a file's raw text for
//! embedding. Unlike the parser's structural extraction, this chunker
//! knows nothing about AST boundaries: it walks the file in
//! `chunk_size`-character steps with `chunk_overlap` characters of
//! repeated context between consecutive windows, nudging each boundary
//! to the nearest preceding newline so a window never splits a line.
//!
//! This is deliberately simpler than symbol-aware chunking: search
//! relevance comes from the embedding and MMR diversification, not from
//! chunk boundaries lining up with a function or class.

use std::path::Path;

use crate::config::Config;
use crate::types::Chunk;

/// Outcome of chunking one file.
pub struct ChunkingOutcome {
    /// The produced chunks, empty if the file was skipped.
    pub chunks: Vec<Chunk>,
    /// Set when the file was too large to chunk at all.
    pub skipped_too_large: bool,
}

/// Split `content` into overlapping windows per `config.chunk_size` /
/// `config.chunk_overlap`.
///
/// `content_hash` is the parent file's current content hash; every
/// chunk produced from this call carries it unchanged; callers must
/// re-chunk (and the old rows are replaced) whenever the file's content
/// hash changes.
pub fn chunk_file(
    content: &str,
    file_id: i64,
    abs_path: &Path,
    rel_path: &Path,
    content_hash: &str,
    config: &Config,
) -> ChunkingOutcome {
    if content.len() as u64 > config.max_file_size {
        return ChunkingOutcome {
            chunks: Vec::new(),
            skipped_too_large: true,
        };
    }

    if content.is_empty() {
        return ChunkingOutcome {
            chunks: Vec::new(),
            skipped_too_large: false,
        };
    }

    let chunk_size = config.chunk_size.max(1);
    let chunk_overlap = config.chunk_overlap.min(chunk_size.saturating_sub(1));
    let stride = (chunk_size - chunk_overlap).max(1);

    // Window bounds are counted in chars (§4.3), not bytes: `char_offsets`
    // maps a char index to its byte offset so every slice below starts and
    // ends on a char boundary even when the content has multi-byte UTF-8.
    let char_offsets = char_offsets(content);
    let total_chars = char_offsets.len() - 1;
    let line_starts = line_start_offsets(content);
    let mut chunks = Vec::new();
    let mut window_start_char = 0usize;

    while window_start_char < total_chars {
        let start_byte = char_offsets[window_start_char];
        let nominal_end_char = (window_start_char + chunk_size).min(total_chars);
        let nominal_end_byte = char_offsets[nominal_end_char];
        let window_end_byte = snap_to_line_boundary(content, nominal_end_byte);
        // If snapping collapsed the window to nothing (a single line longer
        // than chunk_size), fall back to the nominal boundary.
        let window_end_byte = if window_end_byte <= start_byte {
            nominal_end_byte
        } else {
            window_end_byte
        };

        let slice = &content[start_byte..window_end_byte];
        let line_start = line_number_at(&line_starts, start_byte);
        let line_end = line_number_at(&line_starts, window_end_byte.saturating_sub(1).max(start_byte));

        chunks.push(Chunk {
            id: 0,
            file_id,
            file_path: abs_path.to_path_buf(),
            rel_path: rel_path.to_path_buf(),
            content: slice.to_string(),
            line_start,
            line_end,
            content_hash: content_hash.to_string(),
            vector: Vec::new(),
            token_count: estimate_tokens(slice),
        });

        if window_end_byte >= content.len() {
            break;
        }
        window_start_char += stride;
    }

    ChunkingOutcome {
        chunks,
        skipped_too_large: false,
    }
}

/// Byte offset of each char boundary in `content`, plus a trailing entry for
/// `content.len()`; index `i` is the byte offset of the `i`-th char, so
/// `offsets.len() - 1` is the total char count.
fn char_offsets(content: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = content.char_indices().map(|(i, _)| i).collect();
    offsets.push(content.len());
    offsets
}

/// Byte offsets where each line begins (index 0 is always line 1's start).
fn line_start_offsets(content: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in content.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// 1-indexed line number containing byte offset `pos`.
fn line_number_at(line_starts: &[usize], pos: usize) -> u32 {
    match line_starts.binary_search(&pos) {
        Ok(i) => (i + 1) as u32,
        Err(i) => i.max(1) as u32,
    }
}

/// Move `pos` back to just after the nearest preceding newline, so a
/// window boundary never lands mid-line. Returns `pos` unchanged if
/// `pos` is already at a line start or at the end of the content.
fn snap_to_line_boundary(content: &str, pos: usize) -> usize {
    if pos >= content.len() {
        return content.len();
    }
    match content[..pos].rfind('\n') {
        Some(idx) => idx + 1,
        None => pos,
    }
}

/// Rough token estimation: ~4 characters per token for code.
/// This is conservative; actual tokenization happens in the embedder.
fn estimate_tokens(content: &str) -> u32 {
    #[expect(clippy::cast_possible_truncation)]
    let estimate = (content.len() / 4) as u32;
    estimate.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cfg(chunk_size: usize, chunk_overlap: usize) -> Config {
        let mut config = Config::default();
        config.chunk_size = chunk_size;
        config.chunk_overlap = chunk_overlap;
        config
    }

    #[test]
    fn empty_file_produces_no_chunks() {
        let config = cfg(100, 20);
        let outcome = chunk_file("", 1, Path::new("/a"), Path::new("a.rs"), "hash", &config);
        assert!(outcome.chunks.is_empty());
        assert!(!outcome.skipped_too_large);
    }

    #[test]
    fn oversized_file_is_skipped() {
        let mut config = cfg(100, 20);
        config.max_file_size = 10;
        let content = "x".repeat(100);
        let outcome = chunk_file(&content, 1, Path::new("/a"), Path::new("a.rs"), "hash", &config);
        assert!(outcome.chunks.is_empty());
        assert!(outcome.skipped_too_large);
    }

    #[test]
    fn small_file_produces_single_chunk() {
        let config = cfg(1000, 100);
        let content = "fn main() {}\n";
        let outcome = chunk_file(content, 1, Path::new("/a"), Path::new("a.rs"), "hash", &config);
        assert_eq!(outcome.chunks.len(), 1);
        assert_eq!(outcome.chunks[0].content, content);
        assert_eq!(outcome.chunks[0].line_start, 1);
    }

    #[test]
    fn large_file_produces_overlapping_windows() {
        let config = cfg(50, 10);
        let lines: Vec<String> = (0..40).map(|i| format!("line {i}")).collect();
        let content = lines.join("\n") + "\n";
        let outcome = chunk_file(&content, 1, Path::new("/a"), Path::new("a.rs"), "hash", &config);
        assert!(outcome.chunks.len() > 1);
        assert!(!outcome.skipped_too_large);

        // Every chunk carries the parent file's content hash unchanged.
        for chunk in &outcome.chunks {
            assert_eq!(chunk.content_hash, "hash");
        }

        // Consecutive windows overlap: the second window's start text
        // should reappear somewhere near the end of the first.
        let first_end = &outcome.chunks[0].content;
        let second_start = &outcome.chunks[1].content;
        assert!(!second_start.is_empty());
        assert!(!first_end.is_empty());
    }

    #[test]
    fn windows_never_split_a_line_in_the_middle() {
        let config = cfg(20, 5);
        let content = "aaaaaaaaaa\nbbbbbbbbbb\ncccccccccc\ndddddddddd\n";
        let outcome = chunk_file(content, 1, Path::new("/a"), Path::new("a.rs"), "hash", &config);
        for chunk in &outcome.chunks {
            assert!(
                chunk.content.ends_with('\n') || chunk.content == content.trim_end_matches('\n'),
                "chunk should end at a line boundary: {:?}",
                chunk.content
            );
        }
    }

    #[test]
    fn multi_byte_content_does_not_panic_on_window_boundaries() {
        let config = cfg(10, 2);
        // Each "字" is 3 bytes in UTF-8; a byte-offset window would slice
        // mid-character here since 10 is not a multiple of 3.
        let lines: Vec<String> = (0..10).map(|i| format!("字{i}字字")).collect();
        let content = lines.join("\n") + "\n";
        let outcome = chunk_file(&content, 1, Path::new("/a"), Path::new("a.rs"), "hash", &config);
        assert!(!outcome.chunks.is_empty());
        let rejoined: String = outcome.chunks.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join("");
        assert!(rejoined.contains("字"));
    }

    #[test]
    fn file_path_fields_are_preserved() {
        let config = cfg(1000, 100);
        let outcome = chunk_file(
            "content",
            7,
            Path::new("/repo/src/lib.rs"),
            Path::new("src/lib.rs"),
            "h",
            &config,
        );
        assert_eq!(outcome.chunks[0].file_id, 7);
        assert_eq!(outcome.chunks[0].file_path, PathBuf::from("/repo/src/lib.rs"));
        assert_eq!(outcome.chunks[0].rel_path, PathBuf::from("src/lib.rs"));
    }
}
