//! Paragraph-boundary text chunker.
//!
//! Splits document text into [`Passage`]s of roughly `target_chars` chars.
//! Splitting happens on blank lines so that paragraphs stay intact.
//!
//! # Algorithm
//!
//! 1. Split text into paragraphs on blank lines (lines that are empty or
//!    whitespace-only). Trim each paragraph and skip empty ones.
//! 2. Accumulate paragraphs into a buffer, joined by `"\n\n"`, while the
//!    buffer stays within `target_chars`.
//! 3. When the next paragraph would overflow, flush the buffer as a passage
//!    and start a new buffer with that paragraph.
//! 4. A paragraph longer than `target_chars` on its own is handled by the
//!    [`OversizePolicy`]: kept whole, or hard-split into overlapping windows.
//! 5. Flush the final buffer.
//!
//! Lengths are counted in chars, never bytes, so multi-byte text is never
//! split inside a code point.
//!
//! # Example
//!
//! ```rust
//! use context_recall_core::chunk::chunk_text;
//! use context_recall_core::params::ChunkParams;
//!
//! let passages = chunk_text("doc-1", "Hello world.\n\nSecond paragraph.", &ChunkParams::default());
//! assert_eq!(passages.len(), 1);
//! assert_eq!(passages[0].text, "Hello world.\n\nSecond paragraph.");
//! ```

use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::models::Passage;
use crate::params::{ChunkParams, OversizePolicy};

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split `text` into passages.
///
/// # Guarantees
///
/// - No passage is empty; whitespace-only text yields no passages.
/// - Passage indices are contiguous: `0, 1, …, N-1`.
/// - Identical passages within one document are kept once (first wins).
pub fn chunk_text(document_id: &str, text: &str, params: &ChunkParams) -> Vec<Passage> {
    let target = params.target_chars.max(1);
    let mut pieces: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for para in split_paragraphs(text) {
        let para_chars = para.chars().count();
        let would_be = if buf.is_empty() {
            para_chars
        } else {
            buf_chars + PARAGRAPH_SEPARATOR.len() + para_chars
        };

        if would_be > target && !buf.is_empty() {
            pieces.push(std::mem::take(&mut buf));
            buf_chars = 0;
        }

        if para_chars > target {
            match params.oversize {
                OversizePolicy::Keep => pieces.push(para),
                OversizePolicy::Split { overlap_chars } => {
                    pieces.extend(split_oversized(&para, target, overlap_chars));
                }
            }
            continue;
        }

        if !buf.is_empty() {
            buf.push_str(PARAGRAPH_SEPARATOR);
            buf_chars += PARAGRAPH_SEPARATOR.len();
        }
        buf.push_str(&para);
        buf_chars += para_chars;
    }

    if !buf.is_empty() {
        pieces.push(buf);
    }

    let mut seen = HashSet::new();
    let mut passages = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let id = content_hash(&piece);
        if !seen.insert(id.clone()) {
            continue;
        }
        passages.push(Passage {
            id,
            document_id: document_id.to_string(),
            index: passages.len(),
            text: piece,
        });
    }
    passages
}

/// SHA-256 hex digest of `text`.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Split on blank lines, trimming each paragraph and dropping empty ones.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);

    paragraphs
}

fn flush_paragraph(lines: &mut Vec<&str>, out: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    lines.clear();
}

/// Hard-split a paragraph into windows of at most `target` chars, each
/// starting `overlap` chars before the previous window's end.
///
/// A window end snaps back to the last whitespace in its second half, so
/// words are not cut when a boundary is available.
fn split_oversized(para: &str, target: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = para.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + target).min(chars.len());
        if end < chars.len() {
            let min_end = start + target / 2;
            if let Some(ws) = (min_end..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws + 1;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    pieces
}
