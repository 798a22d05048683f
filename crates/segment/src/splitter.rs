//! Recursive character-boundary text splitter.
//!
//! Splits on the first separator (in priority order) that occurs in the text,
//! keeps each separator attached to the start of the piece that follows it,
//! then greedily merges small pieces back up to `chunk_size` characters while
//! carrying up to `chunk_overlap` characters into the next chunk. Pieces that
//! are still too large are split again with the remaining separators.
//!
//! Lengths are counted in `char`s, not bytes.

use protoqa_core::{AppError, AppResult};
use std::collections::VecDeque;

/// Default separators: paragraphs, lines, words, characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// Fails unless `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_overlap >= chunk_size {
            return Err(AppError::Segment(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `text` into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }
        chunks
    }

    /// Greedy merge of pieces that already carry their separators.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }
                if !current.is_empty() {
                    if let Some(doc) = join_trimmed(&current) {
                        docs.push(doc);
                    }
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_trimmed(&current) {
            docs.push(doc);
        }
        docs
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_trimmed(parts: &VecDeque<&str>) -> Option<String> {
    let joined: String = parts.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `"a<sep>b<sep>c"` becomes `["a", "<sep>b", "<sep>c"]`; empty pieces are dropped.
/// An empty separator splits into characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();
    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    pieces.extend(parts.map(|p| format!("{}{}", separator, p)));
    pieces.retain(|p| !p.is_empty());
    pieces
}
