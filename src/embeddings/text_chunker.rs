//! Overlapping text chunking.
//!
//! Sizes are given in tokens and converted with a fixed four characters per
//! token. Chunk ends snap back to a paragraph break, line break or sentence
//! end when one exists in the last fifth of the window.

const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_chars: usize,
    overlap_chars: usize,
}

impl TextChunker {
    /// `chunk_size` and `overlap` are in tokens; the overlap is clamped below
    /// the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_chars = (chunk_size * CHARS_PER_TOKEN).max(1);
        let overlap_chars = (overlap * CHARS_PER_TOKEN).min(chunk_chars - 1);
        Self {
            chunk_chars,
            overlap_chars,
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        if text.trim().is_empty() {
            return chunks;
        }

        let mut start = 0;
        while start < total {
            let target_end = (start + self.chunk_chars).min(total);
            let end = find_break_point(&chars, start, target_end, total);

            let piece: String = chars[start..end].iter().collect();
            if !piece.trim().is_empty() {
                chunks.push(piece);
            }

            if end >= total {
                break;
            }
            // always advance, even when the break point falls inside the overlap
            start = end.saturating_sub(self.overlap_chars).max(start + 1);
        }

        chunks
    }
}

fn find_break_point(chars: &[char], start: usize, target_end: usize, total: usize) -> usize {
    if target_end >= total {
        return total;
    }

    let window = target_end - start;
    let search_start = target_end - window / 5;

    // paragraph break
    for i in (search_start..target_end).rev() {
        if chars[i] == '\n' && i > start && chars[i - 1] == '\n' {
            return i + 1;
        }
    }
    // line break or sentence end
    for i in (search_start..target_end).rev() {
        let c = chars[i];
        if c == '\n' || (matches!(c, '.' | '!' | '?') && chars.get(i + 1).is_some_and(|n| n.is_whitespace())) {
            return i + 1;
        }
    }

    target_end
}
