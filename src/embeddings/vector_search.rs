// In-memory vector index over the chunks of a single document

#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    pub chunk: &'a IndexedChunk,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    chunks: Vec<IndexedChunk>,
}

impl DocumentIndex {
    pub fn new(chunks: Vec<IndexedChunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    /// The `limit` chunks most similar to `query`, best first
    pub fn search(&self, query: &[f32], limit: usize) -> Vec<SearchResult<'_>> {
        let mut results: Vec<SearchResult<'_>> = self
            .chunks
            .iter()
            .map(|chunk| SearchResult {
                chunk,
                score: cosine_similarity(query, &chunk.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        results
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
