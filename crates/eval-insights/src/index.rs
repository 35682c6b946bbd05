/// Ephemeral semantic index over guideline segments.
///
/// Built once per violation request from the chunked guideline and dropped with it.
/// Lookups are brute-force cosine similarity: a guideline is a few dozen segments, so an
/// approximate index would cost more than it saves. The index is immutable after
/// construction and is shared by reference between concurrently analysed groups.
use eval_common::capability::EmbeddingProvider;
use eval_common::error::CommonError;
use tracing::debug;

use crate::chunker::Segment;
use crate::error::AppError;

pub struct SemanticIndex {
    entries: Vec<IndexedSegment>,
    dimensions: usize,
}

struct IndexedSegment {
    segment: Segment,
    embedding: Vec<f32>,
}

impl SemanticIndex {
    /// Embed every segment and index it.
    ///
    /// Fails with `EmptyIndex` for zero segments; callers skip retrieval for an empty
    /// guideline instead of building an index.
    pub async fn build(
        embedder: &dyn EmbeddingProvider,
        segments: Vec<Segment>,
    ) -> Result<Self, AppError> {
        if segments.is_empty() {
            return Err(AppError::EmptyIndex);
        }
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let embeddings = embedder
            .embed_documents(&texts)
            .await
            .map_err(AppError::Retrieval)?;
        let index = Self::from_embeddings(segments, embeddings)?;
        debug!(
            segments = index.segment_count(),
            dimensions = index.dimensions,
            "semantic index built"
        );
        Ok(index)
    }

    /// Index segments whose embeddings are already known. `embeddings[i]` belongs to
    /// `segments[i]`; all vectors must share one dimensionality.
    pub fn from_embeddings(
        segments: Vec<Segment>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, AppError> {
        if segments.is_empty() {
            return Err(AppError::EmptyIndex);
        }
        if embeddings.len() != segments.len() {
            return Err(retrieval_error(format!(
                "embedding count mismatch: expected {}, got {}",
                segments.len(),
                embeddings.len()
            )));
        }
        let dimensions = embeddings[0].len();
        if embeddings.iter().any(|e| e.len() != dimensions) {
            return Err(retrieval_error(
                "segment embeddings have inconsistent dimensions".to_string(),
            ));
        }

        let entries = segments
            .into_iter()
            .zip(embeddings)
            .map(|(segment, embedding)| IndexedSegment { segment, embedding })
            .collect();
        Ok(Self {
            entries,
            dimensions,
        })
    }

    pub fn segment_count(&self) -> usize {
        self.entries.len()
    }

    /// Embed `query` and return up to `k` nearest segments, most similar first.
    pub async fn query(
        &self,
        embedder: &dyn EmbeddingProvider,
        query: &str,
        k: usize,
    ) -> Result<Vec<&Segment>, AppError> {
        let query_embedding = embedder
            .embed_query(query)
            .await
            .map_err(AppError::Retrieval)?;
        if query_embedding.len() != self.dimensions {
            return Err(retrieval_error(format!(
                "query embedding has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }
        Ok(self.nearest(&query_embedding, k))
    }

    /// Up to `k` segments ranked by cosine similarity to `query_embedding`. Equal scores
    /// keep guideline order.
    pub fn nearest(&self, query_embedding: &[f32], k: usize) -> Vec<&Segment> {
        let mut scored: Vec<(f32, &Segment)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(&e.embedding, query_embedding), &e.segment))
            .collect();
        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score.total_cmp(a_score).then(a.index.cmp(&b.index))
        });
        scored.into_iter().take(k).map(|(_, s)| s).collect()
    }
}

fn retrieval_error(message: String) -> AppError {
    AppError::Retrieval(CommonError::Embedding(message))
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}
