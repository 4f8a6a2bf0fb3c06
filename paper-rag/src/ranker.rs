//! Cosine-similarity ranking of corpus chunks against a query.

use tracing::debug;

use crate::document::{Corpus, EmbeddingVector, RankedResult};
use crate::error::{RagError, Result};

/// Compute cosine similarity between two vectors.
///
/// Sums are accumulated in `f64` so large components cannot overflow.
/// Returns 0.0 if either vector has zero (or non-finite) magnitude. The result
/// is clamped to `[-1, 1]` to absorb floating-point rounding and is symmetric
/// in its arguments.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let similarity = dot / denominator;
    if similarity.is_nan() {
        return 0.0;
    }
    // `+ 0.0` folds -0.0 into 0.0 so orthogonal vectors tie under `total_cmp`.
    (similarity.clamp(-1.0, 1.0) + 0.0) as f32
}

/// Rank `corpus` against `query` and keep the `n` most similar chunks.
///
/// `chunk_vectors` must be parallel to `corpus.chunks()`. Results are ordered
/// by descending similarity; equal scores keep corpus order. Asking for more
/// results than there are chunks returns every chunk.
///
/// # Errors
///
/// Returns [`RagError::Pipeline`] if the vector count differs from the chunk
/// count or a chunk vector's dimension differs from the query's.
pub fn rank(
    corpus: &Corpus,
    chunk_vectors: &[EmbeddingVector],
    query: &[f32],
    n: usize,
) -> Result<Vec<RankedResult>> {
    if chunk_vectors.len() != corpus.len() {
        return Err(RagError::Pipeline(format!(
            "{} embeddings for {} chunks",
            chunk_vectors.len(),
            corpus.len()
        )));
    }
    if let Some(bad) = chunk_vectors.iter().find(|v| v.len() != query.len()) {
        return Err(RagError::Pipeline(format!(
            "chunk embedding has {} dimensions, query has {}",
            bad.len(),
            query.len()
        )));
    }

    let mut scored: Vec<RankedResult> = corpus
        .chunks()
        .iter()
        .zip(chunk_vectors)
        .map(|(chunk, vector)| RankedResult {
            chunk: chunk.clone(),
            similarity: cosine_similarity(vector, query),
        })
        .collect();

    // Stable sort: ties keep corpus order.
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored.truncate(n);

    debug!(
        result_count = scored.len(),
        top_similarity = scored.first().map(|r| r.similarity),
        "ranked corpus"
    );
    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextChunk;

    fn corpus(texts: &[&str]) -> Corpus {
        Corpus::from(
            texts
                .iter()
                .map(|t| TextChunk {
                    page: 1,
                    text: t.to_string(),
                    title: "T".into(),
                    document_id: "D".into(),
                })
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn large_components_do_not_overflow() {
        let big = [1e20f32, 1e20];
        assert!((cosine_similarity(&big, &big) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&big, &[-1e20, -1e20]) + 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[f32::MAX, f32::MAX], &[1.0, 0.0]) - 0.707_106_8).abs() < 1e-5);
    }

    #[test]
    fn non_finite_input_scores_zero() {
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn ranking_with_huge_vectors_stays_ordered() {
        let corpus = corpus(&["aligned", "opposite", "orthogonal"]);
        let vectors = vec![vec![1e20, 1e20], vec![-1e20, -1e20], vec![1e20, -1e20]];
        let results = rank(&corpus, &vectors, &[3e19, 3e19], 3).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["aligned", "orthogonal", "opposite"]);
        assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.similarity)));
    }

    #[test]
    fn identical_query_wins_over_orthogonal() {
        let corpus = corpus(&["chunk one", "chunk two"]);
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];

        let results = rank(&corpus, &vectors, &[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "chunk one");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn n_larger_than_corpus_returns_everything() {
        let corpus = corpus(&["a", "b"]);
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let results = rank(&corpus, &vectors, &[0.0, 1.0], 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "b");
    }

    #[test]
    fn ties_keep_corpus_order() {
        let corpus = corpus(&["first", "second", "third"]);
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0]];
        let results = rank(&corpus, &vectors, &[0.0, 1.0], 3).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "third", "first"]);
    }

    #[test]
    fn mismatched_inputs_are_rejected() {
        let corpus = corpus(&["a", "b"]);
        assert!(matches!(rank(&corpus, &[vec![1.0]], &[1.0], 3), Err(RagError::Pipeline(_))));
        assert!(matches!(
            rank(&corpus, &[vec![1.0], vec![1.0, 0.0]], &[1.0], 3),
            Err(RagError::Pipeline(_))
        ));
    }
}
