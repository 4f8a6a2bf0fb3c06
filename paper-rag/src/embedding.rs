//! Embedding providers and the per-query embedding index.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::cache::EmbeddingCache;
use crate::document::{Corpus, EmbeddingVector, TextChunk};
use crate::error::{RagError, Result};
use crate::prompt::truncate_chars;

/// Characters of chunk text quoted in embedding error messages.
const ERROR_EXCERPT_CHARS: usize = 40;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use paper_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Embeds a [`Corpus`] and a query through an [`EmbeddingProvider`].
///
/// Each chunk is embedded with its own call so that a failure can name the
/// chunk that caused it. There is no partial success: the first failure
/// aborts the whole corpus.
pub struct EmbeddingIndex {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Option<Arc<EmbeddingCache>>,
}

impl EmbeddingIndex {
    /// Create an index without a cache.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider, cache: None }
    }

    /// Reuse chunk vectors across queries through `cache`.
    pub fn with_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Embed every chunk of `corpus`.
    ///
    /// The returned vectors are parallel to `corpus.chunks()`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingService`] naming the failing chunk if the
    /// provider fails, returns an empty vector, or returns vectors of
    /// differing dimensions.
    pub async fn embed_corpus(&self, corpus: &Corpus) -> Result<Vec<EmbeddingVector>> {
        let mut vectors: Vec<EmbeddingVector> = Vec::with_capacity(corpus.len());
        let mut cached = 0usize;

        for chunk in corpus.chunks() {
            let hit = match &self.cache {
                Some(cache) => cache.get(&chunk.document_id, &chunk.text).await,
                None => None,
            };

            let vector = match hit {
                Some(vector) => {
                    cached += 1;
                    vector
                }
                None => {
                    let vector = self.provider.embed(&chunk.text).await.map_err(|e| {
                        error!(
                            document.id = %chunk.document_id,
                            page = chunk.page,
                            error = %e,
                            "chunk embedding failed"
                        );
                        e.with_input(chunk_label(chunk))
                    })?;
                    if let Some(cache) = &self.cache {
                        cache.insert(&chunk.document_id, &chunk.text, vector.clone()).await;
                    }
                    vector
                }
            };

            let expected = vectors.first().map(Vec::len);
            check_vector(&vector, expected, || chunk_label(chunk))?;
            vectors.push(vector);
        }

        info!(chunk_count = vectors.len(), cached, "embedded corpus");
        Ok(vectors)
    }

    /// Embed the query text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingService`] labelled `query` on failure.
    pub async fn embed_query(&self, query: &str) -> Result<EmbeddingVector> {
        debug!(query_len = query.len(), "embedding query");
        let vector = self.provider.embed(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e.with_input("query")
        })?;
        check_vector(&vector, None, || "query".to_string())?;
        Ok(vector)
    }
}

fn chunk_label(chunk: &TextChunk) -> String {
    format!(
        "chunk of '{}' (page {}): \"{}\"",
        chunk.document_id,
        chunk.page,
        truncate_chars(&chunk.text, ERROR_EXCERPT_CHARS)
    )
}

fn check_vector(
    vector: &[f32],
    expected: Option<usize>,
    label: impl FnOnce() -> String,
) -> Result<()> {
    let message = if vector.is_empty() {
        "service returned an empty embedding".to_string()
    } else if let Some(expected) = expected.filter(|&d| d != vector.len()) {
        format!("dimension mismatch: expected {expected}, got {}", vector.len())
    } else {
        return Ok(());
    };
    Err(RagError::EmbeddingService { provider: "index".into(), input: label(), message })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Returns a one-hot vector keyed on text length; fails on texts containing "boom".
    struct LengthEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("boom") {
                return Err(RagError::EmbeddingService {
                    provider: "test".into(),
                    input: String::new(),
                    message: "rate limited".into(),
                });
            }
            let mut v = vec![0.0; 8];
            v[text.len() % 8] = 1.0;
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            8
        }
    }

    fn chunk(page: u32, text: &str) -> TextChunk {
        TextChunk { page, text: text.into(), title: "T".into(), document_id: "DOC1".into() }
    }

    #[tokio::test]
    async fn embeds_every_chunk_in_order() {
        let provider = Arc::new(LengthEmbedder { calls: AtomicUsize::new(0) });
        let index = EmbeddingIndex::new(provider.clone());
        let corpus = Corpus::from(vec![chunk(1, "a"), chunk(1, "bb"), chunk(2, "ccc")]);

        let vectors = index.embed_corpus(&corpus).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[1][2], 1.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failure_names_the_offending_chunk() {
        let provider = Arc::new(LengthEmbedder { calls: AtomicUsize::new(0) });
        let index = EmbeddingIndex::new(provider);
        let corpus = Corpus::from(vec![chunk(1, "fine"), chunk(4, "boom goes the dynamite")]);

        let err = index.embed_corpus(&corpus).await.unwrap_err();
        match err {
            RagError::EmbeddingService { provider, input, message } => {
                assert_eq!(provider, "test");
                assert!(input.contains("DOC1"));
                assert!(input.contains("page 4"));
                assert!(input.contains("boom"));
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn query_failure_is_labelled_query() {
        let index = EmbeddingIndex::new(Arc::new(LengthEmbedder { calls: AtomicUsize::new(0) }));
        let err = index.embed_query("boom").await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingService { ref input, .. } if input == "query"));
    }

    #[tokio::test]
    async fn cache_avoids_repeat_calls() {
        let provider = Arc::new(LengthEmbedder { calls: AtomicUsize::new(0) });
        let cache = Arc::new(EmbeddingCache::new());
        let index = EmbeddingIndex::new(provider.clone()).with_cache(cache.clone());
        let corpus = Corpus::from(vec![chunk(1, "a"), chunk(1, "bb")]);

        let first = index.embed_corpus(&corpus).await.unwrap();
        let second = index.embed_corpus(&corpus).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[test]
    fn rejects_empty_and_mismatched_vectors() {
        assert!(check_vector(&[], None, || "x".into()).is_err());
        assert!(check_vector(&[1.0, 0.0], Some(3), || "x".into()).is_err());
        assert!(check_vector(&[1.0, 0.0, 0.0], Some(3), || "x".into()).is_ok());
    }
}
