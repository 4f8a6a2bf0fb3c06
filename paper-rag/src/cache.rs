//! In-memory embedding cache.
//!
//! [`EmbeddingCache`] maps `(document_id, hash(chunk text))` to the chunk's
//! embedding so that repeated questions over the same papers in one process
//! do not re-embed unchanged chunks. Nothing is written to disk.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tokio::sync::RwLock;

use crate::document::EmbeddingVector;

type CacheKey = (String, u64);

/// An in-memory cache of chunk embeddings, shared across queries.
///
/// All operations are async-safe via `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<CacheKey, EmbeddingVector>>,
}

impl EmbeddingCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the embedding for `text` from `document_id`.
    pub async fn get(&self, document_id: &str, text: &str) -> Option<EmbeddingVector> {
        let entries = self.entries.read().await;
        entries.get(&key(document_id, text)).cloned()
    }

    /// Store the embedding for `text` from `document_id`.
    pub async fn insert(&self, document_id: &str, text: &str, vector: EmbeddingVector) {
        let mut entries = self.entries.write().await;
        entries.insert(key(document_id, text), vector);
    }

    /// Number of cached embeddings.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every cached embedding.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

fn key(document_id: &str, text: &str) -> CacheKey {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    (document_id.to_string(), hasher.finish())
}
