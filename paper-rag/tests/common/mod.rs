//! Deterministic test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use paper_rag::{
    Chunker, Collection, DocumentLoader, EmbeddingProvider, EmbeddingVector, GenerationClient,
    GenerationRequest, LibraryClient, PageText, PaperRecord, ParagraphChunker, RagError, Result,
    TextChunk,
};

/// Words that get their own embedding dimension.
pub const VOCABULARY: [&str; 6] =
    ["attention", "transformer", "protein", "folding", "graph", "neural"];

/// Embeds text as word counts over [`VOCABULARY`], plus a constant bias term.
///
/// Texts containing `fail_on` (if set) produce an embedding error.
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    pub calls: AtomicUsize,
    pub fail_on: Option<String>,
}

impl BagOfWordsEmbedder {
    pub fn failing_on(word: &str) -> Self {
        Self { calls: AtomicUsize::new(0), fail_on: Some(word.to_string()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.as_deref().is_some_and(|word| text.contains(word)) {
            return Err(RagError::EmbeddingService {
                provider: "bag-of-words".into(),
                input: String::new(),
                message: "simulated outage".into(),
            });
        }

        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        vector.push(0.1);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }
}

/// Records every request and answers with a fixed text, or fails.
pub struct RecordingGenerator {
    pub requests: Mutex<Vec<GenerationRequest>>,
    pub fail: bool,
}

impl RecordingGenerator {
    pub fn answering() -> Self {
        Self { requests: Mutex::new(Vec::new()), fail: false }
    }

    pub fn failing() -> Self {
        Self { requests: Mutex::new(Vec::new()), fail: true }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> GenerationRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl GenerationClient for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(RagError::GenerationService {
                provider: "recording".into(),
                message: "connection reset by peer".into(),
            });
        }
        Ok("The papers agree.".to_string())
    }
}

/// Serves page text from memory; unknown ids are reported as missing files.
#[derive(Default)]
pub struct MemoryLoader {
    pub documents: HashMap<String, Vec<PageText>>,
}

impl MemoryLoader {
    pub fn with(mut self, document_id: &str, pages: &[&str]) -> Self {
        let pages = pages
            .iter()
            .enumerate()
            .map(|(i, text)| PageText { page: i as u32 + 1, text: text.to_string() })
            .collect();
        self.documents.insert(document_id.to_string(), pages);
        self
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, storage_root: &Path, document_id: &str) -> Result<Vec<PageText>> {
        self.documents.get(document_id).cloned().ok_or_else(|| RagError::NotFound {
            document_id: document_id.to_string(),
            location: storage_root.join(document_id).display().to_string(),
        })
    }
}

/// Counts the documents passed to the wrapped [`ParagraphChunker`].
#[derive(Default)]
pub struct CountingChunker {
    pub documents: Mutex<Vec<String>>,
    inner: ParagraphChunker,
}

impl CountingChunker {
    pub fn chunked(&self) -> Vec<String> {
        self.documents.lock().unwrap().clone()
    }
}

impl Chunker for CountingChunker {
    fn chunk(&self, pages: &[PageText], title: &str, document_id: &str) -> Vec<TextChunk> {
        self.documents.lock().unwrap().push(document_id.to_string());
        self.inner.chunk(pages, title, document_id)
    }
}

/// A library with a fixed listing.
#[derive(Default)]
pub struct StaticLibrary {
    pub papers: Vec<PaperRecord>,
    pub listings: AtomicUsize,
}

impl StaticLibrary {
    pub fn with_papers(papers: Vec<PaperRecord>) -> Self {
        Self { papers, listings: AtomicUsize::new(0) }
    }

    pub fn listing_count(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LibraryClient for StaticLibrary {
    async fn list_collections(&self) -> Result<Vec<Collection>> {
        Ok(vec![Collection { key: "C1".into(), name: "Reading list".into(), item_count: 2 }])
    }

    async fn list_papers(&self, _collection: Option<&str>) -> Result<Vec<PaperRecord>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self.papers.clone())
    }
}

pub fn paper(document_id: &str, title: &str) -> PaperRecord {
    PaperRecord {
        title: title.to_string(),
        item_type: "journalArticle".to_string(),
        publication: String::new(),
        doi: String::new(),
        document_id: document_id.to_string(),
        parent_id: format!("P-{document_id}"),
    }
}
