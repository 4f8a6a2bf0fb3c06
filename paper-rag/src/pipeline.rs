//! Question-answering pipeline orchestrator.
//!
//! [`PaperQa`] runs one question end to end: load → chunk → embed → rank →
//! compose → generate. Every step is awaited in order; nothing is shared
//! between questions except an optional [`EmbeddingCache`].
//!
//! # Example
//!
//! ```rust,ignore
//! use paper_rag::{PaperQa, RagConfig, ModelParams};
//!
//! let pipeline = PaperQa::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .generation_client(Arc::new(OpenAIChatClient::from_env()?))
//!     .build()?;
//!
//! let question = "What problem does it solve?";
//! let answer = pipeline
//!     .answer(&storage_root, &selected_papers, question, &ModelParams::default())
//!     .await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::cache::EmbeddingCache;
use crate::chunking::{Chunker, ParagraphChunker};
use crate::config::{AskConfig, MissingDocumentPolicy, ModelParams, RagConfig};
use crate::document::{Answer, Corpus, PaperRecord, RankedResult};
use crate::embedding::{EmbeddingIndex, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::generation::{GenerationClient, GenerationRequest};
use crate::library::LibraryClient;
use crate::loader::{DocumentLoader, PdfLoader};
use crate::prompt::compose;
use crate::ranker::rank;

/// The chunks of the selected documents, plus the documents left out.
#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    /// Chunks in selection order.
    pub corpus: Corpus,
    /// Titles of the documents that were loaded, in selection order.
    pub titles: Vec<String>,
    /// Ids of documents skipped because no PDF was found.
    pub skipped: Vec<String>,
}

/// The question-answering pipeline.
///
/// Construct one via [`PaperQa::builder()`].
pub struct PaperQa {
    config: RagConfig,
    loader: Arc<dyn DocumentLoader>,
    chunker: Arc<dyn Chunker>,
    index: EmbeddingIndex,
    generator: Arc<dyn GenerationClient>,
}

impl PaperQa {
    /// Create a new [`PaperQaBuilder`].
    pub fn builder() -> PaperQaBuilder {
        PaperQaBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Load and chunk every selected document, in selection order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] for a missing document unless the
    /// missing-document policy is [`MissingDocumentPolicy::Skip`]; any other
    /// loader error is returned as is. Returns [`RagError::EmptyCorpus`] if
    /// no chunk was produced.
    pub fn load_corpus(
        &self,
        storage_root: &Path,
        documents: &[PaperRecord],
    ) -> Result<LoadedCorpus> {
        let mut loaded = LoadedCorpus::default();

        for document in documents {
            let pages = match self.loader.load(storage_root, &document.document_id) {
                Ok(pages) => pages,
                Err(RagError::NotFound { document_id, location })
                    if self.config.missing_documents == MissingDocumentPolicy::Skip =>
                {
                    warn!(document.id = %document_id, %location, "no PDF found, skipping document");
                    loaded.skipped.push(document_id);
                    continue;
                }
                Err(e) => {
                    error!(
                        document.id = %document.document_id,
                        error = %e,
                        "failed to load document"
                    );
                    return Err(e);
                }
            };

            let fragment = self.chunker.chunk(&pages, &document.title, &document.document_id);
            info!(
                document.id = %document.document_id,
                page_count = pages.len(),
                chunk_count = fragment.len(),
                "chunked document"
            );
            loaded.corpus.extend(fragment);
            if !loaded.titles.contains(&document.title) {
                loaded.titles.push(document.title.clone());
            }
        }

        if loaded.corpus.is_empty() {
            let document_ids = documents.iter().map(|d| d.document_id.clone()).collect();
            error!(document_count = documents.len(), "no extractable text in selection");
            return Err(RagError::EmptyCorpus { document_ids });
        }

        Ok(loaded)
    }

    /// Embed `corpus` and `query` and return the top-N chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingService`] if any embedding fails.
    pub async fn retrieve(&self, corpus: &Corpus, query: &str) -> Result<Vec<RankedResult>> {
        let chunk_vectors = self.index.embed_corpus(corpus).await?;
        let query_vector = self.index.embed_query(query).await?;
        rank(corpus, &chunk_vectors, &query_vector, self.config.top_n)
    }

    /// Answer `query` from the PDFs of `documents`.
    ///
    /// # Errors
    ///
    /// - [`RagError::Config`] for an empty query, an empty selection, or
    ///   invalid model parameters
    /// - [`RagError::NotFound`] / [`RagError::DocumentRead`] from loading
    /// - [`RagError::EmptyCorpus`] if the selection has no text
    /// - [`RagError::EmbeddingService`] / [`RagError::GenerationService`] from
    ///   the remote services
    pub async fn answer(
        &self,
        storage_root: &Path,
        documents: &[PaperRecord],
        query: &str,
        params: &ModelParams,
    ) -> Result<Answer> {
        validate_request(query, params)?;
        if documents.is_empty() {
            return Err(RagError::Config("select at least one document".to_string()));
        }

        // 1. Load and chunk
        let LoadedCorpus { corpus, titles, skipped } = self.load_corpus(storage_root, documents)?;

        // 2. Embed and rank
        let ranked = self.retrieve(&corpus, query).await?;

        // 3. Compose the grounded prompt
        let (system, user) = compose(&ranked, &titles, query);
        let request = GenerationRequest::new(system, user, params);

        // 4. Generate
        let answer = self.generator.generate(&request).await.map_err(|e| {
            error!(backend = self.generator.name(), error = %e, "generation failed");
            e
        })?;

        info!(
            chunk_count = corpus.len(),
            source_count = ranked.len(),
            skipped_count = skipped.len(),
            answer_len = answer.len(),
            "answered query"
        );

        Ok(Answer { answer, sources: ranked, skipped_documents: skipped })
    }
}

/// Reject a blank query or unusable model parameters.
fn validate_request(query: &str, params: &ModelParams) -> Result<()> {
    if query.trim().is_empty() {
        return Err(RagError::Config("query must not be empty".to_string()));
    }
    params.validate()
}

/// Resolve selected attachment keys against the library listing.
///
/// Returns the matching records in selection order and the ids that are not
/// in the listing.
pub fn select_documents(papers: &[PaperRecord], ids: &[String]) -> (Vec<PaperRecord>, Vec<String>) {
    let mut selected = Vec::with_capacity(ids.len());
    let mut unknown = Vec::new();
    for id in ids {
        match papers.iter().find(|p| &p.document_id == id) {
            Some(paper) => selected.push(paper.clone()),
            None => unknown.push(id.clone()),
        }
    }
    (selected, unknown)
}

/// Answer `config.query` using `library` to resolve the selected ids.
///
/// Ids missing from the library are handled like missing PDFs: they fail the
/// question, or are reported in [`Answer::skipped_documents`] under
/// [`MissingDocumentPolicy::Skip`]. The request is validated before the
/// library is contacted.
pub async fn ask_with_library(
    config: &AskConfig,
    library: &dyn LibraryClient,
    pipeline: &PaperQa,
) -> Result<Answer> {
    validate_request(&config.query, &config.model_params)?;
    if config.selected_document_ids.is_empty() {
        return Err(RagError::Config("select at least one document".to_string()));
    }

    let papers = library.list_papers(None).await?;
    let (documents, unknown) = select_documents(&papers, &config.selected_document_ids);

    if !unknown.is_empty() {
        match pipeline.config().missing_documents {
            MissingDocumentPolicy::Fail => {
                return Err(RagError::NotFound {
                    document_id: unknown.join(", "),
                    location: "the library".to_string(),
                });
            }
            MissingDocumentPolicy::Skip => {
                warn!(unknown = ?unknown, "selected ids not in library, skipping");
            }
        }
    }
    if documents.is_empty() {
        return Err(RagError::EmptyCorpus { document_ids: config.selected_document_ids.clone() });
    }

    let mut answer = pipeline
        .answer(&config.storage_root, &documents, &config.query, &config.model_params)
        .await?;
    answer.skipped_documents.extend(unknown);
    Ok(answer)
}

/// Answer `config.query` against the Zotero library named in `config`.
#[cfg(feature = "zotero")]
pub async fn ask(config: &AskConfig, pipeline: &PaperQa) -> Result<Answer> {
    let library = crate::library::ZoteroClient::new(
        config.library_user_id.clone(),
        config.library_key.clone(),
    )?;
    ask_with_library(config, &library, pipeline).await
}

/// Builder for constructing a [`PaperQa`].
///
/// `embedding_provider` and `generation_client` are required. The loader
/// defaults to [`PdfLoader`], the chunker to [`ParagraphChunker`], and the
/// config to [`RagConfig::default()`].
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = PaperQa::builder()
///     .embedding_provider(Arc::new(embedder))
///     .embedding_cache(Arc::new(EmbeddingCache::new()))  // optional
///     .generation_client(Arc::new(generator))
///     .build()?;
/// ```
#[derive(Default)]
pub struct PaperQaBuilder {
    config: Option<RagConfig>,
    loader: Option<Arc<dyn DocumentLoader>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    embedding_cache: Option<Arc<EmbeddingCache>>,
    generation_client: Option<Arc<dyn GenerationClient>>,
}

impl PaperQaBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document loader.
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Reuse chunk embeddings across questions.
    pub fn embedding_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.embedding_cache = Some(cache);
        self
    }

    /// Set the generation backend.
    pub fn generation_client(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.generation_client = Some(client);
        self
    }

    /// Build the [`PaperQa`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// config is invalid.
    pub fn build(self) -> Result<PaperQa> {
        let config = self.config.unwrap_or_default();
        if config.top_n == 0 {
            return Err(RagError::Config("top_n must be greater than zero".to_string()));
        }
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let generator = self
            .generation_client
            .ok_or_else(|| RagError::Config("generation_client is required".to_string()))?;

        let mut index = EmbeddingIndex::new(embedding_provider);
        if let Some(cache) = self.embedding_cache {
            index = index.with_cache(cache);
        }

        Ok(PaperQa {
            config,
            loader: self.loader.unwrap_or_else(|| Arc::new(PdfLoader::new())),
            chunker: self.chunker.unwrap_or_else(|| Arc::new(ParagraphChunker::new())),
            index,
            generator,
        })
    }
}
