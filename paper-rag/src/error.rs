//! Error types for the `paper-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while answering a question over a set of papers.
#[derive(Debug, Error)]
pub enum RagError {
    /// A selected document has no PDF on disk, or the identifier is unknown
    /// to the library.
    #[error("Document '{document_id}' not found in {location}")]
    NotFound {
        /// The library identifier of the missing document.
        document_id: String,
        /// Where it was looked up: a storage directory or the library listing.
        location: String,
    },

    /// A PDF exists but could not be parsed or has unreadable pages.
    #[error("Failed to read document {}: {message}", path.display())]
    DocumentRead {
        /// The file that failed to load.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// The embedding service failed for one of the inputs.
    #[error("Embedding error ({provider}) for {input}: {message}")]
    EmbeddingService {
        /// The embedding provider that produced the error.
        provider: String,
        /// Identifies the text that failed (chunk location and excerpt, or `query`).
        input: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation service failed or returned no completion.
    #[error("Generation error ({provider}): {message}")]
    GenerationService {
        /// The generation backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// None of the selected documents produced any text chunk.
    #[error("No extractable text in the selected documents: {}", document_ids.join(", "))]
    EmptyCorpus {
        /// The documents that were loaded and chunked.
        document_ids: Vec<String>,
    },

    /// The reference-library API failed.
    #[error("Library error: {message}")]
    Library {
        /// A description of the failure.
        message: String,
    },

    /// A configuration or request validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An internal contract between pipeline stages was violated.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl RagError {
    /// Replace the input identity of an [`RagError::EmbeddingService`] error.
    ///
    /// Providers only see raw text; the index knows which chunk it came from.
    /// Other variants are returned unchanged.
    pub fn with_input(self, label: impl Into<String>) -> Self {
        match self {
            RagError::EmbeddingService { provider, message, .. } => {
                RagError::EmbeddingService { provider, input: label.into(), message }
            }
            other => other,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
