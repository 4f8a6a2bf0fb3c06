//! # paper-rag
//!
//! Question answering over the PDF papers of a reference library.
//!
//! ## Overview
//!
//! A question is answered in one pass over the selected papers:
//!
//! 1. [`PdfLoader`] finds `storage/<document_id>/*.pdf` and extracts text per page
//! 2. [`ParagraphChunker`] splits each page on blank lines
//! 3. [`EmbeddingIndex`] embeds every chunk and the question
//! 4. [`rank`] keeps the top-N chunks by cosine similarity
//! 5. [`compose`] builds a grounded system prompt from the excerpts and titles
//! 6. a [`GenerationClient`] produces the answer
//!
//! [`PaperQa`] wires the stages together. The remote services sit behind
//! traits ([`EmbeddingProvider`], [`GenerationClient`], [`LibraryClient`]) so
//! any stage can be swapped or mocked.
//!
//! ## Features
//!
//! | Feature | Provides |
//! |---------|----------|
//! | `openai` (default) | [`OpenAIEmbeddingProvider`], [`OpenAIChatClient`] |
//! | `zotero` (default) | [`ZoteroClient`], [`ask`] |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use paper_rag::{AskConfig, OpenAIChatClient, OpenAIEmbeddingProvider, PaperQa};
//!
//! let pipeline = PaperQa::builder()
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::from_env()?))
//!     .generation_client(Arc::new(OpenAIChatClient::from_env()?))
//!     .build()?;
//!
//! let answer = paper_rag::ask(&ask_config, &pipeline).await?;
//! println!("{}", answer.answer);
//! ```

pub mod cache;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod library;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod ranker;

pub use cache::EmbeddingCache;
pub use chunking::{Chunker, ParagraphChunker};
pub use config::{AskConfig, MissingDocumentPolicy, ModelParams, RagConfig, RagConfigBuilder};
pub use document::{
    Answer, ChatMessage, Collection, Corpus, EmbeddingVector, PageText, PaperRecord,
    RankedResult, Role, TextChunk,
};
pub use embedding::{EmbeddingIndex, EmbeddingProvider};
pub use error::{RagError, Result};
pub use generation::{GenerationClient, GenerationRequest};
pub use library::LibraryClient;
#[cfg(feature = "zotero")]
pub use library::ZoteroClient;
pub use loader::{DocumentLoader, PagePolicy, PdfLoader, find_pdf};
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatClient, OpenAIEmbeddingProvider};
#[cfg(feature = "zotero")]
pub use pipeline::ask;
pub use pipeline::{LoadedCorpus, PaperQa, PaperQaBuilder, ask_with_library, select_documents};
pub use prompt::compose;
pub use ranker::{cosine_similarity, rank};
