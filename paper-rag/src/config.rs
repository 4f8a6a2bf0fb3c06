//! Configuration for the question-answering pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default number of ranked chunks passed to the generation backend.
pub const DEFAULT_TOP_N: usize = 3;

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default completion length limit, in tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 3000;

/// What to do when a selected document has no PDF on disk.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingDocumentPolicy {
    /// Abort the query with [`RagError::NotFound`].
    #[default]
    Fail,
    /// Log a warning, report the document in the answer, and continue.
    Skip,
}

/// Configuration parameters for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Number of top ranked chunks used to ground the answer.
    pub top_n: usize,
    /// Handling of selected documents without a PDF.
    pub missing_documents: MissingDocumentPolicy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { top_n: DEFAULT_TOP_N, missing_documents: MissingDocumentPolicy::Fail }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of ranked chunks used to ground the answer.
    pub fn top_n(mut self, n: usize) -> Self {
        self.config.top_n = n;
        self
    }

    /// Set the policy for selected documents without a PDF.
    pub fn missing_documents(mut self, policy: MissingDocumentPolicy) -> Self {
        self.config.missing_documents = policy;
        self
    }

    /// Build the [`RagConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `top_n == 0`.
    pub fn build(self) -> Result<RagConfig> {
        if self.config.top_n == 0 {
            return Err(RagError::Config("top_n must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// Parameters forwarded to the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelParams {
    /// Chat model identifier.
    pub model: String,
    /// Sampling temperature; higher values give more varied answers.
    pub temperature: f32,
    /// Upper bound on the completion length, in tokens.
    pub max_output_tokens: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl ModelParams {
    /// Check that the parameters are acceptable to an OpenAI-style API.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `model` is empty
    /// - `temperature` is outside `0.0..=2.0`
    /// - `max_output_tokens == 0`
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(RagError::Config("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::Config(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(RagError::Config("max_output_tokens must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Everything a single question needs, passed explicitly to [`crate::ask`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AskConfig {
    /// Reference-library user id.
    pub library_user_id: String,
    /// Reference-library API key.
    #[serde(skip_serializing, default)]
    pub library_key: String,
    /// Directory holding one sub-directory per attachment key.
    pub storage_root: PathBuf,
    /// Attachment keys to query, in selection order.
    pub selected_document_ids: Vec<String>,
    /// The question.
    pub query: String,
    /// Generation parameters.
    pub model_params: ModelParams,
}
