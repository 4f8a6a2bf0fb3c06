//! Generation backend trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ModelParams;
use crate::document::ChatMessage;
use crate::error::Result;

/// A chat completion request for the generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    /// Chat model identifier.
    pub model: String,
    /// Messages in conversation order (system first).
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on the completion length, in tokens.
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// Build a request from a composed message pair and model parameters.
    pub fn new(system: ChatMessage, user: ChatMessage, params: &ModelParams) -> Self {
        Self {
            model: params.model.clone(),
            messages: vec![system, user],
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
        }
    }
}

/// A remote text-completion service.
///
/// Implementations return the completion text or
/// [`RagError::GenerationService`](crate::RagError::GenerationService); they
/// never substitute an empty or default answer for a failure.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate a completion for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
