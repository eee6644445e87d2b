use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::model::{LoadOptions, PromptContext};

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("artifact unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response")]
    InvalidResponse,
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("empty context")]
    EmptyContext,
}

/// A loaded, ready-to-infer model.
///
/// Resources held by a handle are released when it is dropped.
#[async_trait]
pub trait ModelHandle: Send + Sync {
    /// Produce the assistant's reply for `context`.
    async fn generate(&self, context: &PromptContext) -> Result<String, LLMError>;
}

/// Something that can turn a model artifact on disk into a [`ModelHandle`].
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn load(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Box<dyn ModelHandle>, LLMError>;

    /// Short name used in logs and health output.
    fn name(&self) -> &'static str;
}
