use llm::LLMError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("model path {path:?} is not usable: {reason}")]
    InvalidPath { path: PathBuf, reason: String },
    #[error("model not found: {0}")]
    NotFound(String),
    #[error("failed to load model {model_id}: {source}")]
    LoadFailure {
        model_id: String,
        #[source]
        source: LLMError,
    },
    #[error("no active model is loaded")]
    NoActiveModel,
    #[error("generation failed: {0}")]
    GenerationFailure(#[source] LLMError),
}

impl ChatError {
    /// Machine-readable kind reported to HTTP callers.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::InvalidArgument(_) => "invalid_argument",
            ChatError::InvalidPath { .. } => "invalid_path",
            ChatError::NotFound(_) => "not_found",
            ChatError::LoadFailure { .. } => "load_failure",
            ChatError::NoActiveModel => "no_active_model",
            ChatError::GenerationFailure(_) => "generation_failure",
        }
    }

    /// Whether the same request may succeed later without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChatError::LoadFailure { .. }
                | ChatError::NoActiveModel
                | ChatError::GenerationFailure(_)
        )
    }
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
