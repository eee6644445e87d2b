//! Backend that delegates inference to an Ollama server.
//!
//! Ollama manages its own weights, so the registered artifact only names the
//! model: its file stem must match a model the server already has. Chat
//! requests carry the system prompt and every turn of the context.

use crate::model::{LoadOptions, PromptContext, Role};
use crate::traits::{InferenceBackend, LLMError, ModelHandle};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    models::ModelOptions,
    Ollama,
};

pub struct OllamaBackend {
    inner: Arc<Ollama>,
}

impl OllamaBackend {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, LLMError> {
        let inner = Ollama::try_new(base_url.as_ref())
            .map_err(|e| LLMError::Network(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

/// Whether a listed Ollama model name refers to `tag`.
fn matches_tag(listed: &str, tag: &str) -> bool {
    listed == tag
        || listed
            .split_once(':')
            .map_or(false, |(name, _)| name == tag)
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn load(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Box<dyn ModelHandle>, LLMError> {
        let tag = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| LLMError::InvalidArtifact(path.display().to_string()))?;
        let models = self
            .inner
            .list_local_models()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;
        let model = models
            .into_iter()
            .map(|m| m.name)
            .find(|name| matches_tag(name, &tag))
            .ok_or_else(|| LLMError::ModelNotFound(tag.clone()))?;
        debug!(%model, context_size = options.context_size, "ollama model resolved");
        Ok(Box::new(OllamaHandle {
            client: self.inner.clone(),
            model,
            options: *options,
        }))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

struct OllamaHandle {
    client: Arc<Ollama>,
    model: String,
    options: LoadOptions,
}

/// Per-request model options mirroring the load options.
fn model_options(options: &LoadOptions) -> ModelOptions {
    ModelOptions::default()
        .num_ctx(u64::from(options.context_size))
        .num_predict(i32::try_from(options.max_tokens).unwrap_or(i32::MAX))
}

#[async_trait]
impl ModelHandle for OllamaHandle {
    async fn generate(&self, context: &PromptContext) -> Result<String, LLMError> {
        if context.turns.is_empty() {
            return Err(LLMError::EmptyContext);
        }
        let mut messages = Vec::with_capacity(context.turns.len() + 1);
        if let Some(system) = &context.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        for turn in &context.turns {
            messages.push(match turn.role {
                Role::User => ChatMessage::user(turn.content.clone()),
                Role::Assistant => ChatMessage::assistant(turn.content.clone()),
            });
        }
        let req = ChatMessageRequest::new(self.model.clone(), messages)
            .options(model_options(&self.options));
        let res = self
            .client
            .send_chat_messages(req)
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;
        let text = res.message.content;
        if text.is_empty() {
            return Err(LLMError::InvalidResponse);
        }
        Ok(text)
    }
}
