//! Reference backend with no native inference dependency.
//!
//! [`EchoBackend`] validates and sniffs the artifact on load, then answers
//! every prompt with a deterministic reply built from the context. It keeps
//! the service usable end to end when no real engine is configured.

use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::model::{ArtifactFormat, LoadOptions, PromptContext};
use crate::traits::{InferenceBackend, LLMError, ModelHandle};

#[derive(Clone, Debug, Default)]
pub struct EchoBackend;

impl EchoBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InferenceBackend for EchoBackend {
    async fn load(
        &self,
        path: &Path,
        options: &LoadOptions,
    ) -> Result<Box<dyn ModelHandle>, LLMError> {
        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(LLMError::InvalidArtifact(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        let mut file = tokio::fs::File::open(path).await?;
        let mut header = [0u8; 4];
        let read = file.read(&mut header).await?;
        let format = ArtifactFormat::sniff(&header[..read]);
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".into());
        debug!(%label, ?format, context_size = options.context_size, "echo model loaded");
        Ok(Box::new(EchoHandle {
            label,
            format,
            max_chars: options.max_tokens as usize * 4,
        }))
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

struct EchoHandle {
    label: String,
    format: ArtifactFormat,
    max_chars: usize,
}

#[async_trait]
impl ModelHandle for EchoHandle {
    async fn generate(&self, context: &PromptContext) -> Result<String, LLMError> {
        let last = context.last_user().ok_or(LLMError::EmptyContext)?;
        let kind = match self.format {
            ArtifactFormat::Gguf => "gguf",
            ArtifactFormat::Unknown => "raw",
        };
        let mut reply = format!(
            "[{} {}] {} turn(s) in context. You said: {}",
            self.label,
            kind,
            context.turns.len(),
            last.content
        );
        if reply.chars().count() > self.max_chars {
            reply = reply.chars().take(self.max_chars).collect();
        }
        Ok(reply)
    }
}
