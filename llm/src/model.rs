//! Data passed across the inference boundary.
//!
//! A [`PromptContext`] is what a [`crate::ModelHandle`] sees for one
//! generation: an optional system prompt plus the ordered [`Turn`]s of the
//! conversation. [`LoadOptions`] travel with [`crate::InferenceBackend::load`].

use serde::{Deserialize, Serialize};

/// Speaker of a [`Turn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message of a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything a model sees for a single generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromptContext {
    /// Instructions kept apart from the conversation turns.
    pub system_prompt: Option<String>,
    /// Prior turns in chronological order, newest last.
    pub turns: Vec<Turn>,
}

impl PromptContext {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            system_prompt: None,
            turns,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// The most recent user turn, if any.
    pub fn last_user(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }
}

/// Parameters applied when an artifact is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    pub context_size: u32,
    pub max_tokens: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            context_size: 8192,
            max_tokens: 512,
        }
    }
}

/// File format sniffed from the first bytes of an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactFormat {
    Gguf,
    Unknown,
}

impl ArtifactFormat {
    pub fn sniff(header: &[u8]) -> Self {
        if header.starts_with(b"GGUF") {
            ArtifactFormat::Gguf
        } else {
            ArtifactFormat::Unknown
        }
    }
}
