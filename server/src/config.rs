use clap::{Parser, ValueEnum};
use llm::{EchoBackend, InferenceBackend, OllamaBackend};
use std::sync::Arc;

/// Which inference backend serves loaded models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Built-in backend that answers from the prompt itself.
    Echo,
    /// Forward generations to an Ollama server.
    Ollama,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "HTTP chat service with model lifecycle")]
pub struct Config {
    /// Address to bind the HTTP server
    #[arg(long, env = "CHAT_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Inference backend used to load models
    #[arg(long, env = "CHAT_BACKEND", value_enum, default_value_t = BackendKind::Echo)]
    pub backend: BackendKind,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Default context window for registered models
    #[arg(long, env = "CHAT_CONTEXT_SIZE", default_value_t = 8192,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub context_size: u32,

    /// Cap on tokens produced per reply
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value_t = 512,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_tokens: u32,

    /// System prompt attached to every generation
    #[arg(long, env = "CHAT_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "CHAT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Knobs passed down to the chat engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub context_size: u32,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            context_size: 8192,
            max_tokens: 512,
            system_prompt: None,
        }
    }
}

impl Config {
    pub fn settings(&self) -> Settings {
        Settings {
            context_size: self.context_size,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt.clone(),
        }
    }

    /// Construct the configured inference backend.
    pub fn backend(&self) -> anyhow::Result<Arc<dyn InferenceBackend>> {
        Ok(match self.backend {
            BackendKind::Echo => Arc::new(EchoBackend::new()),
            BackendKind::Ollama => Arc::new(OllamaBackend::new(&self.ollama_url)?),
        })
    }
}
