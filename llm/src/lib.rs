//! Inference capability boundary for the chat service.
//!
//! The `llm` crate defines the [`InferenceBackend`] and [`ModelHandle`] traits
//! that stand in for a native inference engine, the [`PromptContext`] handed to
//! every generation, and two backends: [`EchoBackend`] and [`OllamaBackend`].

pub mod client;
pub mod echo;
pub mod model;
pub mod traits;

pub use client::OllamaBackend;
pub use echo::EchoBackend;
pub use model::{ArtifactFormat, LoadOptions, PromptContext, Role, Turn};
pub use traits::{InferenceBackend, LLMError, ModelHandle};
