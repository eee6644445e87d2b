//! HTTP front end for the chat engine.
//!
//! The router built by [`app`] exposes model registration, selection and
//! the single conversation over JSON. Configuration is read by [`Config`]
//! and logging is set up with [`init_logging`].

pub mod api;
pub mod config;
pub mod correlation;
pub mod error;
pub mod logging;
pub mod web;

pub use config::{BackendKind, Config, Settings};
pub use error::ApiError;
pub use logging::init_logging;
pub use web::app;

use chat::{ChatCompletionService, ConversationSession, ModelLifecycleManager, ModelRegistry};
use llm::InferenceBackend;
use std::sync::Arc;
use tracing::{info, warn};

/// State shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub lifecycle: Arc<ModelLifecycleManager>,
    pub chat: Arc<ChatCompletionService>,
}

impl AppState {
    /// Wire up the registry, lifecycle manager and completion service around
    /// `backend`.
    pub fn new(backend: Arc<dyn InferenceBackend>, settings: &Settings) -> Self {
        let registry = Arc::new(ModelRegistry::new(settings.context_size));
        let lifecycle = Arc::new(
            ModelLifecycleManager::new(registry.clone(), backend)
                .with_max_tokens(settings.max_tokens),
        );
        let session = Arc::new(ConversationSession::new());
        let chat = Arc::new(
            ChatCompletionService::new(lifecycle.clone(), session)
                .with_system_prompt(settings.system_prompt.clone()),
        );
        Self {
            registry,
            lifecycle,
            chat,
        }
    }
}

/// Resolve once `signal` fires.
///
/// If the signal cannot be installed this never resolves, so the server keeps
/// running without graceful shutdown instead of stopping at once.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for shutdown signal; graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}
