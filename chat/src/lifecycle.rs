//! Ownership of the single active model.
//!
//! The loaded handle lives in an [`RwLock`] slot. [`ModelLifecycleManager::select`]
//! holds the write guard for the whole release-then-load sequence, so a
//! generation (which holds the read guard) only ever sees a fully loaded
//! handle or none at all. A snapshot of the published model is mirrored into
//! a [`watch`] channel so [`ModelLifecycleManager::current`] never waits on a
//! slow load.

use chrono::{DateTime, Utc};
use llm::{InferenceBackend, LoadOptions, ModelHandle, PromptContext};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock, RwLockReadGuard};
use tracing::{info, warn};

use crate::error::{ChatError, Result};
use crate::registry::{ModelEntry, ModelRegistry};

/// Public view of the model currently serving generations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActiveModel {
    pub entry: ModelEntry,
    pub context_size: u32,
    pub loaded_at: DateTime<Utc>,
}

/// Text produced by a generation together with the model that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub model_id: String,
}

struct LoadedModel {
    active: ActiveModel,
    handle: Box<dyn ModelHandle>,
}

pub struct ModelLifecycleManager {
    registry: Arc<ModelRegistry>,
    backend: Arc<dyn InferenceBackend>,
    max_tokens: u32,
    slot: RwLock<Option<LoadedModel>>,
    published: watch::Sender<Option<ActiveModel>>,
}

impl ModelLifecycleManager {
    pub fn new(registry: Arc<ModelRegistry>, backend: Arc<dyn InferenceBackend>) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            registry,
            backend,
            max_tokens: LoadOptions::default().max_tokens,
            slot: RwLock::new(None),
            published,
        }
    }

    /// Cap on generated tokens passed to every load.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Make `model_id` the active model, loading it if needed.
    ///
    /// Selecting the model that is already active with the same context size
    /// is a no-op. Otherwise the previous handle is dropped before the new
    /// one is loaded; if loading fails the slot stays empty.
    pub async fn select(&self, model_id: &str, context_size: Option<u32>) -> Result<ActiveModel> {
        let entry = self.registry.get(model_id).await?;
        let context_size = context_size.unwrap_or(entry.context_size);
        if context_size == 0 {
            return Err(ChatError::InvalidArgument(
                "context size must be positive".into(),
            ));
        }

        let mut slot = self.slot.write().await;
        if let Some(loaded) = slot.as_ref() {
            if loaded.active.entry.id == entry.id && loaded.active.context_size == context_size {
                return Ok(loaded.active.clone());
            }
        }

        if let Some(previous) = slot.take() {
            self.published.send_replace(None);
            info!(id = %previous.active.entry.id, "releasing model");
            drop(previous);
        }

        let options = LoadOptions {
            context_size,
            max_tokens: self.max_tokens,
        };
        info!(id = %entry.id, path = %entry.path.display(), backend = self.backend.name(), "loading model");
        let handle = match self.backend.load(&entry.path, &options).await {
            Ok(handle) => handle,
            Err(source) => {
                warn!(id = %entry.id, error = %source, "model load failed");
                return Err(ChatError::LoadFailure {
                    model_id: entry.id,
                    source,
                });
            }
        };

        let active = ActiveModel {
            entry,
            context_size,
            loaded_at: Utc::now(),
        };
        *slot = Some(LoadedModel {
            active: active.clone(),
            handle,
        });
        self.published.send_replace(Some(active.clone()));
        info!(id = %active.entry.id, "model active");
        Ok(active)
    }

    /// Snapshot of the published model; does not wait for an in-flight select.
    pub fn current(&self) -> Option<ActiveModel> {
        self.published.borrow().clone()
    }

    pub fn active_model_id(&self) -> Option<String> {
        self.published.borrow().as_ref().map(|a| a.entry.id.clone())
    }

    /// Run `context` through the active model and return its output verbatim.
    pub async fn generate(&self, context: &PromptContext) -> Result<String> {
        self.generate_attributed(context).await.map(|g| g.text)
    }

    /// Like [`Self::generate`], also reporting which model answered.
    pub async fn generate_attributed(&self, context: &PromptContext) -> Result<Generation> {
        self.lease().await?.generate(context).await
    }

    /// Pin the active model until the returned lease is dropped.
    ///
    /// Fails with [`ChatError::NoActiveModel`] if the slot is empty. While a
    /// lease is held no `select` can release the model it refers to.
    pub async fn lease(&self) -> Result<ModelLease<'_>> {
        let slot = self.slot.read().await;
        let loaded = RwLockReadGuard::try_map(slot, |slot| slot.as_ref())
            .map_err(|_| ChatError::NoActiveModel)?;
        Ok(ModelLease { loaded })
    }
}

/// Shared hold on the active model, obtained from
/// [`ModelLifecycleManager::lease`].
pub struct ModelLease<'a> {
    loaded: RwLockReadGuard<'a, LoadedModel>,
}

impl ModelLease<'_> {
    pub fn active(&self) -> &ActiveModel {
        &self.loaded.active
    }

    pub async fn generate(&self, context: &PromptContext) -> Result<Generation> {
        let text = self
            .loaded
            .handle
            .generate(context)
            .await
            .map_err(ChatError::GenerationFailure)?;
        Ok(Generation {
            text,
            model_id: self.loaded.active.entry.id.clone(),
        })
    }
}
