#![allow(dead_code)]

use async_trait::async_trait;
use chat::{ChatCompletionService, ConversationSession, ModelLifecycleManager, ModelRegistry};
use llm::{InferenceBackend, LLMError, LoadOptions, ModelHandle, PromptContext};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared observations made by [`TestBackend`] and its handles.
#[derive(Clone, Default)]
pub struct Probe {
    pub contexts: Arc<Mutex<Vec<PromptContext>>>,
    pub live: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
    pub loads: Arc<AtomicUsize>,
    pub fail_generate: Arc<AtomicBool>,
}

impl Probe {
    pub fn last_context(&self) -> PromptContext {
        self.contexts.lock().unwrap().last().cloned().expect("no generation recorded")
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

/// Backend whose handles record every context and count themselves.
pub struct TestBackend {
    pub probe: Probe,
    pub load_delay: Duration,
    pub generate_delay: Duration,
    /// File stem whose load always fails.
    pub fail_load_for: Option<String>,
}

impl TestBackend {
    pub fn new(probe: Probe) -> Self {
        Self {
            probe,
            load_delay: Duration::ZERO,
            generate_delay: Duration::ZERO,
            fail_load_for: None,
        }
    }
}

#[async_trait]
impl InferenceBackend for TestBackend {
    async fn load(
        &self,
        path: &Path,
        _options: &LoadOptions,
    ) -> Result<Box<dyn ModelHandle>, LLMError> {
        tokio::time::sleep(self.load_delay).await;
        let label = path.file_stem().unwrap().to_string_lossy().into_owned();
        if self.fail_load_for.as_deref() == Some(label.as_str()) {
            return Err(LLMError::InvalidArtifact(format!("{label} is corrupt")));
        }
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        let now = self.probe.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(TestHandle {
            label,
            probe: self.probe.clone(),
            delay: self.generate_delay,
        }))
    }

    fn name(&self) -> &'static str {
        "test"
    }
}

struct TestHandle {
    label: String,
    probe: Probe,
    delay: Duration,
}

#[async_trait]
impl ModelHandle for TestHandle {
    async fn generate(&self, context: &PromptContext) -> Result<String, LLMError> {
        tokio::time::sleep(self.delay).await;
        self.probe.contexts.lock().unwrap().push(context.clone());
        if self.probe.fail_generate.load(Ordering::SeqCst) {
            return Err(LLMError::Network("engine crashed".into()));
        }
        Ok(format!("{} reply #{}", self.label, context.turns.len()))
    }
}

impl Drop for TestHandle {
    fn drop(&mut self) {
        self.probe.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Write a small fake GGUF artifact named `name` into `dir`.
pub fn artifact(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"GGUF\x03\x00\x00\x00").unwrap();
    path
}

/// Fully wired core around a [`TestBackend`].
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub probe: Probe,
    pub registry: Arc<ModelRegistry>,
    pub lifecycle: Arc<ModelLifecycleManager>,
    pub session: Arc<ConversationSession>,
    pub service: ChatCompletionService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(TestBackend::new)
    }

    pub fn with_backend(build: impl FnOnce(Probe) -> TestBackend) -> Self {
        let probe = Probe::default();
        let backend = build(probe.clone());
        let registry = Arc::new(ModelRegistry::new(8192));
        let lifecycle = Arc::new(ModelLifecycleManager::new(registry.clone(), Arc::new(backend)));
        let session = Arc::new(ConversationSession::new());
        let service = ChatCompletionService::new(lifecycle.clone(), session.clone());
        Self {
            dir: tempfile::tempdir().unwrap(),
            probe,
            registry,
            lifecycle,
            session,
            service,
        }
    }

    /// Register a fresh artifact called `name` and return its id.
    pub async fn register(&self, name: &str) -> String {
        let path = artifact(self.dir.path(), name);
        self.registry.register(&path, None).await.unwrap().id
    }
}
