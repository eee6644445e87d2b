//! End-to-end handling of a single chat message.

use llm::{PromptContext, Role, Turn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::conversation::ConversationSession;
use crate::error::{ChatError, Result};
use crate::lifecycle::ModelLifecycleManager;

/// Outcome of a successful [`ChatCompletionService::complete`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub model_id: String,
    /// Number of turns the model saw, including the new user turn.
    pub context_turns: usize,
    pub latency: Duration,
}

pub struct ChatCompletionService {
    lifecycle: Arc<ModelLifecycleManager>,
    session: Arc<ConversationSession>,
    system_prompt: Option<String>,
    // held for a whole exchange so user/assistant pairs stay adjacent
    exchange: Mutex<()>,
}

impl ChatCompletionService {
    pub fn new(lifecycle: Arc<ModelLifecycleManager>, session: Arc<ConversationSession>) -> Self {
        Self {
            lifecycle,
            session,
            system_prompt: None,
            exchange: Mutex::new(()),
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn lifecycle(&self) -> &Arc<ModelLifecycleManager> {
        &self.lifecycle
    }

    pub fn session(&self) -> &Arc<ConversationSession> {
        &self.session
    }

    /// Send `message` to the active model with the whole conversation as
    /// context.
    ///
    /// If generation fails the user turn stays in the history without a
    /// reply. If a reset lands while the model is working, the reply is
    /// returned but not recorded.
    pub async fn complete(&self, message: &str) -> Result<Completion> {
        if message.is_empty() {
            return Err(ChatError::InvalidArgument("message cannot be empty".into()));
        }
        let _exchange = self.exchange.lock().await;
        // held from the model check through generation
        let lease = self.lifecycle.lease().await?;

        let started = Instant::now();
        let (epoch, turns) = self.session.append_and_snapshot(Role::User, message).await;
        let context = PromptContext::new(turns).with_system_prompt(self.system_prompt.clone());
        debug!(turns = context.turns.len(), epoch, "prompt context assembled");

        let generation = match lease.generate(&context).await {
            Ok(generation) => generation,
            Err(e) => {
                warn!(error = %e, "completion failed");
                return Err(e);
            }
        };

        drop(lease);
        if !self
            .session
            .append_in_epoch(epoch, Role::Assistant, generation.text.clone())
            .await
        {
            info!(epoch, "conversation reset during generation; reply not recorded");
        }

        Ok(Completion {
            text: generation.text,
            model_id: generation.model_id,
            context_turns: context.turns.len(),
            latency: started.elapsed(),
        })
    }

    /// Forget the conversation. The active model is left alone.
    pub async fn reset(&self) {
        self.session.reset().await;
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.session.snapshot().await
    }
}
