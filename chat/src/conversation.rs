use llm::{Role, Turn};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Default)]
struct History {
    turns: Vec<Turn>,
    epoch: u64,
}

/// The process-wide conversation.
///
/// Turns are kept in arrival order. Every [`reset`](Self::reset) empties the
/// history and advances the epoch, which lets a caller holding an older epoch
/// find out that its exchange was discarded.
#[derive(Default)]
pub struct ConversationSession {
    inner: Mutex<History>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn and return the epoch it landed in.
    pub async fn append(&self, role: Role, content: impl Into<String>) -> u64 {
        let mut history = self.inner.lock().await;
        history.turns.push(Turn {
            role,
            content: content.into(),
        });
        history.epoch
    }

    /// Append only if no reset happened since `epoch`.
    pub async fn append_in_epoch(&self, epoch: u64, role: Role, content: impl Into<String>) -> bool {
        let mut history = self.inner.lock().await;
        if history.epoch != epoch {
            return false;
        }
        history.turns.push(Turn {
            role,
            content: content.into(),
        });
        true
    }

    /// Append a turn and copy the resulting history under one lock.
    pub async fn append_and_snapshot(
        &self,
        role: Role,
        content: impl Into<String>,
    ) -> (u64, Vec<Turn>) {
        let mut history = self.inner.lock().await;
        history.turns.push(Turn {
            role,
            content: content.into(),
        });
        (history.epoch, history.turns.clone())
    }

    /// Point-in-time copy of every turn.
    pub async fn snapshot(&self) -> Vec<Turn> {
        self.inner.lock().await.turns.clone()
    }

    pub async fn reset(&self) {
        let mut history = self.inner.lock().await;
        let dropped = history.turns.len();
        history.turns.clear();
        history.epoch += 1;
        info!(dropped, epoch = history.epoch, "conversation reset");
    }

    pub async fn epoch(&self) -> u64 {
        self.inner.lock().await.epoch
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.turns.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.turns.is_empty()
    }
}
