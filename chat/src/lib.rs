//! Model lifecycle and conversation engine behind the chat API.
//!
//! [`ModelRegistry`] records artifacts, [`ModelLifecycleManager`] keeps at
//! most one of them loaded, [`ConversationSession`] holds the turn history and
//! [`ChatCompletionService`] ties them together for each message.

pub mod completion;
pub mod conversation;
pub mod error;
pub mod lifecycle;
pub mod registry;

pub use completion::{ChatCompletionService, Completion};
pub use conversation::ConversationSession;
pub use error::{ChatError, Result};
pub use lifecycle::{ActiveModel, Generation, ModelLease, ModelLifecycleManager};
pub use registry::{sanitize_model_id, ModelEntry, ModelListing, ModelRegistry, ModelStatus};

pub use llm::{Role, Turn};
