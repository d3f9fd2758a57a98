//! Dialogue State Store Port - Interface for persisting dialogue state.
//!
//! The orchestrator never touches storage. Callers load a state, hand it
//! to the orchestrator, and save whatever comes back on success.
//! Authorization happens before either call.

use async_trait::async_trait;

use crate::domain::dialogue::DialogueState;
use crate::domain::foundation::ConversationId;

/// Errors that can occur during state store operations
#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error("Failed to serialize state: {0}")]
    Serialization(String),

    #[error("Failed to deserialize state: {0}")]
    Deserialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Port for persisting and loading dialogue state
#[async_trait]
pub trait DialogueStateStore: Send + Sync {
    /// Load the state for a conversation.
    ///
    /// Returns a fresh state awaiting start if none has been saved.
    async fn load(&self, id: ConversationId) -> Result<DialogueState, StateStoreError>;

    /// Save the state for a conversation, replacing any previous state.
    async fn save(&self, id: ConversationId, state: &DialogueState) -> Result<(), StateStoreError>;

    /// Check whether a state has been saved for a conversation.
    async fn exists(&self, id: ConversationId) -> Result<bool, StateStoreError>;

    /// Remove the saved state. Deleting a missing state is not an error.
    async fn delete(&self, id: ConversationId) -> Result<(), StateStoreError>;
}
