//! In-Memory Dialogue Store Adapter
//!
//! Keeps dialogue state in a HashMap. Useful for tests and for
//! single-process deployments where persistence is not needed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::dialogue::DialogueState;
use crate::domain::foundation::ConversationId;
use crate::ports::{DialogueStateStore, StateStoreError};

/// In-memory storage for dialogue state
#[derive(Debug, Clone, Default)]
pub struct InMemoryDialogueStore {
    states: Arc<RwLock<HashMap<ConversationId, DialogueState>>>,
}

impl InMemoryDialogueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all stored states
    pub async fn clear(&self) {
        self.states.write().await.clear();
    }

    /// Number of conversations currently stored
    pub async fn state_count(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl DialogueStateStore for InMemoryDialogueStore {
    async fn load(&self, id: ConversationId) -> Result<DialogueState, StateStoreError> {
        let states = self.states.read().await;
        Ok(states.get(&id).cloned().unwrap_or_default())
    }

    async fn save(&self, id: ConversationId, state: &DialogueState) -> Result<(), StateStoreError> {
        self.states.write().await.insert(id, state.clone());
        Ok(())
    }

    async fn exists(&self, id: ConversationId) -> Result<bool, StateStoreError> {
        Ok(self.states.read().await.contains_key(&id))
    }

    async fn delete(&self, id: ConversationId) -> Result<(), StateStoreError> {
        self.states.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::{Stage, StagePosition, SubState};

    fn sample_state() -> DialogueState {
        let mut state = DialogueState::new();
        state.topic = "Is it ever right to lie?".to_string();
        state.position = StagePosition::new(Stage::CaseChallenge, SubState::Main);
        state.stance_history.append("No", "Lying erodes trust");
        state.add_tutor_turn("What do you think?");
        state.add_student_turn("No, never.");
        state
    }

    #[tokio::test]
    async fn load_returns_fresh_state_when_absent() {
        let store = InMemoryDialogueStore::new();

        let state = store.load(ConversationId::new()).await.unwrap();

        assert_eq!(state, DialogueState::new());
        assert_eq!(state.stage(), Stage::AwaitingStart);
    }

    #[tokio::test]
    async fn save_then_load_returns_identical_state() {
        let store = InMemoryDialogueStore::new();
        let id = ConversationId::new();
        let state = sample_state();

        store.save(id, &state).await.unwrap();

        assert_eq!(store.load(id).await.unwrap(), state);
        assert!(store.exists(id).await.unwrap());
        assert_eq!(store.state_count().await, 1);
    }

    #[tokio::test]
    async fn save_replaces_previous_state() {
        let store = InMemoryDialogueStore::new();
        let id = ConversationId::new();
        store.save(id, &DialogueState::new()).await.unwrap();

        let state = sample_state();
        store.save(id, &state).await.unwrap();

        assert_eq!(store.load(id).await.unwrap(), state);
        assert_eq!(store.state_count().await, 1);
    }

    #[tokio::test]
    async fn delete_removes_state_and_tolerates_missing() {
        let store = InMemoryDialogueStore::new();
        let id = ConversationId::new();
        store.save(id, &sample_state()).await.unwrap();

        store.delete(id).await.unwrap();
        store.delete(id).await.unwrap();

        assert!(!store.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let store = InMemoryDialogueStore::new();
        let shared = store.clone();
        shared.save(ConversationId::new(), &sample_state()).await.unwrap();

        assert_eq!(store.state_count().await, 1);
        store.clear().await;
        assert_eq!(shared.state_count().await, 0);
    }
}
