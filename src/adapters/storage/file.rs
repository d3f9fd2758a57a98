//! File-based Dialogue Store Adapter
//!
//! Stores each conversation's state as a YAML file named after the
//! conversation id, so transcripts can be inspected on disk.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::dialogue::DialogueState;
use crate::domain::foundation::ConversationId;
use crate::ports::{DialogueStateStore, StateStoreError};

/// File-based storage for dialogue state
#[derive(Debug, Clone)]
pub struct FileDialogueStore {
    base_path: PathBuf,
}

impl FileDialogueStore {
    /// Create a new file store rooted at `base_path`.
    ///
    /// The directory is created on first save.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileDialogueStore::new("./data/dialogues");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn state_file_path(&self, id: ConversationId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", id))
    }
}

fn io_error(err: std::io::Error) -> StateStoreError {
    StateStoreError::Io(err.to_string())
}

#[async_trait]
impl DialogueStateStore for FileDialogueStore {
    async fn load(&self, id: ConversationId) -> Result<DialogueState, StateStoreError> {
        let yaml = match fs::read_to_string(self.state_file_path(id)).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DialogueState::new()),
            Err(e) => return Err(io_error(e)),
        };

        serde_yaml::from_str(&yaml).map_err(|e| StateStoreError::Deserialization(e.to_string()))
    }

    async fn save(&self, id: ConversationId, state: &DialogueState) -> Result<(), StateStoreError> {
        fs::create_dir_all(&self.base_path).await.map_err(io_error)?;

        let yaml = serde_yaml::to_string(state)
            .map_err(|e| StateStoreError::Serialization(e.to_string()))?;

        fs::write(self.state_file_path(id), yaml)
            .await
            .map_err(io_error)
    }

    async fn exists(&self, id: ConversationId) -> Result<bool, StateStoreError> {
        match fs::metadata(self.state_file_path(id)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn delete(&self, id: ConversationId) -> Result<(), StateStoreError> {
        match fs::remove_file(self.state_file_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::{PrincipleClassification, Stage, StagePosition, SubState};
    use tempfile::TempDir;

    fn sample_state() -> DialogueState {
        let mut state = DialogueState::new();
        state.topic = "Should voting be compulsory?".to_string();
        state.position = StagePosition::new(Stage::PrincipleReasoning, SubState::Clarify);
        state.loop_count = 2;
        state.stance_history.append("Yes", "Legitimacy needs turnout");
        state.stance_history.append("Yes, with exemptions", "Conscience matters");
        state
            .principle_history
            .append("Duties may be imposed when they protect a shared good", PrincipleClassification::Moderate);
        state.current_case = Some("A citizen who objects on religious grounds.".to_string());
        state.add_tutor_turn("Should voting be compulsory?\n\nWhy?");
        state.add_student_turn("Yes: \"legitimacy\" needs turnout.");
        state
    }

    #[tokio::test]
    async fn save_then_load_round_trips_exactly() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDialogueStore::new(temp_dir.path().join("nested"));
        let id = ConversationId::new();
        let state = sample_state();

        store.save(id, &state).await.unwrap();
        let loaded = store.load(id).await.unwrap();

        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn writes_one_yaml_file_per_conversation() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDialogueStore::new(temp_dir.path());
        let id = ConversationId::new();

        store.save(id, &sample_state()).await.unwrap();

        let path = temp_dir.path().join(format!("{}.yaml", id));
        let yaml = std::fs::read_to_string(path).unwrap();
        assert!(yaml.contains("Should voting be compulsory?"));
    }

    #[tokio::test]
    async fn load_missing_returns_fresh_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDialogueStore::new(temp_dir.path());
        let id = ConversationId::new();

        assert_eq!(store.load(id).await.unwrap(), DialogueState::new());
        assert!(!store.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn load_corrupt_file_is_deserialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDialogueStore::new(temp_dir.path());
        let id = ConversationId::new();
        std::fs::write(temp_dir.path().join(format!("{}.yaml", id)), "position: [unclosed").unwrap();

        let result = store.load(id).await;

        assert!(matches!(result, Err(StateStoreError::Deserialization(_))));
    }

    #[tokio::test]
    async fn delete_removes_file_and_tolerates_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileDialogueStore::new(temp_dir.path());
        let id = ConversationId::new();
        store.save(id, &sample_state()).await.unwrap();
        assert!(store.exists(id).await.unwrap());

        store.delete(id).await.unwrap();
        store.delete(id).await.unwrap();

        assert!(!store.exists(id).await.unwrap());
    }
}
