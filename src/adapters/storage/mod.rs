//! Storage Adapters
//!
//! Implementations of the DialogueStateStore port.
//!
//! ## Available Adapters
//!
//! - **FileDialogueStore** - One YAML file per conversation
//! - **InMemoryDialogueStore** - HashMap-backed (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::store_from_config;
//!
//! let store = store_from_config(&config.storage);
//! ```

mod file;
mod in_memory;

pub use file::FileDialogueStore;
pub use in_memory::InMemoryDialogueStore;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::ports::DialogueStateStore;

/// Builds the store selected by configuration.
pub fn store_from_config(config: &StorageConfig) -> Arc<dyn DialogueStateStore> {
    match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryDialogueStore::new()),
        StorageBackend::File => Arc::new(FileDialogueStore::new(&config.data_dir)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn file_backend_writes_under_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            data_dir: temp_dir.path().to_path_buf(),
        };
        let store = store_from_config(&config);
        let id = ConversationId::new();

        store.save(id, &Default::default()).await.unwrap();

        assert!(temp_dir.path().join(format!("{}.yaml", id)).exists());
    }

    #[tokio::test]
    async fn memory_backend_is_default() {
        let store = store_from_config(&StorageConfig::default());
        let id = ConversationId::new();

        assert!(!store.exists(id).await.unwrap());
    }
}
