//! DialogueSessionHandler - load, advance and save one conversation.
//!
//! Authorization happens before these handlers are called. The saved
//! state only changes when the orchestrator succeeds.

use std::sync::Arc;

use tracing::debug;

use crate::domain::dialogue::{ConversationSummary, DialogueState, GeneratedMessage, TopicContext};
use crate::domain::foundation::ConversationId;
use crate::ports::{DialogueStateStore, PromptExecutor};

use super::errors::SessionError;
use super::orchestrator::SocraticOrchestrator;

/// Command to open a new conversation on a topic
#[derive(Debug, Clone)]
pub struct StartDialogueCommand {
    pub conversation_id: ConversationId,
    pub topic: TopicContext,
}

/// Command to submit a student message
#[derive(Debug, Clone)]
pub struct RespondCommand {
    pub conversation_id: ConversationId,
    pub topic: TopicContext,
    pub message: String,
}

/// Result of a handled turn
#[derive(Debug, Clone)]
pub struct DialogueTurnResult {
    pub reply: GeneratedMessage,
    pub summary: ConversationSummary,
    pub ended: bool,
}

/// Handler for persisted dialogue sessions
pub struct DialogueSessionHandler<E: ?Sized + PromptExecutor> {
    store: Arc<dyn DialogueStateStore>,
    orchestrator: SocraticOrchestrator<E>,
}

impl<E: ?Sized + PromptExecutor> DialogueSessionHandler<E> {
    pub fn new(store: Arc<dyn DialogueStateStore>, orchestrator: SocraticOrchestrator<E>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    pub async fn start(&self, cmd: StartDialogueCommand) -> Result<DialogueTurnResult, SessionError> {
        let state = self.store.load(cmd.conversation_id).await?;
        let outcome = self
            .orchestrator
            .start_conversation(&state, &cmd.topic)
            .await?;
        self.commit(cmd.conversation_id, outcome.state, outcome.reply)
            .await
    }

    pub async fn respond(&self, cmd: RespondCommand) -> Result<DialogueTurnResult, SessionError> {
        let state = self.store.load(cmd.conversation_id).await?;
        let outcome = self
            .orchestrator
            .process_student_input(&state, &cmd.message, &cmd.topic)
            .await?;
        self.commit(cmd.conversation_id, outcome.state, outcome.reply)
            .await
    }

    /// Current projection of a conversation without advancing it.
    pub async fn summary(&self, id: ConversationId) -> Result<ConversationSummary, SessionError> {
        let state = self.store.load(id).await?;
        Ok(self.orchestrator.extract_conversation_summary(&state))
    }

    async fn commit(
        &self,
        id: ConversationId,
        state: DialogueState,
        reply: GeneratedMessage,
    ) -> Result<DialogueTurnResult, SessionError> {
        self.store.save(id, &state).await?;
        debug!(conversation_id = %id, position = %state.position, "Dialogue state saved");

        Ok(DialogueTurnResult {
            reply,
            summary: self.orchestrator.extract_conversation_summary(&state),
            ended: self.orchestrator.is_ended(&state),
        })
    }
}
