//! Dialogue use cases: the orchestrator and its persisted session handler.

mod errors;
mod handler;
mod orchestrator;

pub use errors::{DialogueError, SessionError};
pub use handler::{
    DialogueSessionHandler, DialogueTurnResult, RespondCommand, StartDialogueCommand,
};
pub use orchestrator::{SocraticOrchestrator, TurnOutcome};
