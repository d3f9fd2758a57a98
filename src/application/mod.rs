//! Application layer - use cases that coordinate the domain and ports.

pub mod dialogue;

pub use dialogue::{
    DialogueError, DialogueSessionHandler, DialogueTurnResult, RespondCommand, SessionError,
    SocraticOrchestrator, StartDialogueCommand, TurnOutcome,
};
