//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the state machine trait, and validation errors
//! that form the vocabulary of the dialogue domain.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::ConversationId;
pub use state_machine::StateMachine;
