//! Errors surfaced by the dialogue orchestrator.
//!
//! Every variant carries the position the conversation was at when the
//! failure happened. The caller's input state is never modified, so any
//! of these can be answered by retrying with the same state.

use thiserror::Error;

use crate::domain::dialogue::{
    Intent, SchemaValidationError, Stage, StagePosition, SubState, TransitionError,
};
use crate::ports::{AIError, ExecutorError, StateStoreError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DialogueError {
    /// The operation is not allowed at this position. Raised before any
    /// executor call.
    #[error("cannot {operation} at {position}")]
    Precondition {
        position: StagePosition,
        operation: &'static str,
    },

    #[error("provider failed at {position}: {source}")]
    Provider {
        position: StagePosition,
        #[source]
        source: AIError,
    },

    #[error("classifier output at {position} could not be parsed: {reason}")]
    DecisionParse {
        position: StagePosition,
        raw: String,
        reason: String,
    },

    #[error("classifier returned {intent}, which is not legal at {position}")]
    IllegalIntent {
        position: StagePosition,
        intent: Intent,
        raw: String,
    },

    #[error("invalid state at {position}: {reason}")]
    InvalidState {
        position: StagePosition,
        reason: String,
    },
}

impl DialogueError {
    pub fn precondition(position: StagePosition, operation: &'static str) -> Self {
        DialogueError::Precondition {
            position,
            operation,
        }
    }

    pub fn invalid_state(position: StagePosition, reason: impl Into<String>) -> Self {
        DialogueError::InvalidState {
            position,
            reason: reason.into(),
        }
    }

    /// Maps an executor failure at the given position.
    pub fn from_executor(position: StagePosition, err: ExecutorError) -> Self {
        match err {
            ExecutorError::Provider(source) => DialogueError::Provider { position, source },
            ExecutorError::DecisionParse { raw, reason } => DialogueError::DecisionParse {
                position,
                raw,
                reason,
            },
            ExecutorError::IllegalIntent { intent, raw, .. } => DialogueError::IllegalIntent {
                position,
                intent,
                raw,
            },
            ExecutorError::UnexpectedOutput(reason) => DialogueError::Provider {
                position,
                source: AIError::parse(reason),
            },
        }
    }

    /// Maps a decision that validated but could not be decoded.
    pub fn from_decision(position: StagePosition, raw: String, err: SchemaValidationError) -> Self {
        match err {
            SchemaValidationError::IllegalIntent { intent, .. } => DialogueError::IllegalIntent {
                position,
                intent,
                raw,
            },
            other => DialogueError::DecisionParse {
                position,
                raw,
                reason: other.to_string(),
            },
        }
    }

    /// Maps a transition-table rejection.
    pub fn from_transition(err: TransitionError) -> Self {
        let reason = err.to_string();
        let position = match err {
            TransitionError::StageMismatch { position, .. }
            | TransitionError::NotAcceptingInput { position }
            | TransitionError::MissingStance { position }
            | TransitionError::IllegalStageChange { position, .. } => position,
        };
        DialogueError::invalid_state(position, reason)
    }

    pub fn position(&self) -> StagePosition {
        match self {
            DialogueError::Precondition { position, .. }
            | DialogueError::Provider { position, .. }
            | DialogueError::DecisionParse { position, .. }
            | DialogueError::IllegalIntent { position, .. }
            | DialogueError::InvalidState { position, .. } => *position,
        }
    }

    pub fn stage(&self) -> Stage {
        self.position().stage()
    }

    pub fn sub_state(&self) -> Option<SubState> {
        self.position().sub_state()
    }

    /// Raw classifier output, when the failure involved one.
    pub fn raw_decision(&self) -> Option<&str> {
        match self {
            DialogueError::DecisionParse { raw, .. } | DialogueError::IllegalIntent { raw, .. } => {
                Some(raw)
            }
            _ => None,
        }
    }

    /// True only for provider failures that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            DialogueError::Provider { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Errors from the persistence-backed session handler.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Dialogue(#[from] DialogueError),

    #[error("storage error: {0}")]
    Storage(#[from] StateStoreError),
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Dialogue(e) => e.is_retryable(),
            SessionError::Storage(StateStoreError::Io(_)) => true,
            SessionError::Storage(_) => false,
        }
    }
}
