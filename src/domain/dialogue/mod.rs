//! Socratic dialogue domain.
//!
//! Stage model, versioned stance/principle histories, decision schemas,
//! prompt builders and the pure transition table. No I/O happens here.

pub mod builders;
mod decision;
mod message;
mod prompt;
mod rules;
mod schema;
mod stage;
mod state;
mod summary;
pub mod transition;
mod versions;

pub use builders::{
    ChallengeCaseInput, ChallengeClassifierInput, ChallengeFocus, ClosureClassifierInput,
    ClosureRefinementInput, ClosureSummaryInput, PrincipleClassifierInput, PrincipleFocus,
    PrincipleInvitationInput, PrincipleRefinementInput, StageBuilder, StanceClassifierInput,
    StanceOpeningInput,
};
pub use decision::{
    ChallengeDecision, ClosureDecision, Decision, PrincipleDecision, StageDecision, StanceDecision,
};
pub use message::GeneratedMessage;
pub use prompt::{BuilderKind, Prompt, PromptPurpose};
pub use rules::{DialogueRules, MAX_LOOPS_CEILING};
pub use schema::{DecisionSchema, FieldType, SchemaField, SchemaValidationError};
pub use stage::{Intent, Stage, StagePosition, SubState};
pub use state::{DialogueState, Speaker, TopicContext, Turn};
pub use summary::ConversationSummary;
pub use transition::{FollowUp, Transition, TransitionError};
pub use versions::{
    PrincipleClassification, PrincipleVersion, StanceVersion, VersionHistory, Versioned,
};
