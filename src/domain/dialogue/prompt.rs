//! Prompts produced by stage builders and consumed by the prompt executor.

use std::fmt;

use super::schema::DecisionSchema;
use super::stage::Stage;
use super::state::Turn;

/// The capability a builder provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderKind {
    /// Student-facing text, no schema.
    Generation,
    /// Schema-constrained decision.
    Classification,
    /// Revised artifact plus confirmation question, no schema.
    Refinement,
}

impl BuilderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuilderKind::Generation => "generation",
            BuilderKind::Classification => "classification",
            BuilderKind::Refinement => "refinement",
        }
    }
}

/// Which stage a prompt serves and what it is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptPurpose {
    pub stage: Stage,
    pub kind: BuilderKind,
}

impl fmt::Display for PromptPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stage, self.kind.as_str())
    }
}

/// A fully assembled prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub purpose: PromptPurpose,
    /// System instructions.
    pub instructions: String,
    /// Conversation context, oldest first.
    pub turns: Vec<Turn>,
    /// Final instruction appended after the context.
    pub task: String,
    /// Output contract; present only for classification prompts.
    pub schema: Option<&'static DecisionSchema>,
}

impl Prompt {
    pub fn is_structured(&self) -> bool {
        self.schema.is_some()
    }
}
