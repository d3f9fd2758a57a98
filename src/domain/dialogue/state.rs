//! Dialogue State Entity
//!
//! The single record describing where a Socratic conversation stands.
//! It is persisted between invocations and only ever replaced wholesale
//! by a successful orchestrator step.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, ValidationError};

use super::stage::{Stage, StagePosition, SubState};
use super::versions::{PrincipleVersion, StanceVersion, VersionHistory};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Student,
    Tutor,
}

/// One raw conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
}

impl Turn {
    pub fn student(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Student,
            content: content.into(),
        }
    }

    pub fn tutor(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Tutor,
            content: content.into(),
        }
    }
}

/// Discussion subject supplied by the caller on every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicContext {
    pub topic: String,
    /// Optional framing material (reading excerpt, assignment prompt).
    pub background: Option<String>,
}

impl TopicContext {
    pub fn new(topic: impl Into<String>) -> Result<Self, ValidationError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(ValidationError::empty_field("topic"));
        }
        Ok(Self {
            topic,
            background: None,
        })
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }
}

/// Complete state of one Socratic conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogueState {
    pub topic: String,
    pub position: StagePosition,
    pub loop_count: u32,
    pub stance_history: VersionHistory<StanceVersion>,
    pub principle_history: VersionHistory<PrincipleVersion>,
    pub conversation_history: Vec<Turn>,
    /// Challenge case most recently put to the student.
    pub current_case: Option<String>,
    /// Closure synthesis awaiting the student's confirmation.
    pub draft_summary: Option<String>,
    pub discussion_satisfied: bool,
    /// A challenge case has been completed since the latest principle was recorded.
    #[serde(default)]
    pub principle_tested: bool,
    /// Accepted synthesis; present exactly when the dialogue has ended.
    pub summary: Option<String>,
}

impl DialogueState {
    /// Fresh state for a conversation that has not started.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.position.stage()
    }

    pub fn sub_state(&self) -> Option<SubState> {
        self.position.sub_state()
    }

    pub fn current_stance(&self) -> Option<&StanceVersion> {
        self.stance_history.latest()
    }

    pub fn current_principle(&self) -> Option<&PrincipleVersion> {
        self.principle_history.latest()
    }

    pub fn is_ended(&self) -> bool {
        self.stage().is_terminal()
    }

    pub fn add_student_turn(&mut self, content: impl Into<String>) {
        self.conversation_history.push(Turn::student(content));
    }

    pub fn add_tutor_turn(&mut self, content: impl Into<String>) {
        self.conversation_history.push(Turn::tutor(content));
    }

    /// Checks the invariants that must hold for every reachable state.
    pub fn check_invariants(&self, max_loops: u32) -> Result<(), ValidationError> {
        if self.loop_count > max_loops {
            return Err(ValidationError::out_of_range(
                "loop_count",
                0,
                max_loops,
                self.loop_count,
            ));
        }
        if self.is_ended() != self.summary.is_some() {
            return Err(ValidationError::invalid_format(
                "summary",
                "summary must be present exactly when the dialogue has ended",
            ));
        }
        if !self.stance_history.is_contiguous() {
            return Err(ValidationError::invalid_format(
                "stance_history",
                "versions must be contiguous from 1",
            ));
        }
        if !self.principle_history.is_contiguous() {
            return Err(ValidationError::invalid_format(
                "principle_history",
                "versions must be contiguous from 1",
            ));
        }
        let past_stance = !matches!(
            self.stage(),
            Stage::AwaitingStart | Stage::AskingStance
        );
        if past_stance && self.stance_history.is_empty() {
            return Err(ValidationError::empty_field("stance_history"));
        }
        Ok(())
    }
}
