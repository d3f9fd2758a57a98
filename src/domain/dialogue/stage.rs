//! Dialogue stages, sub-states, and the intent vocabulary.
//!
//! `StagePosition` is the persisted sum type: it only carries a sub-state
//! for stages where clarification loops exist, so illegal pairs such as
//! `(Ended, Clarify)` cannot be represented.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Coarse stage of the Socratic exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    AwaitingStart,
    AskingStance,
    CaseChallenge,
    PrincipleReasoning,
    Closure,
    Ended,
}

impl Stage {
    /// Intents the classifier may return while in this stage.
    pub fn legal_intents(&self) -> &'static [Intent] {
        match self {
            Stage::AwaitingStart | Stage::Ended => &[],
            Stage::AskingStance => &[Intent::Clarify, Intent::V1Established],
            Stage::CaseChallenge => &[Intent::Clarify, Intent::Scaffold, Intent::CaseCompleted],
            Stage::PrincipleReasoning => &[
                Intent::Clarify,
                Intent::Complete,
                Intent::NextCase,
                Intent::Scaffold,
            ],
            Stage::Closure => &[Intent::Clarify, Intent::ConfirmEnd],
        }
    }

    /// Returns true if the intent belongs to this stage's vocabulary.
    pub fn allows(&self, intent: Intent) -> bool {
        self.legal_intents().contains(&intent)
    }

    /// Snake-case label used in prompt purposes and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AwaitingStart => "awaiting_start",
            Stage::AskingStance => "asking_stance",
            Stage::CaseChallenge => "case_challenge",
            Stage::PrincipleReasoning => "principle_reasoning",
            Stage::Closure => "closure",
            Stage::Ended => "ended",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for Stage {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use Stage::*;
        match self {
            AwaitingStart => vec![AskingStance],
            AskingStance => vec![AskingStance, CaseChallenge],
            CaseChallenge => vec![CaseChallenge, PrincipleReasoning],
            // Extreme principles are sent back for another challenge case.
            PrincipleReasoning => vec![PrincipleReasoning, CaseChallenge, Closure],
            Closure => vec![Closure, Ended],
            Ended => vec![],
        }
    }
}

/// Whether the last classification asked the student to disambiguate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubState {
    #[default]
    Main,
    Clarify,
}

/// Where a conversation stands: stage plus the sub-states legal for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "stage", content = "sub_state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StagePosition {
    #[default]
    AwaitingStart,
    AskingStance(SubState),
    CaseChallenge(SubState),
    PrincipleReasoning(SubState),
    Closure(SubState),
    Ended,
}

impl StagePosition {
    /// Builds a position from a stage and sub-state.
    ///
    /// Stages without clarification loops ignore the sub-state.
    pub fn new(stage: Stage, sub_state: SubState) -> Self {
        match stage {
            Stage::AwaitingStart => StagePosition::AwaitingStart,
            Stage::AskingStance => StagePosition::AskingStance(sub_state),
            Stage::CaseChallenge => StagePosition::CaseChallenge(sub_state),
            Stage::PrincipleReasoning => StagePosition::PrincipleReasoning(sub_state),
            Stage::Closure => StagePosition::Closure(sub_state),
            Stage::Ended => StagePosition::Ended,
        }
    }

    /// The coarse stage.
    pub fn stage(&self) -> Stage {
        match self {
            StagePosition::AwaitingStart => Stage::AwaitingStart,
            StagePosition::AskingStance(_) => Stage::AskingStance,
            StagePosition::CaseChallenge(_) => Stage::CaseChallenge,
            StagePosition::PrincipleReasoning(_) => Stage::PrincipleReasoning,
            StagePosition::Closure(_) => Stage::Closure,
            StagePosition::Ended => Stage::Ended,
        }
    }

    /// The sub-state, if this stage has one.
    pub fn sub_state(&self) -> Option<SubState> {
        match self {
            StagePosition::AskingStance(s)
            | StagePosition::CaseChallenge(s)
            | StagePosition::PrincipleReasoning(s)
            | StagePosition::Closure(s) => Some(*s),
            StagePosition::AwaitingStart | StagePosition::Ended => None,
        }
    }

    /// Same stage, sub-state switched to `Clarify`.
    pub fn clarifying(&self) -> Self {
        Self::new(self.stage(), SubState::Clarify)
    }

    /// Returns true if the next input must resolve a clarification request.
    pub fn is_clarifying(&self) -> bool {
        self.sub_state() == Some(SubState::Clarify)
    }
}

impl fmt::Display for StagePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub_state() {
            Some(SubState::Clarify) => write!(f, "{}/clarify", self.stage()),
            Some(SubState::Main) => write!(f, "{}/main", self.stage()),
            None => write!(f, "{}", self.stage()),
        }
    }
}

/// Classified category of a student message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "TR_CLARIFY")]
    Clarify,
    #[serde(rename = "TR_V1_ESTABLISHED")]
    V1Established,
    #[serde(rename = "TR_SCAFFOLD")]
    Scaffold,
    #[serde(rename = "TR_CASE_COMPLETED")]
    CaseCompleted,
    #[serde(rename = "TR_COMPLETE")]
    Complete,
    #[serde(rename = "TR_NEXT_CASE")]
    NextCase,
    #[serde(rename = "TR_CONFIRM_END")]
    ConfirmEnd,
}

impl Intent {
    /// Every intent known to any stage.
    pub const ALL: [Intent; 7] = [
        Intent::Clarify,
        Intent::V1Established,
        Intent::Scaffold,
        Intent::CaseCompleted,
        Intent::Complete,
        Intent::NextCase,
        Intent::ConfirmEnd,
    ];

    /// Wire label used in classification schemas.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Clarify => "TR_CLARIFY",
            Intent::V1Established => "TR_V1_ESTABLISHED",
            Intent::Scaffold => "TR_SCAFFOLD",
            Intent::CaseCompleted => "TR_CASE_COMPLETED",
            Intent::Complete => "TR_COMPLETE",
            Intent::NextCase => "TR_NEXT_CASE",
            Intent::ConfirmEnd => "TR_CONFIRM_END",
        }
    }

    /// Parses a wire label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == label)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_serializes_with_stage_and_sub_state() {
        let json = serde_json::to_value(StagePosition::CaseChallenge(SubState::Clarify)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"stage": "CASE_CHALLENGE", "sub_state": "CLARIFY"})
        );

        let json = serde_json::to_value(StagePosition::Ended).unwrap();
        assert_eq!(json, serde_json::json!({"stage": "ENDED"}));
    }

    #[test]
    fn position_round_trips() {
        for position in [
            StagePosition::AwaitingStart,
            StagePosition::AskingStance(SubState::Main),
            StagePosition::PrincipleReasoning(SubState::Clarify),
            StagePosition::Ended,
        ] {
            let json = serde_json::to_string(&position).unwrap();
            let back: StagePosition = serde_json::from_str(&json).unwrap();
            assert_eq!(back, position);
        }
    }

    #[test]
    fn terminal_positions_have_no_sub_state() {
        assert_eq!(StagePosition::AwaitingStart.sub_state(), None);
        assert_eq!(StagePosition::Ended.sub_state(), None);
        assert_eq!(StagePosition::new(Stage::Ended, SubState::Clarify), StagePosition::Ended);
    }

    #[test]
    fn clarifying_keeps_stage() {
        let position = StagePosition::Closure(SubState::Main).clarifying();
        assert_eq!(position, StagePosition::Closure(SubState::Clarify));
        assert!(position.is_clarifying());
        assert_eq!(position.to_string(), "closure/clarify");
    }

    #[test]
    fn stage_vocabularies_are_disjoint_where_required() {
        assert!(Stage::AskingStance.allows(Intent::V1Established));
        assert!(!Stage::AskingStance.allows(Intent::CaseCompleted));
        assert!(!Stage::CaseChallenge.allows(Intent::ConfirmEnd));
        assert!(Stage::PrincipleReasoning.allows(Intent::NextCase));
        assert!(!Stage::Closure.allows(Intent::Scaffold));
        assert!(Stage::Ended.legal_intents().is_empty());
    }

    #[test]
    fn every_intent_is_legal_somewhere() {
        let stages = [
            Stage::AskingStance,
            Stage::CaseChallenge,
            Stage::PrincipleReasoning,
            Stage::Closure,
        ];
        for intent in Intent::ALL {
            assert!(stages.iter().any(|s| s.allows(intent)), "{intent} unused");
        }
    }

    #[test]
    fn intent_labels_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_label(intent.as_str()), Some(intent));
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{}\"", intent.as_str()));
        }
        assert_eq!(Intent::from_label("TR_GUESS"), None);
    }

    #[test]
    fn stage_machine_is_forward_only_except_pressure_test() {
        assert!(Stage::AwaitingStart.can_transition_to(&Stage::AskingStance));
        assert!(!Stage::CaseChallenge.can_transition_to(&Stage::AskingStance));
        assert!(Stage::PrincipleReasoning.can_transition_to(&Stage::CaseChallenge));
        assert!(!Stage::Closure.can_transition_to(&Stage::PrincipleReasoning));
        assert!(Stage::Ended.is_terminal());
    }
}
