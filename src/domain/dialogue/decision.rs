//! Per-stage decisions returned by classification prompts.
//!
//! A decision only ever drives a single transition; it is never persisted.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::schema::{DecisionSchema, SchemaValidationError};
use super::stage::{Intent, Stage};
use super::versions::PrincipleClassification;

/// Stage 1 classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "intent")]
pub enum StanceDecision {
    #[serde(rename = "TR_CLARIFY")]
    Clarify { clarifying_question: String },
    #[serde(rename = "TR_V1_ESTABLISHED")]
    Established { position: String, reason: String },
}

/// Stage 2 classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "intent")]
pub enum ChallengeDecision {
    #[serde(rename = "TR_CLARIFY")]
    Clarify { clarifying_question: String },
    /// The student shifted (or defended) their stance within the current case.
    #[serde(rename = "TR_SCAFFOLD")]
    Scaffold {
        #[serde(default)]
        position: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(rename = "TR_CASE_COMPLETED")]
    CaseCompleted {
        #[serde(default)]
        request_principle: bool,
    },
}

/// Stage 3 classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "intent")]
pub enum PrincipleDecision {
    #[serde(rename = "TR_CLARIFY")]
    Clarify { clarifying_question: String },
    #[serde(rename = "TR_COMPLETE")]
    Complete {
        statement: String,
        classification: PrincipleClassification,
    },
    /// Principle is extreme enough to warrant a pressure-test case.
    #[serde(rename = "TR_NEXT_CASE")]
    NextCase {
        statement: String,
        classification: PrincipleClassification,
    },
    #[serde(rename = "TR_SCAFFOLD")]
    Scaffold { tension: String },
}

/// Stage 4 classifier output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "intent")]
pub enum ClosureDecision {
    /// The student asked for a correction to the draft summary.
    #[serde(rename = "TR_CLARIFY")]
    Clarify { correction: String },
    #[serde(rename = "TR_CONFIRM_END")]
    ConfirmEnd {
        #[serde(default)]
        closing_remark: Option<String>,
    },
}

/// A typed decision bound to the stage whose classifier produces it.
pub trait StageDecision: DeserializeOwned + Sized {
    const STAGE: Stage;

    fn intent(&self) -> Intent;

    /// Validates raw classifier output against the stage schema and decodes it.
    fn from_output(output: &Value) -> Result<Self, SchemaValidationError> {
        let schema = DecisionSchema::for_stage(Self::STAGE)
            .ok_or(SchemaValidationError::NotAnObject)?;
        schema.validate(output)?;
        serde_json::from_value(output.clone())
            .map_err(|e| SchemaValidationError::Malformed(e.to_string()))
    }
}

impl StageDecision for StanceDecision {
    const STAGE: Stage = Stage::AskingStance;

    fn intent(&self) -> Intent {
        match self {
            StanceDecision::Clarify { .. } => Intent::Clarify,
            StanceDecision::Established { .. } => Intent::V1Established,
        }
    }
}

impl StageDecision for ChallengeDecision {
    const STAGE: Stage = Stage::CaseChallenge;

    fn intent(&self) -> Intent {
        match self {
            ChallengeDecision::Clarify { .. } => Intent::Clarify,
            ChallengeDecision::Scaffold { .. } => Intent::Scaffold,
            ChallengeDecision::CaseCompleted { .. } => Intent::CaseCompleted,
        }
    }
}

impl StageDecision for PrincipleDecision {
    const STAGE: Stage = Stage::PrincipleReasoning;

    fn intent(&self) -> Intent {
        match self {
            PrincipleDecision::Clarify { .. } => Intent::Clarify,
            PrincipleDecision::Complete { .. } => Intent::Complete,
            PrincipleDecision::NextCase { .. } => Intent::NextCase,
            PrincipleDecision::Scaffold { .. } => Intent::Scaffold,
        }
    }
}

impl StageDecision for ClosureDecision {
    const STAGE: Stage = Stage::Closure;

    fn intent(&self) -> Intent {
        match self {
            ClosureDecision::Clarify { .. } => Intent::Clarify,
            ClosureDecision::ConfirmEnd { .. } => Intent::ConfirmEnd,
        }
    }
}

/// Any stage's decision, as consumed by the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Stance(StanceDecision),
    Challenge(ChallengeDecision),
    Principle(PrincipleDecision),
    Closure(ClosureDecision),
}

impl Decision {
    /// Decodes classifier output for the given stage.
    pub fn parse(stage: Stage, output: &Value) -> Result<Self, SchemaValidationError> {
        match stage {
            Stage::AskingStance => StanceDecision::from_output(output).map(Decision::Stance),
            Stage::CaseChallenge => ChallengeDecision::from_output(output).map(Decision::Challenge),
            Stage::PrincipleReasoning => {
                PrincipleDecision::from_output(output).map(Decision::Principle)
            }
            Stage::Closure => ClosureDecision::from_output(output).map(Decision::Closure),
            Stage::AwaitingStart | Stage::Ended => Err(SchemaValidationError::Malformed(format!(
                "stage {} does not classify input",
                stage
            ))),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Decision::Stance(_) => StanceDecision::STAGE,
            Decision::Challenge(_) => ChallengeDecision::STAGE,
            Decision::Principle(_) => PrincipleDecision::STAGE,
            Decision::Closure(_) => ClosureDecision::STAGE,
        }
    }

    pub fn intent(&self) -> Intent {
        match self {
            Decision::Stance(d) => d.intent(),
            Decision::Challenge(d) => d.intent(),
            Decision::Principle(d) => d.intent(),
            Decision::Closure(d) => d.intent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_established_stance() {
        let decision = Decision::parse(
            Stage::AskingStance,
            &json!({"intent": "TR_V1_ESTABLISHED", "position": "P", "reason": "R"}),
        )
        .unwrap();

        assert_eq!(
            decision,
            Decision::Stance(StanceDecision::Established {
                position: "P".to_string(),
                reason: "R".to_string()
            })
        );
        assert_eq!(decision.intent(), Intent::V1Established);
        assert_eq!(decision.stage(), Stage::AskingStance);
    }

    #[test]
    fn case_completed_defaults_request_principle() {
        let decision =
            ChallengeDecision::from_output(&json!({"intent": "TR_CASE_COMPLETED"})).unwrap();
        assert_eq!(
            decision,
            ChallengeDecision::CaseCompleted {
                request_principle: false
            }
        );
    }

    #[test]
    fn principle_classification_decodes() {
        let decision = PrincipleDecision::from_output(&json!({
            "intent": "TR_NEXT_CASE",
            "statement": "Lying is always wrong",
            "classification": "EXTREME"
        }))
        .unwrap();
        assert!(matches!(
            decision,
            PrincipleDecision::NextCase {
                classification: PrincipleClassification::Extreme,
                ..
            }
        ));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let decision = ClosureDecision::from_output(&json!({
            "intent": "TR_CONFIRM_END",
            "confidence": 0.9
        }))
        .unwrap();
        assert_eq!(
            decision,
            ClosureDecision::ConfirmEnd {
                closing_remark: None
            }
        );
    }

    #[test]
    fn illegal_intent_surfaces_as_fatal() {
        let err = Decision::parse(Stage::Closure, &json!({"intent": "TR_NEXT_CASE"})).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn non_classifying_stage_rejects_output() {
        assert!(Decision::parse(Stage::Ended, &json!({"intent": "TR_CLARIFY"})).is_err());
    }
}
